//! The [`Unit`] value type.

use std::fmt;
use std::ops::{Div, DivAssign, Mul, MulAssign};

use crate::{Result, UnitError};

/// Base units a [`Unit`] is composed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseUnit {
    Meter,
    Second,
    Kilogram,
    Kelvin,
    Counts,
    Angstrom,
    MilliElectronVolt,
    Microsecond,
    Radian,
    Degree,
}

const BASE_COUNT: usize = 10;

impl BaseUnit {
    pub const ALL: [BaseUnit; BASE_COUNT] = [
        BaseUnit::Meter,
        BaseUnit::Second,
        BaseUnit::Kilogram,
        BaseUnit::Kelvin,
        BaseUnit::Counts,
        BaseUnit::Angstrom,
        BaseUnit::MilliElectronVolt,
        BaseUnit::Microsecond,
        BaseUnit::Radian,
        BaseUnit::Degree,
    ];

    /// Symbol used when formatting units.
    pub fn symbol(self) -> &'static str {
        match self {
            BaseUnit::Meter => "m",
            BaseUnit::Second => "s",
            BaseUnit::Kilogram => "kg",
            BaseUnit::Kelvin => "K",
            BaseUnit::Counts => "counts",
            BaseUnit::Angstrom => "AA",
            BaseUnit::MilliElectronVolt => "meV",
            BaseUnit::Microsecond => "us",
            BaseUnit::Radian => "rad",
            BaseUnit::Degree => "deg",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// A physical unit: integer exponents over [`BaseUnit`].
///
/// Units are plain `Copy` values. Multiplication and division add and
/// subtract exponents; they never fail.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Unit {
    exponents: [i32; BASE_COUNT],
}

impl Unit {
    pub const DIMENSIONLESS: Unit = Unit {
        exponents: [0; BASE_COUNT],
    };
    pub const M: Unit = Unit::base(BaseUnit::Meter);
    pub const S: Unit = Unit::base(BaseUnit::Second);
    pub const KG: Unit = Unit::base(BaseUnit::Kilogram);
    pub const K: Unit = Unit::base(BaseUnit::Kelvin);
    pub const COUNTS: Unit = Unit::base(BaseUnit::Counts);
    pub const ANGSTROM: Unit = Unit::base(BaseUnit::Angstrom);
    pub const MEV: Unit = Unit::base(BaseUnit::MilliElectronVolt);
    pub const US: Unit = Unit::base(BaseUnit::Microsecond);
    pub const RAD: Unit = Unit::base(BaseUnit::Radian);
    pub const DEG: Unit = Unit::base(BaseUnit::Degree);

    /// The unit consisting of a single base unit with exponent one.
    pub const fn base(base: BaseUnit) -> Unit {
        let mut exponents = [0; BASE_COUNT];
        exponents[base.index()] = 1;
        Unit { exponents }
    }

    /// Exponent of `base` in this unit.
    pub fn exponent(&self, base: BaseUnit) -> i32 {
        self.exponents[base.index()]
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Unit::DIMENSIONLESS
    }

    /// True for `rad` and `deg`.
    pub fn is_angle(&self) -> bool {
        *self == Unit::RAD || *self == Unit::DEG
    }

    /// True if the unit is a count unit, possibly scaled by other factors
    /// (`counts`, `counts/m`, ...).
    pub fn is_counts(&self) -> bool {
        self.exponent(BaseUnit::Counts) == 1
    }

    /// Raise to an integer power.
    pub fn powi(self, n: i32) -> Unit {
        let mut out = self;
        for e in out.exponents.iter_mut() {
            *e = e.wrapping_mul(n);
        }
        out
    }

    /// Square root; fails unless every exponent is even.
    pub fn sqrt(self) -> Result<Unit> {
        if self.exponents.iter().any(|e| e % 2 != 0) {
            return Err(UnitError::Sqrt(self));
        }
        let mut out = self;
        for e in out.exponents.iter_mut() {
            *e /= 2;
        }
        Ok(out)
    }

    /// Succeeds if `other` equals `self`, the requirement for addition,
    /// subtraction and comparisons.
    pub fn expect_equal(self, other: Unit) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(UnitError::Mismatch {
                expected: self,
                actual: other,
            })
        }
    }

    /// Unit of `1 / self`.
    pub fn reciprocal(self) -> Unit {
        Unit::DIMENSIONLESS / self
    }

    fn terms(&self, positive: bool) -> Vec<String> {
        BaseUnit::ALL
            .iter()
            .filter_map(|&base| {
                let e = self.exponent(base);
                let e = if positive { e } else { -e };
                match e {
                    e if e <= 0 => None,
                    1 => Some(base.symbol().to_string()),
                    e => Some(format!("{}^{}", base.symbol(), e)),
                }
            })
            .collect()
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(mut self, rhs: Unit) -> Unit {
        self *= rhs;
        self
    }
}

impl MulAssign for Unit {
    fn mul_assign(&mut self, rhs: Unit) {
        for (a, b) in self.exponents.iter_mut().zip(rhs.exponents.iter()) {
            *a = a.wrapping_add(*b);
        }
    }
}

impl Div for Unit {
    type Output = Unit;

    fn div(mut self, rhs: Unit) -> Unit {
        self /= rhs;
        self
    }
}

impl DivAssign for Unit {
    fn div_assign(&mut self, rhs: Unit) {
        for (a, b) in self.exponents.iter_mut().zip(rhs.exponents.iter()) {
            *a = a.wrapping_sub(*b);
        }
    }
}

impl From<BaseUnit> for Unit {
    fn from(base: BaseUnit) -> Self {
        Unit::base(base)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let numerator = self.terms(true);
        let denominator = self.terms(false);
        let numerator = if numerator.is_empty() {
            "1".to_string()
        } else {
            numerator.join("*")
        };
        match denominator.len() {
            0 => write!(f, "{numerator}"),
            1 => write!(f, "{numerator}/{}", denominator[0]),
            _ => write!(f, "{numerator}/({})", denominator.join("*")),
        }
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unit({self})")
    }
}
