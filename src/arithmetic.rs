//! Arithmetic and logical operators on variables.
//!
//! Binary operators broadcast both operands to the union of their dimensions
//! and return `Result<Variable>`, since shapes, units and dtypes are only
//! known at runtime. In-place forms are inherent methods (`add_assign`, ...)
//! on [`Variable`] and [`VariableView`]; the right-hand side must be
//! contained in the left-hand side.

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Sub};

use num_traits::{cast, NumCast};

use crate::element::DType;
use crate::transform::{self, BinaryOp, UnaryOp};
use crate::variable::Variable;
use crate::variable_view::{AsVariableView, VariableConstView, VariableView};
use crate::{Result, VariableError};

/// `a op b` over the union of both operands' dimensions, with the unit
/// computed by `op` before any element is touched.
pub(crate) fn apply_binary(
    a: &VariableConstView<'_>,
    b: &VariableConstView<'_>,
    op: BinaryOp,
) -> Result<Variable> {
    let unit = op.unit(a.unit(), b.unit())?;
    let (dims, data) = transform::binary(a.data(), b.data(), op)?;
    Variable::from_parts(dims, unit, data)
}

/// `op a` elementwise; dimensions are kept.
pub(crate) fn apply_unary(a: &VariableConstView<'_>, op: UnaryOp) -> Result<Variable> {
    let unit = op.unit(a.unit())?;
    let data = transform::unary(a.data(), op)?;
    Variable::from_parts(a.dims().clone(), unit, data)
}

/// Dimensionless 0-d variable holding `value` converted to `dtype`.
fn scalar_operand<S>(value: S, dtype: DType) -> Result<Variable>
where
    S: NumCast + Copy + std::fmt::Display,
{
    let converted = match dtype {
        DType::F64 => cast::<S, f64>(value).map(Variable::scalar),
        DType::F32 => cast::<S, f32>(value).map(Variable::scalar),
        DType::I64 => cast::<S, i64>(value).map(Variable::scalar),
        DType::I32 => cast::<S, i32>(value).map(Variable::scalar),
        _ => None,
    };
    converted.ok_or_else(|| {
        VariableError::Type(format!(
            "Cannot combine scalar {value} with Variable of dtype {dtype}."
        ))
    })
}

// ============================================================================
// Operators
// ============================================================================

/// Implements `$trait` between owned variables and views, by reference or by
/// value. Each returns a new [`Variable`] or the first dimension, unit or
/// dtype error.
///
/// `&a + &b` and `a.view() + b.view()` produce the same result; a slice can be
/// used on either side without copying it first.
macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: AsVariableView> $trait<&R> for &Variable {
            type Output = Result<Variable>;

            fn $method(self, rhs: &R) -> Result<Variable> {
                apply_binary(&self.view(), &rhs.as_variable_view(), $op)
            }
        }

        impl<'b> $trait<VariableConstView<'b>> for &Variable {
            type Output = Result<Variable>;

            fn $method(self, rhs: VariableConstView<'b>) -> Result<Variable> {
                apply_binary(&self.view(), &rhs, $op)
            }
        }

        impl<'a, R: AsVariableView> $trait<&R> for VariableConstView<'a> {
            type Output = Result<Variable>;

            fn $method(self, rhs: &R) -> Result<Variable> {
                apply_binary(&self, &rhs.as_variable_view(), $op)
            }
        }

        impl<'a, 'b> $trait<VariableConstView<'b>> for VariableConstView<'a> {
            type Output = Result<Variable>;

            fn $method(self, rhs: VariableConstView<'b>) -> Result<Variable> {
                apply_binary(&self, &rhs, $op)
            }
        }

        impl<'a, R: AsVariableView> $trait<&R> for &VariableConstView<'a> {
            type Output = Result<Variable>;

            fn $method(self, rhs: &R) -> Result<Variable> {
                apply_binary(self, &rhs.as_variable_view(), $op)
            }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Sub);
impl_binary_operator!(Mul, mul, BinaryOp::Mul);
impl_binary_operator!(Div, div, BinaryOp::Div);
impl_binary_operator!(BitOr, bitor, BinaryOp::Or);
impl_binary_operator!(BitAnd, bitand, BinaryOp::And);
impl_binary_operator!(BitXor, bitxor, BinaryOp::Xor);

/// Implements `$trait` between a plain number and a variable, in both orders.
///
/// The number becomes a dimensionless 0-d operand of the variable's dtype, so
/// `&meters * 2.0` stays in meters while `&meters + 2.0` is a unit error.
/// Conversion fails with [`VariableError::Type`] for non-numeric dtypes or
/// values that do not fit.
macro_rules! impl_scalar_operator {
    ($scalar:ty; $($trait:ident, $method:ident, $op:expr;)*) => {
        $(
            impl $trait<$scalar> for &Variable {
                type Output = Result<Variable>;

                fn $method(self, rhs: $scalar) -> Result<Variable> {
                    let rhs = scalar_operand(rhs, self.dtype())?;
                    apply_binary(&self.view(), &rhs.view(), $op)
                }
            }

            impl<'a> $trait<$scalar> for VariableConstView<'a> {
                type Output = Result<Variable>;

                fn $method(self, rhs: $scalar) -> Result<Variable> {
                    let rhs = scalar_operand(rhs, self.dtype())?;
                    apply_binary(&self, &rhs.view(), $op)
                }
            }

            impl $trait<&Variable> for $scalar {
                type Output = Result<Variable>;

                fn $method(self, rhs: &Variable) -> Result<Variable> {
                    let lhs = scalar_operand(self, rhs.dtype())?;
                    apply_binary(&lhs.view(), &rhs.view(), $op)
                }
            }

            impl<'b> $trait<VariableConstView<'b>> for $scalar {
                type Output = Result<Variable>;

                fn $method(self, rhs: VariableConstView<'b>) -> Result<Variable> {
                    let lhs = scalar_operand(self, rhs.dtype())?;
                    apply_binary(&lhs.view(), &rhs, $op)
                }
            }
        )*
    };
}

/// Scalar `+ - * /` for each listed number type.
macro_rules! impl_scalar_operators {
    ($($scalar:ty),*) => {
        $(
            impl_scalar_operator!($scalar;
                Add, add, BinaryOp::Add;
                Sub, sub, BinaryOp::Sub;
                Mul, mul, BinaryOp::Mul;
                Div, div, BinaryOp::Div;
            );
        )*
    };
}

impl_scalar_operators!(f64, f32, i64, i32);

/// Elementwise negation; variances are unchanged.
impl Neg for &Variable {
    type Output = Result<Variable>;

    fn neg(self) -> Result<Variable> {
        apply_unary(&self.view(), UnaryOp::Neg)
    }
}

impl Neg for VariableConstView<'_> {
    type Output = Result<Variable>;

    fn neg(self) -> Result<Variable> {
        apply_unary(&self, UnaryOp::Neg)
    }
}

/// Logical negation of a `bool` variable; other dtypes are a type error.
impl Not for &Variable {
    type Output = Result<Variable>;

    fn not(self) -> Result<Variable> {
        apply_unary(&self.view(), UnaryOp::Not)
    }
}

impl Not for VariableConstView<'_> {
    type Output = Result<Variable>;

    fn not(self) -> Result<Variable> {
        apply_unary(&self, UnaryOp::Not)
    }
}

// ============================================================================
// In-place operations
// ============================================================================

impl VariableView<'_> {
    /// `self op= rhs`. All checks run before the first element is written.
    pub fn binary_assign(&mut self, op: BinaryOp, rhs: &impl AsVariableView) -> Result<()> {
        let rhs = rhs.as_variable_view();
        let unit = op.unit(self.unit(), rhs.unit())?;
        self.expect_can_set_unit(unit)?;
        let (dst, layout) = self.data_mut().parts_mut();
        transform::binary_in_place(dst, layout, rhs.data().concept(), rhs.data().layout(), op)?;
        self.set_unit(unit)
    }

    /// Add `rhs` elementwise. Units must be equal.
    pub fn add_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Add, rhs)
    }

    /// Subtract `rhs` elementwise. Units must be equal.
    pub fn sub_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Sub, rhs)
    }

    /// Multiply by `rhs`; the unit becomes the product.
    pub fn mul_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Mul, rhs)
    }

    /// Divide by `rhs`; the unit becomes the quotient.
    pub fn div_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Div, rhs)
    }

    /// Logical or with a `bool` `rhs`.
    pub fn or_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Or, rhs)
    }

    /// Logical and with a `bool` `rhs`.
    pub fn and_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::And, rhs)
    }

    /// Logical exclusive or with a `bool` `rhs`.
    pub fn xor_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Xor, rhs)
    }
}

impl Variable {
    /// `self op= rhs`, where `rhs` is a different variable or a view of one.
    /// For operands inside `self`, use [`Variable::binary_assign_within`].
    pub fn binary_assign(&mut self, op: BinaryOp, rhs: &impl AsVariableView) -> Result<()> {
        self.view_mut().binary_assign(op, rhs)
    }

    /// Add `rhs` elementwise. Units must be equal.
    pub fn add_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Add, rhs)
    }

    /// Subtract `rhs` elementwise. Units must be equal.
    pub fn sub_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Sub, rhs)
    }

    /// Multiply by `rhs`; the unit becomes the product.
    pub fn mul_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Mul, rhs)
    }

    /// Divide by `rhs`; the unit becomes the quotient.
    pub fn div_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Div, rhs)
    }

    /// Logical or with a `bool` `rhs`.
    pub fn or_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Or, rhs)
    }

    /// Logical and with a `bool` `rhs`.
    pub fn and_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::And, rhs)
    }

    /// Logical exclusive or with a `bool` `rhs`.
    pub fn xor_assign(&mut self, rhs: &impl AsVariableView) -> Result<()> {
        self.binary_assign(BinaryOp::Xor, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::Dim;
    use crate::dimensions::Dimensions;
    use crate::slice::Slice;
    use crate::ErrorKind;
    use approx::assert_relative_eq;
    use unitvar_units::Unit;

    fn var(pairs: &[(Dim, usize)], unit: Unit, values: Vec<f64>) -> Variable {
        Variable::new(Dimensions::from_pairs(pairs).unwrap(), unit, values).unwrap()
    }

    #[test]
    fn test_add_requires_equal_units() {
        let mut a = var(&[(Dim::X, 2)], Unit::DIMENSIONLESS, vec![1.0, 2.0]);
        let b = var(&[(Dim::X, 2)], Unit::M, vec![1.0, 2.0]);
        let err = a.add_assign(&b).unwrap_err();
        assert_eq!(err.to_string(), "Expected dimensionless to be equal to m.");
        assert_eq!(a.values::<f64>().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_mul_assign_updates_unit() {
        let mut a = var(&[(Dim::X, 2)], Unit::M, vec![1.0, 2.0]);
        let b = var(&[(Dim::X, 2)], Unit::S, vec![3.0, 4.0]);
        a.mul_assign(&b).unwrap();
        assert_eq!(a.unit(), Unit::M * Unit::S);
        assert_eq!(a.values::<f64>().unwrap(), &[3.0, 8.0]);
    }

    #[test]
    fn test_slice_in_place_cannot_change_unit() {
        let mut a = var(&[(Dim::Y, 2), (Dim::X, 2)], Unit::M, vec![1.0, 2.0, 3.0, 4.0]);
        let b = var(&[(Dim::X, 2)], Unit::M, vec![1.0, 1.0]);
        let mut row = a.slice_mut(Slice::at(Dim::Y, 1)).unwrap();
        row.add_assign(&b).unwrap();
        let err = row.mul_assign(&b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnitMismatch);
        assert_eq!(a.values::<f64>().unwrap(), &[1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn test_in_place_requires_containment() {
        let mut a = var(&[(Dim::X, 2)], Unit::M, vec![1.0, 2.0]);
        let b = var(&[(Dim::Y, 2)], Unit::M, vec![1.0, 2.0]);
        let err = a.add_assign(&b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dimension);
        assert_eq!(err.to_string(), "Expected {{Dim::X, 2}} to contain {{Dim::Y, 2}}.");
    }

    #[test]
    fn test_operators_broadcast() {
        let a = var(&[(Dim::X, 2)], Unit::M, vec![1.0, 2.0]);
        let b = var(&[(Dim::Y, 2)], Unit::M, vec![10.0, 20.0]);
        let sum = (&a + &b).unwrap();
        assert_eq!(sum.dims().labels(), &[Dim::Y, Dim::X]);
        assert_eq!(sum.values::<f64>().unwrap(), &[11.0, 12.0, 21.0, 22.0]);
        let from_views = (a.view() + b.view()).unwrap();
        assert_eq!(from_views, sum);
    }

    #[test]
    fn test_scalar_operands() {
        let a = var(&[(Dim::X, 2)], Unit::M, vec![1.0, 2.0]);
        let doubled = (&a * 2.0f64).unwrap();
        assert_eq!(doubled.unit(), Unit::M);
        assert_eq!(doubled.values::<f64>().unwrap(), &[2.0, 4.0]);
        let inverse = (1.0f64 / &a).unwrap();
        assert_eq!(inverse.unit(), Unit::M.reciprocal());
        assert_eq!(inverse.values::<f64>().unwrap(), &[1.0, 0.5]);
        assert_eq!((&a + 1.0f64).unwrap_err().kind(), ErrorKind::UnitMismatch);

        let dims = Dimensions::from_pairs(&[(Dim::X, 2)]).unwrap();
        let ints = Variable::new(dims, Unit::M, vec![3i64, 4]).unwrap();
        assert_eq!((&ints * 2i64).unwrap().values::<i64>().unwrap(), &[6, 8]);
        assert_eq!((&ints / 0i64).unwrap().values::<i64>().unwrap(), &[0, 0]);
    }

    #[test]
    fn test_division_variance_with_zero_numerator() {
        let a = Variable::with_variances(Dimensions::new(), Unit::M, vec![0.0], vec![0.1]).unwrap();
        let b = Variable::with_variances(Dimensions::new(), Unit::M, vec![3.0], vec![0.2]).unwrap();
        let q = (&a / &b).unwrap();
        assert_relative_eq!(*q.value::<f64>().unwrap(), 0.0);
        assert_relative_eq!(*q.variance::<f64>().unwrap(), 0.1 / 9.0);
    }

    #[test]
    fn test_string_arithmetic_is_type_error() {
        let a = Variable::new(
            Dimensions::from_pairs(&[(Dim::X, 1)]).unwrap(),
            Unit::DIMENSIONLESS,
            vec![String::from("a")],
        )
        .unwrap();
        assert_eq!((&a + &a).unwrap_err().kind(), ErrorKind::Type);
        assert_eq!((&a * 2.0f64).unwrap_err().kind(), ErrorKind::Type);
    }

    #[test]
    fn test_logical_operators() {
        let dims = Dimensions::from_pairs(&[(Dim::X, 2)]).unwrap();
        let a = Variable::new(dims.clone(), Unit::DIMENSIONLESS, vec![true, false]).unwrap();
        let b = Variable::new(dims, Unit::DIMENSIONLESS, vec![true, true]).unwrap();
        assert_eq!((&a & &b).unwrap().values::<bool>().unwrap(), &[true, false]);
        assert_eq!((&a | &b).unwrap().values::<bool>().unwrap(), &[true, true]);
        assert_eq!((&a ^ &b).unwrap().values::<bool>().unwrap(), &[false, true]);
        assert_eq!((!&a).unwrap().values::<bool>().unwrap(), &[false, true]);
    }

    #[test]
    fn test_negation_keeps_variances() {
        let a = Variable::with_variances(
            Dimensions::from_pairs(&[(Dim::X, 2)]).unwrap(),
            Unit::M,
            vec![1.0, -2.0],
            vec![0.5, 0.25],
        )
        .unwrap();
        let neg = (-&a).unwrap();
        assert_eq!(neg.values::<f64>().unwrap(), &[-1.0, 2.0]);
        assert_eq!(neg.variances::<f64>().unwrap(), &[0.5, 0.25]);
    }
}
