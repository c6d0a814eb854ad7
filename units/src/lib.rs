//! Physical unit algebra for `unitvar`.
//!
//! A [`Unit`] is a product of integer powers of a fixed set of [`BaseUnit`]s.
//! The array engine treats units as an opaque service: it multiplies and
//! divides them alongside the data, takes square roots for `sqrt`, and
//! requires equality where addition-like operations combine operands.
//!
//! ```rust
//! use unitvar_units::Unit;
//!
//! let area = Unit::M * Unit::M;
//! assert_eq!(area.to_string(), "m^2");
//! assert_eq!(area.sqrt().unwrap(), Unit::M);
//! assert!((Unit::M / Unit::M).is_dimensionless());
//! ```

pub mod unit;

pub use unit::{BaseUnit, Unit};

/// Errors raised by unit arithmetic and unit checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("Expected {expected} to be equal to {actual}.")]
    Mismatch { expected: Unit, actual: Unit },

    #[error("Unit {0} has no integral square root.")]
    Sqrt(Unit),

    #[error("Operation {operation} does not support unit {unit}.")]
    Incompatible { operation: &'static str, unit: Unit },
}

/// Convenience type alias for unit results.
pub type Result<T> = std::result::Result<T, UnitError>;
