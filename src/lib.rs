//! Labeled, unit-aware, type-erased multidimensional arrays.
//!
//! A [`Variable`] owns a flat buffer of elements of one runtime-selected
//! [`DType`], a set of named [`Dimensions`], a physical [`Unit`] and an
//! optional buffer of variances. [`VariableConstView`] and [`VariableView`]
//! are cheap strided windows into a variable, obtained by slicing along named
//! dimensions.
//!
//! # Core Types
//!
//! - [`Dimensions`]: ordered, labeled shape (outermost first)
//! - [`ElementArray`] / [`ElementArrayView`]: typed storage and strided typed views
//! - [`VariableConcept`] / [`ViewModel`]: type-erased storage and views into it
//! - [`Variable`] / [`VariableConstView`] / [`VariableView`]
//!
//! # Operations
//!
//! - Arithmetic: `+ - * /` and `| & ^` return `Result<Variable>`; in-place
//!   forms are methods such as [`Variable::add_assign`]
//! - [`transform`], [`transform2`], [`transform_in_place`], [`transform_in_place2`]:
//!   user closures applied elementwise with broadcasting
//! - [`ops`]: concatenate, broadcast, reverse, permute, split, resize, filter, astype
//! - [`reduce`]: sum, mean, any, all, min, max
//! - [`math`]: abs, sqrt, norm, dot, reciprocal, trigonometry, nan_to_num
//! - [`rebin`]: redistribute counts onto new bin edges
//! - [`sparse`]: event-list helpers
//!
//! # Example
//!
//! ```rust
//! use unitvar::{Dim, Dimensions, Slice, Unit, Variable};
//!
//! let dims = Dimensions::from_pairs(&[(Dim::Y, 2), (Dim::X, 2)]).unwrap();
//! let mut var = Variable::new(dims, Unit::M, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//!
//! // Broadcasts the first row over Y; the source is copied first.
//! var.binary_assign_within(unitvar::BinaryOp::Sub, &[], &[Slice::at(Dim::Y, 0)])
//!     .unwrap();
//! assert_eq!(var.values::<f64>().unwrap(), &[0.0, 0.0, 2.0, 2.0]);
//!
//! let area = (&var * &var).unwrap();
//! assert_eq!(area.unit(), Unit::M * Unit::M);
//! ```

mod arithmetic;
mod concept;
mod dim;
mod dimensions;
mod element;
mod kernel;
pub mod math;
pub mod ops;
pub mod rebin;
pub mod reduce;
mod slice;
pub mod sparse;
mod storage;
mod transform;
mod variable;
mod variable_view;
mod view;

// ============================================================================
// Labels and shapes
// ============================================================================
pub use dim::Dim;
pub use dimensions::{row_major_strides, Dimensions};
pub use slice::Slice;

// ============================================================================
// Elements and typed storage
// ============================================================================
pub use element::{DType, Element, FloatElement, Numeric, Vector3};
pub use storage::ElementArray;
pub use view::{ElementArrayView, ElementArrayViewMut, ViewLayout};

// ============================================================================
// Type-erased storage
// ============================================================================
pub use concept::{VariableConcept, ViewModel, ViewModelMut};

// ============================================================================
// Variables
// ============================================================================
pub use variable::{Variable, VariableBuilder};
pub use variable_view::{AsVariableView, VariableConstView, VariableView};

// ============================================================================
// Transform engine
// ============================================================================
pub use transform::{
    transform, transform2, transform_in_place, transform_in_place2, BinaryOp, UnaryOp,
};

pub use unitvar_units::{BaseUnit, Unit, UnitError};

// ============================================================================
// Error types
// ============================================================================

/// Errors raised by variable operations.
///
/// All shape, dtype, unit and variance checks of an operation run before any
/// element is written, so an `Err` from an in-place operation leaves the
/// target unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VariableError {
    /// A dimension label is not present.
    #[error("Expected dimension to be in {dims}, got {dim}.")]
    DimensionNotFound { dim: Dim, dims: Dimensions },

    /// One shape does not contain another.
    #[error("Expected {expected} to contain {actual}.")]
    DimensionMismatch {
        expected: Dimensions,
        actual: Dimensions,
    },

    #[error("Duplicate dimension {0}.")]
    DuplicateDimension(Dim),

    #[error("{0}")]
    Dimension(String),

    #[error("Slice {slice} is out of range for extent {extent}.")]
    SliceOutOfRange { slice: Slice, extent: usize },

    /// Operands have different element types.
    #[error("Expected dtype {expected}, got {actual}.")]
    TypeMismatch { expected: DType, actual: DType },

    /// The operation has no kernel for this element type.
    #[error("Operation {operation} is not supported for dtype {dtype}.")]
    UnsupportedDType {
        operation: &'static str,
        dtype: DType,
    },

    #[error("{0}")]
    Type(String),

    #[error(transparent)]
    Unit(#[from] UnitError),

    /// The unit of a partial view cannot be changed independently of its owner.
    #[error(
        "Partial view on data of variable cannot be used to change the unit \
         from {current} to {requested}."
    )]
    PartialViewUnit { current: Unit, requested: Unit },

    #[error("{0}")]
    BinEdge(String),

    #[error("{0}")]
    Variances(String),
}

/// Coarse classification of [`VariableError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Dimension,
    Type,
    UnitMismatch,
    BinEdge,
    Variances,
    Slice,
}

impl VariableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VariableError::DimensionNotFound { .. }
            | VariableError::DimensionMismatch { .. }
            | VariableError::DuplicateDimension(_)
            | VariableError::Dimension(_) => ErrorKind::Dimension,
            VariableError::SliceOutOfRange { .. } => ErrorKind::Slice,
            VariableError::TypeMismatch { .. }
            | VariableError::UnsupportedDType { .. }
            | VariableError::Type(_) => ErrorKind::Type,
            VariableError::Unit(_) | VariableError::PartialViewUnit { .. } => {
                ErrorKind::UnitMismatch
            }
            VariableError::BinEdge(_) => ErrorKind::BinEdge,
            VariableError::Variances(_) => ErrorKind::Variances,
        }
    }
}

/// Result type for variable operations.
pub type Result<T> = std::result::Result<T, VariableError>;
