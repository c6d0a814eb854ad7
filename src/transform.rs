//! Elementwise application of operations across variables.
//!
//! Built-in operations are described by [`BinaryOp`] and [`UnaryOp`]. The
//! engine dispatches them at runtime to the typed kernels each [`Element`]
//! type provides, broadcasting operands by dimension label and propagating
//! variances. All shape, dtype, variance and kernel checks happen before the
//! first element is written.
//!
//! For user-defined element functions, [`transform`], [`transform2`],
//! [`transform_in_place`] and [`transform_in_place2`] apply typed closures.

use unitvar_units::{Unit, UnitError};

use crate::concept::{dispatch, dispatch_pair, type_mismatch, ViewModel, VariableConcept};
use crate::dimensions::Dimensions;
use crate::element::{DType, Element};
use crate::kernel::Offsets;
use crate::storage::ElementArray;
use crate::variable::Variable;
use crate::variable_view::{VariableConstView, VariableView};
use crate::view::ViewLayout;
use crate::{Result, VariableError};

// ============================================================================
// Operations
// ============================================================================

/// Built-in binary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Or,
    And,
    Xor,
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "subtract",
            BinaryOp::Mul => "multiply",
            BinaryOp::Div => "divide",
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Xor => "xor",
        }
    }

    /// Unit of `lhs op rhs`.
    pub fn unit(self, lhs: Unit, rhs: Unit) -> Result<Unit> {
        match self {
            BinaryOp::Mul => Ok(lhs * rhs),
            BinaryOp::Div => Ok(lhs / rhs),
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::And | BinaryOp::Xor => {
                lhs.expect_equal(rhs)?;
                Ok(lhs)
            }
        }
    }
}

/// Built-in unary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Abs,
    Sqrt,
    Reciprocal,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Not,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "negative",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Reciprocal => "reciprocal",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Asin => "asin",
            UnaryOp::Acos => "acos",
            UnaryOp::Atan => "atan",
            UnaryOp::Not => "not",
        }
    }

    /// Unit of `op(unit)`. Trigonometric functions take radians.
    pub fn unit(self, unit: Unit) -> Result<Unit> {
        match self {
            UnaryOp::Neg | UnaryOp::Abs | UnaryOp::Not => Ok(unit),
            UnaryOp::Sqrt => Ok(unit.sqrt()?),
            UnaryOp::Reciprocal => Ok(unit.reciprocal()),
            UnaryOp::Sin | UnaryOp::Cos | UnaryOp::Tan => {
                Unit::RAD.expect_equal(unit)?;
                Ok(Unit::DIMENSIONLESS)
            }
            UnaryOp::Asin | UnaryOp::Acos | UnaryOp::Atan => {
                if !unit.is_dimensionless() {
                    return Err(UnitError::Incompatible {
                        operation: self.name(),
                        unit,
                    }
                    .into());
                }
                Ok(Unit::RAD)
            }
        }
    }
}

fn unsupported(operation: &'static str, dtype: DType) -> VariableError {
    VariableError::UnsupportedDType { operation, dtype }
}

fn no_variance_rule(operation: &'static str) -> VariableError {
    VariableError::Variances(format!(
        "Operation {operation} cannot propagate variances."
    ))
}

// ============================================================================
// Erased engine
// ============================================================================

/// `dst[dst_layout] op= src[src_layout]`.
///
/// `src` is broadcast to the shape of `dst_layout`, which must contain it.
/// `dst` and `src` are distinct buffers; callers materialize aliased operands
/// first.
pub(crate) fn binary_in_place(
    dst: &mut VariableConcept,
    dst_layout: &ViewLayout,
    src: &VariableConcept,
    src_layout: &ViewLayout,
    op: BinaryOp,
) -> Result<()> {
    if !dst_layout.dims().contains(src_layout.dims()) {
        return Err(VariableError::DimensionMismatch {
            expected: dst_layout.dims().clone(),
            actual: src_layout.dims().clone(),
        });
    }
    let src_layout = src_layout.broadcast(dst_layout.dims())?;
    if src.has_variances() && !dst.has_variances() {
        return Err(VariableError::Variances(format!(
            "Cannot {} in place: right-hand side has variances but left-hand side does not.",
            op.name()
        )));
    }
    let (expected, actual) = (dst.dtype(), src.dtype());
    dispatch_pair!(dst, src, (a, b) => binary_in_place_typed(a, dst_layout, b, &src_layout, op),
        _ => Err(type_mismatch(expected, actual)))
}

fn binary_in_place_typed<T: Element>(
    dst: &mut ElementArray<T>,
    dst_layout: &ViewLayout,
    src: &ElementArray<T>,
    src_layout: &ViewLayout,
    op: BinaryOp,
) -> Result<()> {
    let value = T::binary_kernel(op).ok_or_else(|| unsupported(op.name(), T::DTYPE))?;
    let variance = match dst.has_variances() {
        true => Some(T::binary_variance_kernel(op).ok_or_else(|| no_variance_rule(op.name()))?),
        false => None,
    };
    let b_values = src.values();
    if T::DTYPE.is_sparse() {
        let a_values = dst.values();
        let compatible = Offsets::new(dst_layout)
            .zip(Offsets::new(src_layout))
            .all(|(i, j)| T::compatible(&a_values[i], &b_values[j]));
        if !compatible {
            return Err(VariableError::Dimension(
                "Cannot combine event lists of different lengths.".into(),
            ));
        }
    }

    let pairs = Offsets::new(dst_layout).zip(Offsets::new(src_layout));
    let b_variances = src.variances();
    let zero = T::default();
    match (dst.parts_mut(), variance) {
        ((values, Some(variances)), Some(variance)) => {
            for (i, j) in pairs {
                let b = &b_values[j];
                let vb = b_variances.map_or(&zero, |v| &v[j]);
                let new_variance = variance(&values[i], &variances[i], b, vb);
                values[i] = value(&values[i], b);
                variances[i] = new_variance;
            }
        }
        ((values, _), _) => {
            for (i, j) in pairs {
                values[i] = value(&values[i], &b_values[j]);
            }
        }
    }
    Ok(())
}

/// `a op b` with broadcasting. Returns the output dimensions and data.
pub(crate) fn binary(
    a: &ViewModel<'_>,
    b: &ViewModel<'_>,
    op: BinaryOp,
) -> Result<(Dimensions, VariableConcept)> {
    if a.dtype() != b.dtype() {
        return Err(type_mismatch(a.dtype(), b.dtype()));
    }
    let dims = Dimensions::merge(a.dims(), b.dims())?;
    let mut out = a.broadcast(&dims)?.clone_data();
    if b.has_variances() {
        out.ensure_variances()?;
    }
    binary_in_place(
        &mut out,
        &ViewLayout::contiguous(&dims),
        b.concept(),
        b.layout(),
        op,
    )?;
    Ok((dims, out))
}

/// `op(a)` as a new contiguous buffer.
pub(crate) fn unary(a: &ViewModel<'_>, op: UnaryOp) -> Result<VariableConcept> {
    let mut out = a.clone_data();
    dispatch!(&mut out, array => unary_typed(array, op))?;
    Ok(out)
}

fn unary_typed<T: Element>(array: &mut ElementArray<T>, op: UnaryOp) -> Result<()> {
    let value = T::unary_kernel(op).ok_or_else(|| unsupported(op.name(), T::DTYPE))?;
    match array.parts_mut() {
        (values, Some(variances)) => {
            let variance = T::unary_variance_kernel(op).ok_or_else(|| no_variance_rule(op.name()))?;
            for (x, v) in values.iter_mut().zip(variances.iter_mut()) {
                *v = variance(x, v);
                *x = value(x);
            }
        }
        (values, None) => {
            for x in values.iter_mut() {
                *x = value(x);
            }
        }
    }
    Ok(())
}

// ============================================================================
// Typed closures
// ============================================================================

fn reject_variances(has_variances: bool) -> Result<()> {
    if has_variances {
        return Err(VariableError::Variances(
            "Typed transforms cannot propagate variances.".into(),
        ));
    }
    Ok(())
}

/// Apply `f` to every element. The result keeps the unit of `var`.
pub fn transform<A, O>(var: &VariableConstView<'_>, f: impl Fn(&A) -> O) -> Result<Variable>
where
    A: Element,
    O: Element,
{
    reject_variances(var.has_variances())?;
    let values: Vec<O> = var.values::<A>()?.iter().map(f).collect();
    Variable::new(var.dims().clone(), var.unit(), values)
}

/// Apply `f` pairwise with broadcasting; the result has unit `unit`.
pub fn transform2<A, B, O>(
    a: &VariableConstView<'_>,
    b: &VariableConstView<'_>,
    unit: Unit,
    f: impl Fn(&A, &B) -> O,
) -> Result<Variable>
where
    A: Element,
    B: Element,
    O: Element,
{
    reject_variances(a.has_variances() || b.has_variances())?;
    let dims = Dimensions::merge(a.dims(), b.dims())?;
    let a_values = a.data().broadcast(&dims)?.values::<A>()?;
    let b_values = b.data().broadcast(&dims)?.values::<B>()?;
    let values: Vec<O> = a_values
        .iter()
        .zip(b_values.iter())
        .map(|(x, y)| f(x, y))
        .collect();
    Variable::new(dims, unit, values)
}

/// Apply `f` to every element of a mutable view.
pub fn transform_in_place<T: Element>(
    var: &mut VariableView<'_>,
    f: impl FnMut(&mut T),
) -> Result<()> {
    reject_variances(var.has_variances())?;
    var.values_mut::<T>()?.for_each_mut(f);
    Ok(())
}

/// `f(&mut lhs, &rhs)` elementwise, broadcasting `rhs` to the shape of `lhs`.
pub fn transform_in_place2<T: Element, U: Element>(
    lhs: &mut VariableView<'_>,
    rhs: &VariableConstView<'_>,
    mut f: impl FnMut(&mut T, &U),
) -> Result<()> {
    reject_variances(lhs.has_variances() || rhs.has_variances())?;
    let source = rhs.data().broadcast(lhs.dims())?.values::<U>()?;
    let mut source = source.iter();
    lhs.values_mut::<T>()?.for_each_mut(|x| {
        if let Some(y) = source.next() {
            f(x, y);
        }
    });
    Ok(())
}
