//! Reductions along a dimension.
//!
//! Dense reductions fold the slices along `dim` into an accumulator with the
//! same in-place operations users have, so units and variances follow the
//! usual rules. Summing an event-list variable along its sparse dimension
//! totals the events of each cell.

use crate::concept::VariableConcept;
use crate::dim::Dim;
use crate::element::{DType, Element, Numeric};
use crate::ops::astype;
use crate::slice::Slice;
use crate::storage::ElementArray;
use crate::transform::{transform_in_place2, BinaryOp};
use crate::variable::Variable;
use crate::variable_view::{AsVariableView, VariableConstView};
use crate::view::ElementArrayView;
use crate::{Result, VariableError};

/// Fold the slices of `var` along `dim` into `init` with `accumulate`.
pub fn reduce_dim<F>(
    var: &impl AsVariableView,
    dim: Dim,
    mut init: Variable,
    mut accumulate: F,
) -> Result<Variable>
where
    F: FnMut(&mut Variable, &VariableConstView<'_>) -> Result<()>,
{
    let var = var.as_variable_view();
    for i in 0..var.dims().extent(dim)? {
        accumulate(&mut init, &var.slice(Slice::at(dim, i))?)?;
    }
    Ok(init)
}

fn reduced(var: &VariableConstView<'_>, dim: Dim) -> Result<Variable> {
    let mut dims = var.dims().clone();
    dims.erase(dim)?;
    Variable::from_dtype(var.dtype(), dims, var.unit(), var.has_variances())
}

fn fold_with(
    var: &impl AsVariableView,
    dim: Dim,
    op: BinaryOp,
    init: Variable,
) -> Result<Variable> {
    reduce_dim(var, dim, init, |acc, slice| acc.binary_assign(op, slice))
}

// ============================================================================
// Sum and mean
// ============================================================================

/// Sum over `dim`. Variances add.
pub fn sum(var: &impl AsVariableView, dim: Dim) -> Result<Variable> {
    let view = var.as_variable_view();
    if view.dims().sparse_dim() == Some(dim) {
        return sum_events(&view);
    }
    if !view.dtype().is_numeric() && view.dtype() != DType::Vector3 {
        return Err(VariableError::UnsupportedDType {
            operation: "sum",
            dtype: view.dtype(),
        });
    }
    let init = reduced(&view, dim)?;
    fold_with(&view, dim, BinaryOp::Add, init)
}

/// Arithmetic mean over `dim`. Integer input yields `f64`.
pub fn mean(var: &impl AsVariableView, dim: Dim) -> Result<Variable> {
    let view = var.as_variable_view();
    let extent = view.dims().extent(dim)?;
    let summed = match view.dtype() {
        DType::I64 | DType::I32 => sum(&astype(&view, DType::F64)?, dim)?,
        DType::F64 | DType::F32 => sum(&view, dim)?,
        dtype => {
            return Err(VariableError::UnsupportedDType {
                operation: "mean",
                dtype,
            })
        }
    };
    &summed * (1.0 / extent as f64)
}

fn sum_events(var: &VariableConstView<'_>) -> Result<Variable> {
    let mut dims = var.dims().clone();
    if let Some(dim) = dims.sparse_dim() {
        dims.erase(dim)?;
    }
    let data: VariableConcept = match var.dtype() {
        DType::SparseF64 => total_events::<f64>(var)?.into(),
        DType::SparseF32 => total_events::<f32>(var)?.into(),
        DType::SparseI64 => total_events::<i64>(var)?.into(),
        DType::SparseI32 => total_events::<i32>(var)?.into(),
        dtype => {
            return Err(VariableError::UnsupportedDType {
                operation: "sum",
                dtype,
            })
        }
    };
    Variable::from_parts(dims, var.unit(), data)
}

/// Per-cell totals of event lists, read through the strided view.
fn total_events<N: Numeric>(var: &VariableConstView<'_>) -> Result<ElementArray<N>>
where
    Vec<N>: Element,
{
    let total = |lists: ElementArrayView<'_, Vec<N>>| -> Vec<N> {
        lists
            .iter()
            .map(|list| list.iter().fold(N::zero(), |acc, &x| acc.plus(x)))
            .collect()
    };
    let variances = match var.has_variances() {
        true => Some(total(var.variances::<Vec<N>>()?)),
        false => None,
    };
    ElementArray::from_parts(total(var.values::<Vec<N>>()?), variances)
}

// ============================================================================
// Logical reductions
// ============================================================================

fn expect_bool(var: &VariableConstView<'_>, operation: &'static str) -> Result<()> {
    if var.dtype() != DType::Bool {
        return Err(VariableError::UnsupportedDType {
            operation,
            dtype: var.dtype(),
        });
    }
    Ok(())
}

/// True where any slice along `dim` is true.
pub fn any(var: &impl AsVariableView, dim: Dim) -> Result<Variable> {
    let view = var.as_variable_view();
    expect_bool(&view, "any")?;
    let init = reduced(&view, dim)?;
    fold_with(&view, dim, BinaryOp::Or, init)
}

/// True where every slice along `dim` is true.
pub fn all(var: &impl AsVariableView, dim: Dim) -> Result<Variable> {
    let view = var.as_variable_view();
    expect_bool(&view, "all")?;
    let mut init = reduced(&view, dim)?;
    init.values_mut::<bool>()?.fill(true);
    fold_with(&view, dim, BinaryOp::And, init)
}

// ============================================================================
// Extrema
// ============================================================================

/// Minimum over `dim`.
pub fn min(var: &impl AsVariableView, dim: Dim) -> Result<Variable> {
    extremum(&var.as_variable_view(), dim, "min", true)
}

/// Maximum over `dim`.
pub fn max(var: &impl AsVariableView, dim: Dim) -> Result<Variable> {
    extremum(&var.as_variable_view(), dim, "max", false)
}

fn extremum(
    var: &VariableConstView<'_>,
    dim: Dim,
    operation: &'static str,
    smallest: bool,
) -> Result<Variable> {
    if var.has_variances() {
        return Err(VariableError::Variances(format!(
            "Cannot compute {operation} of data with variances."
        )));
    }
    match var.dtype() {
        DType::F64 => extremum_typed::<f64>(var, dim, smallest),
        DType::F32 => extremum_typed::<f32>(var, dim, smallest),
        DType::I64 => extremum_typed::<i64>(var, dim, smallest),
        DType::I32 => extremum_typed::<i32>(var, dim, smallest),
        dtype => Err(VariableError::UnsupportedDType { operation, dtype }),
    }
}

fn extremum_typed<N: Numeric>(
    var: &VariableConstView<'_>,
    dim: Dim,
    smallest: bool,
) -> Result<Variable> {
    let extent = var.dims().extent(dim)?;
    if extent == 0 {
        return Err(VariableError::Dimension(format!(
            "Cannot compute extremum along empty dimension {dim}."
        )));
    }
    let init = var.slice(Slice::at(dim, 0))?.to_variable();
    reduce_dim(var, dim, init, |acc, slice| {
        transform_in_place2(&mut acc.view_mut(), slice, |x: &mut N, y: &N| {
            if (smallest && *y < *x) || (!smallest && *y > *x) {
                *x = *y;
            }
        })
    })
}
