//! Helpers for event-list (sparse) variables.

use unitvar_units::Unit;

use crate::concept::VariableConcept;
use crate::element::{DType, Element};
use crate::storage::ElementArray;
use crate::variable::Variable;
use crate::variable_view::{AsVariableView, VariableConstView};
use crate::{Result, VariableError};

fn not_sparse(operation: &'static str, var: &VariableConcept) -> VariableError {
    VariableError::UnsupportedDType {
        operation,
        dtype: var.dtype(),
    }
}

/// Number of events in each cell, as dimensionless `i64`.
pub fn counts(var: &impl AsVariableView) -> Result<Variable> {
    let var = var.as_variable_view();
    let counts = match var.dtype() {
        DType::SparseF64 => lengths::<f64>(&var)?,
        DType::SparseF32 => lengths::<f32>(&var)?,
        DType::SparseI64 => lengths::<i64>(&var)?,
        DType::SparseI32 => lengths::<i32>(&var)?,
        dtype => {
            return Err(VariableError::UnsupportedDType {
                operation: "counts",
                dtype,
            })
        }
    };
    let mut dims = var.dims().clone();
    if let Some(dim) = dims.sparse_dim() {
        dims.erase(dim)?;
    }
    Variable::new(dims, Unit::DIMENSIONLESS, counts)
}

/// Event-list lengths read through the strided view, without copying lists.
fn lengths<N>(var: &VariableConstView<'_>) -> Result<Vec<i64>>
where
    Vec<N>: Element,
{
    Ok(var
        .values::<Vec<N>>()?
        .iter()
        .map(|events| events.len() as i64)
        .collect())
}

/// Reserve room for `capacity` events in every cell.
pub fn reserve(var: &mut Variable, capacity: usize) -> Result<()> {
    match &mut var.data {
        VariableConcept::SparseF64(a) => reserve_events(a, capacity),
        VariableConcept::SparseF32(a) => reserve_events(a, capacity),
        VariableConcept::SparseI64(a) => reserve_events(a, capacity),
        VariableConcept::SparseI32(a) => reserve_events(a, capacity),
        other => return Err(not_sparse("reserve", other)),
    }
    Ok(())
}

fn reserve_events<N>(array: &mut ElementArray<Vec<N>>, capacity: usize)
where
    Vec<N>: Element,
{
    let (values, variances) = array.parts_mut();
    for events in values.iter_mut() {
        events.reserve(capacity);
    }
    for events in variances.into_iter().flatten() {
        events.reserve(capacity);
    }
}
