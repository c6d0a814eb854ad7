//! Shape operations that produce new variables.

use num_traits::cast;
use tracing::debug;

use crate::concept::VariableConcept;
use crate::dim::Dim;
use crate::dimensions::Dimensions;
use crate::element::{DType, Element, Numeric};
use crate::kernel::Offsets;
use crate::slice::Slice;
use crate::storage::ElementArray;
use crate::variable::Variable;
use crate::variable_view::{AsVariableView, VariableConstView};
use crate::view::ViewLayout;
use crate::{Result, VariableError};

// ============================================================================
// Concatenate
// ============================================================================

/// Join `a` and `b` along `dim`.
///
/// An operand without `dim` counts as extent 1. If neither has it, `dim`
/// becomes a new outermost dimension of extent 2. Along the sparse
/// dimension, the event lists of each cell are appended.
pub fn concatenate(
    a: &impl AsVariableView,
    b: &impl AsVariableView,
    dim: Dim,
) -> Result<Variable> {
    let (a, b) = (a.as_variable_view(), b.as_variable_view());
    if a.dtype() != b.dtype() {
        return Err(VariableError::Type(
            "Cannot concatenate Variables: Data types do not match.".into(),
        ));
    }
    a.unit().expect_equal(b.unit())?;
    if a.has_variances() != b.has_variances() {
        return Err(VariableError::Variances(
            "Cannot concatenate Variables: either both or neither must have variances.".into(),
        ));
    }
    if a.dims().sparse_dim() == Some(dim) {
        return concatenate_events(&a, &b);
    }

    let mut a_rest = a.dims().clone();
    let mut b_rest = b.dims().clone();
    let a_extent = extent_or_one(&mut a_rest, dim)?;
    let b_extent = extent_or_one(&mut b_rest, dim)?;
    if a_rest != b_rest {
        return Err(VariableError::Dimension(
            "Cannot concatenate Variables: Dimension extents do not match.".into(),
        ));
    }
    let mut dims = if a.dims().contains_dim(dim) {
        a.dims().clone()
    } else if b.dims().contains_dim(dim) {
        b.dims().clone()
    } else {
        let mut dims = a.dims().clone();
        dims.add_outer(dim, 1)?;
        dims
    };
    dims.resize(dim, a_extent + b_extent)?;

    debug!(dims = %dims, "concatenate: allocating output");
    let mut out = Variable::from_dtype(a.dtype(), dims, a.unit(), a.has_variances())?;
    out.slice_mut(Slice::range(dim, 0, a_extent))?.assign(&a)?;
    out.slice_mut(Slice::range(dim, a_extent, a_extent + b_extent))?
        .assign(&b)?;
    Ok(out)
}

/// Extent of `dim`, removing it from `dims`; 1 if `dims` lacks it.
fn extent_or_one(dims: &mut Dimensions, dim: Dim) -> Result<usize> {
    if !dims.contains_dim(dim) {
        return Ok(1);
    }
    let extent = dims.extent(dim)?;
    dims.erase(dim)?;
    Ok(extent)
}

fn concatenate_events(a: &VariableConstView<'_>, b: &VariableConstView<'_>) -> Result<Variable> {
    if a.dims() != b.dims() {
        return Err(VariableError::DimensionMismatch {
            expected: a.dims().clone(),
            actual: b.dims().clone(),
        });
    }
    let mut data = a.data().clone_data();
    let layout = b.data().layout();
    match (&mut data, b.data().concept()) {
        (VariableConcept::SparseF64(x), VariableConcept::SparseF64(y)) => {
            append_events(x, y, layout)
        }
        (VariableConcept::SparseF32(x), VariableConcept::SparseF32(y)) => {
            append_events(x, y, layout)
        }
        (VariableConcept::SparseI64(x), VariableConcept::SparseI64(y)) => {
            append_events(x, y, layout)
        }
        (VariableConcept::SparseI32(x), VariableConcept::SparseI32(y)) => {
            append_events(x, y, layout)
        }
        _ => {
            return Err(VariableError::Type(
                "Cannot concatenate Variables: Data types do not match.".into(),
            ))
        }
    }
    Variable::from_parts(a.dims().clone(), a.unit(), data)
}

fn append_events<N: Clone>(
    dst: &mut ElementArray<Vec<N>>,
    src: &ElementArray<Vec<N>>,
    src_layout: &ViewLayout,
) where
    Vec<N>: Element,
{
    let (values, variances) = dst.parts_mut();
    for (d, s) in Offsets::new(src_layout).enumerate() {
        values[d].extend_from_slice(&src.values()[s]);
    }
    if let (Some(variances), Some(src_variances)) = (variances, src.variances()) {
        for (d, s) in Offsets::new(src_layout).enumerate() {
            variances[d].extend_from_slice(&src_variances[s]);
        }
    }
}

// ============================================================================
// Layout copies
// ============================================================================

/// Copy of `var` extended to also span `dims`. New dimensions are placed
/// outermost.
pub fn broadcast(var: &impl AsVariableView, dims: &Dimensions) -> Result<Variable> {
    let var = var.as_variable_view();
    let target = Dimensions::merge(var.dims(), dims)?;
    let data = var.data().broadcast(&target)?.clone_data();
    Variable::from_parts(target, var.unit(), data)
}

/// Copy of `var` with the order of elements along `dim` reversed.
pub fn reverse(var: &impl AsVariableView, dim: Dim) -> Result<Variable> {
    let var = var.as_variable_view();
    let data = var.data().reverse(dim)?.clone_data();
    Variable::from_parts(var.dims().clone(), var.unit(), data)
}

/// Reorder along `dim`: slice `i` of the result is slice `indices[i]` of
/// `var`. Indices may repeat or be omitted.
pub fn permute(var: &impl AsVariableView, dim: Dim, indices: &[usize]) -> Result<Variable> {
    let var = var.as_variable_view();
    let mut dims = var.dims().clone();
    dims.resize(dim, indices.len())?;
    let mut out = Variable::from_dtype(var.dtype(), dims, var.unit(), var.has_variances())?;
    for (i, &index) in indices.iter().enumerate() {
        let source = var.slice(Slice::range(dim, index, index + 1))?;
        out.slice_mut(Slice::range(dim, i, i + 1))?.assign(&source)?;
    }
    Ok(out)
}

/// Split along `dim` at the interior positions `indices`, which must be
/// non-decreasing.
pub fn split(var: &impl AsVariableView, dim: Dim, indices: &[usize]) -> Result<Vec<Variable>> {
    let var = var.as_variable_view();
    let extent = var.dims().extent(dim)?;
    if indices.windows(2).any(|w| w[0] > w[1]) {
        return Err(VariableError::Dimension(
            "Split indices must be sorted.".into(),
        ));
    }
    std::iter::once(0)
        .chain(indices.iter().copied())
        .zip(indices.iter().copied().chain(std::iter::once(extent)))
        .map(|(begin, end)| -> Result<Variable> {
            Ok(var.slice(Slice::range(dim, begin, end))?.to_variable())
        })
        .collect()
}

/// Variable like `var` with `dim` resized to `size` and default data.
pub fn resize(var: &impl AsVariableView, dim: Dim, size: usize) -> Result<Variable> {
    let var = var.as_variable_view();
    let mut dims = var.dims().clone();
    dims.resize(dim, size)?;
    Variable::from_dtype(var.dtype(), dims, var.unit(), var.has_variances())
}

/// Keep the slices of `var` along the dimension of the 1-D bool `filter`
/// for which it is `true`.
pub fn filter(var: &impl AsVariableView, filter: &impl AsVariableView) -> Result<Variable> {
    let (var, filter) = (var.as_variable_view(), filter.as_variable_view());
    let dim = match filter.dims().labels() {
        [dim] if !filter.dims().is_sparse() => *dim,
        _ => {
            return Err(VariableError::Dimension(format!(
                "Cannot filter variable: filter must be 1-dimensional, got {}.",
                filter.dims()
            )))
        }
    };
    let extent = var.dims().extent(dim)?;
    if filter.dims().shape()[0] != extent {
        return Err(VariableError::DimensionMismatch {
            expected: var.dims().clone(),
            actual: filter.dims().clone(),
        });
    }
    let indices: Vec<usize> = filter
        .values::<bool>()?
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect();
    permute(&var, dim, &indices)
}

// ============================================================================
// Element type conversion
// ============================================================================

/// Copy of `var` with elements converted to `dtype`. Only numeric dtypes
/// convert; variances are converted with the values.
pub fn astype(var: &impl AsVariableView, dtype: DType) -> Result<Variable> {
    let var = var.as_variable_view();
    let data = var.data().clone_data();
    let converted = match dtype {
        _ if dtype == var.dtype() => data,
        DType::F64 => convert_to::<f64>(&data)?,
        DType::F32 => convert_to::<f32>(&data)?,
        DType::I64 => convert_to::<i64>(&data)?,
        DType::I32 => convert_to::<i32>(&data)?,
        _ => return Err(cannot_convert(var.dtype(), dtype)),
    };
    Variable::from_parts(var.dims().clone(), var.unit(), converted)
}

fn cannot_convert(from: DType, to: DType) -> VariableError {
    VariableError::Type(format!("Cannot convert dtype {from} to {to}."))
}

fn convert_to<D: Numeric>(data: &VariableConcept) -> Result<VariableConcept> {
    let array = match data {
        VariableConcept::F64(a) => convert::<f64, D>(a)?,
        VariableConcept::F32(a) => convert::<f32, D>(a)?,
        VariableConcept::I64(a) => convert::<i64, D>(a)?,
        VariableConcept::I32(a) => convert::<i32, D>(a)?,
        other => return Err(cannot_convert(other.dtype(), D::DTYPE)),
    };
    Ok(array.into())
}

fn convert<S: Numeric, D: Numeric>(array: &ElementArray<S>) -> Result<ElementArray<D>> {
    let cast_all = |xs: &[S]| {
        xs.iter()
            .map(|&x| cast::<S, D>(x))
            .collect::<Option<Vec<D>>>()
            .ok_or_else(|| {
                VariableError::Type(format!(
                    "Values of dtype {} are not representable as {}.",
                    S::DTYPE,
                    D::DTYPE
                ))
            })
    };
    let values = cast_all(array.values())?;
    let variances = array.variances().map(cast_all).transpose()?;
    ElementArray::from_parts(values, variances)
}
