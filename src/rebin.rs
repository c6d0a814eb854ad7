//! Redistribution of histogrammed counts onto new bin edges.

use unitvar_units::UnitError;

use crate::dim::Dim;
use crate::slice::Slice;
use crate::variable::Variable;
use crate::variable_view::{AsVariableView, VariableConstView};
use crate::{Result, VariableError};

fn edge_values(edges: &VariableConstView<'_>, dim: Dim) -> Result<Vec<f64>> {
    if edges.dims().labels() != [dim] || edges.dims().is_sparse() {
        return Err(VariableError::BinEdge(format!(
            "Bin edges must be 1-dimensional along {dim}, got {}.",
            edges.dims()
        )));
    }
    let values = edges.values::<f64>()?.to_vec();
    if values.windows(2).any(|w| w[0] > w[1]) {
        return Err(VariableError::BinEdge("Bin edges must be sorted.".into()));
    }
    Ok(values)
}

/// Rebin the count data `var` along `dim` from `old_edges` to `new_edges`.
///
/// Each old bin contributes to each new bin in proportion to their overlap,
/// assuming counts are uniformly distributed within a bin. Variances are
/// redistributed with the same weights.
pub fn rebin(
    var: &impl AsVariableView,
    dim: Dim,
    old_edges: &impl AsVariableView,
    new_edges: &impl AsVariableView,
) -> Result<Variable> {
    let var = var.as_variable_view();
    if !var.unit().is_counts() {
        return Err(UnitError::Incompatible {
            operation: "rebin",
            unit: var.unit(),
        }
        .into());
    }
    if !var.dtype().is_float() {
        return Err(VariableError::UnsupportedDType {
            operation: "rebin",
            dtype: var.dtype(),
        });
    }
    let old = edge_values(&old_edges.as_variable_view(), dim)?;
    let new = edge_values(&new_edges.as_variable_view(), dim)?;
    let extent = var.dims().extent(dim)?;
    if old.len() != extent + 1 {
        return Err(VariableError::Dimension(format!(
            "Expected {} old bin edges for extent {extent} of {dim}, got {}.",
            extent + 1,
            old.len()
        )));
    }
    if new.len() < 2 {
        return Err(VariableError::BinEdge(
            "At least two new bin edges are required.".into(),
        ));
    }

    let (values, variances) = var.data().clone_data().split_variances();
    let values = Variable::from_parts(var.dims().clone(), var.unit(), values)?;
    let variances = variances
        .map(|v| Variable::from_parts(var.dims().clone(), var.unit() * var.unit(), v))
        .transpose()?;
    let mut out = redistribute(&values.view(), dim, &old, &new)?;
    if let Some(variances) = variances {
        out.set_variances(redistribute(&variances.view(), dim, &old, &new)?)?;
    }
    Ok(out)
}

fn redistribute(
    var: &VariableConstView<'_>,
    dim: Dim,
    old: &[f64],
    new: &[f64],
) -> Result<Variable> {
    let mut dims = var.dims().clone();
    dims.resize(dim, new.len() - 1)?;
    let mut out = Variable::from_dtype(var.dtype(), dims, var.unit(), false)?;
    for (j, new_bin) in new.windows(2).enumerate() {
        let mut target = out.slice_mut(Slice::range(dim, j, j + 1))?;
        for (i, old_bin) in old.windows(2).enumerate() {
            let overlap = new_bin[1].min(old_bin[1]) - new_bin[0].max(old_bin[0]);
            let width = old_bin[1] - old_bin[0];
            if overlap <= 0.0 || width <= 0.0 {
                continue;
            }
            let source = var.slice(Slice::range(dim, i, i + 1))?;
            target.add_assign(&(source * (overlap / width))?)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::Dimensions;
    use crate::ErrorKind;
    use approx::assert_relative_eq;
    use unitvar_units::Unit;

    fn x(unit: Unit, values: Vec<f64>) -> Variable {
        let dims = Dimensions::from_pairs(&[(Dim::X, values.len())]).unwrap();
        Variable::new(dims, unit, values).unwrap()
    }

    #[test]
    fn test_merge_bins() {
        let var = x(Unit::COUNTS, vec![1.0, 2.0]);
        let old = x(Unit::US, vec![1.0, 2.0, 3.0]);
        let new = x(Unit::US, vec![1.0, 3.0]);
        let out = rebin(&var, Dim::X, &old, &new).unwrap();
        assert_eq!(out.dims().volume(), 1);
        assert_eq!(out.values::<f64>().unwrap(), &[3.0]);
        assert_eq!(out.unit(), Unit::COUNTS);
    }

    #[test]
    fn test_split_bins_with_variances() {
        let dims = Dimensions::from_pairs(&[(Dim::Y, 2), (Dim::X, 1)]).unwrap();
        let var =
            Variable::with_variances(dims, Unit::COUNTS, vec![4.0, 8.0], vec![4.0, 8.0]).unwrap();
        let old = x(Unit::US, vec![0.0, 2.0]);
        let new = x(Unit::US, vec![0.0, 0.5, 2.0]);
        let out = rebin(&var, Dim::X, &old, &new).unwrap();
        assert_eq!(out.dims().shape(), &[2, 2]);
        let values = out.values::<f64>().unwrap();
        assert_relative_eq!(values[0], 1.0);
        assert_relative_eq!(values[1], 3.0);
        assert_relative_eq!(values[3], 6.0);
        assert_relative_eq!(out.variances::<f64>().unwrap()[2], 2.0);
    }

    #[test]
    fn test_rebin_errors() {
        let var = x(Unit::COUNTS, vec![1.0, 2.0]);
        let old = x(Unit::US, vec![1.0, 2.0, 3.0]);
        let unsorted = x(Unit::US, vec![3.0, 1.0]);
        assert_eq!(rebin(&var, Dim::X, &old, &unsorted).unwrap_err().kind(), ErrorKind::BinEdge);
        let short = x(Unit::US, vec![1.0, 2.0]);
        assert_eq!(rebin(&var, Dim::X, &short, &old).unwrap_err().kind(), ErrorKind::Dimension);
        let meters = x(Unit::M, vec![1.0, 2.0]);
        assert_eq!(rebin(&meters, Dim::X, &old, &old).unwrap_err().kind(), ErrorKind::UnitMismatch);
    }
}
