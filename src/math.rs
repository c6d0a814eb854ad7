//! Unit-aware elementwise math.

use std::f64::consts::PI;

use unitvar_units::Unit;

use crate::arithmetic::apply_unary;
use crate::element::{DType, FloatElement, Vector3};
use crate::transform::{transform, transform2, UnaryOp};
use crate::variable::Variable;
use crate::variable_view::{AsVariableView, VariableConstView};
use crate::{Result, VariableError};

pub fn abs(var: &impl AsVariableView) -> Result<Variable> {
    apply_unary(&var.as_variable_view(), UnaryOp::Abs)
}

/// Square root; the unit must be a perfect square.
pub fn sqrt(var: &impl AsVariableView) -> Result<Variable> {
    apply_unary(&var.as_variable_view(), UnaryOp::Sqrt)
}

pub fn reciprocal(var: &impl AsVariableView) -> Result<Variable> {
    apply_unary(&var.as_variable_view(), UnaryOp::Reciprocal)
}

/// Length of each vector.
pub fn norm(var: &impl AsVariableView) -> Result<Variable> {
    transform(&var.as_variable_view(), |v: &Vector3| v.norm())
}

/// Elementwise dot product of two vector variables, with broadcasting.
pub fn dot(a: &impl AsVariableView, b: &impl AsVariableView) -> Result<Variable> {
    let (a, b) = (a.as_variable_view(), b.as_variable_view());
    transform2(&a, &b, a.unit() * b.unit(), |x: &Vector3, y: &Vector3| x.dot(y))
}

// ============================================================================
// Trigonometry
// ============================================================================

/// Angles in radians; degrees are converted.
fn in_radians(var: VariableConstView<'_>) -> Result<Variable> {
    if var.unit() != Unit::DEG {
        return Ok(var.to_variable());
    }
    let mut converted = (var * (PI / 180.0))?;
    converted.set_unit(Unit::RAD);
    Ok(converted)
}

fn trigonometric(var: &impl AsVariableView, op: UnaryOp) -> Result<Variable> {
    let radians = in_radians(var.as_variable_view())?;
    apply_unary(&radians.view(), op)
}

pub fn sin(var: &impl AsVariableView) -> Result<Variable> {
    trigonometric(var, UnaryOp::Sin)
}

pub fn cos(var: &impl AsVariableView) -> Result<Variable> {
    trigonometric(var, UnaryOp::Cos)
}

pub fn tan(var: &impl AsVariableView) -> Result<Variable> {
    trigonometric(var, UnaryOp::Tan)
}

/// Inverse sine of dimensionless input, in radians.
pub fn asin(var: &impl AsVariableView) -> Result<Variable> {
    apply_unary(&var.as_variable_view(), UnaryOp::Asin)
}

pub fn acos(var: &impl AsVariableView) -> Result<Variable> {
    apply_unary(&var.as_variable_view(), UnaryOp::Acos)
}

pub fn atan(var: &impl AsVariableView) -> Result<Variable> {
    apply_unary(&var.as_variable_view(), UnaryOp::Atan)
}

// ============================================================================
// NaN replacement
// ============================================================================

/// Copy of `var` with NaN values replaced by the 0-d `replacement`.
/// Variances are left untouched.
pub fn nan_to_num(
    var: &impl AsVariableView,
    replacement: &impl AsVariableView,
) -> Result<Variable> {
    let (var, replacement) = (var.as_variable_view(), replacement.as_variable_view());
    var.unit().expect_equal(replacement.unit())?;
    if var.dtype() != replacement.dtype() {
        return Err(VariableError::TypeMismatch {
            expected: var.dtype(),
            actual: replacement.dtype(),
        });
    }
    let mut out = var.to_variable();
    match var.dtype() {
        DType::F64 => replace_nan(&mut out, *replacement.value::<f64>()?)?,
        DType::F32 => replace_nan(&mut out, *replacement.value::<f32>()?)?,
        dtype => {
            return Err(VariableError::UnsupportedDType {
                operation: "nan_to_num",
                dtype,
            })
        }
    }
    Ok(out)
}

fn replace_nan<F: FloatElement>(var: &mut Variable, replacement: F) -> Result<()> {
    for x in var.values_mut::<F>()?.iter_mut().filter(|x| x.is_nan()) {
        *x = replacement;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::Dim;
    use crate::dimensions::Dimensions;
    use crate::ErrorKind;
    use approx::assert_abs_diff_eq;

    fn x<T: crate::Element>(unit: Unit, values: Vec<T>) -> Variable {
        let dims = Dimensions::from_pairs(&[(Dim::X, values.len())]).unwrap();
        Variable::new(dims, unit, values).unwrap()
    }

    #[test]
    fn test_sqrt_unit() {
        let area = x(Unit::M * Unit::M, vec![4.0, 9.0]);
        let side = sqrt(&area).unwrap();
        assert_eq!(side.unit(), Unit::M);
        assert_eq!(side.values::<f64>().unwrap(), &[2.0, 3.0]);
        assert_eq!(sqrt(&x(Unit::M, vec![4.0])).unwrap_err().kind(), ErrorKind::UnitMismatch);
        assert_eq!(sqrt(&x(Unit::M * Unit::M, vec![4i64])).unwrap_err().kind(), ErrorKind::Type);
    }

    #[test]
    fn test_vectors() {
        let v = x(Unit::M, vec![Vector3::new(3.0, 4.0, 0.0), Vector3::new(0.0, 0.0, 1.0)]);
        let n = norm(&v).unwrap();
        assert_eq!(n.values::<f64>().unwrap(), &[5.0, 1.0]);
        assert_eq!(n.unit(), Unit::M);
        let d = dot(&v, &v).unwrap();
        assert_eq!(d.values::<f64>().unwrap(), &[25.0, 1.0]);
        assert_eq!(d.unit(), Unit::M * Unit::M);
    }

    #[test]
    fn test_trigonometry_units() {
        let degrees = x(Unit::DEG, vec![90.0]);
        let s = sin(&degrees).unwrap();
        assert!(s.unit().is_dimensionless());
        assert_abs_diff_eq!(s.values::<f64>().unwrap()[0], 1.0, epsilon = 1e-12);
        assert_eq!(cos(&x(Unit::M, vec![1.0])).unwrap_err().kind(), ErrorKind::UnitMismatch);

        let a = atan(&x(Unit::DIMENSIONLESS, vec![1.0])).unwrap();
        assert_eq!(a.unit(), Unit::RAD);
        assert_abs_diff_eq!(a.values::<f64>().unwrap()[0], PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_to_num() {
        let var = x(Unit::M, vec![1.0, f64::NAN]);
        let out = nan_to_num(&var, &Variable::quantity(0.5, Unit::M)).unwrap();
        assert_eq!(out.values::<f64>().unwrap(), &[1.0, 0.5]);
        assert!(nan_to_num(&var, &Variable::quantity(0.5f32, Unit::M)).is_err());
    }
}
