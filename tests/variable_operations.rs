use approx::assert_relative_eq;
use unitvar::{
    math, ops, rebin, reduce, BinaryOp, Dim, Dimensions, ErrorKind, Slice, Unit, Variable,
};

fn make(pairs: &[(Dim, usize)], values: Vec<f64>) -> Variable {
    Variable::new(Dimensions::from_pairs(pairs).unwrap(), Unit::DIMENSIONLESS, values).unwrap()
}

fn make_with_unit(pairs: &[(Dim, usize)], unit: Unit, values: Vec<f64>) -> Variable {
    Variable::new(Dimensions::from_pairs(pairs).unwrap(), unit, values).unwrap()
}

#[test]
fn test_unary_minus_of_slice() {
    let a = make(&[(Dim::X, 2)], vec![1.1, 2.2]);
    let b = (-a.slice(Slice::at(Dim::X, 1)).unwrap()).unwrap();
    assert_eq!(a.values::<f64>().unwrap(), &[1.1, 2.2]);
    assert_eq!(b.values::<f64>().unwrap(), &[-2.2]);
}

#[test]
fn test_plus_equal_self() {
    let mut a = make(&[(Dim::X, 2)], vec![1.1, 2.2]);
    a.binary_assign_within(BinaryOp::Add, &[], &[]).unwrap();
    assert_eq!(a.values::<f64>().unwrap(), &[2.2, 4.4]);
}

#[test]
fn test_plus_equal_broadcasts_scalar() {
    let mut a = make(&[(Dim::X, 2)], vec![1.1, 2.2]);
    a.add_assign(&Variable::scalar(1.0)).unwrap();
    assert_relative_eq!(a.values::<f64>().unwrap()[0], 2.1);
    assert_relative_eq!(a.values::<f64>().unwrap()[1], 3.2);
}

#[test]
fn test_plus_equal_transposed_operand() {
    let mut a = make(&[(Dim::Y, 3), (Dim::X, 2)], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let transposed = make(&[(Dim::X, 2), (Dim::Y, 3)], vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    a.add_assign(&transposed).unwrap();
    assert_eq!(a.values::<f64>().unwrap(), &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
}

#[test]
fn test_plus_equal_failures() {
    let mut a = make(&[(Dim::X, 2)], vec![1.1, 2.2]);
    let other_dims = make(&[(Dim::Y, 2)], vec![1.1, 2.2]);
    let err = a.add_assign(&other_dims).unwrap_err();
    assert_eq!(err.to_string(), "Expected {{Dim::X, 2}} to contain {{Dim::Y, 2}}.");

    let mut meters = a.clone();
    meters.set_unit(Unit::M);
    let err = a.add_assign(&meters).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnitMismatch);
    assert_eq!(err.to_string(), "Expected dimensionless to be equal to m.");

    let ints = Variable::new(
        Dimensions::from_pairs(&[(Dim::X, 2)]).unwrap(),
        Unit::DIMENSIONLESS,
        vec![1i64, 2],
    )
    .unwrap();
    assert_eq!(a.add_assign(&ints).unwrap_err().kind(), ErrorKind::Type);

    let mut text = Variable::new(
        Dimensions::from_pairs(&[(Dim::X, 1)]).unwrap(),
        Unit::DIMENSIONLESS,
        vec![String::from("test")],
    )
    .unwrap();
    let err = text.binary_assign_within(BinaryOp::Add, &[], &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn test_times_and_divide_units() {
    let mut a = make_with_unit(&[(Dim::X, 2)], Unit::M, vec![2.0, 3.0]);
    a.binary_assign_within(BinaryOp::Mul, &[], &[]).unwrap();
    assert_eq!(a.values::<f64>().unwrap(), &[4.0, 9.0]);
    assert_eq!(a.unit(), Unit::M * Unit::M);

    let mut b = make(&[(Dim::X, 2)], vec![2.0, 3.0]);
    b.div_assign(&Variable::quantity(2.0, Unit::M)).unwrap();
    assert_eq!(b.values::<f64>().unwrap(), &[1.0, 1.5]);
    assert_eq!(b.unit(), Unit::DIMENSIONLESS / Unit::M);

    let mut c = make_with_unit(&[(Dim::X, 2)], Unit::M, vec![2.0, 3.0]);
    c.binary_assign_within(BinaryOp::Div, &[], &[]).unwrap();
    assert_eq!(c.values::<f64>().unwrap(), &[1.0, 1.0]);
    assert!(c.unit().is_dimensionless());
}

#[test]
fn test_times_broadcasts() {
    let a = make(&[(Dim::X, 2)], vec![0.5, 1.5]);
    let b = make(&[(Dim::Y, 2)], vec![2.0, 3.0]);
    let reference = make(&[(Dim::Y, 2), (Dim::X, 2)], vec![1.0, 3.0, 1.5, 4.5]);
    assert_eq!((&a * &b).unwrap(), reference);
}

#[test]
fn test_scalar_divided_by_variable() {
    let a = make_with_unit(&[(Dim::X, 2)], Unit::M, vec![2.0, 4.0]);
    let result = (1.111f64 / &a).unwrap();
    assert_eq!(result.values::<f64>().unwrap(), &[1.111 / 2.0, 1.111 / 4.0]);
    assert_eq!(result.unit(), Unit::DIMENSIONLESS / Unit::M);

    let single = Variable::new(
        Dimensions::from_pairs(&[(Dim::X, 2)]).unwrap(),
        Unit::M,
        vec![2.0f32, 4.0],
    )
    .unwrap();
    let result = (1.111f64 / &single).unwrap();
    assert_eq!(result.values::<f32>().unwrap(), &[1.111f32 / 2.0, 1.111f32 / 4.0]);
}

#[test]
fn test_non_in_place_scalar_operations() {
    let var = make(&[(Dim::X, 2)], vec![1.0, 2.0]);
    assert_eq!((&var + 1.0f64).unwrap().values::<f64>().unwrap(), &[2.0, 3.0]);
    assert_eq!((2.0f64 + &var).unwrap().values::<f64>().unwrap(), &[3.0, 4.0]);
    assert_eq!((&var - 1.0f64).unwrap().values::<f64>().unwrap(), &[0.0, 1.0]);
    assert_eq!((2.0f64 - &var).unwrap().values::<f64>().unwrap(), &[1.0, 0.0]);
    assert_eq!((3.0f64 * &var).unwrap().values::<f64>().unwrap(), &[3.0, 6.0]);
    assert_eq!((3.0f64 / &var).unwrap().values::<f64>().unwrap(), &[3.0, 1.5]);
}

#[test]
fn test_slice_scalar_operations() {
    let mut var = make(&[(Dim::Y, 2), (Dim::X, 3)], vec![11.0, 12.0, 13.0, 21.0, 22.0, 23.0]);
    let one = Variable::scalar(1.0);
    var.slice_mut(Slice::at(Dim::X, 0)).unwrap().add_assign(&one).unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[12.0, 12.0, 13.0, 22.0, 22.0, 23.0]);
    var.slice_mut(Slice::at(Dim::Y, 1)).unwrap().add_assign(&one).unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[12.0, 12.0, 13.0, 23.0, 23.0, 24.0]);
    var.slice_mut(Slice::range(Dim::X, 1, 3)).unwrap().add_assign(&one).unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[12.0, 13.0, 14.0, 23.0, 24.0, 25.0]);
    var.slice_mut(Slice::at(Dim::X, 2))
        .unwrap()
        .mul_assign(&Variable::scalar(0.0))
        .unwrap();
    var.slice_mut(Slice::at(Dim::Y, 0))
        .unwrap()
        .div_assign(&Variable::scalar(2.0))
        .unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[6.0, 6.5, 0.0, 23.0, 24.0, 0.0]);
}

#[test]
fn test_slice_binary_operations() {
    let v = make(&[(Dim::Y, 2), (Dim::X, 2)], vec![1.0, 2.0, 3.0, 4.0]);
    let first = v.slice(Slice::at(Dim::X, 0)).unwrap();
    let second = v.slice(Slice::at(Dim::X, 1)).unwrap();
    assert_eq!((first.clone() + second.clone()).unwrap().values::<f64>().unwrap(), &[3.0, 7.0]);
    assert_eq!((first.clone() - second.clone()).unwrap().values::<f64>().unwrap(), &[-1.0, -1.0]);
    assert_eq!((first.clone() * second.clone()).unwrap().values::<f64>().unwrap(), &[2.0, 12.0]);
    assert_eq!((first / second).unwrap().values::<f64>().unwrap(), &[0.5, 0.75]);
}

#[test]
fn test_binary_op_with_variances() {
    let dims = Dimensions::from_pairs(&[(Dim::X, 2), (Dim::Y, 3)]).unwrap();
    let var = Variable::with_variances(
        dims.clone(),
        Unit::DIMENSIONLESS,
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
    )
    .unwrap();
    let sum = Variable::with_variances(
        dims,
        Unit::DIMENSIONLESS,
        vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0],
        vec![0.2, 0.4, 0.6, 0.8, 1.0, 1.2],
    )
    .unwrap();
    let doubled = (&var + &var).unwrap();
    assert!(doubled.has_variances());
    assert_eq!(doubled, sum);

    let product = (&var * &sum).unwrap();
    assert_relative_eq!(
        product.variances::<f64>().unwrap()[0],
        0.1 * 2.0 * 2.0 + 0.2 * 1.0 * 1.0
    );
}

#[test]
fn test_divide_with_variances() {
    let dims = Dimensions::from_pairs(&[(Dim::X, 2)]).unwrap();
    let a = Variable::with_variances(dims.clone(), Unit::M, vec![2.0, 0.0], vec![0.1, 0.1])
        .unwrap();
    let b = Variable::with_variances(dims, Unit::M, vec![3.0, 3.0], vec![0.2, 0.2]).unwrap();
    let q = (&a / &b).unwrap();
    let values = q.values::<f64>().unwrap();
    let variances = q.variances::<f64>().unwrap();
    assert_relative_eq!(values[0], 2.0 / 3.0);
    assert_relative_eq!(values[1], 0.0);
    assert_relative_eq!(
        variances[0],
        (0.1 / (2.0 * 2.0) + 0.2 / (3.0 * 3.0)) * (2.0 / 3.0) * (2.0 / 3.0),
        max_relative = 1e-12
    );
    assert_relative_eq!(variances[1], 0.1 / (3.0 * 3.0));
}

// ============================================================================
// Peripheral operations
// ============================================================================

#[test]
fn test_concatenate() {
    let a = make_with_unit(&[(Dim::Tof, 1)], Unit::M, vec![1.0]);
    let b = make_with_unit(&[(Dim::Tof, 1)], Unit::M, vec![2.0]);
    let ab = ops::concatenate(&a, &b, Dim::Tof).unwrap();
    assert_eq!(ab.dims().volume(), 2);
    assert_eq!(ab.unit(), Unit::M);
    assert_eq!(ab.values::<f64>().unwrap(), &[1.0, 2.0]);

    let ba = ops::concatenate(&b, &a, Dim::Tof).unwrap();
    let abba = ops::concatenate(&ab, &ba, Dim::Q).unwrap();
    assert_eq!(abba.dims().ndim(), 2);
    assert_eq!(abba.values::<f64>().unwrap(), &[1.0, 2.0, 2.0, 1.0]);

    let ababbaba = ops::concatenate(&abba, &abba, Dim::Tof).unwrap();
    assert_eq!(
        ababbaba.values::<f64>().unwrap(),
        &[1.0, 2.0, 1.0, 2.0, 2.0, 1.0, 2.0, 1.0]
    );
    let abbaabba = ops::concatenate(&abba, &abba, Dim::Q).unwrap();
    assert_eq!(
        abbaabba.values::<f64>().unwrap(),
        &[1.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0, 1.0]
    );
}

#[test]
fn test_concatenate_volume_with_slice() {
    let a = make(&[(Dim::X, 1)], vec![1.0]);
    let aa = ops::concatenate(&a, &a, Dim::X).unwrap();
    assert!(ops::concatenate(&aa, &a, Dim::X).is_ok());
    assert!(ops::concatenate(&a, &aa, Dim::X).is_ok());
}

#[test]
fn test_concatenate_failures() {
    let a = make(&[(Dim::Tof, 1)], vec![1.0]);
    let c = Variable::new(
        Dimensions::from_pairs(&[(Dim::Tof, 1)]).unwrap(),
        Unit::DIMENSIONLESS,
        vec![2.0f32],
    )
    .unwrap();
    let err = ops::concatenate(&a, &c, Dim::Tof).unwrap_err();
    assert_eq!(err.to_string(), "Cannot concatenate Variables: Data types do not match.");

    let aa = ops::concatenate(&a, &a, Dim::Tof).unwrap();
    let err = ops::concatenate(&a, &aa, Dim::Q).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dimension);
    assert_eq!(
        err.to_string(),
        "Cannot concatenate Variables: Dimension extents do not match."
    );

    let mut meters = a.clone();
    meters.set_unit(Unit::M);
    assert_eq!(
        ops::concatenate(&meters, &a, Dim::Tof).unwrap_err().kind(),
        ErrorKind::UnitMismatch
    );
}

#[test]
fn test_rebin() {
    let var = make_with_unit(&[(Dim::X, 2)], Unit::COUNTS, vec![1.0, 2.0]);
    let old_edges = make(&[(Dim::X, 3)], vec![1.0, 2.0, 3.0]);
    let new_edges = make(&[(Dim::X, 2)], vec![1.0, 3.0]);
    let rebinned = rebin::rebin(&var, Dim::X, &old_edges, &new_edges).unwrap();
    assert_eq!(rebinned.dims().ndim(), 1);
    assert_eq!(rebinned.dims().volume(), 1);
    assert_eq!(rebinned.values::<f64>().unwrap(), &[3.0]);
}

#[test]
fn test_sum_and_mean() {
    let var = make(&[(Dim::Y, 2), (Dim::X, 2)], vec![1.0, 2.0, 3.0, 4.0]);
    let sum_x = reduce::sum(&var, Dim::X).unwrap();
    assert_eq!(sum_x.dims(), &Dimensions::from_pairs(&[(Dim::Y, 2)]).unwrap());
    assert_eq!(sum_x.values::<f64>().unwrap(), &[3.0, 7.0]);
    let sum_y = reduce::sum(&var, Dim::Y).unwrap();
    assert_eq!(sum_y.values::<f64>().unwrap(), &[4.0, 6.0]);

    assert_eq!(reduce::mean(&var, Dim::X).unwrap().values::<f64>().unwrap(), &[1.5, 3.5]);
    assert_eq!(reduce::mean(&var, Dim::Y).unwrap().values::<f64>().unwrap(), &[2.0, 3.0]);
}

#[test]
fn test_abs_norm_sqrt() {
    let var = make(&[(Dim::Y, 2), (Dim::X, 2)], vec![1.0, -2.0, -3.0, 4.0]);
    let reference = make(&[(Dim::Y, 2), (Dim::X, 2)], vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(math::abs(&var).unwrap(), reference);

    let area = make_with_unit(&[(Dim::X, 1)], Unit::M * Unit::M, vec![1.23]);
    let side = math::sqrt(&area).unwrap();
    assert_eq!(side.unit(), Unit::M);
    assert_relative_eq!(side.values::<f64>().unwrap()[0], 1.23f64.sqrt());
}

#[test]
fn test_reverse() {
    let var = make(&[(Dim::Y, 2), (Dim::X, 3)], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let reverse_x = make(&[(Dim::Y, 2), (Dim::X, 3)], vec![3.0, 2.0, 1.0, 6.0, 5.0, 4.0]);
    let reverse_y = make(&[(Dim::Y, 2), (Dim::X, 3)], vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
    assert_eq!(ops::reverse(&var, Dim::X).unwrap(), reverse_x);
    assert_eq!(ops::reverse(&var, Dim::Y).unwrap(), reverse_y);
}
