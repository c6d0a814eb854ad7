use unitvar::{ops, BinaryOp, Dim, Dimensions, ErrorKind, Slice, Unit, Variable};

fn make(pairs: &[(Dim, usize)], values: Vec<f64>) -> Variable {
    Variable::new(Dimensions::from_pairs(pairs).unwrap(), Unit::DIMENSIONLESS, values).unwrap()
}

fn zeros(pairs: &[(Dim, usize)]) -> Variable {
    Variable::zeros::<f64>(Dimensions::from_pairs(pairs).unwrap(), Unit::DIMENSIONLESS).unwrap()
}

fn yx() -> Variable {
    make(&[(Dim::Y, 2), (Dim::X, 2)], vec![1.0, 2.0, 3.0, 4.0])
}

#[test]
fn test_minus_equals_requires_containment() {
    let mut var = make(&[(Dim::X, 2), (Dim::Y, 2)], vec![1.0, 2.0, 3.0, 4.0]);
    let err = var
        .binary_assign_within(BinaryOp::Sub, &[], &[Slice::range(Dim::X, 0, 1)])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected {{Dim::X, 2}, {Dim::Y, 2}} to contain {{Dim::X, 1}, {Dim::Y, 2}}."
    );
    assert_eq!(var.values::<f64>().unwrap(), &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_self_overlapping_view_operation() {
    let mut var = yx();
    var.binary_assign_within(BinaryOp::Sub, &[], &[Slice::at(Dim::Y, 0)])
        .unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[0.0, 0.0, 2.0, 2.0]);
}

#[test]
fn test_minus_equals_slice_outer() {
    let mut var = yx();
    let copy = var.clone();
    var.sub_assign(&copy.slice(Slice::at(Dim::Y, 0)).unwrap()).unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[0.0, 0.0, 2.0, 2.0]);
    var.sub_assign(&copy.slice(Slice::at(Dim::Y, 1)).unwrap()).unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[-3.0, -4.0, -1.0, -2.0]);
}

#[test]
fn test_minus_equals_slice_inner() {
    let mut var = yx();
    let copy = var.clone();
    var.sub_assign(&copy.slice(Slice::at(Dim::X, 0)).unwrap()).unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[0.0, 1.0, 0.0, 1.0]);
    var.sub_assign(&copy.slice(Slice::at(Dim::X, 1)).unwrap()).unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[-2.0, -1.0, -4.0, -3.0]);
}

#[test]
fn test_minus_equals_slice_of_slice() {
    let mut var = yx();
    let copy = var.clone();
    let corner = copy
        .slice(Slice::at(Dim::X, 1))
        .unwrap()
        .slice(Slice::at(Dim::Y, 1))
        .unwrap();
    var.sub_assign(&corner).unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[-3.0, -2.0, -1.0, 0.0]);
}

#[test]
fn test_minus_equals_nontrivial_slices() {
    let source = make(
        &[(Dim::Y, 3), (Dim::X, 3)],
        vec![11.0, 12.0, 13.0, 21.0, 22.0, 23.0, 31.0, 32.0, 33.0],
    );
    let cases = [
        ((0, 2), (0, 2), [-11.0, -12.0, -21.0, -22.0]),
        ((1, 3), (0, 2), [-12.0, -13.0, -22.0, -23.0]),
        ((0, 2), (1, 3), [-21.0, -22.0, -31.0, -32.0]),
        ((1, 3), (1, 3), [-22.0, -23.0, -32.0, -33.0]),
    ];
    for ((x0, x1), (y0, y1), expected) in cases {
        let mut target = zeros(&[(Dim::Y, 2), (Dim::X, 2)]);
        let region = source
            .slice(Slice::range(Dim::X, x0, x1))
            .unwrap()
            .slice(Slice::range(Dim::Y, y0, y1))
            .unwrap();
        target.sub_assign(&region).unwrap();
        assert_eq!(target.values::<f64>().unwrap(), &expected);
    }
}

#[test]
fn test_slice_minus_equals_slice_of_same_variable() {
    let mut var = yx();
    var.binary_assign_within(BinaryOp::Sub, &[Slice::at(Dim::X, 0)], &[Slice::at(Dim::X, 1)])
        .unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[-1.0, 2.0, -1.0, 4.0]);

    let mut var = yx();
    var.binary_assign_within(BinaryOp::Sub, &[Slice::at(Dim::Y, 0)], &[Slice::at(Dim::Y, 1)])
        .unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[-2.0, -2.0, 3.0, 4.0]);
}

#[test]
fn test_nontrivial_slice_minus_equals() {
    let source = make(&[(Dim::Y, 2), (Dim::X, 2)], vec![11.0, 12.0, 21.0, 22.0]);
    let padded = make(
        &[(Dim::Y, 2), (Dim::X, 3)],
        vec![666.0, 11.0, 12.0, 666.0, 21.0, 22.0],
    );
    let padded_region = padded.slice(Slice::range(Dim::X, 1, 3)).unwrap();
    let cases = [
        ((0, 2), (0, 2), [-11.0, -12.0, 0.0, -21.0, -22.0, 0.0, 0.0, 0.0, 0.0]),
        ((1, 3), (0, 2), [0.0, -11.0, -12.0, 0.0, -21.0, -22.0, 0.0, 0.0, 0.0]),
        ((0, 2), (1, 3), [0.0, 0.0, 0.0, -11.0, -12.0, 0.0, -21.0, -22.0, 0.0]),
        ((1, 3), (1, 3), [0.0, 0.0, 0.0, 0.0, -11.0, -12.0, 0.0, -21.0, -22.0]),
    ];
    for ((x0, x1), (y0, y1), expected) in cases {
        for rhs in [source.view(), padded_region.clone()] {
            let mut target = zeros(&[(Dim::Y, 3), (Dim::X, 3)]);
            target
                .slice_mut(Slice::range(Dim::X, x0, x1))
                .unwrap()
                .slice(Slice::range(Dim::Y, y0, y1))
                .unwrap()
                .sub_assign(&rhs)
                .unwrap();
            assert_eq!(target.values::<f64>().unwrap(), &expected);
        }
    }
}

#[test]
fn test_slice_minus_lower_dimensional() {
    let mut target = zeros(&[(Dim::Y, 2), (Dim::X, 2)]);
    let source = make(&[(Dim::X, 2)], vec![1.0, 2.0]);
    assert_eq!(
        target.slice(Slice::range(Dim::Y, 1, 2)).unwrap().dims(),
        &Dimensions::from_pairs(&[(Dim::Y, 1), (Dim::X, 2)]).unwrap()
    );
    target
        .slice_mut(Slice::range(Dim::Y, 1, 2))
        .unwrap()
        .sub_assign(&source)
        .unwrap();
    assert_eq!(target.values::<f64>().unwrap(), &[0.0, 0.0, -1.0, -2.0]);
}

#[test]
fn test_slice_out_of_range() {
    let var = yx();
    let err = var.slice(Slice::at(Dim::X, 2)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Slice);
    let err = var.slice(Slice::range(Dim::X, 1, 3)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Slice);
    let err = var.slice(Slice::at(Dim::Z, 0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dimension);
}

#[test]
fn test_view_assign_and_copy_within() {
    let mut var = yx();
    let row = make(&[(Dim::X, 2)], vec![7.0, 8.0]);
    var.slice_mut(Slice::at(Dim::Y, 0)).unwrap().assign(&row).unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[7.0, 8.0, 3.0, 4.0]);

    var.copy_within(&[Slice::at(Dim::Y, 1)], &[Slice::at(Dim::Y, 0)])
        .unwrap();
    assert_eq!(var.values::<f64>().unwrap(), &[7.0, 8.0, 7.0, 8.0]);
}

#[test]
fn test_transposed_view_to_variable() {
    let var = yx();
    let transposed = var.transpose(&[]).unwrap();
    assert!(transposed.is_view());
    let owned = transposed.to_variable();
    assert_eq!(owned.dims().labels(), &[Dim::X, Dim::Y]);
    assert_eq!(owned.values::<f64>().unwrap(), &[1.0, 3.0, 2.0, 4.0]);
}

#[test]
fn test_into_slice_owns_data() {
    let var = yx();
    let row = var.into_slice(Slice::at(Dim::Y, 1)).unwrap();
    assert_eq!(row.dims(), &Dimensions::from_pairs(&[(Dim::X, 2)]).unwrap());
    assert_eq!(row.values::<f64>().unwrap(), &[3.0, 4.0]);
}

/// Concatenate `parts` in order along `dim`.
fn join(parts: Vec<Variable>, dim: Dim) -> Variable {
    let mut parts = parts.into_iter();
    let first = parts.next().unwrap();
    parts.fold(first, |acc, part| ops::concatenate(&acc, &part, dim).unwrap())
}

#[test]
fn test_single_element_slices_concatenate_to_whole() {
    let dims = Dimensions::from_pairs(&[(Dim::Z, 2), (Dim::Y, 3), (Dim::X, 2)]).unwrap();
    let values: Vec<f64> = (0..12i32).map(f64::from).collect();
    let variances: Vec<f64> = (0..12i32).map(|i| 0.5 * f64::from(i)).collect();
    let var = Variable::with_variances(dims, Unit::M, values, variances).unwrap();

    let planes = (0..2)
        .map(|z| {
            let rows = (0..3)
                .map(|y| {
                    let elements = (0..2)
                        .map(|x| {
                            let element = var
                                .slice(Slice::at(Dim::Z, z))
                                .unwrap()
                                .slice(Slice::at(Dim::Y, y))
                                .unwrap()
                                .slice(Slice::at(Dim::X, x))
                                .unwrap();
                            assert_eq!(element.dims().ndim(), 0);
                            element.to_variable()
                        })
                        .collect();
                    join(elements, Dim::X)
                })
                .collect();
            join(rows, Dim::Y)
        })
        .collect();
    let rebuilt = join(planes, Dim::Z);

    assert_eq!(rebuilt.dims(), var.dims());
    assert_eq!(rebuilt.unit(), Unit::M);
    assert!(rebuilt.has_variances());
    assert_eq!(rebuilt, var);
}
