//! Element types a [`Variable`](crate::Variable) can hold.
//!
//! The set of element types is closed: every type implementing the sealed
//! [`Element`] trait has a matching [`DType`] tag and a matching
//! [`VariableConcept`] variant. Each element type declares which built-in
//! operations it supports by handing out kernels for them; a missing kernel
//! is reported as a type error before any element is touched.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_traits::{Float, NumCast, One, Zero};

use crate::concept::VariableConcept;
use crate::storage::ElementArray;
use crate::transform::{BinaryOp, UnaryOp};

// ============================================================================
// DType
// ============================================================================

/// Runtime tag of an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F64,
    F32,
    I64,
    I32,
    Bool,
    Vector3,
    String,
    SparseF64,
    SparseF32,
    SparseI64,
    SparseI32,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::F64 => "double",
            DType::F32 => "float",
            DType::I64 => "int64",
            DType::I32 => "int32",
            DType::Bool => "bool",
            DType::Vector3 => "vector_3_double",
            DType::String => "string",
            DType::SparseF64 => "sparse_double",
            DType::SparseF32 => "sparse_float",
            DType::SparseI64 => "sparse_int64",
            DType::SparseI32 => "sparse_int32",
        }
    }

    /// True for event-list element types.
    pub fn is_sparse(self) -> bool {
        self.event_dtype().is_some()
    }

    /// Element type of the lists of a sparse dtype.
    pub fn event_dtype(self) -> Option<DType> {
        match self {
            DType::SparseF64 => Some(DType::F64),
            DType::SparseF32 => Some(DType::F32),
            DType::SparseI64 => Some(DType::I64),
            DType::SparseI32 => Some(DType::I32),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DType::F64 | DType::F32 | DType::I64 | DType::I32)
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::F64 | DType::F32)
    }

    /// Numeric types and their event lists may carry variances.
    pub fn can_have_variances(self) -> bool {
        self.is_numeric() || self.is_sparse()
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Vector3
// ============================================================================

/// A 3-vector of `f64`, e.g. a position. Zero-initialized by default.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3(pub [f64; 3]);

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3([x, y, z])
    }

    pub fn x(&self) -> f64 {
        self.0[0]
    }

    pub fn y(&self) -> f64 {
        self.0[1]
    }

    pub fn z(&self) -> f64 {
        self.0[2]
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3([self.0[0] + rhs.0[0], self.0[1] + rhs.0[1], self.0[2] + rhs.0[2]])
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3([self.0[0] - rhs.0[0], self.0[1] - rhs.0[1], self.0[2] - rhs.0[2]])
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        Vector3([-self.0[0], -self.0[1], -self.0[2]])
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f64) -> Vector3 {
        Vector3([self.0[0] * rhs, self.0[1] * rhs, self.0[2] * rhs])
    }
}

// ============================================================================
// Element trait
// ============================================================================

/// Elementwise kernel of a binary operation.
pub type BinaryKernel<T> = fn(&T, &T) -> T;
/// Variance of a binary operation from `(a, var_a, b, var_b)`.
pub type BinaryVarianceKernel<T> = fn(&T, &T, &T, &T) -> T;
/// Elementwise kernel of a unary operation.
pub type UnaryKernel<T> = fn(&T) -> T;
/// Variance of a unary operation from `(x, var_x)`.
pub type UnaryVarianceKernel<T> = fn(&T, &T) -> T;

mod private {
    pub trait Sealed {}
}

/// Sealed trait implemented by every supported element type.
///
/// Kernel getters return `None` when the type does not support an operation.
pub trait Element:
    private::Sealed + Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static
{
    const DTYPE: DType;

    /// Wrap typed storage into the type-erased concept.
    fn wrap(array: ElementArray<Self>) -> VariableConcept;

    /// Typed storage if `concept` holds this element type.
    fn array(concept: &VariableConcept) -> Option<&ElementArray<Self>>;

    /// Mutable typed storage if `concept` holds this element type.
    fn array_mut(concept: &mut VariableConcept) -> Option<&mut ElementArray<Self>>;

    fn binary_kernel(_op: BinaryOp) -> Option<BinaryKernel<Self>> {
        None
    }

    fn binary_variance_kernel(_op: BinaryOp) -> Option<BinaryVarianceKernel<Self>> {
        None
    }

    fn unary_kernel(_op: UnaryOp) -> Option<UnaryKernel<Self>> {
        None
    }

    fn unary_variance_kernel(_op: UnaryOp) -> Option<UnaryVarianceKernel<Self>> {
        None
    }

    /// Whether `a` and `b` may be combined elementwise. Event lists must
    /// have equal lengths.
    fn compatible(_a: &Self, _b: &Self) -> bool {
        true
    }
}

/// Scalar numeric element types: `f64`, `f32`, `i64`, `i32`.
///
/// Integer arithmetic wraps on overflow and division by zero yields zero.
pub trait Numeric: Element + Copy + PartialOrd + NumCast + Zero + One {
    fn plus(self, rhs: Self) -> Self;
    fn minus(self, rhs: Self) -> Self;
    fn times(self, rhs: Self) -> Self;
    fn divide(self, rhs: Self) -> Self;
    fn negate(self) -> Self;
    fn magnitude(self) -> Self;
}

/// Floating-point element types.
pub trait FloatElement: Numeric + Float {}

impl FloatElement for f64 {}
impl FloatElement for f32 {}

macro_rules! impl_float_numeric {
    ($t:ty) => {
        impl Numeric for $t {
            fn plus(self, rhs: Self) -> Self {
                self + rhs
            }
            fn minus(self, rhs: Self) -> Self {
                self - rhs
            }
            fn times(self, rhs: Self) -> Self {
                self * rhs
            }
            fn divide(self, rhs: Self) -> Self {
                self / rhs
            }
            fn negate(self) -> Self {
                -self
            }
            fn magnitude(self) -> Self {
                self.abs()
            }
        }
    };
}

macro_rules! impl_int_numeric {
    ($t:ty) => {
        impl Numeric for $t {
            fn plus(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            fn minus(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            fn times(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
            fn divide(self, rhs: Self) -> Self {
                self.checked_div(rhs).unwrap_or(0)
            }
            fn negate(self) -> Self {
                self.wrapping_neg()
            }
            fn magnitude(self) -> Self {
                self.wrapping_abs()
            }
        }
    };
}

impl_float_numeric!(f64);
impl_float_numeric!(f32);
impl_int_numeric!(i64);
impl_int_numeric!(i32);

// ============================================================================
// Numeric kernels
// ============================================================================

fn add_values<N: Numeric>(a: &N, b: &N) -> N {
    a.plus(*b)
}

fn sub_values<N: Numeric>(a: &N, b: &N) -> N {
    a.minus(*b)
}

fn mul_values<N: Numeric>(a: &N, b: &N) -> N {
    a.times(*b)
}

fn div_values<N: Numeric>(a: &N, b: &N) -> N {
    a.divide(*b)
}

fn sum_variances<N: Numeric>(_a: &N, va: &N, _b: &N, vb: &N) -> N {
    va.plus(*vb)
}

fn product_variance<N: Numeric>(a: &N, va: &N, b: &N, vb: &N) -> N {
    va.times(b.times(*b)).plus(vb.times(a.times(*a)))
}

/// `var_a / b^2 + var_b * a^2 / b^4`, finite for `a == 0`.
fn quotient_variance<N: Numeric>(a: &N, va: &N, b: &N, vb: &N) -> N {
    let ratio = a.divide(*b);
    va.plus(vb.times(ratio.times(ratio))).divide(b.times(*b))
}

fn negate_value<N: Numeric>(x: &N) -> N {
    x.negate()
}

fn magnitude_value<N: Numeric>(x: &N) -> N {
    x.magnitude()
}

fn keep_variance<T: Clone>(_x: &T, v: &T) -> T {
    v.clone()
}

fn sqrt_value<F: FloatElement>(x: &F) -> F {
    x.sqrt()
}

fn sqrt_variance<F: FloatElement>(x: &F, v: &F) -> F {
    let four = F::one() + F::one() + F::one() + F::one();
    *v / (four * *x)
}

fn reciprocal_value<F: FloatElement>(x: &F) -> F {
    F::one() / *x
}

fn reciprocal_variance<F: FloatElement>(x: &F, v: &F) -> F {
    let x2 = *x * *x;
    *v / (x2 * x2)
}

fn sin_value<F: FloatElement>(x: &F) -> F {
    x.sin()
}

fn cos_value<F: FloatElement>(x: &F) -> F {
    x.cos()
}

fn tan_value<F: FloatElement>(x: &F) -> F {
    x.tan()
}

fn asin_value<F: FloatElement>(x: &F) -> F {
    x.asin()
}

fn acos_value<F: FloatElement>(x: &F) -> F {
    x.acos()
}

fn atan_value<F: FloatElement>(x: &F) -> F {
    x.atan()
}

fn numeric_binary_kernel<N: Numeric>(op: BinaryOp) -> Option<BinaryKernel<N>> {
    match op {
        BinaryOp::Add => Some(add_values::<N>),
        BinaryOp::Sub => Some(sub_values::<N>),
        BinaryOp::Mul => Some(mul_values::<N>),
        BinaryOp::Div => Some(div_values::<N>),
        BinaryOp::Or | BinaryOp::And | BinaryOp::Xor => None,
    }
}

fn numeric_binary_variance_kernel<N: Numeric>(op: BinaryOp) -> Option<BinaryVarianceKernel<N>> {
    match op {
        BinaryOp::Add | BinaryOp::Sub => Some(sum_variances::<N>),
        BinaryOp::Mul => Some(product_variance::<N>),
        BinaryOp::Div => Some(quotient_variance::<N>),
        BinaryOp::Or | BinaryOp::And | BinaryOp::Xor => None,
    }
}

fn int_unary_kernel<N: Numeric>(op: UnaryOp) -> Option<UnaryKernel<N>> {
    match op {
        UnaryOp::Neg => Some(negate_value::<N>),
        UnaryOp::Abs => Some(magnitude_value::<N>),
        _ => None,
    }
}

fn int_unary_variance_kernel<N: Numeric>(op: UnaryOp) -> Option<UnaryVarianceKernel<N>> {
    match op {
        UnaryOp::Neg | UnaryOp::Abs => Some(keep_variance::<N>),
        _ => None,
    }
}

fn float_unary_kernel<F: FloatElement>(op: UnaryOp) -> Option<UnaryKernel<F>> {
    match op {
        UnaryOp::Neg => Some(negate_value::<F>),
        UnaryOp::Abs => Some(magnitude_value::<F>),
        UnaryOp::Sqrt => Some(sqrt_value::<F>),
        UnaryOp::Reciprocal => Some(reciprocal_value::<F>),
        UnaryOp::Sin => Some(sin_value::<F>),
        UnaryOp::Cos => Some(cos_value::<F>),
        UnaryOp::Tan => Some(tan_value::<F>),
        UnaryOp::Asin => Some(asin_value::<F>),
        UnaryOp::Acos => Some(acos_value::<F>),
        UnaryOp::Atan => Some(atan_value::<F>),
        UnaryOp::Not => None,
    }
}

fn float_unary_variance_kernel<F: FloatElement>(op: UnaryOp) -> Option<UnaryVarianceKernel<F>> {
    match op {
        UnaryOp::Neg | UnaryOp::Abs => Some(keep_variance::<F>),
        UnaryOp::Sqrt => Some(sqrt_variance::<F>),
        UnaryOp::Reciprocal => Some(reciprocal_variance::<F>),
        _ => None,
    }
}

// ============================================================================
// Event-list kernels
// ============================================================================

fn zip_events<N: Numeric>(a: &[N], b: &[N], f: BinaryKernel<N>) -> Vec<N> {
    a.iter().zip(b.iter()).map(|(x, y)| f(x, y)).collect()
}

/// Missing variances of either operand count as zero.
fn zip_event_variances<N: Numeric>(
    a: &[N],
    va: &[N],
    b: &[N],
    vb: &[N],
    f: BinaryVarianceKernel<N>,
) -> Vec<N> {
    let zero = N::zero();
    a.iter()
        .zip(b.iter())
        .enumerate()
        .map(|(i, (x, y))| f(x, va.get(i).unwrap_or(&zero), y, vb.get(i).unwrap_or(&zero)))
        .collect()
}

macro_rules! event_kernels {
    ($($value:ident, $variance:ident => $scalar_value:ident, $scalar_variance:ident;)*) => {
        $(
            #[allow(clippy::ptr_arg)]
            fn $value<N: Numeric>(a: &Vec<N>, b: &Vec<N>) -> Vec<N> {
                zip_events(a, b, $scalar_value::<N>)
            }

            #[allow(clippy::ptr_arg)]
            fn $variance<N: Numeric>(a: &Vec<N>, va: &Vec<N>, b: &Vec<N>, vb: &Vec<N>) -> Vec<N> {
                zip_event_variances(a, va, b, vb, $scalar_variance::<N>)
            }
        )*
    };
}

event_kernels! {
    events_add, events_add_variance => add_values, sum_variances;
    events_sub, events_sub_variance => sub_values, sum_variances;
    events_mul, events_mul_variance => mul_values, product_variance;
    events_div, events_div_variance => div_values, quotient_variance;
}

#[allow(clippy::ptr_arg)]
fn events_negate<N: Numeric>(x: &Vec<N>) -> Vec<N> {
    x.iter().map(|v| v.negate()).collect()
}

#[allow(clippy::ptr_arg)]
fn events_magnitude<N: Numeric>(x: &Vec<N>) -> Vec<N> {
    x.iter().map(|v| v.magnitude()).collect()
}

fn events_binary_kernel<N: Numeric>(op: BinaryOp) -> Option<BinaryKernel<Vec<N>>> {
    match op {
        BinaryOp::Add => Some(events_add::<N>),
        BinaryOp::Sub => Some(events_sub::<N>),
        BinaryOp::Mul => Some(events_mul::<N>),
        BinaryOp::Div => Some(events_div::<N>),
        BinaryOp::Or | BinaryOp::And | BinaryOp::Xor => None,
    }
}

fn events_binary_variance_kernel<N: Numeric>(
    op: BinaryOp,
) -> Option<BinaryVarianceKernel<Vec<N>>> {
    match op {
        BinaryOp::Add => Some(events_add_variance::<N>),
        BinaryOp::Sub => Some(events_sub_variance::<N>),
        BinaryOp::Mul => Some(events_mul_variance::<N>),
        BinaryOp::Div => Some(events_div_variance::<N>),
        BinaryOp::Or | BinaryOp::And | BinaryOp::Xor => None,
    }
}

fn events_unary_kernel<N: Numeric>(op: UnaryOp) -> Option<UnaryKernel<Vec<N>>> {
    match op {
        UnaryOp::Neg => Some(events_negate::<N>),
        UnaryOp::Abs => Some(events_magnitude::<N>),
        _ => None,
    }
}

fn events_unary_variance_kernel<N: Numeric>(op: UnaryOp) -> Option<UnaryVarianceKernel<Vec<N>>> {
    match op {
        UnaryOp::Neg | UnaryOp::Abs => Some(keep_variance::<Vec<N>>),
        _ => None,
    }
}

// ============================================================================
// Element implementations
// ============================================================================

macro_rules! impl_storage_access {
    ($variant:ident) => {
        const DTYPE: DType = DType::$variant;

        fn wrap(array: ElementArray<Self>) -> VariableConcept {
            VariableConcept::$variant(array)
        }

        fn array(concept: &VariableConcept) -> Option<&ElementArray<Self>> {
            match concept {
                VariableConcept::$variant(array) => Some(array),
                _ => None,
            }
        }

        fn array_mut(concept: &mut VariableConcept) -> Option<&mut ElementArray<Self>> {
            match concept {
                VariableConcept::$variant(array) => Some(array),
                _ => None,
            }
        }
    };
}

macro_rules! impl_scalar_element {
    ($t:ty, $variant:ident, $unary:ident, $unary_variance:ident) => {
        impl private::Sealed for $t {}

        impl Element for $t {
            impl_storage_access!($variant);

            fn binary_kernel(op: BinaryOp) -> Option<BinaryKernel<Self>> {
                numeric_binary_kernel::<Self>(op)
            }

            fn binary_variance_kernel(op: BinaryOp) -> Option<BinaryVarianceKernel<Self>> {
                numeric_binary_variance_kernel::<Self>(op)
            }

            fn unary_kernel(op: UnaryOp) -> Option<UnaryKernel<Self>> {
                $unary::<Self>(op)
            }

            fn unary_variance_kernel(op: UnaryOp) -> Option<UnaryVarianceKernel<Self>> {
                $unary_variance::<Self>(op)
            }
        }
    };
}

impl_scalar_element!(f64, F64, float_unary_kernel, float_unary_variance_kernel);
impl_scalar_element!(f32, F32, float_unary_kernel, float_unary_variance_kernel);
impl_scalar_element!(i64, I64, int_unary_kernel, int_unary_variance_kernel);
impl_scalar_element!(i32, I32, int_unary_kernel, int_unary_variance_kernel);

macro_rules! impl_event_element {
    ($t:ty, $variant:ident) => {
        impl private::Sealed for Vec<$t> {}

        impl Element for Vec<$t> {
            impl_storage_access!($variant);

            fn binary_kernel(op: BinaryOp) -> Option<BinaryKernel<Self>> {
                events_binary_kernel::<$t>(op)
            }

            fn binary_variance_kernel(op: BinaryOp) -> Option<BinaryVarianceKernel<Self>> {
                events_binary_variance_kernel::<$t>(op)
            }

            fn unary_kernel(op: UnaryOp) -> Option<UnaryKernel<Self>> {
                events_unary_kernel::<$t>(op)
            }

            fn unary_variance_kernel(op: UnaryOp) -> Option<UnaryVarianceKernel<Self>> {
                events_unary_variance_kernel::<$t>(op)
            }

            fn compatible(a: &Self, b: &Self) -> bool {
                a.len() == b.len()
            }
        }
    };
}

impl_event_element!(f64, SparseF64);
impl_event_element!(f32, SparseF32);
impl_event_element!(i64, SparseI64);
impl_event_element!(i32, SparseI32);

impl private::Sealed for bool {}

impl Element for bool {
    impl_storage_access!(Bool);

    fn binary_kernel(op: BinaryOp) -> Option<BinaryKernel<Self>> {
        match op {
            BinaryOp::Or => Some(|a, b| *a || *b),
            BinaryOp::And => Some(|a, b| *a && *b),
            BinaryOp::Xor => Some(|a, b| *a ^ *b),
            _ => None,
        }
    }

    fn unary_kernel(op: UnaryOp) -> Option<UnaryKernel<Self>> {
        match op {
            UnaryOp::Not => Some(|x| !*x),
            _ => None,
        }
    }
}

impl private::Sealed for Vector3 {}

impl Element for Vector3 {
    impl_storage_access!(Vector3);

    fn binary_kernel(op: BinaryOp) -> Option<BinaryKernel<Self>> {
        match op {
            BinaryOp::Add => Some(|a, b| *a + *b),
            BinaryOp::Sub => Some(|a, b| *a - *b),
            _ => None,
        }
    }

    fn unary_kernel(op: UnaryOp) -> Option<UnaryKernel<Self>> {
        match op {
            UnaryOp::Neg => Some(|x| -*x),
            _ => None,
        }
    }
}

impl private::Sealed for String {}

impl Element for String {
    impl_storage_access!(String);
}
