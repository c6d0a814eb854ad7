//! Type-erased element storage and views into it.
//!
//! [`VariableConcept`] is a closed sum over the typed [`ElementArray`]s of
//! every supported element type; it owns the data of a
//! [`Variable`](crate::Variable). [`ViewModel`] and [`ViewModelMut`] pair a
//! borrowed concept with a [`ViewLayout`] selecting a strided sub-region.
//!
//! Runtime dispatch to typed code goes through the [`dispatch`] and
//! [`dispatch_pair`] macros, which expand to exhaustive matches.

use crate::dim::Dim;
use crate::dimensions::Dimensions;
use crate::element::{DType, Element, Vector3};
use crate::kernel::{ensure_same_shape, Offsets};
use crate::slice::Slice;
use crate::storage::ElementArray;
use crate::view::{ElementArrayView, ElementArrayViewMut, ViewLayout};
use crate::{Result, VariableError};

// ============================================================================
// VariableConcept
// ============================================================================

/// Owned, type-erased element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableConcept {
    F64(ElementArray<f64>),
    F32(ElementArray<f32>),
    I64(ElementArray<i64>),
    I32(ElementArray<i32>),
    Bool(ElementArray<bool>),
    Vector3(ElementArray<Vector3>),
    String(ElementArray<String>),
    SparseF64(ElementArray<Vec<f64>>),
    SparseF32(ElementArray<Vec<f32>>),
    SparseI64(ElementArray<Vec<i64>>),
    SparseI32(ElementArray<Vec<i32>>),
}

/// Run `$body` with `$array` bound to the typed storage of `$concept`.
macro_rules! dispatch {
    ($concept:expr, $array:ident => $body:expr) => {
        match $concept {
            $crate::concept::VariableConcept::F64($array) => $body,
            $crate::concept::VariableConcept::F32($array) => $body,
            $crate::concept::VariableConcept::I64($array) => $body,
            $crate::concept::VariableConcept::I32($array) => $body,
            $crate::concept::VariableConcept::Bool($array) => $body,
            $crate::concept::VariableConcept::Vector3($array) => $body,
            $crate::concept::VariableConcept::String($array) => $body,
            $crate::concept::VariableConcept::SparseF64($array) => $body,
            $crate::concept::VariableConcept::SparseF32($array) => $body,
            $crate::concept::VariableConcept::SparseI64($array) => $body,
            $crate::concept::VariableConcept::SparseI32($array) => $body,
        }
    };
}

/// Run `$body` with both operands bound to typed storage of the same element
/// type, or `$otherwise` if their element types differ.
macro_rules! dispatch_pair {
    ($a:expr, $b:expr, ($x:ident, $y:ident) => $body:expr, _ => $otherwise:expr) => {{
        use $crate::concept::VariableConcept as C;
        match ($a, $b) {
            (C::F64($x), C::F64($y)) => $body,
            (C::F32($x), C::F32($y)) => $body,
            (C::I64($x), C::I64($y)) => $body,
            (C::I32($x), C::I32($y)) => $body,
            (C::Bool($x), C::Bool($y)) => $body,
            (C::Vector3($x), C::Vector3($y)) => $body,
            (C::String($x), C::String($y)) => $body,
            (C::SparseF64($x), C::SparseF64($y)) => $body,
            (C::SparseF32($x), C::SparseF32($y)) => $body,
            (C::SparseI64($x), C::SparseI64($y)) => $body,
            (C::SparseI32($x), C::SparseI32($y)) => $body,
            _ => $otherwise,
        }
    }};
}

pub(crate) use {dispatch, dispatch_pair};

fn dtype_of<T: Element>(_: &ElementArray<T>) -> DType {
    T::DTYPE
}

impl<T: Element> From<ElementArray<T>> for VariableConcept {
    fn from(array: ElementArray<T>) -> Self {
        T::wrap(array)
    }
}

fn zeros_of<T: Element>(len: usize, variances: bool) -> VariableConcept {
    if variances {
        T::wrap(ElementArray::zeros_with_variances(len))
    } else {
        T::wrap(ElementArray::zeros(len))
    }
}

fn split_parts<T: Element>(array: ElementArray<T>) -> (VariableConcept, Option<VariableConcept>) {
    let (values, variances) = array.into_parts();
    (
        T::wrap(ElementArray::from_values(values)),
        variances.map(|v| T::wrap(ElementArray::from_values(v))),
    )
}

pub(crate) fn type_mismatch(expected: DType, actual: DType) -> VariableError {
    VariableError::TypeMismatch { expected, actual }
}

impl VariableConcept {
    /// Default-initialized storage of `len` elements of `dtype`.
    pub fn zeros(dtype: DType, len: usize, variances: bool) -> Result<Self> {
        if variances && !dtype.can_have_variances() {
            return Err(VariableError::Variances(format!(
                "Variances are not supported for dtype {dtype}."
            )));
        }
        Ok(match dtype {
            DType::F64 => zeros_of::<f64>(len, variances),
            DType::F32 => zeros_of::<f32>(len, variances),
            DType::I64 => zeros_of::<i64>(len, variances),
            DType::I32 => zeros_of::<i32>(len, variances),
            DType::Bool => zeros_of::<bool>(len, variances),
            DType::Vector3 => zeros_of::<Vector3>(len, variances),
            DType::String => zeros_of::<String>(len, variances),
            DType::SparseF64 => zeros_of::<Vec<f64>>(len, variances),
            DType::SparseF32 => zeros_of::<Vec<f32>>(len, variances),
            DType::SparseI64 => zeros_of::<Vec<i64>>(len, variances),
            DType::SparseI32 => zeros_of::<Vec<i32>>(len, variances),
        })
    }

    pub fn dtype(&self) -> DType {
        dispatch!(self, array => dtype_of(array))
    }

    pub fn len(&self) -> usize {
        dispatch!(self, array => array.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_variances(&self) -> bool {
        dispatch!(self, array => array.has_variances())
    }

    pub fn clear_variances(&mut self) {
        dispatch!(self, array => array.clear_variances())
    }

    /// Attach default-initialized variances unless present.
    pub fn ensure_variances(&mut self) -> Result<()> {
        dispatch!(self, array => array.ensure_variances())
    }

    /// Use the values of `variances` as variances of `self`.
    pub fn set_variances(&mut self, variances: VariableConcept) -> Result<()> {
        let (expected, actual) = (self.dtype(), variances.dtype());
        dispatch_pair!(self, variances, (values, var) => {
            let (var, _) = var.into_parts();
            values.set_variances(var)
        }, _ => Err(VariableError::Variances(format!(
            "Expected variances of dtype {expected}, got {actual}."
        ))))
    }

    /// Separate into values and, if present, variances as values.
    pub fn split_variances(self) -> (VariableConcept, Option<VariableConcept>) {
        dispatch!(self, array => split_parts(array))
    }

    /// Contiguous owned copy of the elements selected by `layout`.
    pub fn gather(&self, layout: &ViewLayout) -> VariableConcept {
        dispatch!(self, array => array.gather(layout).into())
    }

    /// Elementwise copy from `src` into the region selected by `dst_layout`.
    ///
    /// `src_layout` must already have the shape of `dst_layout`.
    pub(crate) fn copy_from(
        &mut self,
        dst_layout: &ViewLayout,
        src: &VariableConcept,
        src_layout: &ViewLayout,
    ) -> Result<()> {
        ensure_same_shape(dst_layout.dims(), src_layout.dims())?;
        if self.has_variances() != src.has_variances() {
            return Err(VariableError::Variances(
                "Cannot copy: either both or neither operand must have variances.".into(),
            ));
        }
        let (expected, actual) = (self.dtype(), src.dtype());
        dispatch_pair!(self, src, (dst, src) => {
            dst.copy_from(dst_layout, src, src_layout);
            Ok(())
        }, _ => Err(type_mismatch(expected, actual)))
    }

    /// Elementwise equality of the regions selected by the two layouts,
    /// including variances.
    pub(crate) fn equals(
        &self,
        layout: &ViewLayout,
        other: &VariableConcept,
        other_layout: &ViewLayout,
    ) -> bool {
        if layout.dims() != other_layout.dims() {
            return false;
        }
        dispatch_pair!(self, other, (a, b) => {
            region_equal(a.values(), layout, b.values(), other_layout)
                && match (a.variances(), b.variances()) {
                    (Some(va), Some(vb)) => region_equal(va, layout, vb, other_layout),
                    (None, None) => true,
                    _ => false,
                }
        }, _ => false)
    }
}

fn region_equal<T: PartialEq>(a: &[T], al: &ViewLayout, b: &[T], bl: &ViewLayout) -> bool {
    Offsets::new(al)
        .zip(Offsets::new(bl))
        .all(|(i, j)| a[i] == b[j])
}

fn typed<T: Element>(concept: &VariableConcept) -> Result<&ElementArray<T>> {
    T::array(concept).ok_or_else(|| type_mismatch(T::DTYPE, concept.dtype()))
}

fn typed_mut<T: Element>(concept: &mut VariableConcept) -> Result<&mut ElementArray<T>> {
    let actual = concept.dtype();
    T::array_mut(concept).ok_or_else(|| type_mismatch(T::DTYPE, actual))
}

fn no_variances() -> VariableError {
    VariableError::Variances("Variable has no variances.".into())
}

// ============================================================================
// ViewModel
// ============================================================================

/// Read-only strided view of a [`VariableConcept`].
#[derive(Debug, Clone)]
pub struct ViewModel<'a> {
    concept: &'a VariableConcept,
    layout: ViewLayout,
}

impl<'a> ViewModel<'a> {
    pub fn new(concept: &'a VariableConcept, layout: ViewLayout) -> Self {
        ViewModel { concept, layout }
    }

    pub fn concept(&self) -> &'a VariableConcept {
        self.concept
    }

    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    pub fn dims(&self) -> &Dimensions {
        self.layout.dims()
    }

    pub fn dtype(&self) -> DType {
        self.concept.dtype()
    }

    pub fn has_variances(&self) -> bool {
        self.concept.has_variances()
    }

    /// False only if the view covers the whole buffer in storage order.
    pub fn is_view(&self) -> bool {
        !(self.layout.offset() == 0
            && self.layout.is_contiguous()
            && self.layout.volume() == self.concept.len())
    }

    pub fn make_view(&self, slice: &Slice) -> Result<ViewModel<'a>> {
        Ok(ViewModel::new(self.concept, self.layout.slice(slice)?))
    }

    /// Succeeds only for contiguous views.
    pub fn reshape(&self, dims: &Dimensions) -> Result<ViewModel<'a>> {
        Ok(ViewModel::new(self.concept, self.layout.reshape(dims)?))
    }

    pub fn transpose(&self, order: &[Dim]) -> Result<ViewModel<'a>> {
        Ok(ViewModel::new(self.concept, self.layout.transpose(order)?))
    }

    pub fn reverse(&self, dim: Dim) -> Result<ViewModel<'a>> {
        Ok(ViewModel::new(self.concept, self.layout.reverse(dim)?))
    }

    pub fn broadcast(&self, target: &Dimensions) -> Result<ViewModel<'a>> {
        Ok(ViewModel::new(self.concept, self.layout.broadcast(target)?))
    }

    /// Independent owned copy in row-major order of the view's dimensions.
    pub fn clone_data(&self) -> VariableConcept {
        self.concept.gather(&self.layout)
    }

    pub fn values<T: Element>(&self) -> Result<ElementArrayView<'a, T>> {
        ElementArrayView::new(typed::<T>(self.concept)?.values(), self.layout.clone())
    }

    pub fn variances<T: Element>(&self) -> Result<ElementArrayView<'a, T>> {
        let variances = typed::<T>(self.concept)?.variances().ok_or_else(no_variances)?;
        ElementArrayView::new(variances, self.layout.clone())
    }
}

// ============================================================================
// ViewModelMut
// ============================================================================

/// Mutable strided view of a [`VariableConcept`].
#[derive(Debug)]
pub struct ViewModelMut<'a> {
    concept: &'a mut VariableConcept,
    layout: ViewLayout,
}

impl<'a> ViewModelMut<'a> {
    pub fn new(concept: &'a mut VariableConcept, layout: ViewLayout) -> Self {
        ViewModelMut { concept, layout }
    }

    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    pub fn dims(&self) -> &Dimensions {
        self.layout.dims()
    }

    pub fn as_const(&self) -> ViewModel<'_> {
        ViewModel::new(self.concept, self.layout.clone())
    }

    /// Shorter-lived mutable view of the same region.
    pub fn reborrow(&mut self) -> ViewModelMut<'_> {
        ViewModelMut::new(&mut *self.concept, self.layout.clone())
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut VariableConcept, &ViewLayout) {
        (&mut *self.concept, &self.layout)
    }

    pub fn make_view(self, slice: &Slice) -> Result<ViewModelMut<'a>> {
        let layout = self.layout.slice(slice)?;
        Ok(ViewModelMut::new(self.concept, layout))
    }

    pub fn transpose(self, order: &[Dim]) -> Result<ViewModelMut<'a>> {
        let layout = self.layout.transpose(order)?;
        Ok(ViewModelMut::new(self.concept, layout))
    }

    /// Copy `src` into this view; `src` is broadcast to this view's shape.
    pub fn copy_from(&mut self, src: &ViewModel<'_>) -> Result<()> {
        let src_layout = src.layout().broadcast(self.dims())?;
        self.concept.copy_from(&self.layout, src.concept(), &src_layout)
    }

    pub fn values_mut<T: Element>(&mut self) -> Result<ElementArrayViewMut<'_, T>> {
        ElementArrayViewMut::new(typed_mut::<T>(self.concept)?.values_mut(), self.layout.clone())
    }

    pub fn variances_mut<T: Element>(&mut self) -> Result<ElementArrayViewMut<'_, T>> {
        let variances = typed_mut::<T>(self.concept)?
            .variances_mut()
            .ok_or_else(no_variances)?;
        ElementArrayViewMut::new(variances, self.layout.clone())
    }
}
