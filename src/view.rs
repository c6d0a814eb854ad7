//! Strided element views.
//!
//! - [`ViewLayout`]: dimensions, per-dimension strides and a start offset
//!   describing where a view's elements live inside an owner's buffer
//! - [`ElementArrayView`]: immutable typed view over a buffer
//! - [`ElementArrayViewMut`]: mutable typed view over a buffer

use std::fmt;

use crate::dim::Dim;
use crate::dimensions::Dimensions;
use crate::kernel::{is_contiguous, Offsets};
use crate::slice::Slice;
use crate::{Result, VariableError};

// ============================================================================
// Validation helpers
// ============================================================================

fn out_of_bounds() -> VariableError {
    VariableError::Dimension("View layout exceeds the bounds of its buffer.".into())
}

/// Validate that all accessed offsets stay within `[0, len)`.
fn validate_bounds(len: usize, layout: &ViewLayout) -> Result<()> {
    let shape = layout.dims.shape();
    if shape.len() != layout.strides.len() {
        return Err(VariableError::Dimension(
            "Number of strides does not match number of dimensions.".into(),
        ));
    }
    if shape.iter().any(|&d| d == 0) {
        return Ok(());
    }
    let mut min_offset = layout.offset;
    let mut max_offset = layout.offset;
    for (&extent, &stride) in shape.iter().zip(layout.strides.iter()) {
        if extent > 1 {
            let end = stride
                .checked_mul(extent as isize - 1)
                .ok_or_else(out_of_bounds)?;
            if end >= 0 {
                max_offset = max_offset.checked_add(end).ok_or_else(out_of_bounds)?;
            } else {
                min_offset = min_offset.checked_add(end).ok_or_else(out_of_bounds)?;
            }
        }
    }
    if min_offset < 0 || max_offset < 0 || max_offset as usize >= len {
        return Err(out_of_bounds());
    }
    Ok(())
}

// ============================================================================
// ViewLayout
// ============================================================================

/// Placement of a view inside a buffer.
///
/// Strides are signed: a reversed dimension walks backwards. A stride of 0
/// repeats the same elements along a broadcast dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLayout {
    dims: Dimensions,
    strides: Vec<isize>,
    offset: isize,
}

impl ViewLayout {
    /// Layout of a whole contiguous buffer with shape `dims`.
    pub fn contiguous(dims: &Dimensions) -> Self {
        ViewLayout {
            strides: dims.strides(),
            dims: dims.clone(),
            offset: 0,
        }
    }

    /// Labels and extents of the view, outermost first.
    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    /// Buffer step per dimension, in elements, aligned with [`Self::dims`].
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Buffer position of the first element.
    pub fn offset(&self) -> isize {
        self.offset
    }

    /// Number of elements selected.
    pub fn volume(&self) -> usize {
        self.dims.volume()
    }

    /// True if the elements form one row-major contiguous block.
    pub fn is_contiguous(&self) -> bool {
        is_contiguous(self.dims.shape(), &self.strides)
    }

    /// True if some element is visited more than once.
    pub fn has_broadcast(&self) -> bool {
        self.dims
            .shape()
            .iter()
            .zip(self.strides.iter())
            .any(|(&extent, &stride)| extent > 1 && stride == 0)
    }

    /// Restrict to a single index (dropping the dimension) or a range.
    pub fn slice(&self, slice: &Slice) -> Result<Self> {
        slice.validate(&self.dims)?;
        let axis = self.dims.index(slice.dim())?;
        let mut out = self.clone();
        out.offset += slice.begin() as isize * self.strides[axis];
        match slice.end() {
            None => {
                out.dims.erase(slice.dim())?;
                out.strides.remove(axis);
            }
            Some(end) => out.dims.resize(slice.dim(), end - slice.begin())?,
        }
        Ok(out)
    }

    /// Permute dimensions without moving data. An empty `order` reverses them.
    pub fn transpose(&self, order: &[Dim]) -> Result<Self> {
        let dims = self.dims.transpose(order)?;
        let strides = dims
            .labels()
            .iter()
            .map(|&dim| Ok(self.strides[self.dims.index(dim)?]))
            .collect::<Result<Vec<_>>>()?;
        Ok(ViewLayout {
            dims,
            strides,
            offset: self.offset,
        })
    }

    /// Present the view with shape `target`, which must contain the view's
    /// dimensions. Dimensions absent from the view get stride 0.
    pub fn broadcast(&self, target: &Dimensions) -> Result<Self> {
        if !target.contains(&self.dims) {
            return Err(VariableError::DimensionMismatch {
                expected: target.clone(),
                actual: self.dims.clone(),
            });
        }
        let strides = target
            .labels()
            .iter()
            .map(|&dim| match self.dims.index(dim) {
                Ok(axis) => self.strides[axis],
                Err(_) => 0,
            })
            .collect();
        Ok(ViewLayout {
            dims: target.clone(),
            strides,
            offset: self.offset,
        })
    }

    /// Walk `dim` backwards.
    pub fn reverse(&self, dim: Dim) -> Result<Self> {
        let axis = self.dims.index(dim)?;
        let extent = self.dims.shape()[axis];
        let mut out = self.clone();
        if extent > 0 {
            out.offset += (extent as isize - 1) * self.strides[axis];
        }
        out.strides[axis] = -self.strides[axis];
        Ok(out)
    }

    /// Reinterpret the selected elements with shape `dims`. Only contiguous
    /// layouts can be reshaped without copying.
    pub fn reshape(&self, dims: &Dimensions) -> Result<Self> {
        if dims.volume() != self.volume() || dims.sparse_dim() != self.dims.sparse_dim() {
            return Err(VariableError::Dimension(format!(
                "Cannot reshape {} to {dims}: volume or sparse dimension differs.",
                self.dims
            )));
        }
        if !self.is_contiguous() {
            return Err(VariableError::Dimension(format!(
                "Cannot reshape non-contiguous view {} without copying.",
                self.dims
            )));
        }
        Ok(ViewLayout {
            strides: dims.strides(),
            dims: dims.clone(),
            offset: self.offset,
        })
    }

    /// Buffer offset of the element at flat row-major position `index`.
    pub fn flat_offset(&self, index: usize) -> Option<usize> {
        if index >= self.volume() {
            return None;
        }
        let mut rest = index;
        let mut offset = self.offset;
        for (&extent, &stride) in self.dims.shape().iter().zip(self.strides.iter()).rev() {
            offset += (rest % extent) as isize * stride;
            rest /= extent;
        }
        Some(offset as usize)
    }
}

// ============================================================================
// ElementArrayView
// ============================================================================

/// Immutable strided view of typed elements.
#[derive(Clone)]
pub struct ElementArrayView<'a, T> {
    data: &'a [T],
    layout: ViewLayout,
}

impl<T: fmt::Debug> fmt::Debug for ElementArrayView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> ElementArrayView<'a, T> {
    /// Create a view, validating that `layout` stays inside `data`.
    pub fn new(data: &'a [T], layout: ViewLayout) -> Result<Self> {
        validate_bounds(data.len(), &layout)?;
        Ok(ElementArrayView { data, layout })
    }

    /// View the buffer of an owner with shape `owner` as shape `view`.
    ///
    /// Dimensions of `view` missing from `owner` are broadcast; dimensions of
    /// `owner` missing from `view` are fixed at index 0.
    pub fn from_owner(data: &'a [T], view: &Dimensions, owner: &Dimensions) -> Result<Self> {
        if owner.contains(view) {
            let mut sub = ViewLayout::contiguous(owner);
            for &dim in owner.labels() {
                if !view.contains_dim(dim) {
                    sub = sub.slice(&Slice::at(dim, 0))?;
                }
            }
            let sub = sub.transpose(view.labels())?;
            return Self::new(data, sub);
        }
        Self::new(data, ViewLayout::contiguous(owner).broadcast(view)?)
    }

    pub fn dims(&self) -> &Dimensions {
        self.layout.dims()
    }

    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    /// Number of elements visited, counting broadcast repeats.
    pub fn len(&self) -> usize {
        self.layout.volume()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at flat row-major position `index`.
    pub fn get(&self, index: usize) -> Option<&'a T> {
        let data = self.data;
        self.layout.flat_offset(index).map(|o| &data[o])
    }

    /// Elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + 'a {
        let data = self.data;
        Offsets::new(&self.layout).map(move |o| &data[o])
    }
}

impl<T: Clone> ElementArrayView<'_, T> {
    /// Copy the elements into a contiguous row-major buffer.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

// ============================================================================
// ElementArrayViewMut
// ============================================================================

/// Mutable strided view of typed elements. Never broadcasts.
pub struct ElementArrayViewMut<'a, T> {
    data: &'a mut [T],
    layout: ViewLayout,
}

impl<T: fmt::Debug> fmt::Debug for ElementArrayViewMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_view().fmt(f)
    }
}

impl<'a, T> ElementArrayViewMut<'a, T> {
    /// Create a view, validating that `layout` stays inside `data` and
    /// visits each element at most once.
    pub fn new(data: &'a mut [T], layout: ViewLayout) -> Result<Self> {
        validate_bounds(data.len(), &layout)?;
        if layout.has_broadcast() {
            return Err(VariableError::Dimension(
                "A mutable view cannot broadcast.".into(),
            ));
        }
        Ok(ElementArrayViewMut { data, layout })
    }

    pub fn dims(&self) -> &Dimensions {
        self.layout.dims()
    }

    pub fn len(&self) -> usize {
        self.layout.volume()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at flat row-major position `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.layout.flat_offset(index).map(|o| &self.data[o])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.layout.flat_offset(index).map(move |o| &mut self.data[o])
    }

    /// Apply `f` to every element in row-major order.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut T)) {
        for o in Offsets::new(&self.layout) {
            f(&mut self.data[o]);
        }
    }

    /// Reborrow as an immutable view with the same layout.
    pub fn as_view(&self) -> ElementArrayView<'_, T> {
        ElementArrayView {
            data: &*self.data,
            layout: self.layout.clone(),
        }
    }
}

impl<T: Clone> ElementArrayViewMut<'_, T> {
    /// Set every viewed element to `value`; elements outside the view are untouched.
    pub fn fill(&mut self, value: T) {
        self.for_each_mut(|x| *x = value.clone());
    }
}
