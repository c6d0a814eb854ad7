//! Strided iteration over element buffers.
//!
//! Every elementwise operation walks one or more [`ViewLayout`]s of the same
//! shape in canonical row-major order (outermost dimension slowest) and
//! visits buffer offsets. Broadcast dimensions have stride 0, so the same
//! source element is visited repeatedly instead of being materialized.

use crate::dimensions::Dimensions;
use crate::view::ViewLayout;
use crate::{Result, VariableError};

// ============================================================================
// Offset iteration
// ============================================================================

/// Buffer offsets of a layout in row-major order.
///
/// Keeps a multi-index odometer and a running offset: advancing the innermost
/// axis adds its stride, and wrapping an axis rewinds it by `stride * extent`
/// before carrying into the next outer axis. A 0-d layout yields its offset
/// once; a layout with any zero extent yields nothing.
#[derive(Debug, Clone)]
pub(crate) struct Offsets {
    shape: Vec<usize>,
    strides: Vec<isize>,
    index: Vec<usize>,
    current: isize,
    remaining: usize,
}

impl Offsets {
    /// Start at the first element of `layout`.
    pub(crate) fn new(layout: &ViewLayout) -> Self {
        let shape = layout.dims().shape().to_vec();
        let remaining = total_len(&shape);
        Offsets {
            index: vec![0; shape.len()],
            strides: layout.strides().to_vec(),
            shape,
            current: layout.offset(),
            remaining,
        }
    }

    /// Step the odometer to the next row-major position.
    fn advance(&mut self) {
        for axis in (0..self.shape.len()).rev() {
            self.index[axis] += 1;
            self.current += self.strides[axis];
            if self.index[axis] < self.shape[axis] {
                return;
            }
            self.current -= self.strides[axis] * self.shape[axis] as isize;
            self.index[axis] = 0;
        }
    }
}

impl Iterator for Offsets {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let out = self.current as usize;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Offsets {}

// ============================================================================
// Helpers
// ============================================================================

/// Contiguous copy of the elements of `data` selected by `layout`.
///
/// Contiguous layouts are copied as one slice; anything else (sliced, reversed
/// or broadcast) is walked element by element.
pub(crate) fn gather<T: Clone>(data: &[T], layout: &ViewLayout) -> Vec<T> {
    if is_contiguous(layout.dims().shape(), layout.strides()) {
        let start = layout.offset().max(0) as usize;
        let len = layout.volume();
        if len == 0 {
            return Vec::new();
        }
        return data[start..start + len].to_vec();
    }
    Offsets::new(layout).map(|o| data[o].clone()).collect()
}

/// Error with [`VariableError::DimensionMismatch`] unless `a == b`, order included.
pub(crate) fn ensure_same_shape(a: &Dimensions, b: &Dimensions) -> Result<()> {
    if a != b {
        return Err(VariableError::DimensionMismatch {
            expected: a.clone(),
            actual: b.clone(),
        });
    }
    Ok(())
}

/// Row-major contiguity, ignoring strides of axes with extent <= 1.
pub(crate) fn is_contiguous(shape: &[usize], strides: &[isize]) -> bool {
    if shape.len() != strides.len() {
        return false;
    }
    let mut expected = 1isize;
    for (&extent, &stride) in shape.iter().rev().zip(strides.iter().rev()) {
        if extent <= 1 {
            continue;
        }
        if stride != expected {
            return false;
        }
        expected = expected.saturating_mul(extent as isize);
    }
    true
}

/// Element count of `shape`; 1 for a 0-d shape.
pub(crate) fn total_len(shape: &[usize]) -> usize {
    shape.iter().product()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::Dim;
    use crate::slice::Slice;

    fn layout(pairs: &[(Dim, usize)]) -> ViewLayout {
        ViewLayout::contiguous(&Dimensions::from_pairs(pairs).unwrap())
    }

    #[test]
    fn test_offsets_contiguous() {
        let l = layout(&[(Dim::Y, 2), (Dim::X, 3)]);
        assert_eq!(Offsets::new(&l).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_offsets_scalar_and_empty() {
        assert_eq!(Offsets::new(&layout(&[])).collect::<Vec<_>>(), vec![0]);
        assert_eq!(Offsets::new(&layout(&[(Dim::X, 0)])).count(), 0);
    }

    #[test]
    fn test_offsets_sliced_column() {
        let l = layout(&[(Dim::Y, 3), (Dim::X, 4)])
            .slice(&Slice::at(Dim::X, 1))
            .unwrap();
        assert_eq!(Offsets::new(&l).collect::<Vec<_>>(), vec![1, 5, 9]);
    }

    #[test]
    fn test_offsets_broadcast() {
        let target = Dimensions::from_pairs(&[(Dim::Y, 2), (Dim::X, 3)]).unwrap();
        let l = layout(&[(Dim::X, 3)]).broadcast(&target).unwrap();
        assert_eq!(l.strides(), &[0, 1]);
        assert_eq!(Offsets::new(&l).collect::<Vec<_>>(), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_is_contiguous() {
        assert!(is_contiguous(&[2, 3], &[3, 1]));
        assert!(is_contiguous(&[1, 3], &[100, 1]));
        assert!(!is_contiguous(&[2, 3], &[1, 2]));
        assert!(is_contiguous(&[], &[]));
    }

    #[test]
    fn test_gather_fast_path_with_offset() {
        let data = [0, 1, 2, 3, 4, 5];
        let l = layout(&[(Dim::Y, 3), (Dim::X, 2)])
            .slice(&Slice::range(Dim::Y, 1, 3))
            .unwrap();
        assert_eq!(gather(&data, &l), vec![2, 3, 4, 5]);
    }
}
