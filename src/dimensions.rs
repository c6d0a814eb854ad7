//! Named, ordered dimension extents.

use std::fmt;

use crate::dim::Dim;
use crate::{Result, VariableError};

/// Ordered mapping of dimension labels to extents, outermost first.
///
/// At most one dimension may be sparse. The sparse dimension is always the
/// innermost one and does not contribute to [`volume`](Self::volume); each
/// element of a sparse variable is a variable-length list along it.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    labels: Vec<Dim>,
    shape: Vec<usize>,
    sparse: Option<Dim>,
}

impl Dimensions {
    /// Extent sentinel marking a sparse dimension in [`add_inner`](Self::add_inner).
    pub const SPARSE: usize = usize::MAX;

    /// Zero-dimensional (scalar) dimensions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(label, extent)` pairs, outermost first.
    pub fn from_pairs(pairs: &[(Dim, usize)]) -> Result<Self> {
        let mut dims = Self::new();
        for &(dim, extent) in pairs {
            dims.add_inner(dim, extent)?;
        }
        Ok(dims)
    }

    fn check_new_label(&self, dim: Dim) -> Result<()> {
        if !dim.is_valid() {
            return Err(VariableError::Dimension(
                "Dim::Invalid cannot be used as a dimension label.".into(),
            ));
        }
        if self.contains_dim(dim) {
            return Err(VariableError::DuplicateDimension(dim));
        }
        Ok(())
    }

    fn set_sparse(&mut self, dim: Dim) -> Result<()> {
        if self.sparse.is_some() {
            return Err(VariableError::Dimension(
                "Dimensions cannot have more than one sparse dimension.".into(),
            ));
        }
        self.sparse = Some(dim);
        Ok(())
    }

    /// Append `dim` as the new innermost dense dimension, or mark it sparse
    /// if `extent` is [`Dimensions::SPARSE`].
    pub fn add_inner(&mut self, dim: Dim, extent: usize) -> Result<()> {
        self.check_new_label(dim)?;
        if extent == Self::SPARSE {
            return self.set_sparse(dim);
        }
        self.labels.push(dim);
        self.shape.push(extent);
        Ok(())
    }

    /// Same as [`add_inner`](Self::add_inner).
    pub fn add(&mut self, dim: Dim, extent: usize) -> Result<()> {
        self.add_inner(dim, extent)
    }

    /// Prepend `dim` as the new outermost dimension.
    pub fn add_outer(&mut self, dim: Dim, extent: usize) -> Result<()> {
        self.check_new_label(dim)?;
        if extent == Self::SPARSE {
            return self.set_sparse(dim);
        }
        self.labels.insert(0, dim);
        self.shape.insert(0, extent);
        Ok(())
    }

    /// Number of dense dimensions.
    pub fn ndim(&self) -> usize {
        self.labels.len()
    }

    /// Dense labels, outermost first.
    pub fn labels(&self) -> &[Dim] {
        &self.labels
    }

    /// Dense extents, outermost first.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Iterate `(label, extent)` pairs of the dense dimensions.
    pub fn iter(&self) -> impl Iterator<Item = (Dim, usize)> + '_ {
        self.labels.iter().copied().zip(self.shape.iter().copied())
    }

    /// Product of the dense extents.
    pub fn volume(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn sparse_dim(&self) -> Option<Dim> {
        self.sparse
    }

    pub fn is_sparse(&self) -> bool {
        self.sparse.is_some()
    }

    /// Innermost dense dimension.
    pub fn inner(&self) -> Option<Dim> {
        self.labels.last().copied()
    }

    /// True if `dim` is a dense or the sparse dimension.
    pub fn contains_dim(&self, dim: Dim) -> bool {
        self.labels.contains(&dim) || self.sparse == Some(dim)
    }

    /// True if every dense `(label, extent)` pair of `other` is present in
    /// `self` with the same extent, and sparse dimensions agree.
    pub fn contains(&self, other: &Dimensions) -> bool {
        if other.sparse.is_some() && other.sparse != self.sparse {
            return false;
        }
        other
            .iter()
            .all(|(dim, extent)| self.extent(dim).map_or(false, |e| e == extent))
    }

    /// Position of the dense dimension `dim`.
    pub fn index(&self, dim: Dim) -> Result<usize> {
        self.labels
            .iter()
            .position(|&d| d == dim)
            .ok_or_else(|| VariableError::DimensionNotFound {
                dim,
                dims: self.clone(),
            })
    }

    pub fn extent(&self, dim: Dim) -> Result<usize> {
        Ok(self.shape[self.index(dim)?])
    }

    /// Row-major stride of `dim`: product of the extents inside it.
    pub fn offset(&self, dim: Dim) -> Result<usize> {
        let i = self.index(dim)?;
        Ok(self.shape[i + 1..].iter().product())
    }

    /// Row-major strides of all dense dimensions.
    pub fn strides(&self) -> Vec<isize> {
        row_major_strides(&self.shape)
    }

    pub fn resize(&mut self, dim: Dim, extent: usize) -> Result<()> {
        let i = self.index(dim)?;
        self.shape[i] = extent;
        Ok(())
    }

    /// Remove `dim`, dense or sparse.
    pub fn erase(&mut self, dim: Dim) -> Result<()> {
        if self.sparse == Some(dim) {
            self.sparse = None;
            return Ok(());
        }
        let i = self.index(dim)?;
        self.labels.remove(i);
        self.shape.remove(i);
        Ok(())
    }

    /// Relabel `from` as `to`.
    pub fn rename(&mut self, from: Dim, to: Dim) -> Result<()> {
        if from == to {
            return if self.contains_dim(from) {
                Ok(())
            } else {
                Err(VariableError::DimensionNotFound {
                    dim: from,
                    dims: self.clone(),
                })
            };
        }
        self.check_new_label(to)?;
        if self.sparse == Some(from) {
            self.sparse = Some(to);
            return Ok(());
        }
        let i = self.index(from)?;
        self.labels[i] = to;
        Ok(())
    }

    /// Reorder the dense dimensions. An empty `order` reverses them.
    pub fn transpose(&self, order: &[Dim]) -> Result<Dimensions> {
        let order: Vec<Dim> = if order.is_empty() {
            self.labels.iter().rev().copied().collect()
        } else {
            order.to_vec()
        };
        let is_permutation = order.len() == self.labels.len()
            && self.labels.iter().all(|d| order.contains(d));
        if !is_permutation {
            return Err(VariableError::Dimension(format!(
                "Cannot transpose {self}: order must be a permutation of its labels."
            )));
        }
        let mut out = Dimensions {
            labels: Vec::with_capacity(order.len()),
            shape: Vec::with_capacity(order.len()),
            sparse: self.sparse,
        };
        for dim in order {
            out.labels.push(dim);
            out.shape.push(self.extent(dim)?);
        }
        Ok(out)
    }

    /// Broadcast union of `a` and `b`.
    ///
    /// Labels of `b` missing from `a` become the outermost dimensions, in the
    /// order they have in `b`. Shared labels must have equal extents.
    pub fn merge(a: &Dimensions, b: &Dimensions) -> Result<Dimensions> {
        if a.sparse.is_some() && b.sparse.is_some() && a.sparse != b.sparse {
            return Err(VariableError::DimensionMismatch {
                expected: a.clone(),
                actual: b.clone(),
            });
        }
        let mut out = Dimensions {
            labels: Vec::with_capacity(a.ndim() + b.ndim()),
            shape: Vec::with_capacity(a.ndim() + b.ndim()),
            sparse: a.sparse.or(b.sparse),
        };
        for (dim, extent) in b.iter() {
            match a.extent(dim) {
                Ok(e) if e != extent => {
                    return Err(VariableError::DimensionMismatch {
                        expected: a.clone(),
                        actual: b.clone(),
                    })
                }
                Ok(_) => {}
                Err(_) => {
                    out.labels.push(dim);
                    out.shape.push(extent);
                }
            }
        }
        out.labels.extend_from_slice(&a.labels);
        out.shape.extend_from_slice(&a.shape);
        Ok(out)
    }

    /// True if a buffer with these dimensions is a contiguous block of one
    /// with dimensions `parent`: the labels are the innermost labels of
    /// `parent` in the same order, and only the outermost of them may have a
    /// smaller extent.
    pub fn is_contiguous_in(&self, parent: &Dimensions) -> bool {
        if self.sparse != parent.sparse || self.ndim() > parent.ndim() {
            return false;
        }
        let skip = parent.ndim() - self.ndim();
        let inner = parent.iter().skip(skip);
        self.iter().zip(inner).enumerate().all(|(i, ((d, e), (pd, pe)))| {
            d == pd && if i == 0 { e <= pe } else { e == pe }
        })
    }
}

/// Row-major strides (last index varies fastest).
pub fn row_major_strides(shape: &[usize]) -> Vec<isize> {
    let rank = shape.len();
    let mut strides = vec![1isize; rank];
    for i in (0..rank.saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1] as isize;
    }
    strides
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for (dim, extent) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{{{dim}, {extent}}}")?;
        }
        if let Some(dim) = self.sparse {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{{{dim}, [sparse]}}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dimensions{self}")
    }
}
