//! Slice descriptors.

use std::fmt;

use crate::dim::Dim;
use crate::dimensions::Dimensions;
use crate::{Result, VariableError};

/// Selects a single index or a half-open range along one dimension.
///
/// A single index drops the dimension from the result; a range keeps it with
/// extent `end - begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slice {
    dim: Dim,
    begin: usize,
    end: Option<usize>,
}

impl Slice {
    /// Select index `index` along `dim`, removing the dimension.
    pub fn at(dim: Dim, index: usize) -> Self {
        Slice {
            dim,
            begin: index,
            end: None,
        }
    }

    /// Select `[begin, end)` along `dim`.
    pub fn range(dim: Dim, begin: usize, end: usize) -> Self {
        Slice {
            dim,
            begin,
            end: Some(end),
        }
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> Option<usize> {
        self.end
    }

    pub fn is_range(&self) -> bool {
        self.end.is_some()
    }

    /// Check the slice against `dims`.
    pub fn validate(&self, dims: &Dimensions) -> Result<()> {
        if dims.sparse_dim() == Some(self.dim) {
            return Err(VariableError::Dimension(format!(
                "Cannot slice along the sparse dimension {}.",
                self.dim
            )));
        }
        let extent = dims.extent(self.dim)?;
        let valid = match self.end {
            None => self.begin < extent,
            Some(end) => self.begin <= end && end <= extent,
        };
        if valid {
            Ok(())
        } else {
            Err(VariableError::SliceOutOfRange {
                slice: *self,
                extent,
            })
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            None => write!(f, "({}, {})", self.dim, self.begin),
            Some(end) => write!(f, "({}, {}, {})", self.dim, self.begin, end),
        }
    }
}
