//! Owned element storage.

use crate::element::Element;
use crate::kernel::{gather, Offsets};
use crate::view::ViewLayout;
use crate::{Result, VariableError};

/// Contiguous owned buffer of values with an optional parallel buffer of
/// variances of the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementArray<T> {
    values: Vec<T>,
    variances: Option<Vec<T>>,
}

impl<T: Element> ElementArray<T> {
    /// Default-initialized values (zero for numbers, empty for event lists).
    pub fn zeros(len: usize) -> Self {
        ElementArray {
            values: vec![T::default(); len],
            variances: None,
        }
    }

    /// Default-initialized values and variances.
    pub fn zeros_with_variances(len: usize) -> Self {
        ElementArray {
            values: vec![T::default(); len],
            variances: Some(vec![T::default(); len]),
        }
    }

    pub fn from_values(values: Vec<T>) -> Self {
        ElementArray {
            values,
            variances: None,
        }
    }

    pub fn from_parts(values: Vec<T>, variances: Option<Vec<T>>) -> Result<Self> {
        let mut array = Self::from_values(values);
        if let Some(variances) = variances {
            array.set_variances(variances)?;
        }
        Ok(array)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn variances(&self) -> Option<&[T]> {
        self.variances.as_deref()
    }

    pub fn variances_mut(&mut self) -> Option<&mut [T]> {
        self.variances.as_deref_mut()
    }

    /// Values and variances borrowed mutably at the same time.
    pub fn parts_mut(&mut self) -> (&mut [T], Option<&mut [T]>) {
        (&mut self.values, self.variances.as_deref_mut())
    }

    pub fn has_variances(&self) -> bool {
        self.variances.is_some()
    }

    /// Attach variances; their length must equal the number of values.
    pub fn set_variances(&mut self, variances: Vec<T>) -> Result<()> {
        if !T::DTYPE.can_have_variances() {
            return Err(VariableError::Variances(format!(
                "Variances are not supported for dtype {}.",
                T::DTYPE
            )));
        }
        if variances.len() != self.values.len() {
            return Err(VariableError::Variances(format!(
                "Expected {} variances, got {}.",
                self.values.len(),
                variances.len()
            )));
        }
        self.variances = Some(variances);
        Ok(())
    }

    /// Attach default-initialized variances unless present.
    pub fn ensure_variances(&mut self) -> Result<()> {
        if self.variances.is_none() {
            self.set_variances(vec![T::default(); self.values.len()])?;
        }
        Ok(())
    }

    pub fn clear_variances(&mut self) {
        self.variances = None;
    }

    pub fn into_parts(self) -> (Vec<T>, Option<Vec<T>>) {
        (self.values, self.variances)
    }

    /// Contiguous copy of the elements selected by `layout`.
    pub fn gather(&self, layout: &ViewLayout) -> Self {
        ElementArray {
            values: gather(&self.values, layout),
            variances: self.variances.as_ref().map(|v| gather(v, layout)),
        }
    }

    /// Copy `src` (selected by `src_layout`) into the elements selected by
    /// `dst_layout`. Both layouts must have the same shape. Variances are
    /// copied when both sides carry them.
    pub(crate) fn copy_from(
        &mut self,
        dst_layout: &ViewLayout,
        src: &ElementArray<T>,
        src_layout: &ViewLayout,
    ) {
        let pairs = Offsets::new(dst_layout).zip(Offsets::new(src_layout));
        match (self.variances.as_mut(), src.variances.as_ref()) {
            (Some(dst_var), Some(src_var)) => {
                for (d, s) in pairs {
                    self.values[d] = src.values[s].clone();
                    dst_var[d] = src_var[s].clone();
                }
            }
            _ => {
                for (d, s) in pairs {
                    self.values[d] = src.values[s].clone();
                }
            }
        }
    }
}
