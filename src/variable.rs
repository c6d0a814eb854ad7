//! The [`Variable`] type.

use std::fmt;

use tracing::{debug, trace};
use unitvar_units::Unit;

use crate::concept::{ViewModel, ViewModelMut, VariableConcept};
use crate::dim::Dim;
use crate::dimensions::Dimensions;
use crate::element::{DType, Element, Numeric};
use crate::slice::Slice;
use crate::storage::ElementArray;
use crate::transform::{self, BinaryOp};
use crate::variable_view::{VariableConstView, VariableView};
use crate::view::ViewLayout;
use crate::{Result, VariableError};

/// A multidimensional array with named dimensions, a physical unit, and
/// optional variances.
///
/// The element type is erased at runtime ([`dtype`](Self::dtype)) and chosen
/// from a closed set of [`Element`] types.
///
/// ```rust
/// use unitvar::{Dim, Dimensions, Unit, Variable};
///
/// let dims = Dimensions::from_pairs(&[(Dim::X, 3)]).unwrap();
/// let var = Variable::new(dims, Unit::M, vec![1.0, 2.0, 3.0]).unwrap();
/// let area = (&var * &var).unwrap();
/// assert_eq!(area.unit(), Unit::M * Unit::M);
/// assert_eq!(area.values::<f64>().unwrap(), &[1.0, 4.0, 9.0]);
/// ```
pub struct Variable {
    pub(crate) unit: Unit,
    pub(crate) dims: Dimensions,
    pub(crate) data: VariableConcept,
}

fn volume_mismatch() -> VariableError {
    VariableError::Dimension(
        "Creating Variable: data size does not match volume given by dimension extents.".into(),
    )
}

fn check_sparse(dims: &Dimensions, dtype: DType) -> Result<()> {
    if dims.is_sparse() != dtype.is_sparse() {
        return Err(VariableError::Dimension(format!(
            "Dimensions {dims} do not fit dtype {dtype}: \
             event-list dtypes require exactly one sparse dimension."
        )));
    }
    Ok(())
}

/// Checks shared by [`Variable::set_variances`] and
/// [`VariableView::set_variances`].
pub(crate) fn check_variances(
    dims: &Dimensions,
    unit: Unit,
    dtype: DType,
    variances: &Variable,
) -> Result<()> {
    if !dtype.can_have_variances() {
        return Err(VariableError::Variances(format!(
            "Variances are not supported for dtype {dtype}."
        )));
    }
    if variances.dims() != dims {
        return Err(VariableError::Variances(format!(
            "Expected variances with dimensions {dims}, got {}.",
            variances.dims()
        )));
    }
    if variances.unit() != unit * unit {
        return Err(VariableError::Variances(format!(
            "Expected variances with unit {}, got {}.",
            unit * unit,
            variances.unit()
        )));
    }
    if variances.dtype() != dtype {
        return Err(VariableError::Variances(format!(
            "Expected variances of dtype {dtype}, got {}.",
            variances.dtype()
        )));
    }
    if variances.has_variances() {
        return Err(VariableError::Variances(
            "Variances cannot have variances themselves.".into(),
        ));
    }
    Ok(())
}

pub(crate) fn apply_slices(layout: &ViewLayout, slices: &[Slice]) -> Result<ViewLayout> {
    slices
        .iter()
        .try_fold(layout.clone(), |layout, slice| layout.slice(slice))
}

impl Variable {
    /// Variable with the given values and no variances.
    pub fn new<T: Element>(dims: Dimensions, unit: Unit, values: Vec<T>) -> Result<Self> {
        Self::builder().dims(dims).unit(unit).values(values).build()
    }

    pub fn with_variances<T: Element>(
        dims: Dimensions,
        unit: Unit,
        values: Vec<T>,
        variances: Vec<T>,
    ) -> Result<Self> {
        Self::builder()
            .dims(dims)
            .unit(unit)
            .values(values)
            .variances(variances)
            .build()
    }

    /// Default-initialized values.
    pub fn zeros<T: Element>(dims: Dimensions, unit: Unit) -> Result<Self> {
        Self::builder::<T>().dims(dims).unit(unit).build()
    }

    /// Default-initialized values, and variances if requested.
    pub fn from_dtype(dtype: DType, dims: Dimensions, unit: Unit, variances: bool) -> Result<Self> {
        let data = VariableConcept::zeros(dtype, dims.volume(), variances)?;
        Self::from_parts(dims, unit, data)
    }

    /// Dimensionless 0-d variable.
    pub fn scalar<T: Element>(value: T) -> Self {
        Self::quantity(value, Unit::DIMENSIONLESS)
    }

    /// 0-d variable with a unit.
    pub fn quantity<T: Element>(value: T, unit: Unit) -> Self {
        Variable {
            unit,
            dims: Dimensions::new(),
            data: ElementArray::from_values(vec![value]).into(),
        }
    }

    pub fn builder<T: Element>() -> VariableBuilder<T> {
        VariableBuilder::new()
    }

    pub(crate) fn from_parts(dims: Dimensions, unit: Unit, data: VariableConcept) -> Result<Self> {
        check_sparse(&dims, data.dtype())?;
        if data.len() != dims.volume() {
            return Err(volume_mismatch());
        }
        Ok(Variable { unit, dims, data })
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn set_unit(&mut self, unit: Unit) {
        self.unit = unit;
    }

    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn has_variances(&self) -> bool {
        self.data.has_variances()
    }

    /// Type-erased storage.
    pub fn data(&self) -> &VariableConcept {
        &self.data
    }

    fn typed<T: Element>(&self) -> Result<&ElementArray<T>> {
        T::array(&self.data).ok_or(VariableError::TypeMismatch {
            expected: T::DTYPE,
            actual: self.dtype(),
        })
    }

    fn typed_mut<T: Element>(&mut self) -> Result<&mut ElementArray<T>> {
        let actual = self.dtype();
        T::array_mut(&mut self.data).ok_or(VariableError::TypeMismatch {
            expected: T::DTYPE,
            actual,
        })
    }

    /// Values in row-major order.
    pub fn values<T: Element>(&self) -> Result<&[T]> {
        Ok(self.typed::<T>()?.values())
    }

    pub fn values_mut<T: Element>(&mut self) -> Result<&mut [T]> {
        Ok(self.typed_mut::<T>()?.values_mut())
    }

    pub fn variances<T: Element>(&self) -> Result<&[T]> {
        self.typed::<T>()?
            .variances()
            .ok_or_else(|| VariableError::Variances("Variable has no variances.".into()))
    }

    pub fn variances_mut<T: Element>(&mut self) -> Result<&mut [T]> {
        self.typed_mut::<T>()?
            .variances_mut()
            .ok_or_else(|| VariableError::Variances("Variable has no variances.".into()))
    }

    /// Event lists of a sparse variable.
    pub fn sparse_values<T: Numeric>(&self) -> Result<&[Vec<T>]>
    where
        Vec<T>: Element,
    {
        self.values::<Vec<T>>()
    }

    /// The single value of a 0-d variable.
    pub fn value<T: Element>(&self) -> Result<&T> {
        self.view().value()
    }

    /// The single variance of a 0-d variable.
    pub fn variance<T: Element>(&self) -> Result<&T> {
        self.view().variance()
    }

    /// Attach variances given as a variable with the same dimensions and
    /// dtype and with the squared unit.
    pub fn set_variances(&mut self, variances: Variable) -> Result<()> {
        check_variances(&self.dims, self.unit, self.dtype(), &variances)?;
        self.data.set_variances(variances.data)
    }

    pub fn drop_variances(&mut self) {
        self.data.clear_variances();
    }

    /// Change dimensions. Data is kept if the volume is unchanged, otherwise
    /// it is replaced by default-initialized data.
    pub fn set_dims(&mut self, dims: Dimensions) -> Result<()> {
        check_sparse(&dims, self.dtype())?;
        if dims.volume() != self.dims.volume() {
            debug!(from = %self.dims, to = %dims, "set_dims: reallocating data");
            self.data = VariableConcept::zeros(self.dtype(), dims.volume(), self.has_variances())?;
        }
        self.dims = dims;
        Ok(())
    }

    pub fn rename(&mut self, from: Dim, to: Dim) -> Result<()> {
        self.dims.rename(from, to)
    }

    pub fn view(&self) -> VariableConstView<'_> {
        VariableConstView::new(
            self.unit,
            ViewModel::new(&self.data, ViewLayout::contiguous(&self.dims)),
        )
    }

    pub fn view_mut(&mut self) -> VariableView<'_> {
        let layout = ViewLayout::contiguous(&self.dims);
        VariableView::new(&mut self.unit, ViewModelMut::new(&mut self.data, layout))
    }

    pub fn slice(&self, slice: Slice) -> Result<VariableConstView<'_>> {
        self.view().slice(slice)
    }

    pub fn slice_mut(&mut self, slice: Slice) -> Result<VariableView<'_>> {
        self.view_mut().slice(slice)
    }

    /// Slice of an owned variable: an owned copy, never a view.
    pub fn into_slice(self, slice: Slice) -> Result<Variable> {
        Ok(self.slice(slice)?.to_variable())
    }

    /// View with new dimensions of equal volume.
    pub fn reshape(&self, dims: &Dimensions) -> Result<VariableConstView<'_>> {
        self.view().reshape_view(dims)
    }

    /// Reshape an owned variable without copying its data.
    pub fn into_reshaped(mut self, dims: Dimensions) -> Result<Variable> {
        ViewLayout::contiguous(&self.dims).reshape(&dims)?;
        self.dims = dims;
        Ok(self)
    }

    /// View with permuted dimensions. An empty `order` reverses them.
    pub fn transpose(&self, order: &[Dim]) -> Result<VariableConstView<'_>> {
        self.view().transpose(order)
    }

    /// Replace contents with those of `other`.
    ///
    /// Copies elements in place when `other` is not a view and has the same
    /// dtype, dimensions and variance presence; otherwise reallocates.
    pub fn assign(&mut self, other: &VariableConstView<'_>) {
        if !other.is_view()
            && other.dtype() == self.dtype()
            && other.dims() == self.dims()
            && other.has_variances() == self.has_variances()
        {
            let layout = ViewLayout::contiguous(&self.dims);
            let copied = self
                .data
                .copy_from(&layout, other.data().concept(), other.data().layout());
            if copied.is_ok() {
                trace!(dtype = %self.dtype(), "assign: copied elements in place");
                self.unit = other.unit();
                return;
            }
        }
        trace!(dtype = %other.dtype(), "assign: replacing storage");
        *self = other.to_variable();
    }

    /// `self[target] op= self[source]` for regions of the same variable that
    /// may overlap. The source region is materialized before writing.
    pub fn binary_assign_within(
        &mut self,
        op: BinaryOp,
        target: &[Slice],
        source: &[Slice],
    ) -> Result<()> {
        let full = ViewLayout::contiguous(&self.dims);
        let dst_layout = apply_slices(&full, target)?;
        let src_layout = apply_slices(&full, source)?;
        let unit = op.unit(self.unit, self.unit)?;
        if unit != self.unit && dst_layout != full {
            return Err(VariableError::PartialViewUnit {
                current: self.unit,
                requested: unit,
            });
        }
        debug!(op = op.name(), "materializing overlapping source operand");
        let source = self.data.gather(&src_layout);
        let source_layout = ViewLayout::contiguous(src_layout.dims());
        transform::binary_in_place(&mut self.data, &dst_layout, &source, &source_layout, op)?;
        self.unit = unit;
        Ok(())
    }

    /// `self[target] = self[source]` for regions that may overlap.
    pub fn copy_within(&mut self, target: &[Slice], source: &[Slice]) -> Result<()> {
        let full = ViewLayout::contiguous(&self.dims);
        let dst_layout = apply_slices(&full, target)?;
        let src_layout = apply_slices(&full, source)?;
        debug!("materializing overlapping source of copy");
        let source = self.data.gather(&src_layout);
        let source_layout = ViewLayout::contiguous(src_layout.dims()).broadcast(dst_layout.dims())?;
        self.data.copy_from(&dst_layout, &source, &source_layout)
    }
}

impl Clone for Variable {
    fn clone(&self) -> Self {
        Variable {
            unit: self.unit,
            dims: self.dims.clone(),
            data: self.data.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign(&source.view());
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("unit", &self.unit)
            .field("dims", &self.dims)
            .field("data", &self.data)
            .finish()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Variable(dims={}, dtype={}, unit={}, variances={})",
            self.dims,
            self.dtype(),
            self.unit,
            self.has_variances()
        )
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.view() == other.view()
    }
}

impl<'a> PartialEq<VariableConstView<'a>> for Variable {
    fn eq(&self, other: &VariableConstView<'a>) -> bool {
        self.view() == *other
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Keyword-style construction of a [`Variable`].
///
/// - neither values nor variances: default-initialized values
/// - variances without values: error
/// - empty values or variances: default-initialized to the full volume
#[derive(Debug, Clone)]
pub struct VariableBuilder<T> {
    dims: Dimensions,
    unit: Unit,
    values: Option<Vec<T>>,
    variances: Option<Vec<T>>,
}

impl<T: Element> Default for VariableBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> VariableBuilder<T> {
    pub fn new() -> Self {
        VariableBuilder {
            dims: Dimensions::new(),
            unit: Unit::DIMENSIONLESS,
            values: None,
            variances: None,
        }
    }

    pub fn dims(mut self, dims: Dimensions) -> Self {
        self.dims = dims;
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn values(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.values = Some(values.into_iter().collect());
        self
    }

    pub fn variances(mut self, variances: impl IntoIterator<Item = T>) -> Self {
        self.variances = Some(variances.into_iter().collect());
        self
    }

    pub fn build(self) -> Result<Variable> {
        check_sparse(&self.dims, T::DTYPE)?;
        let volume = self.dims.volume();
        let filled = |data: Vec<T>| -> Result<Vec<T>> {
            match data.len() {
                n if n == volume => Ok(data),
                0 => Ok(vec![T::default(); volume]),
                _ => Err(volume_mismatch()),
            }
        };
        let values = match (self.values, &self.variances) {
            (Some(values), _) => filled(values)?,
            (None, Some(_)) => {
                return Err(VariableError::Variances(
                    "Cannot set variances without values.".into(),
                ))
            }
            (None, None) => vec![T::default(); volume],
        };
        let variances = self.variances.map(filled).transpose()?;
        let array = ElementArray::from_parts(values, variances)?;
        Variable::from_parts(self.dims, self.unit, array.into())
    }
}
