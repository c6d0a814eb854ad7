//! Borrowed views of a [`Variable`].
//!
//! A view borrows the variable it was created from, so the borrow checker
//! guarantees it cannot outlive its owner or observe a structural mutation.
//! Slicing a view yields a view; use [`VariableConstView::to_variable`] or
//! [`Variable::into_slice`] for owned data.

use std::fmt;

use unitvar_units::Unit;

use crate::concept::{ViewModel, ViewModelMut};
use crate::dim::Dim;
use crate::dimensions::Dimensions;
use crate::element::{DType, Element};
use crate::slice::Slice;
use crate::variable::{check_variances, Variable};
use crate::view::{ElementArrayView, ElementArrayViewMut};
use crate::{Result, VariableError};

/// Anything that can be read as a [`VariableConstView`].
pub trait AsVariableView {
    fn as_variable_view(&self) -> VariableConstView<'_>;
}

impl AsVariableView for Variable {
    fn as_variable_view(&self) -> VariableConstView<'_> {
        self.view()
    }
}

impl AsVariableView for VariableConstView<'_> {
    fn as_variable_view(&self) -> VariableConstView<'_> {
        self.clone()
    }
}

impl AsVariableView for VariableView<'_> {
    fn as_variable_view(&self) -> VariableConstView<'_> {
        self.as_const()
    }
}

fn expect_scalar(dims: &Dimensions) -> Result<()> {
    if dims.ndim() != 0 || dims.is_sparse() {
        return Err(VariableError::Dimension(format!(
            "Expected a 0-dimensional variable, got {dims}."
        )));
    }
    Ok(())
}

// ============================================================================
// VariableConstView
// ============================================================================

/// Read-only view of a (possibly strided, sliced or transposed) region of a
/// [`Variable`].
#[derive(Clone)]
pub struct VariableConstView<'a> {
    unit: Unit,
    data: ViewModel<'a>,
}

impl<'a> VariableConstView<'a> {
    pub fn new(unit: Unit, data: ViewModel<'a>) -> Self {
        VariableConstView { unit, data }
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn dims(&self) -> &Dimensions {
        self.data.dims()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn has_variances(&self) -> bool {
        self.data.has_variances()
    }

    /// Type-erased view model.
    pub fn data(&self) -> &ViewModel<'a> {
        &self.data
    }

    /// False if the view covers its whole variable in storage order.
    pub fn is_view(&self) -> bool {
        self.data.is_view()
    }

    pub fn slice(&self, slice: Slice) -> Result<VariableConstView<'a>> {
        Ok(VariableConstView::new(self.unit, self.data.make_view(&slice)?))
    }

    /// Permute dimensions without copying. An empty `order` reverses them.
    pub fn transpose(&self, order: &[Dim]) -> Result<VariableConstView<'a>> {
        Ok(VariableConstView::new(self.unit, self.data.transpose(order)?))
    }

    /// Reshape without copying; fails unless the view is contiguous.
    pub fn reshape_view(&self, dims: &Dimensions) -> Result<VariableConstView<'a>> {
        Ok(VariableConstView::new(self.unit, self.data.reshape(dims)?))
    }

    /// Reshaped copy. Works for any view of matching volume.
    pub fn reshape(&self, dims: &Dimensions) -> Result<Variable> {
        self.to_variable().into_reshaped(dims.clone())
    }

    pub fn values<T: Element>(&self) -> Result<ElementArrayView<'a, T>> {
        self.data.values()
    }

    pub fn variances<T: Element>(&self) -> Result<ElementArrayView<'a, T>> {
        self.data.variances()
    }

    /// The single value of a 0-d view.
    pub fn value<T: Element>(&self) -> Result<&'a T> {
        expect_scalar(self.dims())?;
        self.values::<T>()?
            .get(0)
            .ok_or_else(|| VariableError::Dimension("Variable is empty.".into()))
    }

    /// The single variance of a 0-d view.
    pub fn variance<T: Element>(&self) -> Result<&'a T> {
        expect_scalar(self.dims())?;
        self.variances::<T>()?
            .get(0)
            .ok_or_else(|| VariableError::Dimension("Variable is empty.".into()))
    }

    /// Owned copy with contiguous storage.
    pub fn to_variable(&self) -> Variable {
        Variable {
            unit: self.unit,
            dims: self.dims().clone(),
            data: self.data.clone_data(),
        }
    }
}

impl PartialEq for VariableConstView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.unit == other.unit
            && self.dims() == other.dims()
            && self.dtype() == other.dtype()
            && self.data.concept().equals(
                self.data.layout(),
                other.data.concept(),
                other.data.layout(),
            )
    }
}

impl PartialEq<Variable> for VariableConstView<'_> {
    fn eq(&self, other: &Variable) -> bool {
        *self == other.view()
    }
}

impl fmt::Debug for VariableConstView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableConstView")
            .field("unit", &self.unit)
            .field("dims", self.dims())
            .field("dtype", &self.dtype())
            .field("strides", &self.data.layout().strides())
            .finish()
    }
}

// ============================================================================
// VariableView
// ============================================================================

/// Mutable view of a region of a [`Variable`].
///
/// Writes go straight to the owner's storage. The unit can only be changed
/// through a view covering the whole variable.
pub struct VariableView<'a> {
    unit: &'a mut Unit,
    data: ViewModelMut<'a>,
}

impl<'a> VariableView<'a> {
    pub fn new(unit: &'a mut Unit, data: ViewModelMut<'a>) -> Self {
        VariableView { unit, data }
    }

    pub fn unit(&self) -> Unit {
        *self.unit
    }

    pub fn dims(&self) -> &Dimensions {
        self.data.dims()
    }

    pub fn dtype(&self) -> DType {
        self.as_const().dtype()
    }

    pub fn has_variances(&self) -> bool {
        self.as_const().has_variances()
    }

    pub fn is_view(&self) -> bool {
        self.as_const().is_view()
    }

    pub fn as_const(&self) -> VariableConstView<'_> {
        VariableConstView::new(*self.unit, self.data.as_const())
    }

    pub(crate) fn data_mut(&mut self) -> &mut ViewModelMut<'a> {
        &mut self.data
    }

    pub fn slice(self, slice: Slice) -> Result<VariableView<'a>> {
        Ok(VariableView::new(self.unit, self.data.make_view(&slice)?))
    }

    /// Slice without consuming this view.
    pub fn slice_mut(&mut self, slice: Slice) -> Result<VariableView<'_>> {
        Ok(VariableView::new(
            &mut *self.unit,
            self.data.reborrow().make_view(&slice)?,
        ))
    }

    pub fn transpose(self, order: &[Dim]) -> Result<VariableView<'a>> {
        Ok(VariableView::new(self.unit, self.data.transpose(order)?))
    }

    pub fn values<T: Element>(&self) -> Result<ElementArrayView<'_, T>> {
        self.data.as_const().values()
    }

    pub fn values_mut<T: Element>(&mut self) -> Result<ElementArrayViewMut<'_, T>> {
        self.data.values_mut()
    }

    pub fn variances<T: Element>(&self) -> Result<ElementArrayView<'_, T>> {
        self.data.as_const().variances()
    }

    pub fn variances_mut<T: Element>(&mut self) -> Result<ElementArrayViewMut<'_, T>> {
        self.data.variances_mut()
    }

    /// Fails if `unit` differs from the current unit and this view does not
    /// cover the whole variable.
    pub(crate) fn expect_can_set_unit(&self, unit: Unit) -> Result<()> {
        if unit != *self.unit && self.is_view() {
            return Err(VariableError::PartialViewUnit {
                current: *self.unit,
                requested: unit,
            });
        }
        Ok(())
    }

    pub fn set_unit(&mut self, unit: Unit) -> Result<()> {
        self.expect_can_set_unit(unit)?;
        *self.unit = unit;
        Ok(())
    }

    /// Copy values, variances and unit of `other` into this view. `other` is
    /// broadcast to the view's dimensions.
    pub fn assign(&mut self, other: &impl AsVariableView) -> Result<()> {
        let other = other.as_variable_view();
        self.expect_can_set_unit(other.unit())?;
        self.data.copy_from(other.data())?;
        *self.unit = other.unit();
        Ok(())
    }

    /// Attach variances. Only possible through a view of the whole variable.
    pub fn set_variances(&mut self, variances: Variable) -> Result<()> {
        if self.is_view() {
            return Err(VariableError::Variances(
                "Cannot add variances via sliced view of Variable.".into(),
            ));
        }
        check_variances(self.dims(), *self.unit, self.dtype(), &variances)?;
        let (concept, _) = self.data.parts_mut();
        concept.set_variances(variances.data)
    }
}

impl fmt::Debug for VariableView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableView")
            .field("unit", &*self.unit)
            .field("dims", self.dims())
            .field("dtype", &self.dtype())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn yx() -> Variable {
        let dims = Dimensions::from_pairs(&[(Dim::Y, 2), (Dim::X, 3)]).unwrap();
        Variable::new(dims, Unit::M, vec![1i64, 2, 3, 4, 5, 6]).unwrap()
    }

    #[test]
    fn test_slice_drops_or_narrows_dimension() {
        let var = yx();
        let row = var.slice(Slice::at(Dim::Y, 1)).unwrap();
        assert_eq!(row.dims().labels(), &[Dim::X]);
        assert_eq!(row.values::<i64>().unwrap().to_vec(), vec![4, 5, 6]);

        let cols = var.slice(Slice::range(Dim::X, 1, 3)).unwrap();
        assert_eq!(cols.dims().shape(), &[2, 2]);
        assert_eq!(cols.values::<i64>().unwrap().to_vec(), vec![2, 3, 5, 6]);
        assert!(cols.is_view());
    }

    #[test]
    fn test_slice_of_slice() {
        let var = yx();
        let cols = var.slice(Slice::range(Dim::X, 1, 3)).unwrap();
        let one = cols.slice(Slice::at(Dim::Y, 0)).unwrap().slice(Slice::at(Dim::X, 1)).unwrap();
        assert_eq!(*one.value::<i64>().unwrap(), 3);
    }

    #[test]
    fn test_slice_errors() {
        let var = yx();
        assert_eq!(var.slice(Slice::at(Dim::Z, 0)).unwrap_err().kind(), ErrorKind::Dimension);
        assert_eq!(var.slice(Slice::at(Dim::X, 3)).unwrap_err().kind(), ErrorKind::Slice);
    }

    #[test]
    fn test_transpose_view() {
        let var = yx();
        let t = var.transpose(&[]).unwrap();
        assert_eq!(t.dims().labels(), &[Dim::X, Dim::Y]);
        assert_eq!(t.values::<i64>().unwrap().to_vec(), vec![1, 4, 2, 5, 3, 6]);
        assert!(t.reshape_view(&Dimensions::from_pairs(&[(Dim::Z, 6)]).unwrap()).is_err());
        let flat = t.reshape(&Dimensions::from_pairs(&[(Dim::Z, 6)]).unwrap()).unwrap();
        assert_eq!(flat.values::<i64>().unwrap(), &[1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_mutable_slice_writes_through() {
        let mut var = yx();
        {
            let mut column = var.slice_mut(Slice::at(Dim::X, 0)).unwrap();
            column.values_mut::<i64>().unwrap().fill(0);
        }
        assert_eq!(var.values::<i64>().unwrap(), &[0, 2, 3, 0, 5, 6]);
    }

    #[test]
    fn test_view_assign_broadcasts() {
        let mut var = yx();
        let row = Variable::new(
            Dimensions::from_pairs(&[(Dim::X, 3)]).unwrap(),
            Unit::M,
            vec![7i64, 8, 9],
        )
        .unwrap();
        var.view_mut().assign(&row).unwrap();
        assert_eq!(var.values::<i64>().unwrap(), &[7, 8, 9, 7, 8, 9]);
    }

    #[test]
    fn test_partial_view_unit_change_fails() {
        let mut var = yx();
        let mut row = var.slice_mut(Slice::at(Dim::Y, 0)).unwrap();
        assert!(row.set_unit(Unit::M).is_ok());
        assert_eq!(row.set_unit(Unit::S).unwrap_err().kind(), ErrorKind::UnitMismatch);
        let mut whole = var.view_mut();
        whole.set_unit(Unit::S).unwrap();
        assert_eq!(var.unit(), Unit::S);
    }

    #[test]
    fn test_set_variances_through_view() {
        let mut var = yx();
        let variances = Variable::new(var.dims().clone(), Unit::M * Unit::M, vec![1i64; 6]).unwrap();
        let err = var
            .slice_mut(Slice::at(Dim::Y, 0))
            .unwrap()
            .set_variances(variances.clone())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Variances);
        var.view_mut().set_variances(variances).unwrap();
        assert!(var.has_variances());
    }
}
