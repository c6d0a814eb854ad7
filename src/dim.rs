//! Dimension labels.

use std::fmt;

/// Interned label of a dimension.
///
/// `Dim::Invalid` is the "no dimension" sentinel; it never appears in a valid
/// [`Dimensions`](crate::Dimensions) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dim {
    Invalid,
    Detector,
    DSpacing,
    Energy,
    Event,
    Position,
    Q,
    Row,
    Spectrum,
    Temperature,
    Time,
    Tof,
    Wavelength,
    X,
    Y,
    Z,
}

impl Dim {
    pub fn is_valid(self) -> bool {
        self != Dim::Invalid
    }

    pub fn name(self) -> &'static str {
        match self {
            Dim::Invalid => "Invalid",
            Dim::Detector => "Detector",
            Dim::DSpacing => "DSpacing",
            Dim::Energy => "Energy",
            Dim::Event => "Event",
            Dim::Position => "Position",
            Dim::Q => "Q",
            Dim::Row => "Row",
            Dim::Spectrum => "Spectrum",
            Dim::Temperature => "Temperature",
            Dim::Time => "Time",
            Dim::Tof => "Tof",
            Dim::Wavelength => "Wavelength",
            Dim::X => "X",
            Dim::Y => "Y",
            Dim::Z => "Z",
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dim::{}", self.name())
    }
}
