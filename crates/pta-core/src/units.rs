// pta-core/src/units.rs

use uom::si::f64::Length as UomLength;
use uom::si::length::{mil, millimeter};

use crate::CoreError;

pub type Length = UomLength;

/// Length units that appear in IDF headers and library records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IdfUnit {
    /// Thousandths of an inch (IDF `THOU`, a.k.a. mil).
    #[default]
    Thou,
    Mm,
}

impl IdfUnit {
    pub fn parse(token: &str) -> Result<Self, CoreError> {
        match token.trim().to_ascii_uppercase().as_str() {
            "THOU" | "MIL" => Ok(Self::Thou),
            "MM" => Ok(Self::Mm),
            other => Err(CoreError::UnknownUnit(other.to_string())),
        }
    }

    pub fn length(self, v: f64) -> Length {
        match self {
            Self::Thou => thou(v),
            Self::Mm => mm(v),
        }
    }

    /// Convert a raw value in this unit to millimetres.
    pub fn to_mm(self, v: f64) -> f64 {
        round_mm(in_mm(self.length(v)))
    }
}

/// Steps per millimetre kept after a unit conversion (nanometre grid).
///
/// Going through SI metres leaves float noise in the last bits; snapping to
/// this grid keeps `10 thou == 0.254 mm` exact in the serialized table.
pub const STEPS_PER_MM: f64 = 1e9;

#[inline]
pub fn thou(v: f64) -> Length {
    Length::new::<mil>(v)
}

#[inline]
pub fn mm(v: f64) -> Length {
    Length::new::<millimeter>(v)
}

#[inline]
pub fn in_mm(l: Length) -> f64 {
    l.get::<millimeter>()
}

#[inline]
fn round_mm(v: f64) -> f64 {
    (v * STEPS_PER_MM).round() / STEPS_PER_MM
}
