//! Axis-aligned geometry vocabulary shared by the orchestrator and the engine.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Which end of an axis a face sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum End {
    Min,
    Max,
}

/// One of the six faces of an axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxFace {
    pub axis: Axis,
    pub end: End,
}

impl BoxFace {
    pub const fn new(axis: Axis, end: End) -> Self {
        Self { axis, end }
    }

    pub const fn bottom_z() -> Self {
        Self::new(Axis::Z, End::Min)
    }

    pub const fn top_z() -> Self {
        Self::new(Axis::Z, End::Max)
    }

    pub fn opposite(self) -> Self {
        let end = match self.end {
            End::Min => End::Max,
            End::Max => End::Min,
        };
        Self::new(self.axis, end)
    }

    /// All six faces in a fixed order: -X, +X, -Y, +Y, -Z, +Z.
    pub fn all() -> [BoxFace; 6] {
        [
            Self::new(Axis::X, End::Min),
            Self::new(Axis::X, End::Max),
            Self::new(Axis::Y, End::Min),
            Self::new(Axis::Y, End::Max),
            Self::new(Axis::Z, End::Min),
            Self::new(Axis::Z, End::Max),
        ]
    }
}

impl fmt::Display for BoxFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.end {
            End::Min => '-',
            End::Max => '+',
        };
        write!(f, "{}{:?}", sign, self.axis)
    }
}

/// A signed axis direction, as used for inlet flow and gravity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    #[cfg_attr(feature = "serde", serde(rename = "+X"))]
    PosX,
    #[cfg_attr(feature = "serde", serde(rename = "-X"))]
    NegX,
    #[cfg_attr(feature = "serde", serde(rename = "+Y"))]
    PosY,
    #[cfg_attr(feature = "serde", serde(rename = "-Y"))]
    NegY,
    #[cfg_attr(feature = "serde", serde(rename = "+Z"))]
    PosZ,
    #[cfg_attr(feature = "serde", serde(rename = "-Z"))]
    NegZ,
}

impl Direction {
    pub fn axis(self) -> Axis {
        match self {
            Direction::PosX | Direction::NegX => Axis::X,
            Direction::PosY | Direction::NegY => Axis::Y,
            Direction::PosZ | Direction::NegZ => Axis::Z,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Direction::PosX | Direction::PosY | Direction::PosZ)
    }

    pub fn sign(self) -> f64 {
        if self.is_positive() { 1.0 } else { -1.0 }
    }

    /// The face a flow travelling in this direction enters through.
    pub fn upstream_face(self) -> BoxFace {
        let end = if self.is_positive() { End::Min } else { End::Max };
        BoxFace::new(self.axis(), end)
    }

    /// Unit vector scaled by `magnitude`.
    pub fn vector(self, magnitude: f64) -> [f64; 3] {
        let mut v = [0.0; 3];
        v[self.axis().index()] = self.sign() * magnitude;
        v
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_positive() { '+' } else { '-' };
        write!(f, "{}{:?}", sign, self.axis())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "+X" | "X" => Ok(Direction::PosX),
            "-X" => Ok(Direction::NegX),
            "+Y" | "Y" => Ok(Direction::PosY),
            "-Y" => Ok(Direction::NegY),
            "+Z" | "Z" => Ok(Direction::PosZ),
            "-Z" => Ok(Direction::NegZ),
            _ => Err(CoreError::UnknownDirection(s.to_string())),
        }
    }
}

/// Axis-aligned bounding box in model units (mm).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Build from a corner and non-negative sizes.
    pub fn from_origin_size(origin: [f64; 3], size: [f64; 3]) -> Self {
        Self {
            min: origin,
            max: [
                origin[0] + size[0],
                origin[1] + size[1],
                origin[2] + size[2],
            ],
        }
    }

    pub fn dimension(&self, axis: Axis) -> f64 {
        let i = axis.index();
        self.max[i] - self.min[i]
    }

    pub fn volume(&self) -> f64 {
        Axis::ALL.iter().map(|a| self.dimension(*a)).product()
    }

    pub fn translated(&self, offset: [f64; 3]) -> Self {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] += offset[i];
            out.max[i] += offset[i];
        }
        out
    }

    /// Coordinate of the plane a face lies in.
    pub fn face_coordinate(&self, face: BoxFace) -> f64 {
        let i = face.axis.index();
        match face.end {
            End::Min => self.min[i],
            End::Max => self.max[i],
        }
    }

    pub fn face_center(&self, face: BoxFace) -> [f64; 3] {
        let mut c = [0.0; 3];
        for axis in Axis::ALL {
            let i = axis.index();
            c[i] = if axis == face.axis {
                self.face_coordinate(face)
            } else {
                0.5 * (self.min[i] + self.max[i])
            };
        }
        c
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> Self {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    /// Grow by per-face amounts in the order -X, +X, -Y, +Y, -Z, +Z.
    pub fn padded(&self, pad: [f64; 6]) -> Self {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] -= pad[2 * i];
            out.max[i] += pad[2 * i + 1];
        }
        out
    }

    /// Face of `self` lying in the same plane as a face of `other`, with the
    /// two boxes overlapping across that plane.
    pub fn touching_face(&self, other: &BoundingBox, eps: f64) -> Option<BoxFace> {
        for face in BoxFace::all() {
            let here = self.face_coordinate(face);
            let there = other.face_coordinate(face.opposite());
            if (here - there).abs() > eps {
                continue;
            }
            let overlaps = Axis::ALL
                .iter()
                .filter(|a| **a != face.axis)
                .all(|a| {
                    let i = a.index();
                    self.min[i] < other.max[i] - eps && other.min[i] < self.max[i] - eps
                });
            if overlaps {
                return Some(face);
            }
        }
        None
    }
}
