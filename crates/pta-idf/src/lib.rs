//! pta-idf: IDF board/library parsing.
//!
//! Reads the `.PLACEMENT` block of a board file (`.emn`/`.bdf`) and the
//! `.ELECTRICAL` blocks of its library file (`.emp`/`.ldf`) into component
//! records with their placement side, designator family and height.

use core::fmt;
use core::str::FromStr;
use std::collections::HashMap;

pub use pta_core::IdfUnit;

mod board;
mod designator;
mod error;
mod files;
mod library;
pub mod token;

pub use board::parse_board;
pub use designator::{DesignatorType, classify_designator};
pub use error::{IdfError, IdfResult};
pub use files::{library_path_for, load_pair, read_board, read_library};
pub use library::parse_library;

/// Substituted for an empty quoted name field.
pub const NOPARTNAME: &str = "NOPARTNAME";

/// Designator IDF writers use for parts without a reference designator.
pub const NOREFDES: &str = "NOREFDES";

/// Board side a component is mounted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Top => "TOP",
            Side::Bottom => "BOTTOM",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "TOP" => Ok(Side::Top),
            "BOTTOM" => Ok(Side::Bottom),
            other => Err(other.to_string()),
        }
    }
}

/// Identity of one placed component.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentRecord {
    pub package_name: String,
    pub part_name: String,
    pub instance_name: String,
    pub placement: Side,
    pub designator_type: DesignatorType,
}

impl ComponentRecord {
    pub fn has_designator(&self) -> bool {
        self.instance_name != NOREFDES
    }
}

/// Placement coordinates, converted to millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PlacementLocation {
    pub x_mm: f64,
    pub y_mm: f64,
    pub offset_mm: f64,
    pub rotation_deg: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedComponent {
    pub record: ComponentRecord,
    pub location: PlacementLocation,
}

/// Planar bounding rectangle of an outline loop, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extents {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub(crate) fn include(this: &mut Option<Extents>, x: f64, y: f64) {
        match this {
            Some(e) => {
                e.min_x = e.min_x.min(x);
                e.min_y = e.min_y.min(y);
                e.max_x = e.max_x.max(x);
                e.max_y = e.max_y.max(y);
            }
            None => {
                *this = Some(Extents {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                })
            }
        }
    }
}

/// Parsed board file.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Board {
    pub units: IdfUnit,
    pub thickness_mm: Option<f64>,
    pub outline: Option<Extents>,
    pub components: Vec<PlacedComponent>,
}

impl Board {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.components.iter().map(|c| &c.record)
    }
}

/// One `.ELECTRICAL` library definition.
#[derive(Clone, Debug, PartialEq)]
pub struct LibraryEntry {
    pub package_name: String,
    pub part_name: String,
    pub height_mm: f64,
    pub outline: Option<Extents>,
}

/// Parsed library file, indexed by part name.
#[derive(Clone, Debug, Default)]
pub struct Library {
    entries: Vec<LibraryEntry>,
    by_part: HashMap<String, usize>,
}

impl Library {
    pub fn new(entries: Vec<LibraryEntry>) -> Self {
        // later definitions of the same part replace earlier ones
        let by_part = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.part_name.clone(), i))
            .collect();
        Self { entries, by_part }
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn entry(&self, part_name: &str) -> Option<&LibraryEntry> {
        self.by_part.get(part_name).map(|i| &self.entries[*i])
    }

    /// Height for a part, 0 when the library has no such part.
    pub fn height_of(&self, part_name: &str) -> f64 {
        self.entry(part_name).map(|e| e.height_mm).unwrap_or(0.0)
    }
}
