//! pta-core: shared vocabulary for the PCB thermal analyzer.
//!
//! Contains:
//! - units (uom lengths + IDF unit conversion)
//! - numeric (tolerances + number parsing for table cells)
//! - geometry (axes, flow/gravity directions, box faces)
//! - error (shared error types)

pub mod error;
pub mod geometry;
pub mod numeric;
pub mod units;

pub use error::CoreError;
pub use geometry::*;
pub use numeric::*;
pub use units::*;
