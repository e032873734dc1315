//! Mesh sizing heuristic.
//!
//! In-plane element sizes come from the most common component footprint
//! size, the through-plane size from the thinnest board layer.

use pta_core::{Axis, BoundingBox};
use pta_engine::{GlobalMeshSpec, MeshRegionSpec};
use pta_project::MeshFidelity;
use serde::Serialize;

use crate::error::{AppError, AppResult};

pub const HISTOGRAM_BINS: usize = 10;
/// Global sizes are this multiple of the local ones.
pub const GLOBAL_SCALE: f64 = 4.0;
pub const MESH_REGION: &str = "meshregion_all_objs";
pub const PRIMITIVE_LEVELS: &str = "mesh_levels_primitives";
pub const LAYER_LEVELS: &str = "mesh_levels_pcb_layers";

/// Slack around the mesh region box as a fraction of its size.
const SLACK_XY: f64 = 0.1;
const SLACK_Z: f64 = 0.25;

/// Equal-width histogram over `[min, max]`; the last bin is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub counts: Vec<usize>,
    pub edges: Vec<f64>,
}

impl Histogram {
    /// `None` for an empty sample or one with non-finite values.
    pub fn new(values: &[f64], bins: usize) -> Option<Self> {
        if values.is_empty() || bins == 0 || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = hi - lo;
        let edges: Vec<f64> = (0..=bins)
            .map(|i| lo + width * i as f64 / bins as f64)
            .collect();

        let mut counts = vec![0; bins];
        for &v in values {
            let mut i = (((v - lo) / width) * bins as f64) as usize;
            i = i.min(bins - 1);
            // rounding can land a value one bin off its edges
            if i > 0 && v < edges[i] {
                i -= 1;
            } else if i + 1 < bins && v >= edges[i + 1] {
                i += 1;
            }
            counts[i] += 1;
        }
        Some(Self { counts, edges })
    }

    /// Index of the first bin with the highest count.
    pub fn modal_bin(&self) -> usize {
        let mut best = 0;
        for (i, c) in self.counts.iter().enumerate() {
            if *c > self.counts[best] {
                best = i;
            }
        }
        best
    }

    pub fn bin_edges(&self, bin: usize) -> (f64, f64) {
        (self.edges[bin], self.edges[bin + 1])
    }
}

/// Maximum element sizes, mm, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshSizing {
    pub local: [f64; 3],
    pub global: [f64; 3],
}

/// Size from the modal bin of a sample: multiplier × (left + right edge).
fn modal_size(values: &[f64], multiplier: f64) -> Option<f64> {
    let histogram = Histogram::new(values, HISTOGRAM_BINS)?;
    let (left, right) = histogram.bin_edges(histogram.modal_bin());
    Some(multiplier * (left + right))
}

/// Sizes from component footprint extents and board layer thicknesses.
pub fn mesh_sizing(
    footprint_x: &[f64],
    footprint_y: &[f64],
    layer_thickness: &[f64],
    fidelity: MeshFidelity,
) -> AppResult<MeshSizing> {
    let (mult_xy, mult_z) = fidelity.multipliers();
    let x = modal_size(footprint_x, mult_xy).ok_or(AppError::NoComponents)?;
    let y = modal_size(footprint_y, mult_xy).ok_or(AppError::NoComponents)?;
    let thinnest = layer_thickness
        .iter()
        .copied()
        .filter(|t| t.is_finite())
        .reduce(f64::min)
        .ok_or(AppError::NoBoard)?;
    let local = [x, y, mult_z * thinnest];
    Ok(MeshSizing {
        local,
        global: local.map(|s| GLOBAL_SCALE * s),
    })
}

/// Box around the board footprint spanning the components' height, with
/// slack on every side.
pub fn mesh_region_box(board: &BoundingBox, primitives: &[BoundingBox]) -> Option<BoundingBox> {
    let z_min = primitives
        .iter()
        .map(|b| b.min[2])
        .reduce(f64::min)?;
    let z_max = primitives
        .iter()
        .map(|b| b.max[2])
        .reduce(f64::max)?;
    let core = BoundingBox {
        min: [board.min[0], board.min[1], z_min],
        max: [board.max[0], board.max[1], z_max],
    };
    let sx = SLACK_XY * core.dimension(Axis::X);
    let sy = SLACK_XY * core.dimension(Axis::Y);
    let sz = SLACK_Z * core.dimension(Axis::Z);
    Some(core.padded([sx, sx, sy, sy, sz, sz]))
}

pub fn region_spec(sizing: &MeshSizing) -> MeshRegionSpec {
    MeshRegionSpec {
        name: MESH_REGION.to_string(),
        objects: vec![MESH_REGION.to_string()],
        max_element_size: sizing.local,
        min_elements_in_gap: 2,
        min_elements_on_edge: 2,
        max_size_ratio: 2.0,
        max_levels: 2,
        buffer_layers: 1,
    }
}

pub fn global_spec(sizing: &MeshSizing) -> GlobalMeshSpec {
    GlobalMeshSpec {
        max_element_size: sizing.global,
        min_elements_in_gap: 3,
        min_elements_on_edge: 2,
        max_size_ratio: 2.0,
        optimize_pcb_mesh: true,
    }
}
