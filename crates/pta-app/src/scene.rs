//! Box geometry for a parsed IDF board, used to drive a dry run.
//!
//! Footprints come from the library outlines rotated to their placement;
//! the board is a two-layer stack sharing the outline's footprint.

use pta_core::BoundingBox;
use pta_engine::{IDF_BOARD_OUTLINE, IDF_MECH_PREFIX, Scene};
use pta_idf::{Board, Extents, Library, PlacedComponent, Side};

use crate::mapping::block_name;

pub const TOP_LAYER: &str = "L1_TOP";
pub const BOTTOM_LAYER: &str = "L2_BOTTOM";

/// Board thickness when the board file does not give one, mm.
pub const DEFAULT_THICKNESS_MM: f64 = 1.6;
/// Footprint of a part missing from the library, mm.
const DEFAULT_FOOTPRINT_MM: f64 = 1.0;
/// Bodies are never flatter than this, mm.
const MIN_HEIGHT_MM: f64 = 0.1;
/// Margin around the components when the board has no outline, mm.
const OUTLINE_MARGIN_MM: f64 = 5.0;

fn default_outline() -> Extents {
    let half = DEFAULT_FOOTPRINT_MM / 2.0;
    Extents {
        min_x: -half,
        min_y: -half,
        max_x: half,
        max_y: half,
    }
}

/// Outline rotated about the part origin, then moved to the placement.
fn placed_footprint(outline: &Extents, component: &PlacedComponent) -> Extents {
    let loc = &component.location;
    let (sin, cos) = loc.rotation_deg.to_radians().sin_cos();
    let corners = [
        (outline.min_x, outline.min_y),
        (outline.max_x, outline.min_y),
        (outline.max_x, outline.max_y),
        (outline.min_x, outline.max_y),
    ];
    let mut placed = Extents {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for (x, y) in corners {
        let px = loc.x_mm + x * cos - y * sin;
        let py = loc.y_mm + x * sin + y * cos;
        placed.min_x = placed.min_x.min(px);
        placed.min_y = placed.min_y.min(py);
        placed.max_x = placed.max_x.max(px);
        placed.max_y = placed.max_y.max(py);
    }
    placed
}

fn extruded(footprint: &Extents, z_min: f64, height: f64) -> BoundingBox {
    BoundingBox {
        min: [footprint.min_x, footprint.min_y, z_min],
        max: [footprint.max_x, footprint.max_y, z_min + height],
    }
}

/// Bodies an IDF import of `board` would create, plus a two-layer stack for
/// a layout import.
///
/// Top parts sit on the upper board surface raised by their placement
/// offset; bottom parts hang below the lower surface. Parts without a
/// designator become `idf_mech_<n>` bodies.
pub fn scene_from_idf(board: &Board, library: &Library) -> Scene {
    let thickness = board
        .thickness_mm
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(DEFAULT_THICKNESS_MM);

    let mut bodies = Vec::with_capacity(board.components.len());
    let mut mech = 0;
    for component in &board.components {
        let record = &component.record;
        let entry = library.entry(&record.part_name);
        let outline = entry
            .and_then(|e| e.outline)
            .unwrap_or_else(default_outline);
        let height = entry
            .map(|e| e.height_mm)
            .unwrap_or(0.0)
            .max(MIN_HEIGHT_MM);
        let footprint = placed_footprint(&outline, component);
        let offset = component.location.offset_mm;
        let bbox = match record.placement {
            Side::Top => extruded(&footprint, thickness + offset, height),
            Side::Bottom => extruded(&footprint, -offset - height, height),
        };
        let name = if record.has_designator() {
            block_name(&record.instance_name)
        } else {
            mech += 1;
            format!("{IDF_MECH_PREFIX}_{mech}")
        };
        bodies.push((name, bbox, footprint));
    }

    let outline = board.outline.unwrap_or_else(|| {
        bodies
            .iter()
            .map(|(_, _, f)| *f)
            .reduce(|a, b| Extents {
                min_x: a.min_x.min(b.min_x),
                min_y: a.min_y.min(b.min_y),
                max_x: a.max_x.max(b.max_x),
                max_y: a.max_y.max(b.max_y),
            })
            .map(|e| Extents {
                min_x: e.min_x - OUTLINE_MARGIN_MM,
                min_y: e.min_y - OUTLINE_MARGIN_MM,
                max_x: e.max_x + OUTLINE_MARGIN_MM,
                max_y: e.max_y + OUTLINE_MARGIN_MM,
            })
            .unwrap_or(Extents {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 100.0,
                max_y: 100.0,
            })
    });

    let half = thickness / 2.0;
    let mut scene = Scene::new()
        .with_layer(TOP_LAYER, extruded(&outline, half, half))
        .with_layer(BOTTOM_LAYER, extruded(&outline, 0.0, half))
        .with_body(IDF_BOARD_OUTLINE, extruded(&outline, 0.0, thickness));
    for (name, bbox, _) in bodies {
        scene = scene.with_body(name, bbox);
    }
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use pta_idf::{ComponentRecord, LibraryEntry, PlacementLocation, classify_designator};

    fn placed(name: &str, part: &str, side: Side, x: f64, y: f64, rot: f64) -> PlacedComponent {
        PlacedComponent {
            record: ComponentRecord {
                package_name: "PKG".into(),
                part_name: part.into(),
                instance_name: name.into(),
                placement: side,
                designator_type: classify_designator(name),
            },
            location: PlacementLocation {
                x_mm: x,
                y_mm: y,
                offset_mm: 0.0,
                rotation_deg: rot,
            },
        }
    }

    fn library() -> Library {
        Library::new(vec![LibraryEntry {
            package_name: "QFN".into(),
            part_name: "MCU".into(),
            height_mm: 0.9,
            outline: Some(Extents {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 4.0,
                max_y: 2.0,
            }),
        }])
    }

    fn body<'a>(scene: &'a Scene, name: &str) -> &'a BoundingBox {
        &scene
            .idf_bodies
            .iter()
            .find(|b| b.name == name)
            .unwrap()
            .bbox
    }

    #[test]
    fn parts_sit_on_their_board_side() {
        let board = Board {
            units: Default::default(),
            thickness_mm: Some(1.0),
            outline: Some(Extents {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 50.0,
                max_y: 40.0,
            }),
            components: vec![
                placed("U1", "MCU", Side::Top, 10.0, 10.0, 0.0),
                placed("R-1", "UNKNOWN", Side::Bottom, 20.0, 5.0, 0.0),
            ],
        };
        let scene = scene_from_idf(&board, &library());

        let u1 = body(&scene, "U1");
        assert_eq!(u1.min, [10.0, 10.0, 1.0]);
        assert!((u1.max[2] - 1.9).abs() < 1e-12);

        let r1 = body(&scene, "R_1");
        assert_eq!(r1.max[2], 0.0);
        assert!((r1.min[2] + MIN_HEIGHT_MM).abs() < 1e-12);
        assert_eq!(r1.min[0], 19.5);

        assert_eq!(scene.board_layers[0].name, TOP_LAYER);
        assert_eq!(scene.board_layers[0].bbox.min[2], 0.5);
        assert_eq!(body(&scene, IDF_BOARD_OUTLINE).max, [50.0, 40.0, 1.0]);
    }

    #[test]
    fn rotation_swaps_footprint_axes() {
        let board = Board {
            units: Default::default(),
            thickness_mm: None,
            outline: None,
            components: vec![placed("U1", "MCU", Side::Top, 10.0, 10.0, 90.0)],
        };
        let scene = scene_from_idf(&board, &library());
        let u1 = body(&scene, "U1");
        assert!((u1.min[0] - 8.0).abs() < 1e-9);
        assert!((u1.max[0] - 10.0).abs() < 1e-9);
        assert!((u1.max[1] - 14.0).abs() < 1e-9);
        assert_eq!(u1.min[2], DEFAULT_THICKNESS_MM);

        // outline falls back to the parts plus a margin
        let outline = body(&scene, IDF_BOARD_OUTLINE);
        assert!((outline.min[0] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn parts_without_designator_are_mechanical() {
        let board = Board {
            units: Default::default(),
            thickness_mm: Some(1.6),
            outline: None,
            components: vec![
                placed(pta_idf::NOREFDES, "MCU", Side::Top, 0.0, 0.0, 0.0),
                placed(pta_idf::NOREFDES, "MCU", Side::Top, 5.0, 0.0, 0.0),
            ],
        };
        let scene = scene_from_idf(&board, &library());
        let names: Vec<_> = scene.idf_bodies.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["IDF_BoardOutline", "idf_mech_1", "idf_mech_2"]);
    }
}
