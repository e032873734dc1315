//! Table row to boundary conditions.

use std::sync::LazyLock;

use pta_bc::{BcRow, BcType};
use pta_core::BoxFace;
use pta_engine::{BoundarySpec, CERAMIC_SURFACE};
use regex::Regex;
use serde::Serialize;

use crate::error::{AppError, AppResult};

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W").expect("non-word pattern is valid"));

/// Solver body name of a designator: every non-word character becomes `_`.
pub fn block_name(instance_name: &str) -> String {
    NON_WORD.replace_all(instance_name, "_").into_owned()
}

/// Name of the monitor point on a component's board side.
pub fn point_name(object: &str) -> String {
    format!("point_{object}")
}

/// One boundary condition to create, with its name in the solver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryAssignment {
    pub name: String,
    pub spec: BoundarySpec,
}

fn required(row: &BcRow, value: Option<f64>, column: &str) -> AppResult<f64> {
    value.ok_or_else(|| {
        AppError::row(
            &row.instance_name,
            format!("{column} is required for a {} block", row.bc_type),
        )
    })
}

/// Boundary conditions for one included row.
///
/// `board_face` is the face of the component lying against the board; a
/// network's case node sits on the opposite face.
pub fn map_row(row: &BcRow, board_face: BoxFace) -> AppResult<Vec<BoundaryAssignment>> {
    let object = block_name(&row.instance_name);
    let mut out = Vec::new();
    match row.bc_type {
        BcType::Block => {
            let power_w = required(row, row.power_w, "Power [W]")?;
            if power_w != 0.0 {
                out.push(BoundaryAssignment {
                    name: object.clone(),
                    spec: BoundarySpec::SourceBlock {
                        object: object.clone(),
                        power_w,
                    },
                });
            }
            if !row.material.is_empty() {
                out.push(BoundaryAssignment {
                    name: format!("{object}_material"),
                    spec: BoundarySpec::MaterialAssignment {
                        object: object.clone(),
                        material: row.material.clone(),
                        surface_material: CERAMIC_SURFACE.to_string(),
                    },
                });
            }
        }
        BcType::Network => {
            let power_w = required(row, row.power_w, "Power [W]")?;
            let r_jb = required(row, row.r_jb, "R_jb [C/W]")?;
            let r_jc = required(row, row.r_jc, "R_jc [C/W]")?;
            if r_jb <= 0.0 || r_jc <= 0.0 {
                return Err(AppError::row(
                    &row.instance_name,
                    "network resistances must be positive",
                ));
            }
            out.push(BoundaryAssignment {
                name: object.clone(),
                spec: BoundarySpec::TwoResistorNetwork {
                    object: object.clone(),
                    board_face,
                    case_face: board_face.opposite(),
                    r_jb,
                    r_jc,
                    power_w,
                },
            });
        }
        BcType::Hollow => {
            let power_w = required(row, row.power_w, "Power [W]")?;
            out.push(BoundaryAssignment {
                name: object.clone(),
                spec: BoundarySpec::SourceBlock {
                    object: object.clone(),
                    power_w,
                },
            });
            out.push(BoundaryAssignment {
                name: format!("{object}_solve_inside"),
                spec: BoundarySpec::SolveInside {
                    object,
                    solve_inside: false,
                },
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pta_idf::{ComponentRecord, DesignatorType, Side};
    use proptest::prelude::*;

    fn row(instance: &str, bc_type: BcType) -> BcRow {
        let record = ComponentRecord {
            package_name: "PKG".into(),
            part_name: "PART".into(),
            instance_name: instance.into(),
            placement: Side::Top,
            designator_type: DesignatorType::IntegratedCircuit,
        };
        let mut row = BcRow::from_record(&record, 1.0);
        row.bc_type = bc_type;
        row
    }

    #[test]
    fn block_names_replace_non_word_characters() {
        assert_eq!(block_name("U1"), "U1");
        assert_eq!(block_name("J1-A.2"), "J1_A_2");
        assert_eq!(point_name("U1"), "point_U1");
    }

    #[test]
    fn zero_power_block_gets_material_only() {
        let specs = map_row(&row("U1", BcType::Block), BoxFace::bottom_z()).unwrap();
        assert_eq!(specs.len(), 1);
        assert!(matches!(
            &specs[0].spec,
            BoundarySpec::MaterialAssignment { material, surface_material, .. }
                if material == "Ceramic_material" && surface_material == CERAMIC_SURFACE
        ));
    }

    #[test]
    fn powered_block_without_material() {
        let mut r = row("U1", BcType::Block);
        r.power_w = Some(2.5);
        r.material.clear();
        let specs = map_row(&r, BoxFace::bottom_z()).unwrap();
        assert_eq!(
            specs,
            vec![BoundaryAssignment {
                name: "U1".into(),
                spec: BoundarySpec::SourceBlock {
                    object: "U1".into(),
                    power_w: 2.5
                },
            }]
        );
    }

    #[test]
    fn network_uses_board_face_and_opposite() {
        let mut r = row("U7", BcType::Network);
        r.power_w = Some(1.0);
        r.r_jb = Some(4.0);
        r.r_jc = Some(12.0);
        let specs = map_row(&r, BoxFace::top_z()).unwrap();
        match &specs[..] {
            [BoundaryAssignment {
                spec:
                    BoundarySpec::TwoResistorNetwork {
                        board_face,
                        case_face,
                        ..
                    },
                ..
            }] => {
                assert_eq!(*board_face, BoxFace::top_z());
                assert_eq!(*case_face, BoxFace::bottom_z());
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn hollow_excludes_interior() {
        let mut r = row("Q1", BcType::Hollow);
        r.power_w = Some(0.0);
        let specs = map_row(&r, BoxFace::bottom_z()).unwrap();
        assert_eq!(specs.len(), 2);
        assert!(matches!(
            specs[1].spec,
            BoundarySpec::SolveInside {
                solve_inside: false,
                ..
            }
        ));
    }

    #[test]
    fn missing_numbers_are_row_errors() {
        let mut r = row("U2", BcType::Network);
        r.r_jb = None;
        let err = map_row(&r, BoxFace::bottom_z()).unwrap_err();
        assert!(matches!(err, AppError::RowConfig { ref designator, .. } if designator == "U2"));
        assert!(err.to_string().contains("R_jb"));

        let mut r = row("U3", BcType::Block);
        r.power_w = None;
        assert!(map_row(&r, BoxFace::bottom_z()).is_err());
    }

    proptest! {
        #[test]
        fn block_names_are_word_characters(name in "[ -~]{0,16}") {
            let cleaned = block_name(&name);
            prop_assert!(cleaned.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            prop_assert_eq!(cleaned.chars().count(), name.chars().count());
        }
    }
}
