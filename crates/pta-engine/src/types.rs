//! Values exchanged with a solver session.

use std::path::{Path, PathBuf};

use pta_core::{BoundingBox, BoxFace, Direction};
use serde::{Deserialize, Serialize};

/// Name the solver gives its computational domain.
pub const REGION: &str = "Region";

/// Body the IDF import creates for the bare board outline.
pub const IDF_BOARD_OUTLINE: &str = "IDF_BoardOutline";

/// Prefix of bodies the IDF import creates for mechanical parts.
pub const IDF_MECH_PREFIX: &str = "idf_mech";

/// Surface material given to every block with a bulk material.
pub const CERAMIC_SURFACE: &str = "Ceramic-surface";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOptions {
    /// Dotted release, e.g. `2023.1`.
    pub release: String,
    pub graphical: bool,
}

/// Layout database a board stack-up is imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcadKind {
    EdbFolder,
    OdbArchive,
    BrdFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcadSource {
    pub path: PathBuf,
    pub kind: EcadKind,
}

impl EcadSource {
    /// Infer the kind from the path: a directory is an EDB, `.tgz` an ODB++
    /// archive, `.brd` a board file.
    pub fn detect(path: &Path) -> Option<Self> {
        let kind = if path.is_dir() {
            EcadKind::EdbFolder
        } else {
            match path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .as_deref()
            {
                Some("tgz") => EcadKind::OdbArchive,
                Some("brd") => EcadKind::BrdFile,
                Some("def") | Some("aedb") => EcadKind::EdbFolder,
                _ => return None,
            }
        };
        Some(Self {
            path: path.to_path_buf(),
            kind,
        })
    }

    /// Base name used for the imported board component.
    pub fn component_name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("pcb")
            .to_string()
    }
}

/// A solid body in the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidInfo {
    pub name: String,
    pub bbox: BoundingBox,
    pub volume: f64,
    /// Whether the body takes part in the solve.
    pub model: bool,
}

/// A thermal or flow boundary condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundarySpec {
    /// Solid block dissipating `power_w` through its volume.
    SourceBlock { object: String, power_w: f64 },
    /// Junction node joined to the board-facing face through `r_jb` and to the
    /// opposite case face through `r_jc`.
    TwoResistorNetwork {
        object: String,
        board_face: BoxFace,
        case_face: BoxFace,
        r_jb: f64,
        r_jc: f64,
        power_w: f64,
    },
    /// Opening on a face of the domain.
    Opening { face: BoxFace, flow: OpeningFlow },
    /// Bulk and surface material of a block.
    MaterialAssignment {
        object: String,
        material: String,
        surface_material: String,
    },
    /// Whether the interior of a block is meshed and solved.
    SolveInside { object: String, solve_inside: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpeningFlow {
    /// Prescribed velocity at ambient static pressure.
    Velocity {
        velocity_m_s: [f64; 3],
        temperature_c: f64,
    },
    /// Ambient total pressure and temperature.
    Pressure,
}

/// Boundary category as reported back by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    SolidBlock,
    HollowBlock,
    Network,
    Opening,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryInfo {
    pub name: String,
    pub kind: BoundaryKind,
    pub objects: Vec<String>,
}

/// One face of the domain with the id the solver assigned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFace {
    pub id: u32,
    pub face: BoxFace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshRegionSpec {
    pub name: String,
    pub objects: Vec<String>,
    /// Maximum element size per axis, mm.
    pub max_element_size: [f64; 3],
    pub min_elements_in_gap: u32,
    pub min_elements_on_edge: u32,
    pub max_size_ratio: f64,
    pub max_levels: u32,
    pub buffer_layers: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMeshSpec {
    /// Maximum element size per axis, mm.
    pub max_element_size: [f64; 3],
    pub min_elements_in_gap: u32,
    pub min_elements_on_edge: u32,
    pub max_size_ratio: f64,
    pub optimize_pcb_mesh: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowModel {
    Laminar,
    TurbulentZeroEquation,
    /// Enhanced realizable k-epsilon.
    TurbulentTwoEquation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiationModel {
    Off,
    DiscreteOrdinates,
}

/// Steady thermal/flow solver setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSetup {
    pub name: String,
    pub flow_model: FlowModel,
    pub include_gravity: bool,
    pub radiation: RadiationModel,
    /// Initial velocity field, m/s.
    pub initial_velocity_m_s: [f64; 3],
    pub flow_convergence: f64,
    pub energy_convergence: f64,
    pub max_iterations: u32,
    /// Pressure, momentum and temperature under-relaxation.
    pub under_relaxation: [f64; 3],
    pub sequential_flow_and_energy: bool,
}

/// Ambient conditions applied to the whole design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientSpec {
    pub temperature_c: f64,
    pub gravity: Option<Direction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldQuantity {
    Temperature,
    HeatFlux,
}

impl FieldQuantity {
    /// Unit label the solver prints in report headers.
    pub fn unit(self) -> &'static str {
        match self {
            FieldQuantity::Temperature => "cel",
            FieldQuantity::HeatFlux => "W",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "over", rename_all = "snake_case")]
pub enum FieldRegion {
    Volume { object: String },
    Surface { object: String },
    Face { object: String, face: BoxFace },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOp {
    Maximum,
    Integrate,
}

/// A named field calculation usable as a report quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExpression {
    pub name: String,
    pub quantity: FieldQuantity,
    pub region: FieldRegion,
    pub op: FieldOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    Monitor,
    Fields,
}

/// A data-table report over one solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub name: String,
    pub category: ReportCategory,
    pub solution: String,
    pub quantities: Vec<String>,
}

/// A surface contour plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPlotRequest {
    pub name: String,
    pub objects: Vec<String>,
    pub quantity: FieldQuantity,
    pub solution: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecad_kind_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let edb = EcadSource::detect(dir.path()).unwrap();
        assert_eq!(edb.kind, EcadKind::EdbFolder);
        let odb = EcadSource::detect(Path::new("layout.TGZ")).unwrap();
        assert_eq!(odb.kind, EcadKind::OdbArchive);
        assert_eq!(odb.component_name(), "layout");
        assert!(EcadSource::detect(Path::new("layout.pdf")).is_none());
    }

    #[test]
    fn boundary_spec_json_is_tagged() {
        let spec = BoundarySpec::SourceBlock {
            object: "U1".into(),
            power_w: 1.5,
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"type\":\"source_block\""), "{json}");
    }
}
