//! Simulation settings schema.

use pta_core::Direction;
use serde::{Deserialize, Serialize};

/// Current settings file version.
pub const LATEST_VERSION: u32 = 1;

pub const MIN_PROCESSORS: u32 = 1;
pub const MAX_PROCESSORS: u32 = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Base name of the solver project file; may be left empty in a draft.
    #[serde(default)]
    pub project_name: String,
    /// Solver release, e.g. `2023 R1`.
    #[serde(default = "default_release")]
    pub release: String,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    #[serde(default = "default_processors")]
    pub processors: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convection: Option<ConvectionDef>,
    #[serde(default)]
    pub flow_regime: FlowRegime,
    #[serde(default)]
    pub turbulence_model: TurbulenceModel,
    #[serde(default)]
    pub mesh_fidelity: MeshFidelity,
    #[serde(default)]
    pub options: SetupOptions,
}

fn default_version() -> u32 {
    LATEST_VERSION
}

fn default_release() -> String {
    "2023 R1".to_string()
}

fn default_processors() -> u32 {
    MIN_PROCESSORS
}

impl SimulationSettings {
    /// Forced-convection starting point written by `settings init`.
    pub fn template(project_name: &str) -> Self {
        Self {
            version: LATEST_VERSION,
            project_name: project_name.to_string(),
            release: default_release(),
            execution_mode: ExecutionMode::default(),
            processors: default_processors(),
            convection: Some(ConvectionDef::Forced {
                direction: Direction::PosX,
                speed_m_s: Some(1.0),
                inlet_temperature_c: Some(20.0),
            }),
            flow_regime: FlowRegime::default(),
            turbulence_model: TurbulenceModel::default(),
            mesh_fidelity: MeshFidelity::default(),
            options: SetupOptions::default(),
        }
    }

    /// Release in the solver's dotted form: `2023 R1` becomes `2023.1`.
    pub fn normalized_release(&self) -> String {
        let release = self.release.trim();
        match release.split_once(" R") {
            Some((year, rev)) => format!("{}.{}", year.trim(), rev.trim()),
            None => release.to_string(),
        }
    }

    /// Project file name with the solver's extension.
    pub fn project_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.project_name, extension)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Graphical,
    NonGraphical,
}

impl ExecutionMode {
    pub fn is_graphical(self) -> bool {
        matches!(self, ExecutionMode::Graphical)
    }
}

/// Air flow around the board. Values are optional so a draft can be saved
/// and the missing ones reported before a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvectionDef {
    Forced {
        direction: Direction,
        #[serde(default)]
        speed_m_s: Option<f64>,
        #[serde(default)]
        inlet_temperature_c: Option<f64>,
    },
    Natural {
        gravity: Direction,
        #[serde(default)]
        ambient_temperature_c: Option<f64>,
    },
}

impl ConvectionDef {
    /// Air temperature at the inlet or in the surroundings.
    pub fn air_temperature_c(&self) -> Option<f64> {
        match self {
            ConvectionDef::Forced {
                inlet_temperature_c,
                ..
            } => *inlet_temperature_c,
            ConvectionDef::Natural {
                ambient_temperature_c,
                ..
            } => *ambient_temperature_c,
        }
    }

    /// Names of required values that are not set.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self {
            ConvectionDef::Forced {
                speed_m_s,
                inlet_temperature_c,
                ..
            } => {
                if speed_m_s.is_none() {
                    missing.push("speed_m_s");
                }
                if inlet_temperature_c.is_none() {
                    missing.push("inlet_temperature_c");
                }
            }
            ConvectionDef::Natural {
                ambient_temperature_c,
                ..
            } => {
                if ambient_temperature_c.is_none() {
                    missing.push("ambient_temperature_c");
                }
            }
        }
        missing
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowRegime {
    Laminar,
    #[default]
    Turbulent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurbulenceModel {
    #[default]
    ZeroEquation,
    /// Enhanced realizable k-epsilon.
    TwoEquation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshFidelity {
    #[default]
    Coarse,
    Medium,
    Fine,
}

impl MeshFidelity {
    /// In-plane and through-plane element size multipliers.
    pub fn multipliers(self) -> (f64, f64) {
        match self {
            MeshFidelity::Coarse => (0.5, 8.0),
            MeshFidelity::Medium => (0.25, 4.0),
            MeshFidelity::Fine => (0.1, 2.0),
        }
    }
}

/// How the board-facing face of a component is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardSideMethod {
    /// Bottom face for TOP parts, top face for BOTTOM parts.
    #[default]
    Placement,
    /// Face touching the outer board layers.
    TouchingFace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupOptions {
    /// Delete excluded components instead of marking them non-model.
    #[serde(default)]
    pub hard_delete_excluded: bool,
    /// Create a board-side monitor point for every component.
    #[serde(default)]
    pub points_for_all_components: bool,
    /// Mesh and solve after setup.
    #[serde(default)]
    pub solve: bool,
    #[serde(default)]
    pub board_side: BoardSideMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_is_normalized() {
        let mut s = SimulationSettings::template("demo");
        assert_eq!(s.normalized_release(), "2023.1");
        s.release = "2023 R2".into();
        assert_eq!(s.normalized_release(), "2023.2");
        s.release = "2024.1".into();
        assert_eq!(s.normalized_release(), "2024.1");
    }

    #[test]
    fn minimal_yaml_takes_defaults() {
        let s: SimulationSettings = serde_yaml::from_str(
            "project_name: demo\nconvection:\n  type: natural\n  gravity: \"-Z\"\n",
        )
        .unwrap();
        assert_eq!(s.processors, 1);
        assert_eq!(s.flow_regime, FlowRegime::Turbulent);
        assert_eq!(s.mesh_fidelity, MeshFidelity::Coarse);
        assert_eq!(s.options.board_side, BoardSideMethod::Placement);
        let conv = s.convection.unwrap();
        assert_eq!(conv.missing(), vec!["ambient_temperature_c"]);
    }

    #[test]
    fn fidelity_multipliers() {
        assert_eq!(MeshFidelity::Coarse.multipliers(), (0.5, 8.0));
        assert_eq!(MeshFidelity::Medium.multipliers(), (0.25, 4.0));
        assert_eq!(MeshFidelity::Fine.multipliers(), (0.1, 2.0));
    }
}
