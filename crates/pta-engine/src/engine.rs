//! The capability interface to an electronics-cooling solver session.

use std::path::Path;

use pta_core::{BoundingBox, BoxFace};

use crate::error::EngineResult;
use crate::types::*;

/// Operations the orchestrator and the result extractor need from a solver.
///
/// Object names are the solver's body names. Lengths are millimetres and
/// temperatures degrees Celsius. Calls other than `launch`, `open_project`
/// and `process_id` fail with [`EngineError::NoSession`] before a session
/// has been started.
///
/// [`EngineError::NoSession`]: crate::EngineError::NoSession
pub trait ThermalEngine {
    // session
    fn launch(&mut self, options: &LaunchOptions) -> EngineResult<()>;
    fn open_project(&mut self, path: &Path, options: &LaunchOptions) -> EngineResult<()>;
    /// Save under a new path, or in place when `path` is `None`.
    fn save_project(&mut self, path: Option<&Path>) -> EngineResult<()>;
    fn process_id(&self) -> Option<u32>;
    fn shutdown(&mut self) -> EngineResult<()>;
    /// Extension of the solver's project files, without the dot.
    fn project_extension(&self) -> &'static str;

    // geometry
    /// Import a layout database as a layered board component; returns the
    /// component name.
    fn import_ecad(&mut self, source: &EcadSource) -> EngineResult<String>;
    fn import_idf(&mut self, board_path: &Path) -> EngineResult<()>;
    fn fit_all(&mut self) -> EngineResult<()>;
    /// Every solid body, including the domain.
    fn solid_bodies(&mut self) -> EngineResult<Vec<SolidInfo>>;
    fn object(&mut self, name: &str) -> EngineResult<SolidInfo>;
    /// Board layer bodies, sorted by name; the first is the top layer and the
    /// last the bottom layer.
    fn board_layers(&mut self) -> EngineResult<Vec<String>>;
    /// Bodies that take part in the solve, including the domain.
    fn model_objects(&mut self) -> EngineResult<Vec<String>>;
    fn delete(&mut self, names: &[String]) -> EngineResult<()>;
    fn set_model(&mut self, name: &str, model: bool) -> EngineResult<()>;
    fn move_objects(&mut self, names: &[String], vector: [f64; 3]) -> EngineResult<()>;
    /// Face of `object` lying against `other`, if the two touch.
    fn touching_face(&mut self, object: &str, other: &str) -> EngineResult<Option<BoxFace>>;
    fn create_box(&mut self, name: &str, bbox: BoundingBox, model: bool) -> EngineResult<()>;
    fn region_faces(&mut self) -> EngineResult<Vec<RegionFace>>;
    /// Domain padding per face as a percentage of the model extent, in the
    /// order -X, +X, -Y, +Y, -Z, +Z.
    fn set_region_padding(&mut self, percent: [f64; 6]) -> EngineResult<()>;

    // materials and boundaries
    fn add_material(&mut self, name: &str, conductivity: f64) -> EngineResult<()>;
    fn delete_all_boundaries(&mut self) -> EngineResult<()>;
    fn delete_all_points(&mut self) -> EngineResult<()>;
    fn assign_boundary(&mut self, name: &str, spec: &BoundarySpec) -> EngineResult<()>;
    fn boundaries(&mut self) -> EngineResult<Vec<BoundaryInfo>>;
    fn create_point_monitor(&mut self, name: &str, position: [f64; 3]) -> EngineResult<()>;
    fn monitor_names(&mut self) -> EngineResult<Vec<String>>;
    /// Meshing priorities; higher numbers win where bodies overlap.
    fn set_priorities(&mut self, priorities: &[(String, u32)]) -> EngineResult<()>;

    // mesh and solve
    fn assign_mesh_region(&mut self, spec: &MeshRegionSpec) -> EngineResult<()>;
    fn assign_mesh_levels(&mut self, name: &str, levels: &[(String, u32)]) -> EngineResult<()>;
    fn set_global_mesh(&mut self, spec: &GlobalMeshSpec) -> EngineResult<()>;
    fn create_setup(&mut self, setup: &SolverSetup) -> EngineResult<()>;
    fn apply_ambient(&mut self, ambient: &AmbientSpec) -> EngineResult<()>;
    fn generate_mesh(&mut self, setup: &str) -> EngineResult<()>;
    fn analyze(&mut self, setup: &str, cores: u32, tasks: u32) -> EngineResult<()>;

    // results
    fn solution_name(&mut self) -> EngineResult<String>;
    fn define_field_expression(&mut self, expression: &FieldExpression) -> EngineResult<()>;
    /// Create (or replace) a data-table report and export it as CSV to `path`.
    fn export_report(&mut self, request: &ReportRequest, path: &Path) -> EngineResult<()>;
    /// Create a contour plot and export it as PNG to `path`.
    fn export_field_plot(&mut self, request: &FieldPlotRequest, path: &Path) -> EngineResult<()>;
}
