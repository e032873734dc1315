//! In-memory solver session that journals every call.
//!
//! Bodies are axis-aligned boxes. Reports are filled from a fixed linear
//! response to the assigned powers (not a thermal model) so that extraction
//! paths produce stable numbers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pta_core::{Axis, BoundingBox, BoxFace};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::ThermalEngine;
use crate::error::{EngineError, EngineResult};
use crate::scene::Scene;
use crate::types::*;

const PROCESS_ID: u32 = 4242;
const DEFAULT_AMBIENT_C: f64 = 20.0;
const DEFAULT_REGION_PADDING: [f64; 6] = [50.0; 6];
const TOUCH_EPS: f64 = 1e-6;

/// Kelvin-per-watt of the fixed response used for block temperatures.
const BLOCK_RISE_PER_W: f64 = 10.0;
/// Share of a block's power reported as flowing into the board.
const BOARD_SIDE_SHARE: f64 = 0.5;

/// 1×1 grey PNG written for every exported plot.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x3a, 0x7e, 0x9b,
    0x55, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x68, 0x00, 0x00, 0x00,
    0x82, 0x00, 0x81, 0x77, 0xcd, 0x72, 0xb6, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

/// One journaled call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EngineCall {
    Launch { options: LaunchOptions },
    OpenProject { path: PathBuf, options: LaunchOptions },
    SaveProject { path: Option<PathBuf> },
    Shutdown,
    ImportEcad { source: EcadSource },
    ImportIdf { path: PathBuf },
    FitAll,
    Delete { names: Vec<String> },
    SetModel { name: String, model: bool },
    MoveObjects { names: Vec<String>, vector: [f64; 3] },
    CreateBox { name: String, bbox: BoundingBox, model: bool },
    SetRegionPadding { percent: [f64; 6] },
    AddMaterial { name: String, conductivity: f64 },
    DeleteAllBoundaries,
    DeleteAllPoints,
    AssignBoundary { name: String, spec: BoundarySpec },
    CreatePointMonitor { name: String, position: [f64; 3] },
    SetPriorities { priorities: Vec<(String, u32)> },
    AssignMeshRegion { spec: MeshRegionSpec },
    AssignMeshLevels { name: String, levels: Vec<(String, u32)> },
    SetGlobalMesh { spec: GlobalMeshSpec },
    CreateSetup { setup: SolverSetup },
    ApplyAmbient { ambient: AmbientSpec },
    GenerateMesh { setup: String },
    Analyze { setup: String, cores: u32, tasks: u32 },
    DefineFieldExpression { expression: FieldExpression },
    ExportReport { request: ReportRequest, path: PathBuf },
    ExportFieldPlot { request: FieldPlotRequest, path: PathBuf },
    /// Any read-only query.
    Query { name: String },
}

impl EngineCall {
    /// Operation name used for failure injection and logging.
    pub fn operation(&self) -> &str {
        match self {
            EngineCall::Launch { .. } => "launch",
            EngineCall::OpenProject { .. } => "open_project",
            EngineCall::SaveProject { .. } => "save_project",
            EngineCall::Shutdown => "shutdown",
            EngineCall::ImportEcad { .. } => "import_ecad",
            EngineCall::ImportIdf { .. } => "import_idf",
            EngineCall::FitAll => "fit_all",
            EngineCall::Delete { .. } => "delete",
            EngineCall::SetModel { .. } => "set_model",
            EngineCall::MoveObjects { .. } => "move_objects",
            EngineCall::CreateBox { .. } => "create_box",
            EngineCall::SetRegionPadding { .. } => "set_region_padding",
            EngineCall::AddMaterial { .. } => "add_material",
            EngineCall::DeleteAllBoundaries => "delete_all_boundaries",
            EngineCall::DeleteAllPoints => "delete_all_points",
            EngineCall::AssignBoundary { .. } => "assign_boundary",
            EngineCall::CreatePointMonitor { .. } => "create_point_monitor",
            EngineCall::SetPriorities { .. } => "set_priorities",
            EngineCall::AssignMeshRegion { .. } => "assign_mesh_region",
            EngineCall::AssignMeshLevels { .. } => "assign_mesh_levels",
            EngineCall::SetGlobalMesh { .. } => "set_global_mesh",
            EngineCall::CreateSetup { .. } => "create_setup",
            EngineCall::ApplyAmbient { .. } => "apply_ambient",
            EngineCall::GenerateMesh { .. } => "generate_mesh",
            EngineCall::Analyze { .. } => "analyze",
            EngineCall::DefineFieldExpression { .. } => "define_field_expression",
            EngineCall::ExportReport { .. } => "export_report",
            EngineCall::ExportFieldPlot { .. } => "export_field_plot",
            EngineCall::Query { name } => name,
        }
    }
}

#[derive(Debug, Clone)]
struct Body {
    name: String,
    bbox: BoundingBox,
    model: bool,
    layer: bool,
}

#[derive(Debug, Clone, Default)]
struct ModelState {
    bodies: Vec<Body>,
    region_padding: [f64; 6],
    materials: Vec<(String, f64)>,
    boundaries: Vec<(String, BoundarySpec)>,
    monitors: Vec<(String, [f64; 3])>,
    setups: Vec<SolverSetup>,
    meshed: Vec<String>,
    solved: Vec<String>,
    ambient: Option<AmbientSpec>,
    expressions: Vec<FieldExpression>,
    project: Option<PathBuf>,
}

impl ModelState {
    fn new() -> Self {
        Self {
            region_padding: DEFAULT_REGION_PADDING,
            ..Self::default()
        }
    }

    fn body(&self, name: &str) -> EngineResult<&Body> {
        self.bodies
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| EngineError::ObjectNotFound(name.to_string()))
    }

    fn body_mut(&mut self, name: &str) -> EngineResult<&mut Body> {
        self.bodies
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| EngineError::ObjectNotFound(name.to_string()))
    }

    fn bbox(&self, name: &str) -> EngineResult<BoundingBox> {
        if name == REGION {
            return self
                .region()
                .ok_or_else(|| EngineError::ObjectNotFound(name.to_string()));
        }
        Ok(self.body(name)?.bbox)
    }

    /// Domain box: all bodies padded by a percentage of their extent.
    fn region(&self) -> Option<BoundingBox> {
        let extent = self
            .bodies
            .iter()
            .map(|b| b.bbox)
            .reduce(|a, b| a.union(&b))?;
        let mut pad = [0.0; 6];
        for axis in Axis::ALL {
            let i = axis.index();
            let size = extent.dimension(axis);
            pad[2 * i] = self.region_padding[2 * i] / 100.0 * size;
            pad[2 * i + 1] = self.region_padding[2 * i + 1] / 100.0 * size;
        }
        Some(extent.padded(pad))
    }

    /// Ambient temperature, else the inlet air temperature.
    fn ambient_c(&self) -> f64 {
        if let Some(ambient) = &self.ambient {
            return ambient.temperature_c;
        }
        self.boundaries
            .iter()
            .find_map(|(_, spec)| match spec {
                BoundarySpec::Opening {
                    flow: OpeningFlow::Velocity { temperature_c, .. },
                    ..
                } => Some(*temperature_c),
                _ => None,
            })
            .unwrap_or(DEFAULT_AMBIENT_C)
    }

    fn power_of(&self, object: &str) -> f64 {
        self.boundaries
            .iter()
            .filter_map(|(_, spec)| match spec {
                BoundarySpec::SourceBlock { object: o, power_w }
                | BoundarySpec::TwoResistorNetwork {
                    object: o, power_w, ..
                } if o == object => Some(*power_w),
                _ => None,
            })
            .sum()
    }

    fn network(&self, name: &str) -> Option<(f64, f64, f64)> {
        self.boundaries.iter().find_map(|(n, spec)| match spec {
            BoundarySpec::TwoResistorNetwork {
                r_jb, r_jc, power_w, ..
            } if n == name => Some((*r_jb, *r_jc, *power_w)),
            _ => None,
        })
    }

    fn block_temperature(&self, object: &str) -> f64 {
        self.ambient_c() + BLOCK_RISE_PER_W * self.power_of(object)
    }

    /// Value and unit of a report quantity.
    fn quantity(&self, category: ReportCategory, quantity: &str) -> EngineResult<(f64, &'static str)> {
        let unknown = || EngineError::failed("export_report", format!("unknown quantity {quantity}"));
        match category {
            ReportCategory::Monitor => {
                if let Some(network) = quantity.strip_suffix(".Internal.Temperature") {
                    let (r_jb, r_jc, power) = self.network(network).ok_or_else(unknown)?;
                    let r = if r_jb + r_jc > 0.0 {
                        r_jb * r_jc / (r_jb + r_jc)
                    } else {
                        0.0
                    };
                    return Ok((self.ambient_c() + r * power, "cel"));
                }
                let point = quantity.strip_suffix(".Temperature").ok_or_else(unknown)?;
                if !self.monitors.iter().any(|(n, _)| n == point) {
                    return Err(unknown());
                }
                let object = point.strip_prefix("point_").unwrap_or(point);
                Ok((self.block_temperature(object), "cel"))
            }
            ReportCategory::Fields => {
                let expr = self
                    .expressions
                    .iter()
                    .find(|e| e.name == quantity)
                    .ok_or_else(unknown)?;
                let object = match &expr.region {
                    FieldRegion::Volume { object }
                    | FieldRegion::Surface { object }
                    | FieldRegion::Face { object, .. } => object,
                };
                let value = match expr.quantity {
                    FieldQuantity::Temperature => self.block_temperature(object),
                    FieldQuantity::HeatFlux => BOARD_SIDE_SHARE * self.power_of(object),
                };
                Ok((value, expr.quantity.unit()))
            }
        }
    }
}

/// A [`ThermalEngine`] over an in-memory [`Scene`].
#[derive(Debug)]
pub struct RecordingEngine {
    scene: Scene,
    session: Option<ModelState>,
    /// Model snapshots by project path, taken on every save.
    saved: HashMap<PathBuf, ModelState>,
    journal: Vec<EngineCall>,
    failures: HashMap<String, String>,
}

impl RecordingEngine {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            session: None,
            saved: HashMap::new(),
            journal: Vec::new(),
            failures: HashMap::new(),
        }
    }

    /// Make every call of `operation` fail with `message`.
    pub fn fail_on(&mut self, operation: &str, message: &str) {
        self.failures
            .insert(operation.to_string(), message.to_string());
    }

    pub fn journal(&self) -> &[EngineCall] {
        &self.journal
    }

    /// Journaled calls other than queries.
    pub fn mutations(&self) -> impl Iterator<Item = &EngineCall> {
        self.journal
            .iter()
            .filter(|c| !matches!(c, EngineCall::Query { .. }))
    }

    pub fn count(&self, operation: &str) -> usize {
        self.journal
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn dump_journal(&self, path: &Path) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(&self.journal)?;
        std::fs::write(path, json).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn record(&mut self, call: EngineCall) -> EngineResult<()> {
        let failure = self.failures.get(call.operation()).cloned();
        debug!(op = call.operation(), "engine call");
        let op = call.operation().to_string();
        self.journal.push(call);
        match failure {
            Some(message) => Err(EngineError::failed(op, message)),
            None => Ok(()),
        }
    }

    fn session(&mut self) -> EngineResult<&mut ModelState> {
        self.session.as_mut().ok_or(EngineError::NoSession)
    }

    /// Journal a mutating call and return the live session.
    fn apply(&mut self, call: EngineCall) -> EngineResult<&mut ModelState> {
        self.session.as_ref().ok_or(EngineError::NoSession)?;
        self.record(call)?;
        self.session()
    }

    fn query(&mut self, name: &str) -> EngineResult<&mut ModelState> {
        self.apply(EngineCall::Query {
            name: name.to_string(),
        })
    }

    fn write(path: &Path, bytes: &[u8]) -> EngineResult<()> {
        std::fs::write(path, bytes).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ThermalEngine for RecordingEngine {
    fn launch(&mut self, options: &LaunchOptions) -> EngineResult<()> {
        self.record(EngineCall::Launch {
            options: options.clone(),
        })?;
        info!(release = %options.release, graphical = options.graphical, "solver session started");
        self.session = Some(ModelState::new());
        Ok(())
    }

    fn open_project(&mut self, path: &Path, options: &LaunchOptions) -> EngineResult<()> {
        self.record(EngineCall::OpenProject {
            path: path.to_path_buf(),
            options: options.clone(),
        })?;
        if !path.exists() {
            return Err(EngineError::failed(
                "open_project",
                format!("{} does not exist", path.display()),
            ));
        }
        let mut state = self.saved.get(path).cloned().unwrap_or_else(ModelState::new);
        state.project = Some(path.to_path_buf());
        self.session = Some(state);
        Ok(())
    }

    fn save_project(&mut self, path: Option<&Path>) -> EngineResult<()> {
        let session = self.apply(EngineCall::SaveProject {
            path: path.map(Path::to_path_buf),
        })?;
        if let Some(path) = path {
            session.project = Some(path.to_path_buf());
        }
        let Some(project) = session.project.clone() else {
            return Err(EngineError::failed("save_project", "project has no path"));
        };
        let snapshot = session.clone();
        Self::write(&project, b"recorded project\n")?;
        self.saved.insert(project, snapshot);
        Ok(())
    }

    fn process_id(&self) -> Option<u32> {
        self.session.as_ref().map(|_| PROCESS_ID)
    }

    fn shutdown(&mut self) -> EngineResult<()> {
        self.apply(EngineCall::Shutdown)?;
        self.session = None;
        info!("solver session closed");
        Ok(())
    }

    fn project_extension(&self) -> &'static str {
        "aedt"
    }

    fn import_ecad(&mut self, source: &EcadSource) -> EngineResult<String> {
        let layers = self.scene.board_layers.clone();
        let session = self.apply(EngineCall::ImportEcad {
            source: source.clone(),
        })?;
        session.bodies.extend(layers.into_iter().map(|l| Body {
            name: l.name,
            bbox: l.bbox,
            model: true,
            layer: true,
        }));
        Ok(source.component_name())
    }

    fn import_idf(&mut self, board_path: &Path) -> EngineResult<()> {
        let bodies = self.scene.idf_bodies.clone();
        let session = self.apply(EngineCall::ImportIdf {
            path: board_path.to_path_buf(),
        })?;
        session.bodies.extend(bodies.into_iter().map(|b| Body {
            name: b.name,
            bbox: b.bbox,
            model: true,
            layer: false,
        }));
        Ok(())
    }

    fn fit_all(&mut self) -> EngineResult<()> {
        self.apply(EngineCall::FitAll)?;
        Ok(())
    }

    fn solid_bodies(&mut self) -> EngineResult<Vec<SolidInfo>> {
        let session = self.query("solid_bodies")?;
        let mut solids: Vec<SolidInfo> = session
            .bodies
            .iter()
            .map(|b| SolidInfo {
                name: b.name.clone(),
                bbox: b.bbox,
                volume: b.bbox.volume(),
                model: b.model,
            })
            .collect();
        if let Some(region) = session.region() {
            solids.push(SolidInfo {
                name: REGION.to_string(),
                bbox: region,
                volume: region.volume(),
                model: true,
            });
        }
        Ok(solids)
    }

    fn object(&mut self, name: &str) -> EngineResult<SolidInfo> {
        let session = self.query("object")?;
        let bbox = session.bbox(name)?;
        let model = name == REGION || session.body(name)?.model;
        Ok(SolidInfo {
            name: name.to_string(),
            bbox,
            volume: bbox.volume(),
            model,
        })
    }

    fn board_layers(&mut self) -> EngineResult<Vec<String>> {
        let session = self.query("board_layers")?;
        let mut layers: Vec<String> = session
            .bodies
            .iter()
            .filter(|b| b.layer)
            .map(|b| b.name.clone())
            .collect();
        layers.sort();
        Ok(layers)
    }

    fn model_objects(&mut self) -> EngineResult<Vec<String>> {
        let session = self.query("model_objects")?;
        let mut names: Vec<String> = session
            .bodies
            .iter()
            .filter(|b| b.model)
            .map(|b| b.name.clone())
            .collect();
        if session.region().is_some() {
            names.push(REGION.to_string());
        }
        Ok(names)
    }

    fn delete(&mut self, names: &[String]) -> EngineResult<()> {
        let session = self.apply(EngineCall::Delete {
            names: names.to_vec(),
        })?;
        for name in names {
            session.body(name)?;
        }
        session.bodies.retain(|b| !names.contains(&b.name));
        Ok(())
    }

    fn set_model(&mut self, name: &str, model: bool) -> EngineResult<()> {
        let session = self.apply(EngineCall::SetModel {
            name: name.to_string(),
            model,
        })?;
        session.body_mut(name)?.model = model;
        Ok(())
    }

    fn move_objects(&mut self, names: &[String], vector: [f64; 3]) -> EngineResult<()> {
        let session = self.apply(EngineCall::MoveObjects {
            names: names.to_vec(),
            vector,
        })?;
        for name in names {
            let body = session.body_mut(name)?;
            body.bbox = body.bbox.translated(vector);
        }
        Ok(())
    }

    fn touching_face(&mut self, object: &str, other: &str) -> EngineResult<Option<BoxFace>> {
        let session = self.query("touching_face")?;
        let a = session.bbox(object)?;
        let b = session.bbox(other)?;
        Ok(a.touching_face(&b, TOUCH_EPS))
    }

    fn create_box(&mut self, name: &str, bbox: BoundingBox, model: bool) -> EngineResult<()> {
        let session = self.apply(EngineCall::CreateBox {
            name: name.to_string(),
            bbox,
            model,
        })?;
        if session.bodies.iter().any(|b| b.name == name) {
            return Err(EngineError::failed(
                "create_box",
                format!("{name} already exists"),
            ));
        }
        session.bodies.push(Body {
            name: name.to_string(),
            bbox,
            model,
            layer: false,
        });
        Ok(())
    }

    fn region_faces(&mut self) -> EngineResult<Vec<RegionFace>> {
        self.query("region_faces")?;
        // face ids follow the solver's numbering of the domain box
        Ok(BoxFace::all()
            .into_iter()
            .zip(7u32..)
            .map(|(face, id)| RegionFace { id, face })
            .collect())
    }

    fn set_region_padding(&mut self, percent: [f64; 6]) -> EngineResult<()> {
        let session = self.apply(EngineCall::SetRegionPadding { percent })?;
        session.region_padding = percent;
        Ok(())
    }

    fn add_material(&mut self, name: &str, conductivity: f64) -> EngineResult<()> {
        let session = self.apply(EngineCall::AddMaterial {
            name: name.to_string(),
            conductivity,
        })?;
        session.materials.retain(|(n, _)| n != name);
        session.materials.push((name.to_string(), conductivity));
        Ok(())
    }

    fn delete_all_boundaries(&mut self) -> EngineResult<()> {
        self.apply(EngineCall::DeleteAllBoundaries)?.boundaries.clear();
        Ok(())
    }

    fn delete_all_points(&mut self) -> EngineResult<()> {
        self.apply(EngineCall::DeleteAllPoints)?.monitors.clear();
        Ok(())
    }

    fn assign_boundary(&mut self, name: &str, spec: &BoundarySpec) -> EngineResult<()> {
        let session = self.apply(EngineCall::AssignBoundary {
            name: name.to_string(),
            spec: spec.clone(),
        })?;
        let object = match spec {
            BoundarySpec::SourceBlock { object, .. }
            | BoundarySpec::TwoResistorNetwork { object, .. }
            | BoundarySpec::MaterialAssignment { object, .. }
            | BoundarySpec::SolveInside { object, .. } => Some(object),
            BoundarySpec::Opening { .. } => None,
        };
        if let Some(object) = object {
            session.body(object)?;
        }
        session.boundaries.push((name.to_string(), spec.clone()));
        Ok(())
    }

    fn boundaries(&mut self) -> EngineResult<Vec<BoundaryInfo>> {
        let session = self.query("boundaries")?;
        let hollow = |object: &str| {
            session.boundaries.iter().any(|(_, s)| {
                matches!(s, BoundarySpec::SolveInside { object: o, solve_inside: false } if o == object)
            })
        };
        Ok(session
            .boundaries
            .iter()
            .filter_map(|(name, spec)| {
                let (kind, objects) = match spec {
                    BoundarySpec::SourceBlock { object, .. } => {
                        let kind = if hollow(object) {
                            BoundaryKind::HollowBlock
                        } else {
                            BoundaryKind::SolidBlock
                        };
                        (kind, vec![object.clone()])
                    }
                    BoundarySpec::TwoResistorNetwork { object, .. } => {
                        (BoundaryKind::Network, vec![object.clone()])
                    }
                    BoundarySpec::Opening { .. } => (BoundaryKind::Opening, vec![REGION.to_string()]),
                    BoundarySpec::MaterialAssignment { .. } | BoundarySpec::SolveInside { .. } => {
                        return None;
                    }
                };
                Some(BoundaryInfo {
                    name: name.clone(),
                    kind,
                    objects,
                })
            })
            .collect())
    }

    fn create_point_monitor(&mut self, name: &str, position: [f64; 3]) -> EngineResult<()> {
        let session = self.apply(EngineCall::CreatePointMonitor {
            name: name.to_string(),
            position,
        })?;
        if session.monitors.iter().any(|(n, _)| n == name) {
            return Err(EngineError::failed(
                "create_point_monitor",
                format!("monitor {name} already exists"),
            ));
        }
        session.monitors.push((name.to_string(), position));
        Ok(())
    }

    fn monitor_names(&mut self) -> EngineResult<Vec<String>> {
        let session = self.query("monitor_names")?;
        Ok(session.monitors.iter().map(|(n, _)| n.clone()).collect())
    }

    fn set_priorities(&mut self, priorities: &[(String, u32)]) -> EngineResult<()> {
        let session = self.apply(EngineCall::SetPriorities {
            priorities: priorities.to_vec(),
        })?;
        for (name, _) in priorities {
            session.body(name)?;
        }
        Ok(())
    }

    fn assign_mesh_region(&mut self, spec: &MeshRegionSpec) -> EngineResult<()> {
        let session = self.apply(EngineCall::AssignMeshRegion { spec: spec.clone() })?;
        for name in &spec.objects {
            session.body(name)?;
        }
        Ok(())
    }

    fn assign_mesh_levels(&mut self, name: &str, levels: &[(String, u32)]) -> EngineResult<()> {
        self.apply(EngineCall::AssignMeshLevels {
            name: name.to_string(),
            levels: levels.to_vec(),
        })?;
        Ok(())
    }

    fn set_global_mesh(&mut self, spec: &GlobalMeshSpec) -> EngineResult<()> {
        self.apply(EngineCall::SetGlobalMesh { spec: spec.clone() })?;
        Ok(())
    }

    fn create_setup(&mut self, setup: &SolverSetup) -> EngineResult<()> {
        let session = self.apply(EngineCall::CreateSetup {
            setup: setup.clone(),
        })?;
        session.setups.retain(|s| s.name != setup.name);
        session.setups.push(setup.clone());
        Ok(())
    }

    fn apply_ambient(&mut self, ambient: &AmbientSpec) -> EngineResult<()> {
        let session = self.apply(EngineCall::ApplyAmbient {
            ambient: ambient.clone(),
        })?;
        session.ambient = Some(ambient.clone());
        Ok(())
    }

    fn generate_mesh(&mut self, setup: &str) -> EngineResult<()> {
        let session = self.apply(EngineCall::GenerateMesh {
            setup: setup.to_string(),
        })?;
        if !session.setups.iter().any(|s| s.name == setup) {
            return Err(EngineError::SetupNotFound(setup.to_string()));
        }
        session.meshed.push(setup.to_string());
        Ok(())
    }

    fn analyze(&mut self, setup: &str, cores: u32, tasks: u32) -> EngineResult<()> {
        let session = self.apply(EngineCall::Analyze {
            setup: setup.to_string(),
            cores,
            tasks,
        })?;
        if !session.setups.iter().any(|s| s.name == setup) {
            return Err(EngineError::SetupNotFound(setup.to_string()));
        }
        session.solved.push(setup.to_string());
        info!(setup, cores, "solve finished");
        Ok(())
    }

    fn solution_name(&mut self) -> EngineResult<String> {
        let session = self.query("solution_name")?;
        session
            .solved
            .first()
            .map(|s| format!("{s} : SteadyState"))
            .ok_or(EngineError::NoSolution)
    }

    fn define_field_expression(&mut self, expression: &FieldExpression) -> EngineResult<()> {
        let session = self.apply(EngineCall::DefineFieldExpression {
            expression: expression.clone(),
        })?;
        session.expressions.retain(|e| e.name != expression.name);
        session.expressions.push(expression.clone());
        Ok(())
    }

    fn export_report(&mut self, request: &ReportRequest, path: &Path) -> EngineResult<()> {
        let session = self.apply(EngineCall::ExportReport {
            request: request.clone(),
            path: path.to_path_buf(),
        })?;
        if session.solved.is_empty() {
            return Err(EngineError::NoSolution);
        }
        let mut header = vec!["X []".to_string()];
        let mut row = vec!["0".to_string()];
        for quantity in &request.quantities {
            let (value, unit) = session.quantity(request.category, quantity)?;
            header.push(format!("{quantity} [{unit}]"));
            row.push(format!("{value}"));
        }
        let csv = format!("{}\n{}\n", header.join(","), row.join(","));
        Self::write(path, csv.as_bytes())
    }

    fn export_field_plot(&mut self, request: &FieldPlotRequest, path: &Path) -> EngineResult<()> {
        let session = self.apply(EngineCall::ExportFieldPlot {
            request: request.clone(),
            path: path.to_path_buf(),
        })?;
        if session.solved.is_empty() {
            return Err(EngineError::NoSolution);
        }
        Self::write(path, PLACEHOLDER_PNG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::new()
            .with_layer(
                "L1_TOP",
                BoundingBox::from_origin_size([0.0, 0.0, 0.8], [50.0, 40.0, 0.8]),
            )
            .with_layer(
                "L2_BOTTOM",
                BoundingBox::from_origin_size([0.0, 0.0, 0.0], [50.0, 40.0, 0.8]),
            )
            .with_body(
                "U1",
                BoundingBox::from_origin_size([10.0, 10.0, 1.6], [5.0, 5.0, 1.0]),
            )
    }

    fn launched() -> RecordingEngine {
        let mut engine = RecordingEngine::new(scene());
        engine
            .launch(&LaunchOptions {
                release: "2023.1".into(),
                graphical: false,
            })
            .unwrap();
        engine
            .import_ecad(&EcadSource {
                path: "board.tgz".into(),
                kind: EcadKind::OdbArchive,
            })
            .unwrap();
        engine.import_idf(Path::new("board.emn")).unwrap();
        engine
    }

    #[test]
    fn calls_before_launch_fail() {
        let mut engine = RecordingEngine::new(scene());
        assert!(matches!(engine.fit_all(), Err(EngineError::NoSession)));
        assert!(engine.journal().is_empty());
        assert_eq!(engine.process_id(), None);
    }

    #[test]
    fn import_populates_bodies_and_region() {
        let mut engine = launched();
        assert_eq!(engine.board_layers().unwrap(), vec!["L1_TOP", "L2_BOTTOM"]);
        let solids = engine.solid_bodies().unwrap();
        assert_eq!(solids.len(), 4);
        let region = solids.iter().find(|s| s.name == REGION).unwrap();
        assert!(region.volume > solids[0].volume);
        assert_eq!(
            engine.touching_face("U1", "L1_TOP").unwrap(),
            Some(BoxFace::bottom_z())
        );
        assert_eq!(engine.touching_face("U1", "L2_BOTTOM").unwrap(), None);
    }

    #[test]
    fn injected_failure_is_journaled_and_returned() {
        let mut engine = launched();
        engine.fail_on("set_model", "object locked");
        let err = engine.set_model("U1", false).unwrap_err();
        assert_eq!(err.to_string(), "set_model failed: object locked");
        assert_eq!(engine.count("set_model"), 1);
    }

    #[test]
    fn reports_follow_assigned_power() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = launched();
        engine
            .assign_boundary(
                "U1",
                &BoundarySpec::SourceBlock {
                    object: "U1".into(),
                    power_w: 2.0,
                },
            )
            .unwrap();
        engine.create_point_monitor("point_U1", [12.5, 12.5, 1.6]).unwrap();
        let request = ReportRequest {
            name: "Monitor_Point_Temperatures".into(),
            category: ReportCategory::Monitor,
            solution: "s".into(),
            quantities: vec!["point_U1.Temperature".into()],
        };
        let path = dir.path().join("r.csv");
        assert!(matches!(
            engine.export_report(&request, &path),
            Err(EngineError::NoSolution)
        ));

        let setup = SolverSetup {
            name: "s".into(),
            flow_model: FlowModel::Laminar,
            include_gravity: false,
            radiation: RadiationModel::Off,
            initial_velocity_m_s: [0.0; 3],
            flow_convergence: 1e-4,
            energy_convergence: 1e-10,
            max_iterations: 10,
            under_relaxation: [0.3, 0.7, 1.0],
            sequential_flow_and_energy: true,
        };
        engine.create_setup(&setup).unwrap();
        engine.analyze("s", 2, 2).unwrap();
        assert_eq!(engine.solution_name().unwrap(), "s : SteadyState");
        engine.export_report(&request, &path).unwrap();
        let csv = std::fs::read_to_string(&path).unwrap();
        assert_eq!(csv, "X [],point_U1.Temperature [cel]\n0,40\n");
    }

    #[test]
    fn journal_dumps_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = launched();
        engine.move_objects(&["U1".to_string()], [0.0, 0.0, -0.1]).unwrap();
        let path = dir.path().join("journal.json");
        engine.dump_journal(&path).unwrap();
        let calls: Vec<EngineCall> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(calls, engine.journal());
        assert_eq!(calls[0].operation(), "launch");
    }
}
