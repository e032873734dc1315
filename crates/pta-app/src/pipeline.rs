//! Simulation run orchestration.
//!
//! A run is a fixed list of named stages. Each stage takes the state built so
//! far and returns it extended; the first failing stage ends the run with the
//! solver left as it is.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use pta_bc::{BcTable, MaterialList};
use pta_core::{Axis, Direction, Tolerances, nearly_equal};
use pta_engine::{
    AmbientSpec, BoundarySpec, EcadSource, FlowModel, IDF_BOARD_OUTLINE, IDF_MECH_PREFIX,
    LaunchOptions, OpeningFlow, REGION, RadiationModel, SolverSetup, ThermalEngine,
};
use pta_idf::Side;
use pta_project::{
    ConvectionDef, FlowRegime, SimulationSettings, TurbulenceModel, to_yaml_string,
    validate_settings,
};
use pta_results::{RunManifest, RunStore, compute_run_id, digest};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::board_side::{BoardBodies, locator_for};
use crate::cleanup::remove_stale_project;
use crate::error::{AppError, AppResult, Precondition};
use crate::mapping::{block_name, map_row, point_name};
use crate::mesh::{
    LAYER_LEVELS, MESH_REGION, MeshSizing, PRIMITIVE_LEVELS, global_spec, mesh_region_box,
    mesh_sizing, region_spec,
};
use crate::progress::{RunProgressEvent, RunStage, emit_progress};
use crate::session::Session;

pub const FORCED_SETUP: &str = "forced_conv_setup";
pub const NATURAL_SETUP: &str = "natural_conv_setup";

/// Initial velocity against gravity that starts a buoyant flow, m/s.
const NATURAL_INITIAL_VELOCITY: f64 = 0.00098;
const FLOW_CONVERGENCE: f64 = 1e-4;
const ENERGY_CONVERGENCE: f64 = 1e-10;

/// Convection with every value a run needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Convection {
    Forced {
        direction: Direction,
        speed_m_s: f64,
        inlet_temperature_c: f64,
    },
    Natural {
        gravity: Direction,
        ambient_temperature_c: f64,
    },
}

impl Convection {
    /// `None` while a value is still missing.
    pub fn resolve(def: &ConvectionDef) -> Option<Self> {
        match *def {
            ConvectionDef::Forced {
                direction,
                speed_m_s,
                inlet_temperature_c,
            } => Some(Convection::Forced {
                direction,
                speed_m_s: speed_m_s?,
                inlet_temperature_c: inlet_temperature_c?,
            }),
            ConvectionDef::Natural {
                gravity,
                ambient_temperature_c,
            } => Some(Convection::Natural {
                gravity,
                ambient_temperature_c: ambient_temperature_c?,
            }),
        }
    }

    pub fn setup_name(&self) -> &'static str {
        match self {
            Convection::Forced { .. } => FORCED_SETUP,
            Convection::Natural { .. } => NATURAL_SETUP,
        }
    }

    /// Domain padding in percent, -X, +X, -Y, +Y, -Z, +Z.
    ///
    /// Forced flow stretches the domain along the flow axis. Natural
    /// convection leaves room above the board for the plume, with extra
    /// height beside a vertical board.
    pub fn region_padding(&self) -> [f64; 6] {
        let mut pad = [50.0; 6];
        match *self {
            Convection::Forced { direction, .. } => {
                let i = direction.axis().index();
                pad[2 * i] = 100.0;
                pad[2 * i + 1] = 100.0;
            }
            Convection::Natural { gravity, .. } => {
                let i = gravity.axis().index();
                if i != 2 {
                    pad[4] = 200.0;
                    pad[5] = 200.0;
                }
                pad[2 * i + usize::from(gravity.is_positive())] = 250.0;
            }
        }
        pad
    }
}

pub fn flow_model(regime: FlowRegime, turbulence: TurbulenceModel) -> FlowModel {
    match (regime, turbulence) {
        (FlowRegime::Laminar, _) => FlowModel::Laminar,
        (FlowRegime::Turbulent, TurbulenceModel::ZeroEquation) => FlowModel::TurbulentZeroEquation,
        (FlowRegime::Turbulent, TurbulenceModel::TwoEquation) => FlowModel::TurbulentTwoEquation,
    }
}

pub fn forced_setup(flow_model: FlowModel) -> SolverSetup {
    SolverSetup {
        name: FORCED_SETUP.to_string(),
        flow_model,
        include_gravity: false,
        radiation: RadiationModel::Off,
        initial_velocity_m_s: [0.0; 3],
        flow_convergence: FLOW_CONVERGENCE,
        energy_convergence: ENERGY_CONVERGENCE,
        max_iterations: 300,
        under_relaxation: [0.3, 0.7, 1.0],
        sequential_flow_and_energy: true,
    }
}

pub fn natural_setup(flow_model: FlowModel, gravity: Direction) -> SolverSetup {
    let up = gravity.vector(NATURAL_INITIAL_VELOCITY).map(|v| -v);
    SolverSetup {
        name: NATURAL_SETUP.to_string(),
        flow_model,
        include_gravity: true,
        radiation: RadiationModel::DiscreteOrdinates,
        initial_velocity_m_s: up,
        flow_convergence: FLOW_CONVERGENCE,
        energy_convergence: ENERGY_CONVERGENCE,
        max_iterations: 500,
        under_relaxation: [0.7, 0.3, 1.0],
        sequential_flow_and_energy: false,
    }
}

/// Everything a run reads, checked up front.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub workdir: PathBuf,
    pub board: PathBuf,
    pub ecad: Option<EcadSource>,
    pub table: BcTable,
    pub materials: MaterialList,
    pub settings: SimulationSettings,
    pub convection: Convection,
    pub project_path: PathBuf,
}

/// What the stages have built so far.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub board: Option<BoardBodies>,
    pub priorities: Vec<(String, u32)>,
    pub boundaries: Vec<String>,
    pub monitors: Vec<String>,
    pub setup_name: String,
    pub mesh: Option<MeshSizing>,
    pub solved: bool,
    pub stages: Vec<RunStage>,
}

impl PipelineState {
    fn board(&self) -> AppResult<&BoardBodies> {
        self.board.as_ref().ok_or(AppError::NoBoard)
    }
}

pub type Stage = fn(&mut dyn ThermalEngine, &StageInput, PipelineState) -> AppResult<PipelineState>;

/// Stages after the precondition check, in execution order.
pub const STAGES: [(RunStage, Stage); 7] = [
    (RunStage::CleaningUp, cleanup),
    (RunStage::ImportingGeometry, import),
    (RunStage::PreparingModel, prepare),
    (RunStage::AssigningBoundaries, boundaries),
    (RunStage::ConfiguringConvection, convection),
    (RunStage::ConfiguringMesh, mesh),
    (RunStage::Solving, solve),
];

/// Gather every missing or unusable input.
///
/// Reads the table and materials files but never touches the solver.
pub fn check_preconditions(
    session: &Session,
    settings: &SimulationSettings,
    project_extension: &str,
) -> AppResult<StageInput> {
    let mut problems = Vec::new();
    let unreadable = |path: &PathBuf, message: String| Precondition::Unreadable {
        path: path.clone(),
        message,
    };

    let board = match &session.files.board {
        None => {
            problems.push(Precondition::MissingBoardFile);
            None
        }
        Some(path) if !path.is_file() => {
            problems.push(unreadable(path, "file not found".to_string()));
            None
        }
        Some(path) => Some(path.clone()),
    };

    let table = match &session.files.table {
        None => {
            problems.push(Precondition::MissingTable);
            None
        }
        Some(path) => match BcTable::read_csv(path) {
            Ok(table) => Some(table),
            Err(e) => {
                problems.push(unreadable(path, e.to_string()));
                None
            }
        },
    };

    let materials = match &session.files.materials {
        None => MaterialList::default(),
        Some(path) => MaterialList::read_csv(path).unwrap_or_else(|e| {
            problems.push(unreadable(path, e.to_string()));
            MaterialList::default()
        }),
    };

    let ecad = session.files.ecad.as_ref().and_then(|path| {
        let source = EcadSource::detect(path);
        if source.is_none() {
            problems.push(unreadable(path, "not a recognized layout database".to_string()));
        }
        source
    });

    let convection = match &settings.convection {
        None => {
            problems.push(Precondition::MissingConvection);
            None
        }
        Some(def) => {
            problems.extend(
                def.missing()
                    .into_iter()
                    .map(Precondition::MissingConvectionValue),
            );
            Convection::resolve(def)
        }
    };

    if settings.project_name.trim().is_empty() {
        problems.push(Precondition::MissingProjectName);
    }
    if let Err(e) = validate_settings(settings) {
        problems.push(Precondition::InvalidSettings(e.to_string()));
    }

    match (board, table, convection) {
        (Some(board), Some(table), Some(convection)) if problems.is_empty() => {
            let workdir = session.workdir().to_path_buf();
            let project_path = workdir.join(settings.project_file_name(project_extension));
            Ok(StageInput {
                workdir,
                board,
                ecad,
                table,
                materials,
                settings: settings.clone(),
                convection,
                project_path,
            })
        }
        _ => Err(AppError::Preconditions(problems)),
    }
}

fn cleanup(
    _engine: &mut dyn ThermalEngine,
    input: &StageInput,
    state: PipelineState,
) -> AppResult<PipelineState> {
    let Some(project_file) = input.project_path.file_name().and_then(|f| f.to_str()) else {
        return Ok(state);
    };
    let removed = remove_stale_project(&input.workdir, project_file);
    if !removed.is_empty() {
        info!(count = removed.len(), "removed artifacts of an earlier run");
    }
    Ok(state)
}

fn import(
    engine: &mut dyn ThermalEngine,
    input: &StageInput,
    mut state: PipelineState,
) -> AppResult<PipelineState> {
    engine.launch(&LaunchOptions {
        release: input.settings.normalized_release(),
        graphical: input.settings.execution_mode.is_graphical(),
    })?;
    if let Some(source) = &input.ecad {
        let component = engine.import_ecad(source)?;
        info!(component = %component, "imported board layers");
    }
    engine.import_idf(&input.board)?;
    engine.fit_all()?;
    engine.save_project(Some(&input.project_path))?;

    let board = BoardBodies::discover(engine)?;
    debug!(layers = ?board.layers, "board bodies");
    state.board = Some(board);
    Ok(state)
}

fn names_on_side(table: &BcTable, side: Side) -> Vec<String> {
    table
        .rows()
        .iter()
        .filter(|r| !r.is_sentinel() && r.placement == side)
        .map(|r| block_name(&r.instance_name))
        .collect()
}

/// Move the parts on one side so the first of them touches the board.
fn close_gap(
    engine: &mut dyn ThermalEngine,
    parts: &[String],
    layer: &str,
    side: Side,
) -> AppResult<()> {
    let Some(first) = parts.first() else {
        return Ok(());
    };
    let part = engine.object(first)?.bbox;
    let layer = engine.object(layer)?.bbox;
    let (board_z, part_z) = match side {
        Side::Top => (layer.max[2], part.min[2]),
        Side::Bottom => (layer.min[2], part.max[2]),
    };
    let dz = board_z - part_z;
    if nearly_equal(dz, 0.0, Tolerances::default()) {
        return Ok(());
    }
    debug!(side = %side, dz, "closing gap between parts and board");
    engine.move_objects(parts, [0.0, 0.0, dz])?;
    Ok(())
}

fn prepare(
    engine: &mut dyn ThermalEngine,
    input: &StageInput,
    mut state: PipelineState,
) -> AppResult<PipelineState> {
    let board = state.board()?.clone();
    engine.delete_all_boundaries()?;
    engine.delete_all_points()?;
    for material in input.materials.materials() {
        engine.add_material(&material.name, material.conductivity)?;
    }

    let mech: Vec<String> = engine
        .solid_bodies()?
        .into_iter()
        .map(|s| s.name)
        .filter(|n| n.starts_with(IDF_MECH_PREFIX))
        .collect();
    if !mech.is_empty() {
        engine.delete(&mech)?;
    }

    close_gap(engine, &names_on_side(&input.table, Side::Top), board.top(), Side::Top)?;
    close_gap(
        engine,
        &names_on_side(&input.table, Side::Bottom),
        board.bottom(),
        Side::Bottom,
    )?;

    let excluded: Vec<String> = input
        .table
        .excluded()
        .map(|r| block_name(&r.instance_name))
        .collect();
    if input.settings.options.hard_delete_excluded {
        if !excluded.is_empty() {
            engine.delete(&excluded)?;
        }
    } else {
        for name in &excluded {
            engine.set_model(name, false)?;
        }
    }

    let mut solids: Vec<_> = engine
        .solid_bodies()?
        .into_iter()
        .filter(|s| s.name != REGION)
        .collect();
    solids.sort_by(|a, b| b.volume.total_cmp(&a.volume));
    state.priorities = solids.into_iter().map(|s| s.name).zip(2u32..).collect();
    engine.set_priorities(&state.priorities)?;
    engine.save_project(None)?;

    if board.from_ecad {
        engine.set_model(IDF_BOARD_OUTLINE, false)?;
    }
    Ok(state)
}

fn boundaries(
    engine: &mut dyn ThermalEngine,
    input: &StageInput,
    mut state: PipelineState,
) -> AppResult<PipelineState> {
    let locator = locator_for(input.settings.options.board_side, state.board()?);
    let all_points = input.settings.options.points_for_all_components;
    let mut points = HashSet::new();

    for row in input.table.active() {
        let object = block_name(&row.instance_name);
        let face = locator.find_board_side(engine, &object, row.placement)?;
        for assignment in map_row(row, face)? {
            engine.assign_boundary(&assignment.name, &assignment.spec)?;
            state.boundaries.push(assignment.name);
        }
        if (row.monitor_point || all_points) && points.insert(object.clone()) {
            let name = point_name(&object);
            let position = engine.object(&object)?.bbox.face_center(face);
            engine.create_point_monitor(&name, position)?;
            state.monitors.push(name);
        }
    }
    info!(
        boundaries = state.boundaries.len(),
        monitors = state.monitors.len(),
        "boundary conditions assigned"
    );
    Ok(state)
}

fn convection(
    engine: &mut dyn ThermalEngine,
    input: &StageInput,
    mut state: PipelineState,
) -> AppResult<PipelineState> {
    let model = flow_model(input.settings.flow_regime, input.settings.turbulence_model);
    let conv = input.convection;
    match conv {
        Convection::Forced {
            direction,
            speed_m_s,
            inlet_temperature_c,
        } => {
            engine.create_setup(&forced_setup(model))?;
            engine.set_region_padding(conv.region_padding())?;
            let inlet = direction.upstream_face();
            let openings = [
                (
                    "inlet",
                    BoundarySpec::Opening {
                        face: inlet,
                        flow: OpeningFlow::Velocity {
                            velocity_m_s: direction.vector(speed_m_s),
                            temperature_c: inlet_temperature_c,
                        },
                    },
                ),
                (
                    "outlet",
                    BoundarySpec::Opening {
                        face: inlet.opposite(),
                        flow: OpeningFlow::Pressure,
                    },
                ),
            ];
            for (name, spec) in openings {
                engine.assign_boundary(name, &spec)?;
                state.boundaries.push(name.to_string());
            }
        }
        Convection::Natural {
            gravity,
            ambient_temperature_c,
        } => {
            engine.create_setup(&natural_setup(model, gravity))?;
            engine.apply_ambient(&AmbientSpec {
                temperature_c: ambient_temperature_c,
                gravity: Some(gravity),
            })?;
            engine.set_region_padding(conv.region_padding())?;
            for region_face in engine.region_faces()? {
                let name = format!("outlet_{}", region_face.id);
                engine.assign_boundary(
                    &name,
                    &BoundarySpec::Opening {
                        face: region_face.face,
                        flow: OpeningFlow::Pressure,
                    },
                )?;
                state.boundaries.push(name);
            }
        }
    }
    state.setup_name = conv.setup_name().to_string();
    Ok(state)
}

fn mesh(
    engine: &mut dyn ThermalEngine,
    input: &StageInput,
    mut state: PipelineState,
) -> AppResult<PipelineState> {
    let board = state.board()?.clone();
    let primitives: Vec<String> = engine
        .model_objects()?
        .into_iter()
        .filter(|n| n != REGION && !board.contains(n))
        .collect();

    let mut boxes = Vec::with_capacity(primitives.len());
    for name in &primitives {
        boxes.push(engine.object(name)?.bbox);
    }
    let mut thickness = Vec::with_capacity(board.layers.len());
    for layer in &board.layers {
        thickness.push(engine.object(layer)?.bbox.dimension(Axis::Z));
    }
    let fx: Vec<f64> = boxes.iter().map(|b| b.dimension(Axis::X)).collect();
    let fy: Vec<f64> = boxes.iter().map(|b| b.dimension(Axis::Y)).collect();
    let sizing = mesh_sizing(&fx, &fy, &thickness, input.settings.mesh_fidelity)?;
    info!(local = ?sizing.local, global = ?sizing.global, "mesh sizing");

    let board_box = engine.object(board.top())?.bbox;
    let region = mesh_region_box(&board_box, &boxes).ok_or(AppError::NoComponents)?;
    engine.create_box(MESH_REGION, region, false)?;
    engine.assign_mesh_region(&region_spec(&sizing))?;

    let levels = |names: &[String], level: u32| -> Vec<(String, u32)> {
        names.iter().map(|n| (n.clone(), level)).collect()
    };
    engine.assign_mesh_levels(PRIMITIVE_LEVELS, &levels(&primitives, 2))?;
    engine.assign_mesh_levels(LAYER_LEVELS, &levels(&board.layers, 1))?;
    engine.set_global_mesh(&global_spec(&sizing))?;
    state.mesh = Some(sizing);
    Ok(state)
}

fn solve(
    engine: &mut dyn ThermalEngine,
    input: &StageInput,
    mut state: PipelineState,
) -> AppResult<PipelineState> {
    if !input.settings.options.solve {
        engine.save_project(None)?;
        info!(project = %input.project_path.display(), "setup saved without solving");
        return Ok(state);
    }
    let setup = state.setup_name.clone();
    let cores = input.settings.processors;
    engine.generate_mesh(&setup)?;
    engine.analyze(&setup, cores, cores)?;
    engine.save_project(None)?;
    engine.shutdown()?;
    state.solved = true;
    Ok(state)
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    pub project_path: PathBuf,
    pub setup_name: String,
    pub mesh: Option<MeshSizing>,
    pub priorities: Vec<(String, u32)>,
    pub boundaries: Vec<String>,
    pub monitors: Vec<String>,
    pub stages: Vec<RunStage>,
    pub solved: bool,
    /// Solver process still running after a setup-only run.
    pub process_id: Option<u32>,
}

/// Set up (and optionally solve) the thermal model for the session's files.
pub fn run_simulation(
    session: &mut Session,
    engine: &mut dyn ThermalEngine,
    settings: &SimulationSettings,
) -> AppResult<RunOutcome> {
    run_simulation_with_progress(session, engine, settings, None)
}

/// Like [`run_simulation`], reporting each stage as it starts.
pub fn run_simulation_with_progress(
    session: &mut Session,
    engine: &mut dyn ThermalEngine,
    settings: &SimulationSettings,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunOutcome> {
    let started = Instant::now();
    emit_progress(&mut progress_cb, RunStage::CheckingPreconditions, started, None);
    let input = check_preconditions(session, settings, engine.project_extension())?;

    let mut state = PipelineState::default();
    for (stage, run) in STAGES {
        emit_progress(&mut progress_cb, stage, started, None);
        let result = run(engine, &input, state);
        session.process_id = engine.process_id();
        state = result.inspect_err(|e| warn!(stage = %stage, error = %e, "run stopped"))?;
        state.stages.push(stage);
        debug!(stage = %stage, elapsed_s = started.elapsed().as_secs_f64(), "stage done");
    }

    emit_progress(&mut progress_cb, RunStage::SavingRun, started, None);
    let settings_yaml = to_yaml_string(settings)?;
    let run_id = compute_run_id(&input.table.to_csv(), &settings_yaml);
    let store = RunStore::for_workdir(&input.workdir)?;
    let mut manifest = RunManifest::new(
        run_id.clone(),
        settings.project_name.clone(),
        digest(&settings_yaml),
    );
    manifest.solved = state.solved;
    manifest.stages = state.stages.iter().map(|s| s.label().to_string()).collect();
    store.save_manifest(&manifest)?;

    session.set_last_table(input.table);
    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some(format!("run {run_id}")),
    );
    info!(run_id = %run_id, solved = state.solved, "run finished");

    Ok(RunOutcome {
        run_id,
        project_path: input.project_path,
        setup_name: state.setup_name,
        mesh: state.mesh,
        priorities: state.priorities,
        boundaries: state.boundaries,
        monitors: state.monitors,
        stages: state.stages,
        solved: state.solved,
        process_id: session.process_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_padding_stretches_flow_axis() {
        let conv = Convection::Forced {
            direction: Direction::NegY,
            speed_m_s: 1.0,
            inlet_temperature_c: 20.0,
        };
        assert_eq!(conv.region_padding(), [50.0, 50.0, 100.0, 100.0, 50.0, 50.0]);
        assert_eq!(conv.setup_name(), FORCED_SETUP);
    }

    #[test]
    fn natural_padding_follows_gravity() {
        let cases = [
            (Direction::NegX, [250.0, 50.0, 50.0, 50.0, 200.0, 200.0]),
            (Direction::PosY, [50.0, 50.0, 50.0, 250.0, 200.0, 200.0]),
            (Direction::NegZ, [50.0, 50.0, 50.0, 50.0, 250.0, 50.0]),
            (Direction::PosZ, [50.0, 50.0, 50.0, 50.0, 50.0, 250.0]),
        ];
        for (gravity, expected) in cases {
            let conv = Convection::Natural {
                gravity,
                ambient_temperature_c: 25.0,
            };
            assert_eq!(conv.region_padding(), expected, "{gravity}");
        }
    }

    #[test]
    fn natural_setup_starts_flow_against_gravity() {
        let setup = natural_setup(FlowModel::TurbulentZeroEquation, Direction::NegZ);
        assert_eq!(setup.initial_velocity_m_s, [0.0, 0.0, NATURAL_INITIAL_VELOCITY]);
        assert!(setup.include_gravity);
        let setup = natural_setup(FlowModel::Laminar, Direction::PosX);
        assert_eq!(setup.initial_velocity_m_s[0], -NATURAL_INITIAL_VELOCITY);
    }

    #[test]
    fn resolve_needs_every_value() {
        let def = ConvectionDef::Forced {
            direction: Direction::PosX,
            speed_m_s: None,
            inlet_temperature_c: Some(20.0),
        };
        assert!(Convection::resolve(&def).is_none());
        let def = ConvectionDef::Natural {
            gravity: Direction::NegZ,
            ambient_temperature_c: Some(30.0),
        };
        assert_eq!(
            Convection::resolve(&def),
            Some(Convection::Natural {
                gravity: Direction::NegZ,
                ambient_temperature_c: 30.0
            })
        );
    }

    #[test]
    fn flow_model_from_settings() {
        assert_eq!(
            flow_model(FlowRegime::Laminar, TurbulenceModel::TwoEquation),
            FlowModel::Laminar
        );
        assert_eq!(
            flow_model(FlowRegime::Turbulent, TurbulenceModel::TwoEquation),
            FlowModel::TurbulentTwoEquation
        );
    }
}
