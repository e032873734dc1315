use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use pta_app::cleanup::{remove_stale_project, sweep_lock_files};
use pta_app::{
    AppError, AppResult, Extractor, RunOutcome, RunProgressEvent, Session, generate_table,
    load_materials, load_table, reshape_report, run_simulation_with_progress, scene_from_idf,
    set_cell,
};
use pta_bc::{Column, MaterialList, default_table_path};
use pta_engine::{LaunchOptions, RecordingEngine, Scene};
use pta_idf::{library_path_for, load_pair};
use pta_project::SimulationSettings;
use pta_results::{ResultKind, RunStore};

#[derive(Parser)]
#[command(name = "pta-cli")]
#[command(about = "PCB thermal analyzer CLI - board boundary conditions and solver setup", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boundary-condition table operations
    #[command(subcommand)]
    Bc(BcCommands),
    /// List the materials in a materials CSV
    Materials {
        /// Path to the materials CSV
        path: PathBuf,
    },
    /// Simulation settings files
    #[command(subcommand)]
    Settings(SettingsCommands),
    /// Run the full setup pipeline against the recording solver
    Plan {
        /// IDF board file (.emn or .bdf)
        board: PathBuf,
        /// Simulation settings YAML
        #[arg(short, long)]
        settings: PathBuf,
        /// Boundary-condition table (defaults to <board stem>_bcs.csv)
        #[arg(long)]
        table: Option<PathBuf>,
        /// IDF library file (defaults to the board's pair)
        #[arg(long)]
        library: Option<PathBuf>,
        /// Materials CSV
        #[arg(long)]
        materials: Option<PathBuf>,
        /// Layout database with the board stack-up
        #[arg(long)]
        ecad: Option<PathBuf>,
        /// Scene JSON to import instead of boxes built from the board file
        #[arg(long)]
        scene: Option<PathBuf>,
        /// Output path for the solver call journal
        #[arg(long, default_value = "plan_journal.json")]
        journal: PathBuf,
        /// Extract result tables and images after a solved run
        #[arg(long)]
        extract: bool,
    },
    /// Reshape an exported one-row report into a two-column table
    Reshape {
        /// Path to the exported report CSV
        report: PathBuf,
        /// Which result the report holds
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List stored runs in a working directory
    Runs {
        /// Working directory of the runs
        workdir: PathBuf,
        /// Delete this run instead of listing
        #[arg(long)]
        delete: Option<String>,
    },
    /// Show a stored run and its result tables
    ShowRun {
        /// Working directory of the run
        workdir: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Remove lock files and the artifacts of an earlier run
    Clean {
        /// Working directory to clean
        workdir: PathBuf,
        /// Project file whose artifacts to remove, e.g. Board_01.aedt
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Subcommand)]
enum BcCommands {
    /// Build the table for a board/library pair
    Generate {
        /// IDF board file (.emn or .bdf)
        board: PathBuf,
        /// IDF library file (defaults to the board's pair)
        #[arg(long)]
        library: Option<PathBuf>,
    },
    /// Print a table
    Show {
        /// Path to the table CSV
        table: PathBuf,
    },
    /// Edit one cell of a table
    Set {
        /// Path to the table CSV
        table: PathBuf,
        /// Component designator, e.g. U1
        designator: String,
        /// Column header or a loose spelling such as `power` or `r_jb`
        column: String,
        /// New cell value
        value: String,
        /// Materials CSV the material column must come from
        #[arg(long)]
        materials: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Write a forced-convection settings template
    Init {
        /// Output YAML path
        path: PathBuf,
        /// Project name
        #[arg(long, default_value = "Board_01")]
        name: String,
    },
    /// Check a settings file
    Validate {
        /// Path to the settings YAML
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    MonitorPoints,
    NetworkJunctions,
    ObjectMaxTemperatures,
    BoardSideHeatFlow,
}

impl From<KindArg> for ResultKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::MonitorPoints => ResultKind::MonitorPoints,
            KindArg::NetworkJunctions => ResultKind::NetworkJunctions,
            KindArg::ObjectMaxTemperatures => ResultKind::ObjectMaxTemperatures,
            KindArg::BoardSideHeatFlow => ResultKind::BoardSideHeatFlow,
        }
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bc(bc) => match bc {
            BcCommands::Generate { board, library } => cmd_bc_generate(&board, library.as_deref()),
            BcCommands::Show { table } => cmd_bc_show(&table),
            BcCommands::Set {
                table,
                designator,
                column,
                value,
                materials,
            } => cmd_bc_set(&table, &designator, &column, &value, materials.as_deref()),
        },
        Commands::Materials { path } => cmd_materials(&path),
        Commands::Settings(settings) => match settings {
            SettingsCommands::Init { path, name } => cmd_settings_init(&path, &name),
            SettingsCommands::Validate { path } => cmd_settings_validate(&path),
        },
        Commands::Plan {
            board,
            settings,
            table,
            library,
            materials,
            ecad,
            scene,
            journal,
            extract,
        } => cmd_plan(PlanArgs {
            board,
            settings,
            table,
            library,
            materials,
            ecad,
            scene,
            journal,
            extract,
        }),
        Commands::Reshape {
            report,
            kind,
            output,
        } => cmd_reshape(&report, kind.into(), output.as_deref()),
        Commands::Runs { workdir, delete } => cmd_runs(&workdir, delete.as_deref()),
        Commands::ShowRun { workdir, run_id } => cmd_show_run(&workdir, &run_id),
        Commands::Clean { workdir, project } => cmd_clean(&workdir, project.as_deref()),
    }
}

/// Directory holding `path`, or the current one for a bare file name.
fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

fn cmd_bc_generate(board: &Path, library: Option<&Path>) -> AppResult<()> {
    let mut session = Session::new(parent_dir(board));
    let (path, table) = generate_table(&mut session, board, library)?;
    println!("✓ Wrote {} component rows to {}", table.len(), path.display());
    Ok(())
}

fn cmd_bc_show(table_path: &Path) -> AppResult<()> {
    let mut session = Session::new(parent_dir(table_path));
    let table = load_table(&mut session, table_path)?;
    let columns = [
        Column::Include,
        Column::InstanceName,
        Column::DesignatorType,
        Column::Placement,
        Column::HeightMm,
        Column::BcType,
        Column::PowerW,
        Column::RJb,
        Column::RJc,
        Column::MonitorPoint,
        Column::Material,
    ];
    let header: Vec<&str> = columns.iter().map(|c| c.header()).collect();
    println!("{}", header.join(" | "));
    for row in table.rows() {
        let cells: Vec<String> = columns.iter().map(|c| row.cell(*c)).collect();
        println!("{}", cells.join(" | "));
    }
    println!(
        "\n{} rows, {} included",
        table.len(),
        table.active().count()
    );
    Ok(())
}

fn cmd_bc_set(
    table_path: &Path,
    designator: &str,
    column: &str,
    value: &str,
    materials: Option<&Path>,
) -> AppResult<()> {
    let column: Column = column.parse()?;
    let mut session = Session::new(parent_dir(table_path));
    session.files.table = Some(table_path.to_path_buf());
    if let Some(materials) = materials {
        load_materials(&mut session, materials)?;
    }
    let edit = set_cell(&mut session, designator, column, value)?;
    println!("✓ {designator} {column} = {}", edit.stored);
    Ok(())
}

fn cmd_materials(path: &Path) -> AppResult<()> {
    let materials = MaterialList::read_csv(path)?;
    if materials.is_empty() {
        println!("No materials found in {}", path.display());
    } else {
        println!("Materials:");
        for m in materials.materials() {
            println!("  {} - {} W/(m·K)", m.name, m.conductivity);
        }
    }
    Ok(())
}

fn cmd_settings_init(path: &Path, name: &str) -> AppResult<()> {
    let settings = SimulationSettings::template(name);
    pta_project::save_yaml(path, &settings)?;
    println!("✓ Wrote settings template to {}", path.display());
    Ok(())
}

fn cmd_settings_validate(path: &Path) -> AppResult<()> {
    println!("Validating settings: {}", path.display());
    let settings = pta_project::load_yaml(path)?;
    let missing = settings
        .convection
        .as_ref()
        .map(|c| c.missing())
        .unwrap_or_default();
    if settings.project_name.is_empty() || settings.convection.is_none() || !missing.is_empty() {
        println!("✓ Settings are valid but incomplete for a run");
        if settings.project_name.is_empty() {
            println!("  project name is empty");
        }
        if settings.convection.is_none() {
            println!("  convection is not set");
        }
        for name in missing {
            println!("  convection {name} is not set");
        }
    } else {
        println!("✓ Settings are valid");
    }
    Ok(())
}

struct PlanArgs {
    board: PathBuf,
    settings: PathBuf,
    table: Option<PathBuf>,
    library: Option<PathBuf>,
    materials: Option<PathBuf>,
    ecad: Option<PathBuf>,
    scene: Option<PathBuf>,
    journal: PathBuf,
    extract: bool,
}

fn cmd_plan(args: PlanArgs) -> AppResult<()> {
    let settings = pta_project::load_yaml(&args.settings)?;
    let library = match &args.library {
        Some(path) => path.clone(),
        None => library_path_for(&args.board)?,
    };
    let scene = match &args.scene {
        Some(path) => Scene::from_json_file(path)?,
        None => {
            let (board, parts) = load_pair(&args.board, &library)?;
            scene_from_idf(&board, &parts)
        }
    };
    let mut engine = RecordingEngine::new(scene);

    let mut session = Session::new(parent_dir(&args.board));
    session.files.board = Some(args.board.clone());
    session.files.library = Some(library);
    session.files.table = Some(
        args.table
            .clone()
            .unwrap_or_else(|| default_table_path(&args.board)),
    );
    session.files.materials = args.materials.clone();
    session.files.ecad = args.ecad.clone();

    println!("Planning run for project: {}", settings.project_name);
    let result = run_simulation_with_progress(
        &mut session,
        &mut engine,
        &settings,
        Some(&mut |event| render_cli_progress(&event)),
    );
    clear_progress_line();
    let finished = finish_plan(&mut engine, &session, &args, &settings, result);
    let ((), swept) = session.end_after(&mut engine, finished)?;
    if swept > 0 {
        println!("  Removed {swept} lock file(s)");
    }
    Ok(())
}

/// Journal, report and optionally extract a finished run.
fn finish_plan(
    engine: &mut RecordingEngine,
    session: &Session,
    args: &PlanArgs,
    settings: &SimulationSettings,
    result: AppResult<RunOutcome>,
) -> AppResult<()> {
    engine.dump_journal(&args.journal)?;
    println!(
        "  Journal: {} ({} calls)",
        args.journal.display(),
        engine.journal().len()
    );
    let outcome = result?;
    print_outcome(&outcome);

    if args.extract {
        if outcome.solved {
            let options = LaunchOptions {
                release: settings.normalized_release(),
                graphical: false,
            };
            extract_results(engine, session.workdir(), &outcome, &options)?;
        } else {
            println!("Run was not solved; nothing to extract");
        }
    }
    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    println!("✓ Run completed: {}", outcome.run_id);
    println!("  Project: {}", outcome.project_path.display());
    println!("  Setup: {}", outcome.setup_name);
    println!("  Boundaries: {}", outcome.boundaries.len());
    println!("  Monitor points: {}", outcome.monitors.len());
    if let Some(mesh) = &outcome.mesh {
        println!(
            "  Mesh: local {:.3?} mm, global {:.3?} mm",
            mesh.local, mesh.global
        );
    }
    let stages: Vec<&str> = outcome.stages.iter().map(|s| s.label()).collect();
    println!("  Stages: {}", stages.join(" > "));
    println!("  Solved: {}", outcome.solved);
}

fn extract_results(
    engine: &mut RecordingEngine,
    workdir: &Path,
    outcome: &RunOutcome,
    options: &LaunchOptions,
) -> AppResult<()> {
    let store = RunStore::for_workdir(workdir)?;
    let mut extractor = Extractor::open_project(engine, &outcome.project_path, options)?;
    println!("\nResults ({}):", extractor.solution());
    for kind in ResultKind::ALL {
        match extractor.extract(kind) {
            Ok(table) => {
                store.save_table(&outcome.run_id, &table)?;
                println!("  {}: {} rows", kind.report_name(), table.rows.len());
            }
            Err(AppError::NoNetworkBlocks) => {
                println!("  {}: no network blocks", kind.report_name());
            }
            Err(e) => return Err(e),
        }
    }
    let layers = extractor.pcb_layers_image()?;
    let objects = extractor.all_objects_image()?;
    println!("  Images: {}, {}", layers.display(), objects.display());
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(80));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn cmd_reshape(report: &Path, kind: ResultKind, output: Option<&Path>) -> AppResult<()> {
    let text = std::fs::read_to_string(report).map_err(|source| AppError::Io {
        path: report.to_path_buf(),
        source,
    })?;
    let table = reshape_report(kind, &text)?;
    let csv = table.to_csv();

    if let Some(path) = output {
        std::fs::write(path, csv).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        println!("✓ Wrote {} rows to {}", table.rows.len(), path.display());
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn cmd_runs(workdir: &Path, delete: Option<&str>) -> AppResult<()> {
    let store = RunStore::for_workdir(workdir)?;
    if let Some(run_id) = delete {
        store.delete_run(run_id)?;
        println!("✓ Deleted run {run_id}");
        return Ok(());
    }

    let runs = store.list_runs()?;
    if runs.is_empty() {
        println!("No stored runs in {}", workdir.display());
    } else {
        println!("Stored runs in '{}':", workdir.display());
        for manifest in runs {
            let state = if manifest.solved { "solved" } else { "setup only" };
            println!(
                "  {} - {} ({}, {})",
                manifest.run_id, manifest.project_name, manifest.timestamp, state
            );
        }
    }
    Ok(())
}

fn cmd_show_run(workdir: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);
    let store = RunStore::for_workdir(workdir)?;
    let manifest = store.load_manifest(run_id)?;

    println!("\nRun Summary:");
    println!("  Project: {}", manifest.project_name);
    println!("  Timestamp: {}", manifest.timestamp);
    println!("  Solved: {}", manifest.solved);
    println!("  Stages: {}", manifest.stages.join(" > "));

    for kind in store.tables(run_id) {
        let table = store.load_table(run_id, kind)?;
        println!("\n{}:", kind.report_name());
        for (name, value) in &table.rows {
            println!("  {name} = {value}");
        }
    }
    Ok(())
}

fn cmd_clean(workdir: &Path, project: Option<&str>) -> AppResult<()> {
    if let Some(project) = project {
        for path in remove_stale_project(workdir, project) {
            println!("  Removed {}", path.display());
        }
    }
    let swept = sweep_lock_files(workdir);
    println!("✓ Removed {swept} lock file(s) from {}", workdir.display());
    Ok(())
}
