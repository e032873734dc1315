//! Board fixture shared by the pta-app integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use pta_app::{Session, generate_table, scene_from_idf, set_cell};
use pta_bc::Column;
use pta_engine::{RecordingEngine, Scene};
use pta_project::{ExecutionMode, SimulationSettings};
use tempfile::TempDir;

pub const BOARD: &str = "\
.HEADER
BOARD_FILE 3.0 \"test\" 2024/01/01.00:00:00 1
demo MM
.END_HEADER
.BOARD_OUTLINE ECAD
1.6
0 0.0 0.0 0.0
0 60.0 0.0 0.0
0 60.0 40.0 0.0
0 0.0 40.0 0.0
.END_BOARD_OUTLINE
.PLACEMENT
\"QFN48\" \"MCU\" \"U1\"
10.0 20.0 0.2 0.0 TOP PLACED
\"0402\" \"RES\" \"R1\"
30.0 5.0 0.0 90.0 BOTTOM PLACED
\"0603\" \"CAP\" \"C1\"
40.0 10.0 0.2 0.0 TOP PLACED
\"BRK\" \"\" \"NOREFDES\"
2.0 2.0 0.0 0.0 TOP PLACED
.END_PLACEMENT
";

pub const LIBRARY: &str = "\
.HEADER
LIBRARY_FILE 3.0 \"test\" 2024/01/01.00:00:00 1
.END_HEADER
.ELECTRICAL
\"QFN48\" \"MCU\" MM 0.9
0 0.0 0.0 0
0 7.0 7.0 0
.END_ELECTRICAL
";

pub struct Fixture {
    pub dir: TempDir,
    pub board: PathBuf,
    pub session: Session,
}

impl Fixture {
    pub fn workdir(&self) -> &Path {
        self.dir.path()
    }

    /// Bodies the solver would import; `with_layers` adds the ECAD stack-up.
    pub fn engine(&self, with_layers: bool) -> RecordingEngine {
        let library = self.board.with_extension("emp");
        let (board, library) =
            pta_idf::load_pair(&self.board, &library).expect("fixture board should parse");
        let mut scene = scene_from_idf(&board, &library);
        if !with_layers {
            scene = Scene {
                board_layers: Vec::new(),
                ..scene
            };
        }
        RecordingEngine::new(scene)
    }
}

/// U1 is a network with a monitor point, R1 a 0.5 W block, C1 excluded.
pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let board = dir.path().join("demo.emn");
    fs::write(&board, BOARD).expect("write board");
    fs::write(dir.path().join("demo.emp"), LIBRARY).expect("write library");

    let mut session = Session::new(dir.path());
    generate_table(&mut session, &board, None).expect("table should generate");
    let edits = [
        ("U1", Column::BcType, "network"),
        ("U1", Column::PowerW, "2"),
        ("U1", Column::RJb, "4"),
        ("U1", Column::RJc, "12"),
        ("U1", Column::MonitorPoint, "YES"),
        ("R1", Column::PowerW, "0.5"),
        ("C1", Column::Include, "NO"),
    ];
    for (designator, column, value) in edits {
        set_cell(&mut session, designator, column, value).expect("cell edit");
    }

    Fixture {
        dir,
        board,
        session,
    }
}

/// Forced +X air at 1 m/s and 20 C, solved after setup.
pub fn forced_settings() -> SimulationSettings {
    let mut settings = SimulationSettings::template("Board_01");
    settings.execution_mode = ExecutionMode::NonGraphical;
    settings.options.solve = true;
    settings
}
