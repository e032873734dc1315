use std::path::Path;

use pta_core::{Axis, BoundingBox, BoxFace, End};
use pta_engine::*;

fn engine() -> RecordingEngine {
    let scene = Scene::new()
        .with_layer(
            "L1_TOP",
            BoundingBox::from_origin_size([0.0, 0.0, 0.8], [40.0, 20.0, 0.8]),
        )
        .with_layer(
            "L2_BOTTOM",
            BoundingBox::from_origin_size([0.0, 0.0, 0.0], [40.0, 20.0, 0.8]),
        )
        .with_body(
            "U1",
            BoundingBox::from_origin_size([5.0, 5.0, 1.6], [4.0, 4.0, 1.0]),
        )
        .with_body(
            "C1",
            BoundingBox::from_origin_size([20.0, 5.0, -0.5], [1.0, 0.5, 0.5]),
        );
    let mut engine = RecordingEngine::new(scene);
    engine
        .launch(&LaunchOptions {
            release: "2023.1".into(),
            graphical: true,
        })
        .unwrap();
    engine.import_idf(Path::new("board.emn")).unwrap();
    engine
        .import_ecad(&EcadSource {
            path: "board.tgz".into(),
            kind: EcadKind::OdbArchive,
        })
        .unwrap();
    engine
}

#[test]
fn region_follows_padding() {
    let mut engine = engine();
    let before = engine.object(REGION).unwrap().bbox;
    // default padding is 50% of the 40 mm board length on each side
    assert_eq!(before.min[0], -20.0);
    assert_eq!(before.max[0], 60.0);

    engine
        .set_region_padding([100.0, 100.0, 50.0, 50.0, 50.0, 50.0])
        .unwrap();
    let after = engine.object(REGION).unwrap().bbox;
    assert_eq!(after.min[0], -40.0);
    assert_eq!(after.max[0], 80.0);
    assert_eq!(after.min[1], before.min[1]);
}

#[test]
fn boundary_kinds_are_reported() {
    let mut engine = engine();
    engine
        .assign_boundary(
            "U1",
            &BoundarySpec::TwoResistorNetwork {
                object: "U1".into(),
                board_face: BoxFace::bottom_z(),
                case_face: BoxFace::top_z(),
                r_jb: 5.0,
                r_jc: 10.0,
                power_w: 1.5,
            },
        )
        .unwrap();
    engine
        .assign_boundary(
            "C1",
            &BoundarySpec::SourceBlock {
                object: "C1".into(),
                power_w: 0.1,
            },
        )
        .unwrap();
    engine
        .assign_boundary(
            "C1_solve_inside",
            &BoundarySpec::SolveInside {
                object: "C1".into(),
                solve_inside: false,
            },
        )
        .unwrap();
    engine
        .assign_boundary(
            "outlet",
            &BoundarySpec::Opening {
                face: BoxFace::new(Axis::X, End::Max),
                flow: OpeningFlow::Pressure,
            },
        )
        .unwrap();

    let kinds: Vec<_> = engine
        .boundaries()
        .unwrap()
        .into_iter()
        .map(|b| (b.name, b.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("U1".to_string(), BoundaryKind::Network),
            ("C1".to_string(), BoundaryKind::HollowBlock),
            ("outlet".to_string(), BoundaryKind::Opening),
        ]
    );

    let err = engine
        .assign_boundary(
            "missing",
            &BoundarySpec::SourceBlock {
                object: "U99".into(),
                power_w: 1.0,
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::ObjectNotFound(name) if name == "U99"));
}

#[test]
fn saved_project_reopens_with_its_model() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("Board_01.aedt");
    let mut engine = engine();
    engine.set_model("C1", false).unwrap();
    engine.save_project(Some(&project)).unwrap();
    engine.shutdown().unwrap();
    assert!(!engine.is_running());
    assert!(matches!(
        engine.model_objects(),
        Err(EngineError::NoSession)
    ));

    let options = LaunchOptions {
        release: "2023.1".into(),
        graphical: false,
    };
    engine.open_project(&project, &options).unwrap();
    let objects = engine.model_objects().unwrap();
    assert!(objects.contains(&"U1".to_string()));
    assert!(!objects.contains(&"C1".to_string()));
    assert_eq!(engine.process_id(), Some(4242));

    let missing = dir.path().join("Other.aedt");
    assert!(engine.open_project(&missing, &options).is_err());
}

#[test]
fn mutations_exclude_queries() {
    let mut engine = engine();
    engine.solid_bodies().unwrap();
    engine.fit_all().unwrap();
    let ops: Vec<_> = engine.mutations().map(|c| c.operation().to_string()).collect();
    assert_eq!(ops, ["launch", "import_idf", "import_ecad", "fit_all"]);
    assert_eq!(engine.count("solid_bodies"), 1);
}
