use pta_core::Direction;
use pta_project::*;

#[test]
fn roundtrip_yaml_forced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.yaml");

    let mut settings = SimulationSettings::template("Board_A");
    settings.processors = 8;
    settings.mesh_fidelity = MeshFidelity::Medium;
    settings.options.points_for_all_components = true;
    settings.options.board_side = BoardSideMethod::TouchingFace;

    save_yaml(&path, &settings).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(settings, loaded);
}

#[test]
fn roundtrip_json_natural() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut settings = SimulationSettings::template("Board_B");
    settings.execution_mode = ExecutionMode::NonGraphical;
    settings.convection = Some(ConvectionDef::Natural {
        gravity: Direction::NegZ,
        ambient_temperature_c: Some(35.0),
    });
    settings.flow_regime = FlowRegime::Laminar;

    save_json(&path, &settings).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(settings, loaded);
}

#[test]
fn directions_use_signed_labels() {
    let yaml = to_yaml_string(&SimulationSettings::template("x")).unwrap();
    assert!(yaml.contains("+X"), "{yaml}");
    let back = from_yaml_str(&yaml.replace("+X", "-Y")).unwrap();
    match back.convection {
        Some(ConvectionDef::Forced { direction, .. }) => assert_eq!(direction, Direction::NegY),
        other => panic!("unexpected convection: {other:?}"),
    }
}

#[test]
fn invalid_settings_are_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    let mut settings = SimulationSettings::template("ok");
    settings.processors = 500;
    assert!(matches!(
        save_yaml(&path, &settings),
        Err(ProjectError::Validation(_))
    ));
    assert!(!path.exists());
}

#[test]
fn invalid_file_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "project_name: \"has space\"\n").unwrap();
    assert!(matches!(load_yaml(&path), Err(ProjectError::Validation(_))));
}
