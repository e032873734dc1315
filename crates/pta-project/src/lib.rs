//! pta-project: simulation settings file format and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_settings};

use std::path::Path;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> ProjectResult<SimulationSettings> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn from_yaml_str(content: &str) -> ProjectResult<SimulationSettings> {
    let settings: SimulationSettings = serde_yaml::from_str(content)?;
    validate_settings(&settings)?;
    Ok(settings)
}

pub fn to_yaml_string(settings: &SimulationSettings) -> ProjectResult<String> {
    validate_settings(settings)?;
    Ok(serde_yaml::to_string(settings)?)
}

pub fn save_yaml(path: &Path, settings: &SimulationSettings) -> ProjectResult<()> {
    let content = to_yaml_string(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<SimulationSettings> {
    let content = std::fs::read_to_string(path)?;
    let settings: SimulationSettings = serde_json::from_str(&content)?;
    validate_settings(&settings)?;
    Ok(settings)
}

pub fn save_json(path: &Path, settings: &SimulationSettings) -> ProjectResult<()> {
    validate_settings(settings)?;
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
