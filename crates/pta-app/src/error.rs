//! Error types for the pta-app service layer.

use std::fmt;
use std::path::PathBuf;

/// An input a run needs that is absent or unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    MissingBoardFile,
    MissingTable,
    MissingConvection,
    /// A convection value such as `speed_m_s` is not set.
    MissingConvectionValue(&'static str),
    MissingProjectName,
    Unreadable { path: PathBuf, message: String },
    InvalidSettings(String),
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::MissingBoardFile => f.write_str("no board file selected"),
            Precondition::MissingTable => f.write_str("no boundary-condition table selected"),
            Precondition::MissingConvection => f.write_str("convection parameters are not set"),
            Precondition::MissingConvectionValue(name) => write!(f, "convection {name} is not set"),
            Precondition::MissingProjectName => f.write_str("project name is empty"),
            Precondition::Unreadable { path, message } => {
                write!(f, "{} cannot be used: {message}", path.display())
            }
            Precondition::InvalidSettings(message) => write!(f, "invalid settings: {message}"),
        }
    }
}

fn join(preconditions: &[Precondition]) -> String {
    preconditions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Application error type that wraps errors from the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Every missing input, gathered before the solver is touched.
    #[error("Cannot start the run: {}", join(.0))]
    Preconditions(Vec<Precondition>),

    #[error("Row {designator}: {message}")]
    RowConfig { designator: String, message: String },

    #[error("No network blocks in the model")]
    NoNetworkBlocks,

    #[error("No board body in the model")]
    NoBoard,

    #[error("No component bodies to size the mesh from")]
    NoComponents,

    #[error("Malformed report {name}: {message}")]
    InvalidReport { name: String, message: String },

    #[error("Geometry error: {0}")]
    Idf(#[from] pta_idf::IdfError),

    #[error("Table error: {0}")]
    Bc(#[from] pta_bc::BcError),

    #[error("Settings error: {0}")]
    Project(#[from] pta_project::ProjectError),

    #[error("Solver error: {0}")]
    Engine(#[from] pta_engine::EngineError),

    #[error("Results error: {0}")]
    Results(#[from] pta_results::ResultsError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for pta-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub(crate) fn row(designator: &str, message: impl Into<String>) -> Self {
        AppError::RowConfig {
            designator: designator.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preconditions_are_listed_together() {
        let err = AppError::Preconditions(vec![
            Precondition::MissingBoardFile,
            Precondition::MissingConvectionValue("speed_m_s"),
        ]);
        assert_eq!(
            err.to_string(),
            "Cannot start the run: no board file selected; convection speed_m_s is not set"
        );
    }
}
