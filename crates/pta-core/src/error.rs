use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown length unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown direction: {0} (expected one of +X, -X, +Y, -Y, +Z, -Z)")]
    UnknownDirection(String),
}
