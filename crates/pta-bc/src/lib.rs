//! pta-bc: the per-component boundary-condition table.
//!
//! Builds the defaulted table from a parsed board, reads and writes it as
//! comma-delimited text, and applies constrained cell edits.

pub mod column;
pub mod delimited;
pub mod editor;
pub mod materials;
pub mod row;
pub mod table;

pub use column::{Column, ColumnKind};
pub use editor::{Edit, Editor};
pub use materials::{Material, MaterialList};
pub use row::{BcRow, BcType, DEFAULT_MATERIAL};
pub use table::{BcTable, default_table_path};

use std::path::PathBuf;

pub type BcResult<T> = Result<T, BcError>;

#[derive(thiserror::Error, Debug)]
pub enum BcError {
    #[error("Board has no placed components")]
    EmptyBoard,

    #[error("Duplicate designator: {0}")]
    DuplicateDesignator(String),

    #[error("Unexpected header: expected `{expected}`, found `{found}`")]
    Header { expected: String, found: String },

    #[error("Line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Line {line}: invalid {column} value `{value}`")]
    InvalidCell {
        line: usize,
        column: Column,
        value: String,
    },

    #[error("`{value}` is not a valid {column} (choices: {})", .choices.join(", "))]
    NotAChoice {
        column: Column,
        value: String,
        choices: Vec<String>,
    },

    #[error("Column {0} is read-only")]
    ReadOnly(Column),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Row {row} out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("No row with designator {0}")]
    UnknownDesignator(String),

    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
