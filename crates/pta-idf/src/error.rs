use std::path::PathBuf;

use thiserror::Error;

pub type IdfResult<T> = Result<T, IdfError>;

/// IDF board/library parse errors
#[derive(Error, Debug)]
pub enum IdfError {
    #[error("Section {0} not found")]
    MissingSection(&'static str),

    #[error("Section {open} is not closed by {close}")]
    UnterminatedSection {
        open: &'static str,
        close: &'static str,
    },

    #[error("Line {line}: placement entry has no placement line")]
    DanglingLine { line: usize },

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unsupported board file extension: {0}")]
    UnsupportedExtension(String),

    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl IdfError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
