//! Data error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading, reshaping or writing mesh and field data
#[derive(Debug, Error)]
pub enum DataError {
    #[error("No solution: field has {rows} row(s), at least 2 are required")]
    NoSolution { rows: usize },

    #[error("Unknown sensor: {name} (expected MACH, PRES or MACH_PRES)")]
    UnknownSensor { name: String },

    #[error("Solution field has no '{tag}' column (available: {available:?})")]
    MissingTag { tag: String, available: Vec<String> },

    #[error("{kind} buffer holds {len} values, not a multiple of {width}")]
    RaggedBuffer {
        kind: &'static str,
        len: usize,
        width: usize,
    },

    #[error("Field buffer holds {len} values for {vertices} vertices")]
    RaggedField { len: usize, vertices: usize },

    #[error("Field row {row} has {found} values, expected {expected}")]
    RaggedRow { row: usize, found: usize, expected: usize },

    #[error("Field has {tags} column name(s) for {width} value(s) per row")]
    TagCountMismatch { tags: usize, width: usize },

    #[error("Invalid dimension marker: {0:?}")]
    InvalidDimension(Option<String>),

    #[error("Malformed {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DataError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
