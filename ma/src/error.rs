//! Error types for the adaptation workflow

use std::path::PathBuf;
use thiserror::Error;

pub use meshio::DataError;

/// Malformed or inconsistent adaptation configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "The number of mesh complexities ({complexities}) and the number of sub-iterations ({sub_iterations}) don't match"
    )]
    LengthMismatch { complexities: usize, sub_iterations: usize },

    #[error("{key} is empty")]
    EmptyList { key: &'static str },

    #[error("{key}: '{value}' is not a number")]
    NotNumeric { key: &'static str, value: String },

    #[error("{key}: {value} must be positive")]
    NonPositive { key: &'static str, value: String },

    #[error("{key}: {total} global iterations in total, at most {max} are supported")]
    TooManyIterations { key: &'static str, total: u64, max: u32 },

    #[error("Missing required key {0}")]
    MissingKey(&'static str),

    #[error("Missing initial files: {}", .missing.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    MissingInitialFiles { missing: Vec<PathBuf> },

    #[error("Could not read case file {path}: {source}")]
    CaseFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: expected KEY= value, found '{text}'")]
    CaseSyntax { path: PathBuf, line: usize, text: String },
}

/// An external tool did not produce what it was asked for
#[derive(Debug, Error)]
pub enum ToolFailure {
    #[error("AMG failed at global iteration {iteration}: no adapted mesh (see {log})\n  Command: {command}")]
    AdaptedMeshMissing {
        iteration: u32,
        command: String,
        log: PathBuf,
    },

    #[error("AMG solution interpolation failed at global iteration {iteration} (see {log})\n  Command: {command}")]
    InterpolationMissing {
        iteration: u32,
        command: String,
        log: PathBuf,
    },

    #[error("SU2 failed at global iteration {iteration}: no restart file {restart} (see {log})")]
    RestartMissing {
        iteration: u32,
        restart: PathBuf,
        log: PathBuf,
    },

    #[error("SU2 produced no sensor file {sensor} at global iteration {iteration} (see {log})")]
    SensorMissing {
        iteration: u32,
        sensor: PathBuf,
        log: PathBuf,
    },

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {secs}s (see {log})")]
    TimedOut { program: String, secs: u64, log: PathBuf },
}

/// Any error that stops an adaptation run
#[derive(Debug, Error)]
pub enum AdaptError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tool(#[from] ToolFailure),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bad journal record in {path}: {source}")]
    Journal {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AdaptError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
