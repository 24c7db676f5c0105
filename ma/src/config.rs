//! meshadapt configuration types and loading
//!
//! This is the tool-side configuration (which binaries to call, where the
//! workspace goes). The adaptation schedule itself lives in the SU2 case file.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCAL_CONFIG: &str = ".meshadapt.yml";

/// Main meshadapt configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// External tool locations
    pub tools: ToolsConfig,

    /// Adaptation workspace settings
    pub workspace: WorkspaceConfig,

    /// Fixed file names produced by the flow solver
    pub files: FilesConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .meshadapt.yml
        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/meshadapt/meshadapt.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; the full [`Config::load`] reports them.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => [Some(PathBuf::from(LOCAL_CONFIG)), user_config_path()]
                .into_iter()
                .flatten()
                .collect(),
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("meshadapt").join("meshadapt.yml"))
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Mesh adaptation executable
    pub amg: String,

    /// Flow solver executable
    pub solver: String,

    /// MPI launcher used when more than one partition is requested
    #[serde(rename = "mpi-launcher")]
    pub mpi_launcher: String,

    /// Kill a tool that runs longer than this; unset waits forever
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: Option<u64>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            amg: "amg".to_string(),
            solver: "SU2_CFD".to_string(),
            mpi_launcher: "mpirun".to_string(),
            timeout_secs: None,
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Adaptation workspace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory created under the case root
    #[serde(rename = "dir-name")]
    pub dir_name: String,

    /// Delay before an existing workspace is destroyed
    #[serde(rename = "grace-period-secs")]
    pub grace_period_secs: u64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            dir_name: "ADAP".to_string(),
            grace_period_secs: 10,
        }
    }
}

/// Fixed-name solver outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Sensor field written next to the restart file
    pub sensor: String,

    /// Convergence history
    pub history: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            sensor: "mach.solb".to_string(),
            history: "history.dat".to_string(),
        }
    }
}
