//! Starting state for the adaptation cycle
//!
//! Either a fresh solve on the case's own mesh (cold start) or three files
//! supplied by the case (warm start). Both end with the canonical current
//! triple installed in the workspace.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::artifacts::{WorkingArtifacts, remove_if_exists};
use crate::case::CaseConfig;
use crate::config::FilesConfig;
use crate::error::{AdaptError, ConfigError, ToolFailure};
use crate::gateway::{FlowSolver, SolverRun, run_flow_solver};
use crate::workspace::Workspace;

pub const KEY_RESTART: &str = "ADAP_RESTART";
pub const KEY_INI_RESTART: &str = "ADAP_INI_RESTART_FILE";
pub const KEY_INI_SENSOR: &str = "ADAP_INI_SENSOR_FILE";
pub const KEY_INI_MESH: &str = "ADAP_INI_MESH_FILE";
pub const KEY_MESH: &str = "MESH_FILENAME";

pub const INITIAL_DIR: &str = "initial_solution";
pub const INITIAL_RESTART: &str = "initial_sol.solb";
pub const INITIAL_RUN_NAME: &str = "SU2_ini";

/// Where the first current triple comes from
#[derive(Debug, Clone, PartialEq)]
pub enum InitialSource {
    /// Solve once on this mesh
    Cold { mesh: PathBuf },
    /// Use existing files as they are
    Warm {
        restart: PathBuf,
        sensor: PathBuf,
        mesh: PathBuf,
    },
}

impl InitialSource {
    /// Pick the start mode from the case; relative names resolve against `root`
    pub fn from_case(case: &CaseConfig, root: &Path) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            case.get(key)
                .map(|name| root.join(name.trim()))
                .ok_or(ConfigError::MissingKey(key))
        };

        if case.is_yes(KEY_RESTART) {
            Ok(Self::Warm {
                restart: required(KEY_INI_RESTART)?,
                sensor: required(KEY_INI_SENSOR)?,
                mesh: required(KEY_INI_MESH)?,
            })
        } else {
            Ok(Self::Cold {
                mesh: required(KEY_MESH)?,
            })
        }
    }

    pub fn is_warm(&self) -> bool {
        matches!(self, Self::Warm { .. })
    }
}

/// Produces the current triple before the first sub-iteration
pub struct InitialStateResolver<'a> {
    workspace: &'a Workspace,
    case: &'a CaseConfig,
    solver: &'a dyn FlowSolver,
    files: FilesConfig,
    partitions: u32,
}

impl<'a> InitialStateResolver<'a> {
    pub fn new(workspace: &'a Workspace, case: &'a CaseConfig, solver: &'a dyn FlowSolver) -> Self {
        debug!(dir = ?workspace.dir(), "InitialStateResolver::new: called");
        Self {
            workspace,
            case,
            solver,
            files: FilesConfig::default(),
            partitions: 1,
        }
    }

    pub fn with_files(mut self, files: FilesConfig) -> Self {
        self.files = files;
        self
    }

    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = partitions;
        self
    }

    pub async fn resolve(&self, source: &InitialSource) -> Result<WorkingArtifacts, AdaptError> {
        debug!(?source, "InitialStateResolver::resolve: called");
        let artifacts = WorkingArtifacts::new(self.workspace.dir());
        match source {
            InitialSource::Warm { restart, sensor, mesh } => {
                let missing: Vec<PathBuf> = [restart, sensor, mesh]
                    .into_iter()
                    .filter(|p| !p.is_file())
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    return Err(ConfigError::MissingInitialFiles { missing }.into());
                }
                info!("Warm start from {}", restart.display());
                artifacts.install(mesh, restart, sensor)?;
            }
            InitialSource::Cold { mesh } => {
                let (restart, sensor) = self.initial_solve(mesh).await?;
                artifacts.install(mesh, &restart, &sensor)?;
            }
        }
        Ok(artifacts)
    }

    /// Solve on the starting mesh; returns (restart, sensor)
    async fn initial_solve(&self, mesh: &Path) -> Result<(PathBuf, PathBuf), AdaptError> {
        let dir = self.workspace.path(INITIAL_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AdaptError::io(&dir, e))?;

        let restart = dir.join(INITIAL_RESTART);
        let sensor = dir.join(&self.files.sensor);
        remove_if_exists(&sensor)?;

        let run = SolverRun::new(self.case, &dir, INITIAL_RUN_NAME, mesh, &restart).with_partitions(self.partitions);
        info!("Running initial flow solution, log: {}", run.log.display());

        let outcome = run_flow_solver(self.solver, &run).await?;
        if !outcome.is_success() {
            return Err(ToolFailure::RestartMissing {
                iteration: 0,
                restart,
                log: outcome.log,
            }
            .into());
        }
        if !sensor.is_file() {
            return Err(ToolFailure::SensorMissing {
                iteration: 0,
                sensor,
                log: outcome.log,
            }
            .into());
        }
        Ok((restart, sensor))
    }
}
