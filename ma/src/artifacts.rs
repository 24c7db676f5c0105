//! Canonical working files, per-iteration archives and rotation
//!
//! Between sub-iterations the workspace holds exactly one current triple
//! (mesh, restart, sensor). A sub-iteration builds the next triple under
//! separate names, archives it, then renames it over the current one.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AdaptError;
use crate::schedule::ComplexityLevel;

pub const CURRENT_MESH: &str = "current.meshb";
pub const CURRENT_RESTART: &str = "current_restart.solb";
pub const CURRENT_SENSOR: &str = "current_sensor.solb";
pub const NEXT_MESH: &str = "current.new.meshb";
/// Field interpolated by the adaptation tool from the current restart
pub const INTERPOLATED: &str = "current_restart.itp.solb";
pub const NEXT_INITIAL: &str = "current.new_ini.solb";
pub const NEXT_RESTART: &str = "current.new_restart.solb";
pub const NEXT_SENSOR: &str = "current.new_sensor.solb";

/// Names of the working files inside one workspace
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingArtifacts {
    dir: PathBuf,
}

impl WorkingArtifacts {
    pub fn new(dir: &Path) -> Self {
        Self { dir: dir.to_path_buf() }
    }

    pub fn current_mesh(&self) -> PathBuf {
        self.dir.join(CURRENT_MESH)
    }

    pub fn current_restart(&self) -> PathBuf {
        self.dir.join(CURRENT_RESTART)
    }

    pub fn current_sensor(&self) -> PathBuf {
        self.dir.join(CURRENT_SENSOR)
    }

    pub fn next_mesh(&self) -> PathBuf {
        self.dir.join(NEXT_MESH)
    }

    pub fn interpolated(&self) -> PathBuf {
        self.dir.join(INTERPOLATED)
    }

    pub fn next_initial(&self) -> PathBuf {
        self.dir.join(NEXT_INITIAL)
    }

    pub fn next_restart(&self) -> PathBuf {
        self.dir.join(NEXT_RESTART)
    }

    pub fn next_sensor(&self) -> PathBuf {
        self.dir.join(NEXT_SENSOR)
    }

    fn next_names(&self) -> [PathBuf; 5] {
        [
            self.next_mesh(),
            self.interpolated(),
            self.next_initial(),
            self.next_restart(),
            self.next_sensor(),
        ]
    }

    /// The three current files, in (mesh, restart, sensor) order
    pub fn current_triple(&self) -> [PathBuf; 3] {
        [self.current_mesh(), self.current_restart(), self.current_sensor()]
    }

    pub fn has_current_triple(&self) -> bool {
        self.current_triple().iter().all(|p| p.is_file())
    }

    /// Install the starting state under the current names
    pub fn install(&self, mesh: &Path, restart: &Path, sensor: &Path) -> Result<(), AdaptError> {
        debug!(?mesh, ?restart, ?sensor, "WorkingArtifacts::install: called");
        for (src, dst) in [mesh, restart, sensor].into_iter().zip(self.current_triple()) {
            copy(src, &dst)?;
        }
        Ok(())
    }

    /// Remove leftovers from an interrupted sub-iteration
    pub fn clear_next(&self) -> Result<(), AdaptError> {
        for path in self.next_names() {
            remove_if_exists(&path)?;
        }
        Ok(())
    }

    /// Hand the interpolated field to the solver as its initial condition
    pub fn promote_interpolated(&self) -> Result<PathBuf, AdaptError> {
        let target = self.next_initial();
        rename(&self.interpolated(), &target)?;
        Ok(target)
    }

    /// Copy the solver's fixed-name sensor output to the next sensor name
    pub fn capture_sensor(&self, solver_sensor: &Path) -> Result<PathBuf, AdaptError> {
        let target = self.next_sensor();
        copy(solver_sensor, &target)?;
        Ok(target)
    }

    /// Write-once snapshot of the next triple under iteration names
    pub fn archive(
        &self,
        global_iteration: u32,
        level: &ComplexityLevel,
        history: &Path,
    ) -> Result<ArchivedIteration, AdaptError> {
        debug!(global_iteration, complexity = level.complexity, "WorkingArtifacts::archive: called");
        let stem = format!("ite.{}.{}", global_iteration, level.label());

        let mesh = self.dir.join(format!("{}.meshb", stem));
        let sensor = self.dir.join(format!("{}.solb", stem));
        let restart = self.dir.join(format!("{}_restart.solb", stem));
        copy(&self.next_mesh(), &mesh)?;
        copy(&self.next_sensor(), &sensor)?;
        copy(&self.next_restart(), &restart)?;

        let history = if history.is_file() {
            let target = self.dir.join(format!("{}_history.dat", stem));
            copy(history, &target)?;
            Some(target)
        } else {
            None
        };

        Ok(ArchivedIteration {
            global_iteration,
            complexity: level.complexity,
            mesh,
            sensor,
            restart,
            history,
            archived_at: Utc::now(),
        })
    }

    /// Rename the next triple over the current one and vacate the next names
    pub fn rotate(&self) -> Result<(), AdaptError> {
        debug!(dir = ?self.dir, "WorkingArtifacts::rotate: called");
        rename(&self.next_mesh(), &self.current_mesh())?;
        rename(&self.next_restart(), &self.current_restart())?;
        rename(&self.next_sensor(), &self.current_sensor())?;
        self.clear_next()
    }
}

/// Files kept for one global iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedIteration {
    pub global_iteration: u32,
    pub complexity: f64,
    pub mesh: PathBuf,
    pub sensor: PathBuf,
    pub restart: PathBuf,
    pub history: Option<PathBuf>,
    pub archived_at: DateTime<Utc>,
}

/// Remove a file left by an earlier step; absent is fine
pub fn remove_if_exists(path: &Path) -> Result<(), AdaptError> {
    if path.exists() {
        debug!(?path, "remove_if_exists: removing");
        fs::remove_file(path).map_err(|e| AdaptError::io(path, e))?;
    }
    Ok(())
}

fn copy(src: &Path, dst: &Path) -> Result<(), AdaptError> {
    fs::copy(src, dst).map_err(|e| AdaptError::io(src, e))?;
    Ok(())
}

fn rename(src: &Path, dst: &Path) -> Result<(), AdaptError> {
    fs::rename(src, dst).map_err(|e| AdaptError::io(src, e))
}
