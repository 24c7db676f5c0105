//! Adaptation workspace lifecycle
//!
//! A run owns one directory under the case root. A workspace left over from
//! an earlier run is destroyed, after a grace period the operator can use to
//! interrupt, unless warnings are disabled.

use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use tracing::{debug, info, warn};

use crate::config::WorkspaceConfig;
use crate::error::AdaptError;

/// Configuration for the workspace manager
#[derive(Debug, Clone)]
pub struct WorkspaceOptions {
    /// Absolute case root (where the case file lives)
    pub root: PathBuf,

    /// Workspace directory name under the root
    pub dir_name: String,

    /// Delay before an existing workspace is removed
    pub grace_period: Duration,

    /// When false the grace period is skipped
    pub warn: bool,
}

impl WorkspaceOptions {
    pub fn new(root: impl Into<PathBuf>, config: &WorkspaceConfig) -> Self {
        let root = root.into();
        debug!(?root, ?config, "WorkspaceOptions::new: called");
        Self {
            root,
            dir_name: config.dir_name.clone(),
            grace_period: Duration::from_secs(config.grace_period_secs),
            warn: true,
        }
    }

    pub fn with_warn(mut self, warn: bool) -> Self {
        self.warn = warn;
        self
    }
}

/// Prepared workspace
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    root: PathBuf,
    dir: PathBuf,
}

impl Workspace {
    /// Case root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Workspace directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File inside the workspace
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// File relative to the case root
    pub fn root_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Creates and recycles the adaptation workspace
pub struct WorkspaceManager {
    options: WorkspaceOptions,
}

impl WorkspaceManager {
    pub fn new(options: WorkspaceOptions) -> Self {
        debug!(?options, "WorkspaceManager::new: called");
        Self { options }
    }

    /// Workspace location without touching the filesystem
    pub fn locate(&self) -> Workspace {
        Workspace {
            root: self.options.root.clone(),
            dir: self.options.root.join(&self.options.dir_name),
        }
    }

    /// Create a fresh, empty workspace
    pub async fn prepare(&self) -> Result<Workspace, AdaptError> {
        let workspace = self.locate();
        debug!(dir = ?workspace.dir, "WorkspaceManager::prepare: called");

        if workspace.dir.exists() {
            if self.options.warn {
                let notice = format!(
                    "{} exists. Removing old mesh adaptation in {}s.",
                    workspace.dir.display(),
                    self.options.grace_period.as_secs()
                );
                println!("{}", notice.yellow());
                warn!("{}", notice);
                tokio::time::sleep(self.options.grace_period).await;
            }
            info!("Removing {}", workspace.dir.display());
            tokio::fs::remove_dir_all(&workspace.dir)
                .await
                .map_err(|e| AdaptError::io(&workspace.dir, e))?;
        }

        tokio::fs::create_dir_all(&workspace.dir)
            .await
            .map_err(|e| AdaptError::io(&workspace.dir, e))?;
        info!("Created workspace {}", workspace.dir.display());
        Ok(workspace)
    }
}
