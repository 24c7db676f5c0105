//! End-to-end adaptation run
//!
//! Loads the case, validates the schedule, prepares the workspace, resolves
//! the starting state and hands over to the [`CycleDriver`].

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::case::CaseConfig;
use crate::config::Config;
use crate::driver::{CycleDriver, RunSummary};
use crate::error::AdaptError;
use crate::gateway::{AmgAdapter, FlowSolver, MeshAdapter, ProcessRunner, Su2Solver};
use crate::initial::{InitialSource, InitialStateResolver};
use crate::schedule::AdaptationPlan;
use crate::workspace::{WorkspaceManager, WorkspaceOptions};

/// A validated run, ready to execute
#[derive(Debug, Clone)]
pub struct AdaptationRun {
    config: Config,
    root: PathBuf,
    case: CaseConfig,
    plan: AdaptationPlan,
    source: InitialSource,
    partitions: u32,
    warn: bool,
}

impl AdaptationRun {
    /// Parse and validate everything before any file is touched
    pub fn load(config: Config, case_file: &Path) -> Result<Self, AdaptError> {
        debug!(?case_file, "AdaptationRun::load: called");
        let case_file = std::path::absolute(case_file).map_err(|e| AdaptError::io(case_file, e))?;
        let root = case_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let case = CaseConfig::load(&case_file)?;
        let mut plan = AdaptationPlan::from_case(&case)?;
        if let Some(search) = plan.options.tool_search_path.take() {
            plan.options.tool_search_path = Some(root.join(search));
        }
        let source = InitialSource::from_case(&case, &root)?;

        Ok(Self {
            config,
            root,
            case,
            plan,
            source,
            partitions: 1,
            warn: true,
        })
    }

    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = partitions.max(1);
        self
    }

    pub fn with_warn(mut self, warn: bool) -> Self {
        self.warn = warn;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn plan(&self) -> &AdaptationPlan {
        &self.plan
    }

    pub fn source(&self) -> &InitialSource {
        &self.source
    }

    /// Subprocess adapters for the configured tools
    pub fn tools(&self) -> (AmgAdapter, Su2Solver) {
        let runner = ProcessRunner::new(self.plan.options.tool_search_path.clone(), self.config.tools.timeout());
        let tools = &self.config.tools;
        (
            AmgAdapter::new(runner.clone(), tools.amg.as_str()),
            Su2Solver::new(runner, tools.solver.as_str(), tools.mpi_launcher.as_str()),
        )
    }

    /// Run with the real tools
    pub async fn execute(&self) -> Result<RunSummary, AdaptError> {
        let (adapter, solver) = self.tools();
        self.execute_with(&adapter, &solver).await
    }

    /// Run with the given tool ports
    pub async fn execute_with(
        &self,
        adapter: &dyn MeshAdapter,
        solver: &dyn FlowSolver,
    ) -> Result<RunSummary, AdaptError> {
        debug!(root = ?self.root, "AdaptationRun::execute_with: called");
        let options = WorkspaceOptions::new(&self.root, &self.config.workspace).with_warn(self.warn);
        let workspace = WorkspaceManager::new(options).prepare().await?;

        InitialStateResolver::new(&workspace, &self.case, solver)
            .with_files(self.config.files.clone())
            .with_partitions(self.partitions)
            .resolve(&self.source)
            .await?;
        info!(warm = self.source.is_warm(), "Initial state ready");

        CycleDriver::new(&workspace, &self.plan, &self.case, adapter, solver)
            .with_files(self.config.files.clone())
            .with_partitions(self.partitions)
            .run()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_resolves_paths_against_case_root() {
        let temp = tempdir().unwrap();
        let case_file = temp.path().join("case.cfg");
        fs::write(
            &case_file,
            "ADAP_COMPLEXITIES= (1000)\nADAP_SUBITE= (1)\nADAP_PATH= bin\nMESH_FILENAME= mesh.meshb\n",
        )
        .unwrap();

        let run = AdaptationRun::load(Config::default(), &case_file).unwrap();

        assert_eq!(run.root(), temp.path());
        assert_eq!(run.plan().options.tool_search_path, Some(temp.path().join("bin")));
        assert_eq!(
            run.source(),
            &InitialSource::Cold {
                mesh: temp.path().join("mesh.meshb")
            }
        );
    }

    #[test]
    fn test_load_rejects_bad_schedule_before_touching_workspace() {
        let temp = tempdir().unwrap();
        let case_file = temp.path().join("case.cfg");
        fs::write(&case_file, "ADAP_COMPLEXITIES= (1000, 2000)\nADAP_SUBITE= (1)\n").unwrap();

        let err = AdaptationRun::load(Config::default(), &case_file).unwrap_err();

        assert!(matches!(err, AdaptError::Config(_)));
        assert!(!temp.path().join("ADAP").exists());
    }
}
