//! Gateway to the external tools and to mesh/field data
//!
//! The adaptation tool and the flow solver are reached through two ports,
//! [`MeshAdapter`] and [`FlowSolver`]. An implementation only launches the
//! tool; whether the call succeeded is decided afterwards by
//! [`run_mesh_adaptation`] / [`run_flow_solver`], which check that the
//! declared output files exist. Exit codes are never trusted.

mod amg;
mod process;
mod su2;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::case::CaseConfig;
use crate::error::AdaptError;

pub use amg::AmgAdapter;
pub use meshio::{
    DataError, FieldData, MeditCodec, MeshCodec, MeshData, SensorKind, create_sensor, create_sensor_named,
    read_mesh, write_mesh, write_solution,
};
pub use process::{Invocation, ProcessRunner, ToolCommand};
pub use su2::Su2Solver;

/// Result of an external call, judged by the files it left behind
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Command line that was issued
    pub command: String,
    /// Where the tool's output went
    pub log: PathBuf,
    /// Declared outputs that do not exist
    pub missing_artifacts: Vec<PathBuf>,
}

impl Outcome {
    /// Post-condition check: every expected file must exist
    pub fn check(invocation: Invocation, expected: &[&Path]) -> Self {
        debug!(command = %invocation.command, ?expected, "Outcome::check: called");
        let missing_artifacts: Vec<PathBuf> = expected
            .iter()
            .filter(|p| !p.is_file())
            .map(|p| p.to_path_buf())
            .collect();

        if !missing_artifacts.is_empty() && invocation.exit_code == Some(0) {
            warn!(?missing_artifacts, "Tool exited 0 but declared outputs are missing");
        }

        Self {
            command: invocation.command,
            log: invocation.log,
            missing_artifacts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.missing_artifacts.is_empty()
    }

    pub fn is_missing(&self, path: &Path) -> bool {
        self.missing_artifacts.iter().any(|p| p == path)
    }
}

/// One call to the mesh adaptation tool
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptRequest {
    pub mesh_in: PathBuf,
    /// Field driving the metric
    pub sensor_in: PathBuf,
    /// Field interpolated onto the adapted mesh
    pub restart_in: PathBuf,
    pub complexity: f64,
    pub gradation: f64,
    pub min_edge_length: f64,
    pub max_edge_length: f64,
    pub back_mesh: Option<PathBuf>,
    pub source_metric: Option<PathBuf>,
    pub mesh_out: PathBuf,
    /// Where the tool leaves the interpolated field
    pub interpolated_out: PathBuf,
    pub log: PathBuf,
    pub work_dir: PathBuf,
}

/// Port to the mesh adaptation tool
#[async_trait]
pub trait MeshAdapter: Send + Sync {
    /// Launch the tool and wait for it
    async fn invoke(&self, request: &AdaptRequest) -> Result<Invocation, AdaptError>;
}

/// Run the adaptation tool; success needs both the mesh and the interpolated field
pub async fn run_mesh_adaptation(adapter: &dyn MeshAdapter, request: &AdaptRequest) -> Result<Outcome, AdaptError> {
    debug!(complexity = request.complexity, "run_mesh_adaptation: called");
    let invocation = adapter.invoke(request).await?;
    Ok(Outcome::check(
        invocation,
        &[request.mesh_out.as_path(), request.interpolated_out.as_path()],
    ))
}

/// One call to the flow solver
#[derive(Debug, Clone, PartialEq)]
pub struct SolverRun {
    /// Fully derived case, written to `case_file` before launch
    pub case: CaseConfig,
    pub case_file: PathBuf,
    pub work_dir: PathBuf,
    pub partitions: u32,
    pub log: PathBuf,
    /// Restart file the solver must produce
    pub restart_out: PathBuf,
}

impl SolverRun {
    /// Derive a run from the base case
    ///
    /// `name` is the stem shared by the derived case file and the log
    /// (e.g. `SU2.3.2000` gives `SU2.3.2000.cfg` and `SU2.3.2000.job`).
    pub fn new(base: &CaseConfig, work_dir: &Path, name: &str, mesh: &Path, restart_out: &Path) -> Self {
        debug!(%name, ?mesh, ?restart_out, "SolverRun::new: called");
        let case = base
            .clone()
            .with("MESH_FILENAME", mesh.display().to_string())
            .with("MESH_FORMAT", "INRIA")
            .with("RESTART_FLOW_FILENAME", restart_out.display().to_string())
            .with("RESTART_SOL", "NO");
        Self {
            case,
            case_file: work_dir.join(format!("{}.cfg", name)),
            work_dir: work_dir.to_path_buf(),
            partitions: 1,
            log: work_dir.join(format!("{}.job", name)),
            restart_out: restart_out.to_path_buf(),
        }
    }

    /// Start from an initial field instead of free stream
    pub fn with_initial_solution(mut self, solution: &Path) -> Self {
        self.case.set("SOLUTION_FLOW_FILENAME", solution.display().to_string());
        self.case.set("RESTART_SOL", "YES");
        self
    }

    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = partitions.max(1);
        self
    }

    pub fn restart_enabled(&self) -> bool {
        self.case.is_yes("RESTART_SOL")
    }
}

/// Port to the flow solver
#[async_trait]
pub trait FlowSolver: Send + Sync {
    /// Launch the solver and wait for it
    async fn invoke(&self, run: &SolverRun) -> Result<Invocation, AdaptError>;
}

/// Run the flow solver; success is the existence of the restart file
pub async fn run_flow_solver(solver: &dyn FlowSolver, run: &SolverRun) -> Result<Outcome, AdaptError> {
    debug!(restart = ?run.restart_out, "run_flow_solver: called");
    let invocation = solver.invoke(run).await?;
    Ok(Outcome::check(invocation, &[run.restart_out.as_path()]))
}
