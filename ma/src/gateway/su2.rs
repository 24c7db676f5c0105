//! SU2 flow solver

use async_trait::async_trait;
use tracing::{debug, info};

use super::process::{Invocation, ProcessRunner, ToolCommand};
use super::{FlowSolver, SolverRun};
use crate::error::AdaptError;

/// Adapter for `SU2_CFD`, optionally under an MPI launcher
#[derive(Debug, Clone)]
pub struct Su2Solver {
    runner: ProcessRunner,
    program: String,
    mpi_launcher: String,
}

impl Su2Solver {
    pub fn new(runner: ProcessRunner, program: impl Into<String>, mpi_launcher: impl Into<String>) -> Self {
        let program = program.into();
        let mpi_launcher = mpi_launcher.into();
        debug!(%program, %mpi_launcher, "Su2Solver::new: called");
        Self {
            runner,
            program,
            mpi_launcher,
        }
    }

    /// Command line for one solver run
    pub fn command(&self, run: &SolverRun) -> ToolCommand {
        let case_file = run.case_file.display().to_string();
        if run.partitions > 1 {
            ToolCommand::new(self.mpi_launcher.as_str(), &run.work_dir, &run.log)
                .arg("-n")
                .arg(run.partitions.to_string())
                .arg(self.runner.resolve(&self.program))
                .arg(case_file)
        } else {
            ToolCommand::new(self.program.as_str(), &run.work_dir, &run.log).arg(case_file)
        }
    }
}

#[async_trait]
impl FlowSolver for Su2Solver {
    async fn invoke(&self, run: &SolverRun) -> Result<Invocation, AdaptError> {
        run.case.write(&run.case_file)?;
        let cmd = self.command(run);
        info!(partitions = run.partitions, "Running SU2, log: {}", run.log.display());
        self.runner.run(&cmd).await
    }
}
