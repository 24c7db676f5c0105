//! Adaptation cycle driver
//!
//! Walks the schedule level by level. Every sub-iteration adapts the current
//! triple, solves on the adapted mesh, archives the result and rotates it in
//! as the new current triple. The first failure ends the run; whatever was
//! archived before it stays on disk.

use std::path::PathBuf;

use colored::Colorize;
use tracing::{debug, error, info};

use crate::artifacts::{ArchivedIteration, WorkingArtifacts, remove_if_exists};
use crate::case::CaseConfig;
use crate::config::FilesConfig;
use crate::error::{AdaptError, ConfigError, ToolFailure};
use crate::gateway::{AdaptRequest, FlowSolver, MeshAdapter, SolverRun, run_flow_solver, run_mesh_adaptation};
use crate::journal::Journal;
use crate::schedule::{AdaptationPlan, ComplexityLevel};
use crate::workspace::Workspace;

/// Optional source term for the metric, looked up in the case root
pub const SOURCE_METRIC: &str = "adap.source";

/// Position in the schedule
#[derive(Debug, Clone, PartialEq)]
pub struct CycleState {
    /// 1-based, never reset between levels
    pub global_iteration: u32,
    pub complexity_index: usize,
    pub sub_iteration_index: u32,
    pub root_dir: PathBuf,
    pub work_dir: PathBuf,
}

/// What a completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub iterations: u32,
    pub archives: Vec<ArchivedIteration>,
}

/// Runs the nested complexity / sub-iteration loop
pub struct CycleDriver<'a> {
    workspace: &'a Workspace,
    plan: &'a AdaptationPlan,
    case: &'a CaseConfig,
    adapter: &'a dyn MeshAdapter,
    solver: &'a dyn FlowSolver,
    files: FilesConfig,
    partitions: u32,
    journal: Journal,
}

impl<'a> CycleDriver<'a> {
    pub fn new(
        workspace: &'a Workspace,
        plan: &'a AdaptationPlan,
        case: &'a CaseConfig,
        adapter: &'a dyn MeshAdapter,
        solver: &'a dyn FlowSolver,
    ) -> Self {
        debug!(dir = ?workspace.dir(), "CycleDriver::new: called");
        Self {
            workspace,
            plan,
            case,
            adapter,
            solver,
            files: FilesConfig::default(),
            partitions: 1,
            journal: Journal::in_dir(workspace.dir()),
        }
    }

    pub fn with_files(mut self, files: FilesConfig) -> Self {
        self.files = files;
        self
    }

    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = partitions.max(1);
        self
    }

    /// Run the whole schedule
    pub async fn run(&self) -> Result<RunSummary, AdaptError> {
        debug!("CycleDriver::run: called");
        let artifacts = WorkingArtifacts::new(self.workspace.dir());
        if !artifacts.has_current_triple() {
            let missing = artifacts.current_triple().into_iter().filter(|p| !p.is_file()).collect();
            return Err(ConfigError::MissingInitialFiles { missing }.into());
        }

        let mut state = CycleState {
            global_iteration: 1,
            complexity_index: 0,
            sub_iteration_index: 0,
            root_dir: self.workspace.root().to_path_buf(),
            work_dir: self.workspace.dir().to_path_buf(),
        };
        let mut archives = Vec::new();

        for (complexity_index, level) in self.plan.schedule.levels().iter().enumerate() {
            println!(
                "{} {}: {} sub-iteration{}",
                " -- Mesh complexity".cyan().bold(),
                level.label(),
                level.sub_iterations,
                if level.sub_iterations > 1 { "s" } else { "" }
            );

            for sub_iteration_index in 0..level.sub_iterations {
                state.complexity_index = complexity_index;
                state.sub_iteration_index = sub_iteration_index;
                println!(
                    "    -- Sub-iteration {}/{} (global iteration {})",
                    sub_iteration_index + 1,
                    level.sub_iterations,
                    state.global_iteration
                );

                let archived = self.sub_iteration(&state, level, &artifacts).await?;
                archives.push(archived);
                state.global_iteration += 1;
            }
        }

        let iterations = state.global_iteration - 1;
        info!(iterations, "Adaptation schedule complete");
        Ok(RunSummary { iterations, archives })
    }

    async fn sub_iteration(
        &self,
        state: &CycleState,
        level: &ComplexityLevel,
        artifacts: &WorkingArtifacts,
    ) -> Result<ArchivedIteration, AdaptError> {
        let iteration = state.global_iteration;
        debug!(?state, "CycleDriver::sub_iteration: called");
        artifacts.clear_next()?;

        let request = self.adapt_request(state, level, artifacts);
        println!("       Running AMG. Log: {}", file_name(&request.log));
        let outcome = run_mesh_adaptation(self.adapter, &request).await?;
        if outcome.is_missing(&request.mesh_out) {
            error!(iteration, command = %outcome.command, "Adapted mesh missing");
            return Err(ToolFailure::AdaptedMeshMissing {
                iteration,
                command: outcome.command,
                log: outcome.log,
            }
            .into());
        }
        if outcome.is_missing(&request.interpolated_out) {
            error!(iteration, command = %outcome.command, "Interpolated solution missing");
            return Err(ToolFailure::InterpolationMissing {
                iteration,
                command: outcome.command,
                log: outcome.log,
            }
            .into());
        }
        let initial = artifacts.promote_interpolated()?;

        let solver_sensor = self.workspace.path(&self.files.sensor);
        let history = self.workspace.path(&self.files.history);
        remove_if_exists(&solver_sensor)?;
        remove_if_exists(&history)?;

        let run = SolverRun::new(
            self.case,
            &state.work_dir,
            &format!("SU2.{}.{}", iteration, level.label()),
            &artifacts.next_mesh(),
            &artifacts.next_restart(),
        )
        .with_initial_solution(&initial)
        .with_partitions(self.partitions);
        println!("       Running SU2. Log: {}", file_name(&run.log));
        let outcome = run_flow_solver(self.solver, &run).await?;
        if !outcome.is_success() {
            error!(iteration, "Flow solver produced no restart file");
            return Err(ToolFailure::RestartMissing {
                iteration,
                restart: run.restart_out,
                log: outcome.log,
            }
            .into());
        }
        if !solver_sensor.is_file() {
            error!(iteration, "Flow solver produced no sensor file");
            return Err(ToolFailure::SensorMissing {
                iteration,
                sensor: solver_sensor,
                log: outcome.log,
            }
            .into());
        }
        artifacts.capture_sensor(&solver_sensor)?;

        let archived = artifacts.archive(iteration, level, &history)?;
        self.journal.append(&archived).await?;
        artifacts.rotate()?;
        info!(iteration, complexity = level.complexity, "Sub-iteration archived");
        Ok(archived)
    }

    fn adapt_request(&self, state: &CycleState, level: &ComplexityLevel, artifacts: &WorkingArtifacts) -> AdaptRequest {
        let options = &self.plan.options;
        let back_mesh = match (options.back_mesh.enabled, &options.back_mesh.mesh) {
            (true, Some(name)) => Some(state.root_dir.join(name)),
            _ => None,
        };
        let source = state.root_dir.join(SOURCE_METRIC);

        AdaptRequest {
            mesh_in: artifacts.current_mesh(),
            sensor_in: artifacts.current_sensor(),
            restart_in: artifacts.current_restart(),
            complexity: level.complexity,
            gradation: options.gradation,
            min_edge_length: options.min_edge_length,
            max_edge_length: options.max_edge_length,
            back_mesh,
            source_metric: source.is_file().then_some(source),
            mesh_out: artifacts.next_mesh(),
            interpolated_out: artifacts.interpolated(),
            log: state
                .work_dir
                .join(format!("AMG.{}.{}.job", state.global_iteration, level.label())),
            work_dir: state.work_dir.clone(),
        }
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
