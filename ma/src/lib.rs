//! meshadapt - anisotropic mesh adaptation driver
//!
//! Repeatedly adapts a mesh with AMG and re-solves the flow with SU2,
//! stepping through a schedule of target complexities.
//!
//! # Architecture
//!
//! ```text
//! case.cfg ──▶ AdaptationPlan ──▶ WorkspaceManager ──▶ InitialStateResolver
//!                                                            │
//!                                                            ▼
//!                      ┌───────────── CycleDriver ◀──── current triple
//!                      │  adapt (MeshAdapter) ─▶ solve (FlowSolver)
//!                      │  archive ─▶ journal ─▶ rotate
//!                      └──────────────▶ RunSummary
//! ```
//!
//! The external tools sit behind the [`MeshAdapter`] and [`FlowSolver`]
//! ports; success of a call is judged by the files it leaves behind.

pub mod artifacts;
pub mod case;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod gateway;
pub mod initial;
pub mod journal;
pub mod run;
pub mod schedule;
pub mod workspace;

pub use artifacts::{ArchivedIteration, WorkingArtifacts};
pub use case::CaseConfig;
pub use config::Config;
pub use driver::{CycleDriver, CycleState, RunSummary};
pub use error::{AdaptError, ConfigError, DataError, ToolFailure};
pub use gateway::{
    AdaptRequest, AmgAdapter, FlowSolver, Invocation, MeshAdapter, Outcome, ProcessRunner, SolverRun, Su2Solver,
    run_flow_solver, run_mesh_adaptation,
};
pub use initial::{InitialSource, InitialStateResolver};
pub use journal::Journal;
pub use run::AdaptationRun;
pub use schedule::{AdaptationOptions, AdaptationPlan, AdaptationSchedule, BackMesh, ComplexityLevel};
pub use workspace::{Workspace, WorkspaceManager, WorkspaceOptions};
