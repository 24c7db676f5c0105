//! Subprocess execution for external tools
//!
//! Every tool writes stdout and stderr to its own log file. The optional
//! search directory is consulted first when resolving the program and is
//! prepended to the child's `PATH` only; the parent environment is left alone.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{AdaptError, ToolFailure};

/// What was launched and where its output went
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Command line as issued, with the log redirection
    pub command: String,
    pub log: PathBuf,
    /// Recorded for the log only; success is judged on files
    pub exit_code: Option<i32>,
}

/// A tool command line
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
    log: PathBuf,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, work_dir: &Path, log: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: work_dir.to_path_buf(),
            log: log.to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Shell-style rendering used in logs and failure reports
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line.push_str(" > ");
        line.push_str(&self.log.display().to_string());
        line
    }
}

/// Launches tool commands and waits for them
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    search_path: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(search_path: Option<PathBuf>, timeout: Option<Duration>) -> Self {
        debug!(?search_path, ?timeout, "ProcessRunner::new: called");
        Self { search_path, timeout }
    }

    /// Program path: the search directory wins when it holds the program
    pub fn resolve(&self, program: &str) -> String {
        if program.contains(std::path::MAIN_SEPARATOR) {
            return program.to_string();
        }
        match &self.search_path {
            Some(dir) if dir.join(program).is_file() => dir.join(program).display().to_string(),
            _ => program.to_string(),
        }
    }

    /// `PATH` for the child, with the search directory in front
    fn child_path(&self) -> Option<OsString> {
        let dir = self.search_path.as_ref()?;
        let mut paths = vec![dir.clone()];
        if let Some(current) = std::env::var_os("PATH") {
            paths.extend(std::env::split_paths(&current));
        }
        std::env::join_paths(paths).ok()
    }

    /// Run to completion with output redirected to the command's log
    pub async fn run(&self, command: &ToolCommand) -> Result<Invocation, AdaptError> {
        let program = self.resolve(&command.program);
        let resolved = ToolCommand {
            program: program.clone(),
            ..command.clone()
        };
        let line = resolved.command_line();
        debug!(%line, work_dir = ?command.work_dir, "ProcessRunner::run: called");

        let stdout = File::create(&command.log).map_err(|e| AdaptError::io(&command.log, e))?;
        let stderr = stdout.try_clone().map_err(|e| AdaptError::io(&command.log, e))?;

        let mut cmd = Command::new(&program);
        cmd.args(&command.args)
            .current_dir(&command.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true);
        if let Some(path) = self.child_path() {
            cmd.env("PATH", path);
        }

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| ToolFailure::Launch {
            program: program.clone(),
            source,
        })?;

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };
        let Some(waited) = waited else {
            let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
            warn!(%program, secs, "Tool timed out, killing it");
            if let Err(e) = child.kill().await {
                warn!(%program, error = %e, "Failed to kill timed out tool");
            }
            return Err(ToolFailure::TimedOut {
                program,
                secs,
                log: command.log.clone(),
            }
            .into());
        };
        let status = waited.map_err(|source| ToolFailure::Launch {
            program: program.clone(),
            source,
        })?;

        let exit_code = status.code();
        info!(
            %program,
            ?exit_code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tool finished"
        );

        Ok(Invocation {
            command: line,
            log: command.log.clone(),
            exit_code,
        })
    }
}
