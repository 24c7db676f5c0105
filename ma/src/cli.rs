//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

/// meshadapt - anisotropic mesh adaptation with AMG and SU2
#[derive(Parser)]
#[command(
    name = "ma",
    about = "Drive the AMG / SU2 mesh adaptation loop",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full adaptation workflow
    Run {
        /// SU2 case file carrying the ADAP_* keys
        #[arg(short = 'f', long = "file", value_name = "CFG")]
        file: PathBuf,

        /// Number of solver partitions
        #[arg(short = 'n', long, default_value = "1")]
        partitions: u32,

        /// Remove an existing workspace without waiting
        #[arg(long)]
        no_warn: bool,
    },

    /// Validate the case file and print the adaptation plan
    Plan {
        /// SU2 case file carrying the ADAP_* keys
        #[arg(short = 'f', long = "file", value_name = "CFG")]
        file: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the iterations archived in a workspace
    Status {
        /// Workspace directory
        #[arg(short, long, default_value = "ADAP")]
        dir: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for plan/status commands
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

/// Result of looking for a tool on PATH
pub struct ToolCheck {
    pub name: &'static str,
    pub location: Option<PathBuf>,
}

/// Look for the default external tools on PATH
pub fn check_tools() -> Vec<ToolCheck> {
    ["amg", "SU2_CFD", "mpirun"]
        .into_iter()
        .map(|name| ToolCheck {
            name,
            location: find_on_path(name),
        })
        .collect()
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Help footer listing which tools were found
pub fn generate_after_help() -> String {
    let mut help = String::from("External tools:\n");
    for check in check_tools() {
        let line = match &check.location {
            Some(path) => format!("  {} {:<8} {}\n", "✓".green(), check.name, path.display()),
            None => format!("  {} {:<8} not on PATH (set ADAP_PATH or tools.*)\n", "✗".red(), check.name),
        };
        help.push_str(&line);
    }
    help
}
