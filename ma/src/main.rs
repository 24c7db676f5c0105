//! meshadapt - anisotropic mesh adaptation driver
//!
//! CLI entry point for running and inspecting adaptation workflows.

use std::path::Path;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use meshadapt::cli::{Cli, Command, OutputFormat, generate_after_help};
use meshadapt::config::Config;
use meshadapt::{AdaptationRun, Journal};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run {
            file,
            partitions,
            no_warn,
        } => cmd_run(config, &file, partitions, no_warn).await,
        Command::Plan { file, format } => cmd_plan(config, &file, format),
        Command::Status { dir, format } => cmd_status(&dir, format).await,
    }
}

async fn cmd_run(config: Config, file: &Path, partitions: u32, no_warn: bool) -> Result<()> {
    debug!(?file, partitions, no_warn, "cmd_run: called");
    let run = AdaptationRun::load(config, file)
        .context(format!("Invalid adaptation case {}", file.display()))?
        .with_partitions(partitions)
        .with_warn(!no_warn);

    let summary = run.execute().await.context("Mesh adaptation failed")?;

    info!(iterations = summary.iterations, "Run finished");
    println!(
        "{} {} global iteration{}",
        "Mesh adaptation complete:".green().bold(),
        summary.iterations,
        if summary.iterations == 1 { "" } else { "s" }
    );
    if let Some(last) = summary.archives.last() {
        println!("  Final mesh: {}", last.mesh.display());
        println!("  Final restart: {}", last.restart.display());
    }
    Ok(())
}

fn cmd_plan(config: Config, file: &Path, format: OutputFormat) -> Result<()> {
    debug!(?file, ?format, "cmd_plan: called");
    let run = AdaptationRun::load(config, file).context(format!("Invalid adaptation case {}", file.display()))?;
    let plan = run.plan();

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "root": run.root(),
                "warm_start": run.source().is_warm(),
                "total_global_iterations": plan.schedule.total_global_iterations(),
                "plan": plan,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            println!("{}", "Adaptation schedule".bold());
            for (i, level) in plan.schedule.levels().iter().enumerate() {
                println!(
                    "  {}. complexity {} x {} sub-iteration{}",
                    i + 1,
                    level.label().cyan(),
                    level.sub_iterations,
                    if level.sub_iterations == 1 { "" } else { "s" }
                );
            }
            println!("  Total global iterations: {}", plan.schedule.total_global_iterations());

            let options = &plan.options;
            println!("{}", "Options".bold());
            println!("  hmin: {:e}", options.min_edge_length);
            println!("  hmax: {:e}", options.max_edge_length);
            println!("  hgrad: {}", options.gradation);
            match &options.back_mesh.mesh {
                Some(mesh) if options.back_mesh.enabled => println!("  Back mesh: {}", mesh),
                _ => println!("  Back mesh: none"),
            }
            if let Some(path) = &options.tool_search_path {
                println!("  Tool path: {}", path.display());
            }
            println!(
                "  Start: {}",
                if run.source().is_warm() { "warm (ADAP_RESTART)" } else { "cold" }
            );
        }
    }
    Ok(())
}

async fn cmd_status(dir: &Path, format: OutputFormat) -> Result<()> {
    debug!(?dir, ?format, "cmd_status: called");
    let records = Journal::in_dir(dir)
        .read_all()
        .await
        .context(format!("Failed to read journal in {}", dir.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No archived iterations in {}", dir.display());
                return Ok(());
            }
            println!("{:>5}  {:>12}  {:<20}  {}", "ITER", "COMPLEXITY", "ARCHIVED", "MESH");
            for record in &records {
                println!(
                    "{:>5}  {:>12.0}  {:<20}  {}",
                    record.global_iteration,
                    record.complexity,
                    record.archived_at.format("%Y-%m-%d %H:%M:%S"),
                    record.mesh.display()
                );
            }
        }
    }
    Ok(())
}
