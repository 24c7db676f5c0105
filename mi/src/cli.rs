//! CLI argument parsing for meshio

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mi")]
#[command(author, version, about = "Inspect meshes and extract adaptation sensors", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show dimension, element counts and field columns
    Info {
        /// Mesh file (.mesh)
        #[arg(required = true)]
        mesh: PathBuf,

        /// Solution file (.sol) defined on the mesh vertices
        solution: Option<PathBuf>,
    },

    /// Extract a sensor field from a flow solution
    Sensor {
        /// Mesh file (.mesh)
        #[arg(required = true)]
        mesh: PathBuf,

        /// Flow solution file (.sol)
        #[arg(required = true)]
        solution: PathBuf,

        /// Sensor kind (MACH, PRES, MACH_PRES)
        #[arg(required = true)]
        kind: String,

        /// Output solution file
        #[arg(required = true)]
        output: PathBuf,
    },
}
