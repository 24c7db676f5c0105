use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use meshio::cli::{Cli, Command};
use meshio::{MeditCodec, create_sensor_named, read_mesh, write_solution};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();

    info!("meshio starting");

    match cli.command {
        Command::Info { mesh, solution } => {
            let data = read_mesh(&MeditCodec, &mesh, solution.as_deref())
                .context(format!("Failed to read {}", mesh.display()))?;
            println!("Mesh: {}", mesh.display().to_string().cyan());
            println!("  Dimension: {}", data.dimension.as_usize());
            println!("  Vertices: {}", data.vertices.len());
            println!("  Edges: {}", data.edges.len());
            println!("  Triangles: {}", data.triangles.len());
            println!("  Tetrahedra: {}", data.tetrahedra.len());
            if !data.markers.is_empty() {
                println!("  Markers: {}", data.markers.join(", "));
            }
            if !data.field.is_empty() {
                println!(
                    "  Field: {} x {} [{}]",
                    data.field.len(),
                    data.field.width(),
                    data.field.tags().join(", ").yellow()
                );
            }
        }
        Command::Sensor {
            mesh,
            solution,
            kind,
            output,
        } => {
            let flow = read_mesh(&MeditCodec, &mesh, Some(&solution))
                .context(format!("Failed to read {}", solution.display()))?;
            let sensor = create_sensor_named(&flow, &kind)?;
            write_solution(&MeditCodec, &output, &sensor)?;
            println!(
                "{} Wrote {} sensor to {}",
                "✓".green(),
                kind.to_uppercase().cyan(),
                output.display()
            );
        }
    }

    Ok(())
}
