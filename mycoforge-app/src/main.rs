use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::PresetLibrary;
use crate::request::GrowthRequest;
use crate::workflow::PhaseSelection;

mod config;
mod request;
mod workflow;

/// Projects mushroom yield and mycelium colonisation for a substrate batch.
#[derive(Debug, Parser)]
#[command(name = "mycoforge", version, about)]
struct Cli {
    /// Growth request YAML.
    #[arg(short, long, default_value = "mycoforge-app/request.yaml")]
    request: PathBuf,

    /// Directory of preset YAML files. The built-in presets are used when omitted.
    #[arg(short, long)]
    presets: Option<PathBuf>,

    /// Parent directory for run outputs.
    #[arg(short, long, default_value = "./data/runs")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = PhaseSelection::Both)]
    phase: PhaseSelection,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    println!("--- Mycoforge Growth Projection ---");

    let request = GrowthRequest::load(&cli.request)?;
    let library = match &cli.presets {
        Some(dir) => PresetLibrary::load(dir)?,
        None => PresetLibrary::default(),
    };

    let run_name = request.batch_name.replace(char::is_whitespace, "_");
    let output_dir = cli
        .output
        .join(format!("{}_{}", run_name, chrono::Utc::now().format("%Y%m%d_%H%M%S")));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    // Copy the request file to the output directory for traceability
    fs::copy(&cli.request, Path::new(&output_dir).join("request.yaml"))?;

    let output_dir = output_dir.to_string_lossy().to_string();
    let report = workflow::run_projection(&request, &library, cli.phase, &output_dir)?;
    workflow::write_summary(&report, &output_dir)?;
    workflow::print_summary_report(&report, &request);

    println!("\nGrowth projection complete. Results are in '{}'", output_dir);

    Ok(())
}
