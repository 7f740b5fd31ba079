use crate::{config::PresetLibrary, request::GrowthRequest};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use mycoforge_core::{
    analysis::{self, GrowthSummary, YieldCheckpoint, DEFAULT_CHECKPOINT_DAYS},
    simulation::{builder::SimulationBuilder, state::RunWarning},
    SimulationRun,
};
use mycoforge_schemas::{inputs::SimulationInputs, preset::GrowthPhase};
use serde::Serialize;
use std::{fs, path::Path};
use tracing::info;

/// Which phases to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhaseSelection {
    Both,
    Mushroom,
    Mycelium,
}

impl PhaseSelection {
    pub fn phases(self) -> Vec<GrowthPhase> {
        match self {
            PhaseSelection::Both => GrowthPhase::ALL.to_vec(),
            PhaseSelection::Mushroom => vec![GrowthPhase::Mushroom],
            PhaseSelection::Mycelium => vec![GrowthPhase::Mycelium],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhaseReport {
    pub summary: GrowthSummary,
    pub checkpoints: Vec<YieldCheckpoint>,
    pub log_file: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectionReport {
    pub batch_name: String,
    pub start_date: Option<NaiveDate>,
    pub harvest_date: Option<NaiveDate>,
    pub inputs: SimulationInputs,
    pub phases: Vec<PhaseReport>,
}

/// Runs every selected phase, logging each to `<phase>_timeseries.csv` in `output_dir`.
pub fn run_projection(
    request: &GrowthRequest,
    library: &PresetLibrary,
    selection: PhaseSelection,
    output_dir: &str,
) -> Result<ProjectionReport> {
    println!("\n--- [Workflow] Starting Growth Projection: {} ---", request.batch_name);

    let mut phases = Vec::new();
    let mut inputs_used = None;

    for phase in selection.phases() {
        let preset_id = match phase {
            GrowthPhase::Mushroom => request.mushroom_preset.as_deref(),
            GrowthPhase::Mycelium => request.mycelium_preset.as_deref(),
        };
        let preset = library.resolve(phase, preset_id)?;
        // Duration is whole days; the preset's time length is the fallback.
        let inputs = request.to_simulation_inputs(preset.time.time_length.max(0.0).round() as u32);

        let log_file = format!("{}/{}_timeseries.csv", output_dir, phase);
        let mut engine = SimulationBuilder::new()
            .with_preset(&preset)
            .with_inputs(inputs.clone())
            .with_timeseries_logging_to_file(&log_file)
            .build()?;

        info!(%phase, preset = %preset.preset_id, "running phase");
        let run = engine.run()?;
        phases.push(phase_report(&run, log_file));
        inputs_used.get_or_insert(inputs);
    }

    let inputs = inputs_used.context("No growth phase was selected")?;
    Ok(ProjectionReport {
        batch_name: request.batch_name.clone(),
        start_date: request.start_date()?,
        harvest_date: request.harvest_date(inputs.duration_days)?,
        inputs,
        phases,
    })
}

fn phase_report(run: &SimulationRun, log_file: String) -> PhaseReport {
    PhaseReport {
        summary: analysis::summarize(run),
        checkpoints: analysis::yield_checkpoints(&run.records, &DEFAULT_CHECKPOINT_DAYS),
        log_file,
    }
}

pub fn write_summary(report: &ProjectionReport, output_dir: &str) -> Result<()> {
    let path = Path::new(output_dir).join("summary.json");
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}{}", v, unit),
        Some(_) => "non-finite".to_string(),
        None => "n/a".to_string(),
    }
}

fn describe_warning(warning: &RunWarning) -> String {
    match warning {
        RunWarning::InvalidParameters { reason } => {
            format!("Substrate parameters rejected ({}); a fallback initial state was used", reason)
        }
        RunWarning::NumericalInstability { step, time } => {
            format!("State became non-finite or negative at step {} (day {:.1})", step, time)
        }
        RunWarning::NegativePool { step, time, pool } => {
            format!("Pool '{}' went negative at step {} (day {:.1}); try a heavier substrate", pool, step, time)
        }
    }
}

pub fn print_summary_report(report: &ProjectionReport, request: &GrowthRequest) {
    let inputs = &report.inputs;

    println!("\n\n--- [Growth Projection Report] ---");
    println!("========================================");
    println!("Batch: {}", report.batch_name);
    if let Some(start) = report.start_date {
        println!("Start Date: {}", start.format("%Y-%m-%d"));
    }
    if let Some(harvest) = report.harvest_date {
        println!("Projected Harvest Date: {}", harvest.format("%Y-%m-%d"));
    }
    println!("Duration: {} days (step {} days)", inputs.duration_days, inputs.time_step);
    println!("----------------------------------------");

    println!("\nConditions:");
    println!("  - Temperature: {:.1} °C", inputs.temperature);
    println!("  - pH:          {:.2}", inputs.ph);

    println!("\nSubstrate:");
    for (name, grams) in request.substrate.components() {
        if grams > 0.0 {
            println!("  - {}: {:.1} g", name, grams);
        }
    }
    println!("  - Total dry weight: {:.1} g", inputs.initial_dry_substrate_weight);
    if let Some(cn) = inputs.phase_overrides.initial_cn_ratio {
        println!("  - Initial C:N ratio: {:.2}", cn);
    }

    for phase in &report.phases {
        let summary = &phase.summary;
        println!("\n[{} phase] preset '{}'", summary.phase, summary.preset_id);
        println!("  - Status: {:?}", summary.status);
        if summary.phase.is_mushroom_phase() {
            println!("  - Projected Yield: {}", format_value(summary.final_yield, " g"));
            println!("  - Yield Checkpoints:");
            for checkpoint in &phase.checkpoints {
                println!(
                    "    - Day {:>3}: {}",
                    checkpoint.day,
                    format_value(checkpoint.mushroom_yield, " g")
                );
            }
        } else {
            println!("  - Final Colonisation: {}", format_value(summary.final_colonisation.map(|c| c * 100.0), " %"));
            match summary.colonised_at {
                Some(day) => println!("  - Fully colonised by day {:.1}", day),
                None => println!("  - Not fully colonised within the run"),
            }
        }
        println!("  - Peak Temperature: {}", format_value(summary.peak_temperature, " °C"));
        println!("  - Peak CO2: {}", format_value(summary.peak_co2, " ppm"));
        for warning in &summary.warnings {
            println!("  ! {}", describe_warning(warning));
        }
        println!("  - Time series: {}", phase.log_file);
    }
    println!("========================================");
}
