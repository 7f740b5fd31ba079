use super::{
    builder::PresetBuilder,
    derivatives::{derivatives, DEPLETION_EPSILON},
    initial::{fallback_initial_state, initial_state_for},
    integrator::{integrate, StepPlan, Termination},
    state::{RunStatus, RunWarning},
};
use crate::{
    error::MycoforgeError,
    logger::TimeSeriesLogger,
    presets::{canonical_preset, validate_preset},
};
use mycoforge_schemas::{
    inputs::SimulationInputs,
    preset::{GrowthPhase, ParameterPreset},
    record::GrowthRecord,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// The outcome of simulating one phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRun {
    pub preset_id: String,
    pub phase: GrowthPhase,
    pub records: Vec<GrowthRecord>,
    pub status: RunStatus,
    pub warnings: Vec<RunWarning>,
}

impl SimulationRun {
    pub fn initial_record(&self) -> Option<&GrowthRecord> {
        self.records.first()
    }

    pub fn final_record(&self) -> Option<&GrowthRecord> {
        self.records.last()
    }

    pub fn final_yield(&self) -> Option<f64> {
        self.final_record().map(|r| r.mushroom_yield)
    }

    pub fn unstable_count(&self) -> usize {
        self.records.iter().filter(|r| r.unstable).count()
    }

    pub fn used_fallback_state(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, RunWarning::InvalidParameters { .. }))
    }
}

/// Both phases simulated from the same inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthProjection {
    pub mushroom: SimulationRun,
    pub mycelium: SimulationRun,
}

impl GrowthProjection {
    pub fn runs(&self) -> [&SimulationRun; 2] {
        [&self.mushroom, &self.mycelium]
    }
}

/// A single-phase simulation with an optional CSV sink.
pub struct SimulationEngine {
    pub(super) preset: ParameterPreset,
    pub(super) logger: Option<TimeSeriesLogger>,
}

impl SimulationEngine {
    /// Runs the configured preset to completion and logs every record.
    pub fn run(&mut self) -> Result<SimulationRun, MycoforgeError> {
        let run = execute(&self.preset);

        if let Some(logger) = &mut self.logger {
            for record in &run.records {
                logger.log_record(run.phase, &run.preset_id, record)?;
            }
            logger.flush()?;
        }

        Ok(run)
    }

    pub fn get_preset(&self) -> &ParameterPreset {
        &self.preset
    }
}

/// Merges `inputs` into a copy of `preset` and simulates it.
///
/// Never fails: bad substrate parameters fall back to a placeholder initial
/// state, and numerical trouble is reported through the run's status and
/// warnings rather than an error.
pub fn run(inputs: &SimulationInputs, preset: &ParameterPreset) -> SimulationRun {
    let effective = PresetBuilder::from_preset(preset).with_inputs(inputs).build();
    execute(&effective)
}

/// Simulates both canonical phases with the same inputs.
pub fn run_growth_projection(inputs: &SimulationInputs) -> GrowthProjection {
    project_with(
        inputs,
        canonical_preset(GrowthPhase::Mushroom),
        canonical_preset(GrowthPhase::Mycelium),
    )
}

/// Simulates both phases from caller-supplied base presets.
pub fn project_with(
    inputs: &SimulationInputs,
    mushroom: &ParameterPreset,
    mycelium: &ParameterPreset,
) -> GrowthProjection {
    GrowthProjection {
        mushroom: run(inputs, mushroom),
        mycelium: run(inputs, mycelium),
    }
}

/// Simulates `preset` exactly as given.
///
/// A preset that fails [`validate_preset`], or whose time axis needs more than
/// [`MAX_STEPS`](super::integrator::MAX_STEPS) steps, is not integrated: the
/// run is `Aborted` at step 0 with only the initial sample.
pub fn execute(preset: &ParameterPreset) -> SimulationRun {
    let mut warnings = Vec::new();

    let initial = match initial_state_for(preset) {
        Ok(state) => state,
        Err(err) => {
            warn!(preset = %preset.preset_id, error = %err, "invalid substrate parameters, using fallback initial state");
            warnings.push(RunWarning::InvalidParameters { reason: err.to_string() });
            fallback_initial_state(preset)
        }
    };

    let plan = StepPlan::new(preset.time.time_length, preset.time.time_step);
    if let Err(err) = validate_preset(preset).and_then(|()| plan.check()) {
        error!(preset = %preset.preset_id, error = %err, "preset rejected, run not integrated");
        let time = preset.time.time_start;
        return SimulationRun {
            preset_id: preset.preset_id.clone(),
            phase: preset.phase,
            records: vec![initial.to_record(time)],
            status: RunStatus::Aborted {
                step: 0,
                time,
                reason: err.to_string(),
            },
            warnings,
        };
    }

    info!(
        preset = %preset.preset_id,
        phase = %preset.phase,
        steps = plan.num_steps,
        time_step = plan.time_step,
        "starting growth simulation"
    );

    let trajectory = integrate(
        initial,
        |state, t| derivatives(state, t, preset),
        preset.time.time_start,
        plan.time_step,
        plan.num_steps,
    );

    let first_unstable = trajectory.first_unstable().map(|(step, sample)| (step, sample.time));
    if let Some((step, time)) = first_unstable {
        warnings.push(RunWarning::NumericalInstability { step, time });
    }
    let first_negative = trajectory.samples.iter().enumerate().find_map(|(step, sample)| {
        sample
            .state
            .negative_pool(DEPLETION_EPSILON)
            .filter(|_| sample.state.is_finite())
            .map(|pool| (step, sample.time, pool))
    });
    if let Some((step, time, pool)) = first_negative {
        warn!(step, time, pool, "pool went negative");
        warnings.push(RunWarning::NegativePool {
            step,
            time,
            pool: pool.to_string(),
        });
    }

    let steps = trajectory.steps_taken();
    let status = match trajectory.termination {
        Termination::NoSteps => RunStatus::NoStepsExecuted,
        Termination::DerivativeFailed { step, time, error } => RunStatus::Aborted {
            step,
            time,
            reason: error.to_string(),
        },
        Termination::Completed => match first_unstable {
            Some((_, first_unstable_time)) => RunStatus::NumericallyUnstable { steps, first_unstable_time },
            None => RunStatus::Completed { steps },
        },
    };

    let records: Vec<GrowthRecord> = trajectory
        .samples
        .iter()
        .map(|sample| sample.state.to_record(sample.time))
        .collect();

    if let Some(last) = records.last() {
        debug!(time = last.time, mushroom_yield = last.mushroom_yield, "final sample");
    }
    info!(preset = %preset.preset_id, records = records.len(), ?status, "growth simulation finished");

    SimulationRun {
        preset_id: preset.preset_id.clone(),
        phase: preset.phase,
        records,
        status,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{mushroom_preset, mycelium_preset, MUSHROOM_PRESET_ID};
    use mycoforge_schemas::inputs::PresetOverrides;
    use crate::simulation::builder::SimulationBuilder;

    #[test]
    fn test_short_run_completes() {
        let inputs = SimulationInputs::new(25.0, 6.9, 400.0, 2).with_time_step(0.5);
        let run = run(&inputs, mushroom_preset());

        assert_eq!(run.preset_id, MUSHROOM_PRESET_ID);
        assert_eq!(run.status, RunStatus::Completed { steps: 4 });
        assert_eq!(run.records.len(), 5);
        assert!(run.warnings.is_empty());
        assert_eq!(run.final_record().unwrap().time, 2.0);
    }

    #[test]
    fn test_zero_duration_reports_no_steps() {
        let inputs = SimulationInputs::new(25.0, 6.9, 400.0, 0);
        let run = run(&inputs, mushroom_preset());
        assert_eq!(run.status, RunStatus::NoStepsExecuted);
        assert_eq!(run.records.len(), 1);
        assert_eq!(run.initial_record(), run.final_record());
    }

    #[test]
    fn test_invalid_weight_uses_fallback_and_warns() {
        let inputs = SimulationInputs::new(25.0, 6.9, 0.0, 1);
        let run = run(&inputs, mushroom_preset());
        assert!(run.used_fallback_state());
        assert_eq!(run.records.len(), 6);
    }

    #[test]
    fn test_infinite_time_length_is_rejected() {
        let overrides = PresetOverrides {
            time_length: Some(f64::INFINITY),
            ..Default::default()
        };
        let inputs = SimulationInputs::new(25.0, 6.9, 400.0, 40).with_overrides(overrides);
        let run = run(&inputs, mushroom_preset());

        assert_eq!(run.records.len(), 1);
        match &run.status {
            RunStatus::Aborted { step, reason, .. } => {
                assert_eq!(*step, 0);
                assert!(reason.contains("time_length"));
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_oversized_step_count_is_rejected() {
        let overrides = PresetOverrides {
            time_length: Some(1.0e12),
            ..Default::default()
        };
        let inputs = SimulationInputs::new(25.0, 6.9, 400.0, 40).with_overrides(overrides);
        let run = run(&inputs, mycelium_preset());

        assert_eq!(run.records.len(), 1);
        assert!(matches!(run.status, RunStatus::Aborted { step: 0, .. }));
    }

    #[test]
    fn test_non_finite_environment_is_rejected() {
        let mut preset = mushroom_preset().clone();
        preset.environment.ph = f64::NAN;
        let run = execute(&preset);
        assert_eq!(run.records.len(), 1);
        assert!(matches!(run.status, RunStatus::Aborted { step: 0, .. }));
    }

    #[test]
    fn test_projection_runs_both_phases() {
        let inputs = SimulationInputs::new(25.0, 6.9, 400.0, 1);
        let projection = run_growth_projection(&inputs);
        assert_eq!(projection.mushroom.phase, GrowthPhase::Mushroom);
        assert_eq!(projection.mycelium.phase, GrowthPhase::Mycelium);
        assert_eq!(projection.mushroom.records.len(), projection.mycelium.records.len());
        assert!(projection.runs().iter().all(|r| r.status.is_completed()));
    }

    #[test]
    fn test_engine_logs_every_record() {
        let path = std::env::temp_dir().join(format!("mycoforge-engine-{}.csv", std::process::id()));
        let path_str = path.to_string_lossy().to_string();

        let mut engine = SimulationBuilder::new()
            .with_phase(GrowthPhase::Mycelium)
            .with_inputs(SimulationInputs::new(25.0, 6.9, 400.0, 1).with_time_step(0.25))
            .with_timeseries_logging_to_file(&path_str)
            .build()
            .unwrap();
        let run = engine.run().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), run.records.len() + 1);
        std::fs::remove_file(path).ok();
    }
}
