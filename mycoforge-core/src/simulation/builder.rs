use crate::{
    error::MycoforgeError,
    logger::TimeSeriesLogger,
    presets::canonical_preset,
    simulation::engine::SimulationEngine,
};
use mycoforge_schemas::{
    inputs::{PresetOverrides, SimulationInputs},
    preset::{GrowthPhase, ParameterPreset},
};

/// One overridable preset field and its new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresetOverride {
    ExternalTemp(f64),
    ExternalCo2(f64),
    Ph(f64),
    InitialDryWeight(f64),
    InitialCnRatio(f64),
    InitialComplexSimpleRatio(f64),
    InitialMyceliumSeed(f64),
    TimeLength(f64),
    TimeStep(f64),
}

/// Expands a partial preset into the individual overrides it carries.
pub fn overrides_from(partial: &PresetOverrides) -> Vec<PresetOverride> {
    [
        partial.external_temp.map(PresetOverride::ExternalTemp),
        partial.external_co2.map(PresetOverride::ExternalCo2),
        partial.ph.map(PresetOverride::Ph),
        partial.initial_dry_weight.map(PresetOverride::InitialDryWeight),
        partial.initial_cn_ratio.map(PresetOverride::InitialCnRatio),
        partial.initial_complex_simple_ratio.map(PresetOverride::InitialComplexSimpleRatio),
        partial.initial_mycelium_seed.map(PresetOverride::InitialMyceliumSeed),
        partial.time_length.map(PresetOverride::TimeLength),
        partial.time_step.map(PresetOverride::TimeStep),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Derives a new preset from a base preset and a set of overrides.
///
/// The base is cloned up front, so the canonical presets are never touched.
#[derive(Debug, Clone)]
pub struct PresetBuilder {
    preset: ParameterPreset,
}

impl PresetBuilder {
    /// Starts from a copy of `base`.
    pub fn from_preset(base: &ParameterPreset) -> Self {
        Self { preset: base.clone() }
    }

    /// Starts from the canonical preset for `phase`.
    pub fn for_phase(phase: GrowthPhase) -> Self {
        Self::from_preset(canonical_preset(phase))
    }

    /// Applies a single override.
    pub fn with(mut self, field: PresetOverride) -> Self {
        let preset = &mut self.preset;
        match field {
            PresetOverride::ExternalTemp(v) => preset.environment.external_temp = v,
            PresetOverride::ExternalCo2(v) => preset.environment.external_co2 = v,
            PresetOverride::Ph(v) => preset.environment.ph = v,
            PresetOverride::InitialDryWeight(v) => preset.substrate.initial_dry_weight = v,
            PresetOverride::InitialCnRatio(v) => preset.substrate.initial_cn_ratio = v,
            PresetOverride::InitialComplexSimpleRatio(v) => preset.substrate.initial_complex_simple_ratio = v,
            PresetOverride::InitialMyceliumSeed(v) => preset.substrate.initial_mycelium_seed = v,
            PresetOverride::TimeLength(v) => preset.time.time_length = v,
            PresetOverride::TimeStep(v) => preset.time.time_step = v,
        }
        self
    }

    pub fn with_external_temp(self, celsius: f64) -> Self {
        self.with(PresetOverride::ExternalTemp(celsius))
    }

    pub fn with_ph(self, ph: f64) -> Self {
        self.with(PresetOverride::Ph(ph))
    }

    pub fn with_initial_dry_weight(self, grams: f64) -> Self {
        self.with(PresetOverride::InitialDryWeight(grams))
    }

    pub fn with_time_length(self, days: f64) -> Self {
        self.with(PresetOverride::TimeLength(days))
    }

    pub fn with_time_step(self, days: f64) -> Self {
        self.with(PresetOverride::TimeStep(days))
    }

    /// Applies every field of a partial preset that is set.
    pub fn with_overrides(self, partial: &PresetOverrides) -> Self {
        overrides_from(partial).into_iter().fold(self, Self::with)
    }

    /// Applies the per-run inputs, then any phase overrides they carry.
    pub fn with_inputs(self, inputs: &SimulationInputs) -> Self {
        self.with_external_temp(inputs.temperature)
            .with_ph(inputs.ph)
            .with_initial_dry_weight(inputs.initial_dry_substrate_weight)
            .with_time_length(f64::from(inputs.duration_days))
            .with_time_step(inputs.time_step)
            .with_overrides(&inputs.phase_overrides)
    }

    pub fn build(self) -> ParameterPreset {
        self.preset
    }
}

/// A fluent builder for constructing a `SimulationEngine`.
///
/// The engine runs one phase. Supply a base preset (or a phase, to use the
/// canonical preset), optionally the per-run inputs to merge into it, and
/// optionally a CSV file to receive every emitted record.
#[derive(Default)]
pub struct SimulationBuilder {
    preset: Option<ParameterPreset>,
    inputs: Option<SimulationInputs>,
    log_path: Option<String>,
}

impl SimulationBuilder {
    /// Creates a new, empty `SimulationBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base preset the run starts from.
    pub fn with_preset(mut self, preset: &ParameterPreset) -> Self {
        self.preset = Some(preset.clone());
        self
    }

    /// Uses the canonical preset for `phase` as the base.
    pub fn with_phase(self, phase: GrowthPhase) -> Self {
        self.with_preset(canonical_preset(phase))
    }

    /// Sets the per-run inputs merged over the base preset.
    pub fn with_inputs(mut self, inputs: SimulationInputs) -> Self {
        self.inputs = Some(inputs);
        self
    }

    /// Configures the simulation to write time-series data to the specified CSV file.
    pub fn with_timeseries_logging_to_file(mut self, path: &str) -> Self {
        self.log_path = Some(path.to_string());
        self
    }

    /// Consumes the builder and returns a fully configured `SimulationEngine`.
    ///
    /// # Errors
    ///
    /// Returns a `MycoforgeError` if no preset was provided or the log file
    /// cannot be created.
    pub fn build(self) -> Result<SimulationEngine, MycoforgeError> {
        let base = self.preset.ok_or(MycoforgeError::PresetNotDefined)?;
        let preset = match &self.inputs {
            Some(inputs) => PresetBuilder::from_preset(&base).with_inputs(inputs).build(),
            None => base,
        };

        let logger = match self.log_path {
            Some(path) => Some(
                TimeSeriesLogger::new(&path)
                    .map_err(|e| MycoforgeError::FileIO(path.clone(), e))?,
            ),
            None => None,
        };

        Ok(SimulationEngine { preset, logger })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{mushroom_preset, mycelium_preset};

    #[test]
    fn test_overrides_produce_new_preset() {
        let preset = PresetBuilder::from_preset(mushroom_preset())
            .with_external_temp(27.5)
            .with_ph(6.4)
            .with_initial_dry_weight(250.0)
            .with_time_length(30.0)
            .build();

        assert_eq!(preset.environment.external_temp, 27.5);
        assert_eq!(preset.environment.ph, 6.4);
        assert_eq!(preset.substrate.initial_dry_weight, 250.0);
        assert_eq!(preset.time.time_length, 30.0);
        assert_eq!(preset.coefficients, mushroom_preset().coefficients);

        assert_eq!(mushroom_preset().environment.external_temp, 24.0);
        assert_eq!(mushroom_preset().substrate.initial_dry_weight, 410.2);
    }

    #[test]
    fn test_inputs_then_partial_overrides() {
        let overrides = PresetOverrides {
            initial_mycelium_seed: Some(0.3),
            ph: Some(6.5),
            ..Default::default()
        };
        let inputs = SimulationInputs::new(25.0, 6.9, 400.0, 40)
            .with_time_step(0.1)
            .with_overrides(overrides);
        let preset = PresetBuilder::for_phase(GrowthPhase::Mycelium).with_inputs(&inputs).build();

        assert_eq!(preset.phase, GrowthPhase::Mycelium);
        assert_eq!(preset.environment.external_temp, 25.0);
        assert_eq!(preset.environment.ph, 6.5);
        assert_eq!(preset.substrate.initial_mycelium_seed, 0.3);
        assert_eq!(preset.time.time_length, 40.0);
        assert_eq!(preset.time.time_step, 0.1);
        assert_eq!(preset.substrate.initial_cn_ratio, mycelium_preset().substrate.initial_cn_ratio);
    }

    #[test]
    fn test_overrides_from_skips_unset_fields() {
        let partial = PresetOverrides {
            external_co2: Some(600.0),
            time_length: Some(12.0),
            ..Default::default()
        };
        assert_eq!(
            overrides_from(&partial),
            vec![PresetOverride::ExternalCo2(600.0), PresetOverride::TimeLength(12.0)]
        );
        assert!(overrides_from(&PresetOverrides::default()).is_empty());
    }

    #[test]
    fn test_build_requires_preset() {
        assert!(matches!(
            SimulationBuilder::new().build(),
            Err(MycoforgeError::PresetNotDefined)
        ));
    }

    #[test]
    fn test_engine_receives_merged_preset() {
        let engine = SimulationBuilder::new()
            .with_phase(GrowthPhase::Mushroom)
            .with_inputs(SimulationInputs::new(22.0, 6.8, 500.0, 10))
            .build()
            .unwrap();
        let preset = engine.get_preset();
        assert_eq!(preset.environment.external_temp, 22.0);
        assert_eq!(preset.substrate.initial_dry_weight, 500.0);
        assert_eq!(preset.time.time_length, 10.0);
    }
}
