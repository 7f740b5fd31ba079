use serde::{Deserialize, Serialize};

/// A partial preset. Every `Some` field replaces the matching preset value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetOverrides {
    pub external_temp: Option<f64>,
    pub external_co2: Option<f64>,
    pub ph: Option<f64>,
    pub initial_dry_weight: Option<f64>,
    pub initial_cn_ratio: Option<f64>,
    pub initial_complex_simple_ratio: Option<f64>,
    pub initial_mycelium_seed: Option<f64>,
    pub time_length: Option<f64>,
    pub time_step: Option<f64>,
}

impl PresetOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The values a caller varies per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    /// External temperature in degrees Celsius.
    pub temperature: f64,
    pub ph: f64,
    /// Dry substrate mass in grams. Must be positive for a meaningful run.
    pub initial_dry_substrate_weight: f64,
    pub duration_days: u32,
    /// Fixed integration step in days.
    pub time_step: f64,
    /// Extra overrides applied after the fields above.
    #[serde(default, skip_serializing_if = "PresetOverrides::is_empty")]
    pub phase_overrides: PresetOverrides,
}

impl SimulationInputs {
    pub fn new(temperature: f64, ph: f64, initial_dry_substrate_weight: f64, duration_days: u32) -> Self {
        Self {
            temperature,
            ph,
            initial_dry_substrate_weight,
            duration_days,
            time_step: 0.2,
            phase_overrides: PresetOverrides::default(),
        }
    }

    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_overrides(mut self, overrides: PresetOverrides) -> Self {
        self.phase_overrides = overrides;
        self
    }
}
