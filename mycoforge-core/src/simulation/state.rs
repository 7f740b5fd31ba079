use super::derivatives::DEPLETION_EPSILON;
use mycoforge_schemas::record::GrowthRecord;
use serde::{Deserialize, Serialize};

const POOL_NAMES: [&str; 7] = [
    "co2",
    "complex_carbon",
    "mushroom_yield",
    "mycelium_density",
    "nitrogen",
    "simple_carbon",
    "available_space",
];

/// The eight quantities the growth model integrates, in their fixed order.
///
/// The same shape carries rates of change, so the RK4 stage arithmetic works
/// on `StateVector` directly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateVector {
    pub co2: f64,
    pub complex_carbon: f64,
    pub mushroom_yield: f64,
    pub mycelium_density: f64,
    pub nitrogen: f64,
    pub simple_carbon: f64,
    pub available_space: f64,
    pub temperature: f64,
}

impl StateVector {
    pub const LEN: usize = 8;

    pub fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.co2,
            self.complex_carbon,
            self.mushroom_yield,
            self.mycelium_density,
            self.nitrogen,
            self.simple_carbon,
            self.available_space,
            self.temperature,
        ]
    }

    pub fn from_array(values: [f64; Self::LEN]) -> Self {
        let [co2, complex_carbon, mushroom_yield, mycelium_density, nitrogen, simple_carbon, available_space, temperature] =
            values;
        Self {
            co2,
            complex_carbon,
            mushroom_yield,
            mycelium_density,
            nitrogen,
            simple_carbon,
            available_space,
            temperature,
        }
    }

    /// `self + scale * rate`, component-wise.
    pub fn add_scaled(&self, rate: &StateVector, scale: f64) -> Self {
        let (a, b) = (self.to_array(), rate.to_array());
        Self::from_array(std::array::from_fn(|i| a[i] + scale * b[i]))
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// The first pool below `-tolerance`, if any. Temperature is not a pool.
    pub fn negative_pool(&self, tolerance: f64) -> Option<&'static str> {
        let values = self.to_array();
        POOL_NAMES
            .iter()
            .zip(values)
            .find(|(_, v)| *v < -tolerance)
            .map(|(name, _)| *name)
    }

    /// Finite, with no pool below `-DEPLETION_EPSILON`.
    pub fn is_physical(&self) -> bool {
        self.is_finite() && self.negative_pool(DEPLETION_EPSILON).is_none()
    }

    pub fn to_record(&self, time: f64) -> GrowthRecord {
        GrowthRecord {
            time,
            co2: self.co2,
            complex_carbon: self.complex_carbon,
            mushroom_yield: self.mushroom_yield,
            mycelium_density: self.mycelium_density,
            nitrogen: self.nitrogen,
            simple_carbon: self.simple_carbon,
            available_space: self.available_space,
            temperature: self.temperature,
            unstable: !self.is_physical(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSample {
    pub time: f64,
    pub state: StateVector,
    /// True when `state` holds a NaN or infinite component, or a negative pool.
    pub unstable: bool,
}

impl SimulationSample {
    pub fn new(time: f64, state: StateVector) -> Self {
        Self {
            time,
            state,
            unstable: !state.is_physical(),
        }
    }
}

/// Non-fatal conditions raised while preparing or executing a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunWarning {
    /// The initial state could not be built from the requested substrate; a fallback was used.
    InvalidParameters { reason: String },
    /// A step produced a non-finite or negative state. Only the first occurrence is recorded.
    NumericalInstability { step: usize, time: f64 },
    /// A finite step drove `pool` below zero. Only the first occurrence is recorded.
    NegativePool { step: usize, time: f64, pool: String },
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed { steps: usize },
    /// Duration and step size left zero steps; only the initial sample exists.
    NoStepsExecuted,
    /// Every step ran but at least one sample is non-finite or has a negative pool.
    NumericallyUnstable { steps: usize, first_unstable_time: f64 },
    /// The preset was rejected (`step` 0) or the derivative function failed;
    /// the trajectory stops at the last good sample.
    Aborted { step: usize, time: f64, reason: String },
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed { .. })
    }
}
