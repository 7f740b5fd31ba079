use serde::{Deserialize, Serialize};

/// One row of a simulation's output: the named state at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthRecord {
    /// Days since the start of the run.
    pub time: f64,
    pub co2: f64,
    pub complex_carbon: f64,
    pub mushroom_yield: f64,
    pub mycelium_density: f64,
    pub nitrogen: f64,
    pub simple_carbon: f64,
    pub available_space: f64,
    pub temperature: f64,
    /// Set when any component of this sample is NaN or infinite.
    pub unstable: bool,
}
