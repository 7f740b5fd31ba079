//! Growth simulation engine for Mycoforge.
//!
//! Integrates the coupled substrate, mycelium and fruiting-body model over a
//! fixed time grid, for either the mushroom or the mycelium phase.

pub mod analysis;
pub mod error;
pub mod interpolation;
pub mod logger;
pub mod presets;
pub mod simulation;

pub use error::{ModelError, MycoforgeError};
pub use simulation::engine::{run, run_growth_projection, GrowthProjection, SimulationRun};
