//! Defines the parameter presets that drive a growth simulation.
//! A preset bundles the environment, the substrate's starting composition,
//! the growth coefficients, the flow rates and the response curves for one
//! growth phase.

use crate::curve::ResponseCurve;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two biologically distinct growth regimes the model simulates independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPhase {
    /// Fruiting: mycelium converts substrate into mushroom mass.
    Mushroom,
    /// Colonisation: mycelium spreads through the uncolonised substrate.
    Mycelium,
}

impl GrowthPhase {
    pub const ALL: [GrowthPhase; 2] = [GrowthPhase::Mushroom, GrowthPhase::Mycelium];

    pub fn is_mushroom_phase(self) -> bool {
        matches!(self, GrowthPhase::Mushroom)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GrowthPhase::Mushroom => "mushroom",
            GrowthPhase::Mycelium => "mycelium",
        }
    }
}

impl fmt::Display for GrowthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time axis of a run, in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSettings {
    pub time_start: f64,
    /// Total simulated duration.
    pub time_length: f64,
    /// Fixed integration step.
    pub time_step: f64,
}

/// Conditions outside the growing bag that the headspace relaxes toward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Ambient CO2 concentration in ppm.
    pub external_co2: f64,
    /// Ambient temperature set-point in degrees Celsius.
    pub external_temp: f64,
    /// Substrate pH, held constant for the run.
    pub ph: f64,
}

/// Starting composition of the substrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstrateParameters {
    /// Dry substrate mass in grams.
    pub initial_dry_weight: f64,
    /// Carbon to nitrogen mass ratio.
    pub initial_cn_ratio: f64,
    /// Fraction of the carbon held in complex (undecomposed) form, in `[0, 1]`.
    pub initial_complex_simple_ratio: f64,
    /// Colonised fraction at `t = 0`, in `[0, 1]`.
    pub initial_mycelium_seed: f64,
}

/// Dimensionless coefficients scaling each limiting factor of the growth rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthCoefficients {
    pub temp_coeff: f64,
    pub ph_coeff: f64,
    pub co2_coeff: f64,
    pub n_coeff: f64,
    pub c_coeff: f64,
    pub growth_coeff: f64,
    /// Converts growth rate into fruiting-body mass in the mushroom phase.
    pub mushroom_multiplier: f64,
}

/// Rate constants of the mass and heat flows between state pools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRates {
    pub carbon_breakdown_rate: f64,
    pub carbon_consumption_rate: f64,
    pub co2_production_rate: f64,
    pub co2_removal_rate: f64,
    pub nitrogen_rate: f64,
    pub temp_production_rate: f64,
    pub temp_transfer_rate: f64,
}

/// The six environmental response curves. The active phase picks one of each pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCurves {
    pub co2_effect_on_mushroom: ResponseCurve,
    pub co2_effect_on_mycelium: ResponseCurve,
    pub ph_effect_on_mushroom: ResponseCurve,
    pub ph_effect_on_mycelium: ResponseCurve,
    pub temp_effect_on_mushroom: ResponseCurve,
    pub temp_effect_on_mycelium: ResponseCurve,
}

/// A complete, immutable parameter set for one growth phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterPreset {
    pub preset_id: String,
    pub phase: GrowthPhase,
    pub time: TimeSettings,
    pub environment: Environment,
    pub substrate: SubstrateParameters,
    pub coefficients: GrowthCoefficients,
    pub rates: FlowRates,
    pub curves: ResponseCurves,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&GrowthPhase::Mycelium).unwrap(), "\"mycelium\"");
        let phase: GrowthPhase = serde_yaml::from_str("mushroom").unwrap();
        assert_eq!(phase, GrowthPhase::Mushroom);
    }

    #[test]
    fn test_phase_flag() {
        assert!(GrowthPhase::Mushroom.is_mushroom_phase());
        assert!(!GrowthPhase::Mycelium.is_mushroom_phase());
        assert_eq!(GrowthPhase::Mycelium.to_string(), "mycelium");
    }
}
