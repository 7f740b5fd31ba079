use super::state::StateVector;
use crate::{
    error::ModelError,
    presets::{canonical_preset, FALLBACK_DRY_WEIGHT},
};
use mycoforge_schemas::preset::{GrowthPhase, ParameterPreset};

/// Splits the dry substrate into nitrogen, complex carbon and simple carbon pools
/// and seeds the colonised fraction.
pub fn build_initial_state(
    initial_dry_weight: f64,
    cn_ratio: f64,
    complex_simple_ratio: f64,
    external_co2: f64,
    external_temp: f64,
    initial_mycelium_seed: f64,
) -> Result<StateVector, ModelError> {
    if !(initial_dry_weight > 0.0) {
        return Err(ModelError::InvalidParameters(format!(
            "initial dry substrate weight must be positive, got {initial_dry_weight}"
        )));
    }
    if !(cn_ratio > 0.0) {
        return Err(ModelError::InvalidParameters(format!(
            "C:N ratio must be positive, got {cn_ratio}"
        )));
    }
    if !(0.0..=1.0).contains(&complex_simple_ratio) {
        return Err(ModelError::InvalidParameters(format!(
            "complex:simple carbon ratio must lie in [0, 1], got {complex_simple_ratio}"
        )));
    }

    let nitrogen = initial_dry_weight / (cn_ratio + 1.0);
    let total_carbon = initial_dry_weight - nitrogen;

    Ok(StateVector {
        co2: external_co2,
        complex_carbon: total_carbon * complex_simple_ratio,
        mushroom_yield: 0.0,
        mycelium_density: initial_mycelium_seed,
        nitrogen,
        simple_carbon: total_carbon * (1.0 - complex_simple_ratio),
        available_space: (1.0 - initial_mycelium_seed).max(0.0),
        temperature: external_temp,
    })
}

/// Builds the initial state for `preset`.
pub fn initial_state_for(preset: &ParameterPreset) -> Result<StateVector, ModelError> {
    let substrate = &preset.substrate;
    build_initial_state(
        substrate.initial_dry_weight,
        substrate.initial_cn_ratio,
        substrate.initial_complex_simple_ratio,
        preset.environment.external_co2,
        preset.environment.external_temp,
        substrate.initial_mycelium_seed,
    )
}

/// The state a run starts from when `initial_state_for` rejects the preset.
///
/// Each offending substrate value is swapped for a stand-in: a non-positive
/// weight becomes [`FALLBACK_DRY_WEIGHT`] (the same unit weight the derivative
/// function divides by), and a bad C:N or complex:simple ratio takes the
/// canonical preset's value. These stand-ins keep the run going; they are not
/// calibrated biology.
pub fn fallback_initial_state(preset: &ParameterPreset) -> StateVector {
    let defaults = &canonical_preset(preset.phase).substrate;
    let substrate = &preset.substrate;

    let weight = if substrate.initial_dry_weight > 0.0 {
        substrate.initial_dry_weight
    } else {
        FALLBACK_DRY_WEIGHT
    };
    let cn_ratio = if substrate.initial_cn_ratio > 0.0 {
        substrate.initial_cn_ratio
    } else {
        defaults.initial_cn_ratio
    };
    let complex_simple_ratio = if (0.0..=1.0).contains(&substrate.initial_complex_simple_ratio) {
        substrate.initial_complex_simple_ratio
    } else {
        defaults.initial_complex_simple_ratio
    };

    build_initial_state(
        weight,
        cn_ratio,
        complex_simple_ratio,
        preset.environment.external_co2,
        preset.environment.external_temp,
        substrate.initial_mycelium_seed,
    )
    .unwrap_or_else(|_| placeholder_state(preset.phase))
}

// Only reachable if the canonical substrate values themselves were invalid.
fn placeholder_state(phase: GrowthPhase) -> StateVector {
    let preset = canonical_preset(phase);
    StateVector {
        co2: preset.environment.external_co2,
        temperature: preset.environment.external_temp,
        mycelium_density: preset.substrate.initial_mycelium_seed,
        available_space: (1.0 - preset.substrate.initial_mycelium_seed).max(0.0),
        ..StateVector::default()
    }
}
