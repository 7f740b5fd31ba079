//! Right-hand side of the growth ODE system.
//!
//! Growth is the product of five independent limiting factors (temperature,
//! pH, CO2, nitrogen, carbon). The active [`GrowthPhase`] decides which
//! response curves are consulted and where growth goes: into fruiting-body
//! mass for `Mushroom`, into colonised substrate for `Mycelium`.

use super::state::StateVector;
use crate::{error::ModelError, interpolation::interpolate};
use mycoforge_schemas::{
    curve::ResponseCurve,
    preset::{GrowthPhase, ParameterPreset},
};

/// Pools at or below this level may not be drawn down any further.
pub const DEPLETION_EPSILON: f64 = 1e-9;

struct PhaseCurves<'a> {
    co2: (&'static str, &'a ResponseCurve),
    ph: (&'static str, &'a ResponseCurve),
    temp: (&'static str, &'a ResponseCurve),
}

fn phase_curves(preset: &ParameterPreset) -> PhaseCurves<'_> {
    let curves = &preset.curves;
    match preset.phase {
        GrowthPhase::Mushroom => PhaseCurves {
            co2: ("co2_effect_on_mushroom", &curves.co2_effect_on_mushroom),
            ph: ("ph_effect_on_mushroom", &curves.ph_effect_on_mushroom),
            temp: ("temp_effect_on_mushroom", &curves.temp_effect_on_mushroom),
        },
        GrowthPhase::Mycelium => PhaseCurves {
            co2: ("co2_effect_on_mycelium", &curves.co2_effect_on_mycelium),
            ph: ("ph_effect_on_mycelium", &curves.ph_effect_on_mycelium),
            temp: ("temp_effect_on_mycelium", &curves.temp_effect_on_mycelium),
        },
    }
}

fn lookup((name, curve): (&'static str, &ResponseCurve), x: f64) -> Result<f64, ModelError> {
    interpolate(curve, x).ok_or(ModelError::EmptyCurve(name))
}

/// The growth rate after phase-specific scaling, and the share of it that drives
/// consumption, production and heating.
struct PhaseGrowth {
    growth_rate: f64,
    normalized_growth_rate: f64,
}

fn phase_growth(phase: GrowthPhase, state: &StateVector, raw_growth_rate: f64, growth_coeff: f64) -> PhaseGrowth {
    match phase {
        GrowthPhase::Mushroom => {
            let growth_rate = (raw_growth_rate * growth_coeff).max(0.0);
            PhaseGrowth {
                growth_rate,
                normalized_growth_rate: growth_rate / 100.0,
            }
        }
        GrowthPhase::Mycelium => {
            let growth_opportunity = state.available_space * state.mycelium_density;
            let growth_rate = (raw_growth_rate * growth_opportunity * growth_coeff).max(0.0);
            PhaseGrowth {
                growth_rate,
                normalized_growth_rate: growth_rate,
            }
        }
    }
}

/// Computes the rate of change of every state component at time `_t`.
///
/// The system is autonomous; `_t` is accepted so the function matches the
/// integrator's `f(y, t)` signature.
pub fn derivatives(state: &StateVector, _t: f64, preset: &ParameterPreset) -> Result<StateVector, ModelError> {
    let env = &preset.environment;
    let coeffs = &preset.coefficients;
    let rates = &preset.rates;

    let weight = if preset.substrate.initial_dry_weight > 0.0 {
        preset.substrate.initial_dry_weight
    } else {
        1.0
    };
    let available_nitrogen_fraction = state.nitrogen / weight;
    let available_carbon_fraction = state.simple_carbon / weight;
    let volume_normalisation = (100.0 / weight).sqrt();

    let curves = phase_curves(preset);
    let co2_multiplier = lookup(curves.co2, state.co2)?;
    let ph_multiplier = lookup(curves.ph, env.ph)?;
    let temp_multiplier = lookup(curves.temp, state.temperature)?;

    let temp_effect = (coeffs.temp_coeff * temp_multiplier / 10.0).max(0.0);
    let ph_effect = (ph_multiplier * coeffs.ph_coeff).max(0.0);
    let co2_effect = (coeffs.co2_coeff * co2_multiplier).max(0.0);
    let n_effect = (coeffs.n_coeff * available_nitrogen_fraction).max(0.0);
    let c_effect = (coeffs.c_coeff * available_carbon_fraction).max(0.0).sqrt().max(0.0);

    let raw_growth_rate = temp_effect * ph_effect * n_effect * c_effect * co2_effect;

    let PhaseGrowth {
        growth_rate,
        normalized_growth_rate,
    } = phase_growth(preset.phase, state, raw_growth_rate, coeffs.growth_coeff);

    let carbon_breakdown = (state.mycelium_density
        * rates.carbon_breakdown_rate
        * state.complex_carbon
        * raw_growth_rate
        * volume_normalisation)
        .max(0.0);
    let carbon_consumption = (normalized_growth_rate * rates.carbon_consumption_rate).max(0.0);
    let co2_production = (normalized_growth_rate * rates.co2_production_rate).max(0.0);
    let co2_venting = rates.co2_removal_rate * (state.co2 - env.external_co2) * volume_normalisation;
    let (colonisation, mushroom_growth) = match preset.phase {
        GrowthPhase::Mycelium => (growth_rate, 0.0),
        GrowthPhase::Mushroom => (0.0, (growth_rate * coeffs.mushroom_multiplier).max(0.0)),
    };
    let nitrogen_consumption = (normalized_growth_rate * rates.nitrogen_rate).max(0.0);
    let temp_production = (normalized_growth_rate * rates.temp_production_rate).max(0.0);
    let temp_venting = (state.temperature - env.external_temp) * rates.temp_transfer_rate * volume_normalisation;

    let rates = StateVector {
        co2: co2_production - co2_venting,
        complex_carbon: -carbon_breakdown,
        mushroom_yield: mushroom_growth,
        mycelium_density: colonisation,
        nitrogen: -nitrogen_consumption,
        simple_carbon: carbon_breakdown - carbon_consumption,
        available_space: -colonisation,
        temperature: temp_production - temp_venting,
    };

    Ok(clamp_depletion(state, rates))
}

/// Zeroes any negative rate on a pool that is already exhausted.
///
/// The first seven components use [`DEPLETION_EPSILON`] as the floor;
/// temperature is only held once it reaches zero. Colonisation moves mass
/// from available space into mycelium density, so when the space outflow is
/// blocked the matching density inflow is withdrawn with it.
pub fn clamp_depletion(state: &StateVector, rates: StateVector) -> StateVector {
    let values = state.to_array();
    let space_outflow = rates.available_space;
    let mut rates = rates.to_array();
    let last = StateVector::LEN - 1;

    for (i, rate) in rates.iter_mut().enumerate().take(last) {
        if values[i] <= DEPLETION_EPSILON && *rate < 0.0 {
            *rate = 0.0;
        }
    }
    if values[last] <= 0.0 && rates[last] < 0.0 {
        rates[last] = 0.0;
    }

    let mut clamped = StateVector::from_array(rates);
    if space_outflow < 0.0 && clamped.available_space == 0.0 {
        clamped.mycelium_density = (clamped.mycelium_density + space_outflow).max(0.0);
    }
    clamped
}
