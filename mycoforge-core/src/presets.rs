//! The canonical mushroom-phase and mycelium-phase presets.
//!
//! Both are built once per process and handed out by shared reference; a run
//! that needs different values goes through [`PresetBuilder`], which clones.
//!
//! [`PresetBuilder`]: crate::simulation::builder::PresetBuilder

use crate::error::ModelError;
use mycoforge_schemas::{
    curve::ResponseCurve,
    preset::{
        Environment, FlowRates, GrowthCoefficients, GrowthPhase, ParameterPreset, ResponseCurves,
        SubstrateParameters, TimeSettings,
    },
};
use std::sync::LazyLock;

pub const MUSHROOM_PRESET_ID: &str = "mushroom-default";
pub const MYCELIUM_PRESET_ID: &str = "mycelium-default";

/// Substrate weight used when a run is asked to start from a non-positive weight.
pub const FALLBACK_DRY_WEIGHT: f64 = 1.0;

static MUSHROOM_PRESET: LazyLock<ParameterPreset> =
    LazyLock::new(|| calibrated_preset(MUSHROOM_PRESET_ID, GrowthPhase::Mushroom));

static MYCELIUM_PRESET: LazyLock<ParameterPreset> =
    LazyLock::new(|| calibrated_preset(MYCELIUM_PRESET_ID, GrowthPhase::Mycelium));

pub fn mushroom_preset() -> &'static ParameterPreset {
    &MUSHROOM_PRESET
}

pub fn mycelium_preset() -> &'static ParameterPreset {
    &MYCELIUM_PRESET
}

pub fn canonical_preset(phase: GrowthPhase) -> &'static ParameterPreset {
    match phase {
        GrowthPhase::Mushroom => mushroom_preset(),
        GrowthPhase::Mycelium => mycelium_preset(),
    }
}

fn calibrated_preset(preset_id: &str, phase: GrowthPhase) -> ParameterPreset {
    ParameterPreset {
        preset_id: preset_id.to_string(),
        phase,
        time: TimeSettings {
            time_start: 0.0,
            time_length: 100.0,
            time_step: 0.2,
        },
        environment: Environment {
            external_co2: 428.23,
            external_temp: 24.0,
            ph: 6.91,
        },
        substrate: SubstrateParameters {
            initial_dry_weight: 410.2,
            initial_cn_ratio: 43.58,
            initial_complex_simple_ratio: 0.8054,
            initial_mycelium_seed: 0.9,
        },
        coefficients: GrowthCoefficients {
            temp_coeff: 1.3,
            ph_coeff: 1.4,
            co2_coeff: 0.8,
            n_coeff: 68.4,
            c_coeff: 0.7,
            growth_coeff: 5.1,
            mushroom_multiplier: 5.17,
        },
        rates: FlowRates {
            carbon_breakdown_rate: 1.11,
            carbon_consumption_rate: 76.39,
            co2_production_rate: 410_000.0,
            co2_removal_rate: 12.6,
            nitrogen_rate: 13.03,
            temp_production_rate: 405.0,
            temp_transfer_rate: 1.5,
        },
        curves: ResponseCurves {
            co2_effect_on_mushroom: ResponseCurve::from([
                (500.0, 0.9),
                (800.0, 1.0),
                (1000.0, 0.8),
                (1200.0, 0.25),
                (1400.0, 0.0),
            ]),
            co2_effect_on_mycelium: ResponseCurve::from([
                (15_000.0, 1.0),
                (20_000.0, 0.9),
                (25_000.0, 0.25),
                (30_000.0, 0.0),
            ]),
            ph_effect_on_mushroom: ResponseCurve::from([
                (5.5, 0.0),
                (6.0, 0.25),
                (6.7, 1.0),
                (7.0, 0.6),
                (7.5, 0.0),
            ]),
            ph_effect_on_mycelium: ResponseCurve::from([
                (5.8, 0.0),
                (6.0, 0.25),
                (6.7, 1.0),
                (7.0, 0.6),
                (7.5, 0.0),
            ]),
            temp_effect_on_mushroom: ResponseCurve::from([
                (10.0, 0.0),
                (15.0, 5.37),
                (20.0, 6.36),
                (25.0, 8.63),
                (30.0, 6.37),
                (40.0, 0.0),
            ]),
            temp_effect_on_mycelium: ResponseCurve::from([
                (10.0, 0.0),
                (15.0, 5.37),
                (20.0, 6.36),
                (25.0, 8.63),
                (30.0, 6.37),
                (35.0, 5.36),
                (45.0, 0.0),
            ]),
        },
    }
}

/// Checks that every curve is non-empty and strictly increasing, and that every scalar is finite.
pub fn validate_preset(preset: &ParameterPreset) -> Result<(), ModelError> {
    let curves = &preset.curves;
    for (name, curve) in [
        ("co2_effect_on_mushroom", &curves.co2_effect_on_mushroom),
        ("co2_effect_on_mycelium", &curves.co2_effect_on_mycelium),
        ("ph_effect_on_mushroom", &curves.ph_effect_on_mushroom),
        ("ph_effect_on_mycelium", &curves.ph_effect_on_mycelium),
        ("temp_effect_on_mushroom", &curves.temp_effect_on_mushroom),
        ("temp_effect_on_mycelium", &curves.temp_effect_on_mycelium),
    ] {
        if curve.is_empty() {
            return Err(ModelError::EmptyCurve(name));
        }
        if curve.points().windows(2).any(|w| !(w[0].x < w[1].x)) {
            return Err(ModelError::UnorderedCurve(name));
        }
    }

    let (time, env, substrate) = (&preset.time, &preset.environment, &preset.substrate);
    let (coeffs, rates) = (&preset.coefficients, &preset.rates);
    let scalars = [
        ("time_start", time.time_start),
        ("time_length", time.time_length),
        ("time_step", time.time_step),
        ("external_co2", env.external_co2),
        ("external_temp", env.external_temp),
        ("ph", env.ph),
        ("initial_dry_weight", substrate.initial_dry_weight),
        ("initial_cn_ratio", substrate.initial_cn_ratio),
        ("initial_complex_simple_ratio", substrate.initial_complex_simple_ratio),
        ("initial_mycelium_seed", substrate.initial_mycelium_seed),
        ("temp_coeff", coeffs.temp_coeff),
        ("ph_coeff", coeffs.ph_coeff),
        ("co2_coeff", coeffs.co2_coeff),
        ("n_coeff", coeffs.n_coeff),
        ("c_coeff", coeffs.c_coeff),
        ("growth_coeff", coeffs.growth_coeff),
        ("mushroom_multiplier", coeffs.mushroom_multiplier),
        ("carbon_breakdown_rate", rates.carbon_breakdown_rate),
        ("carbon_consumption_rate", rates.carbon_consumption_rate),
        ("co2_production_rate", rates.co2_production_rate),
        ("co2_removal_rate", rates.co2_removal_rate),
        ("nitrogen_rate", rates.nitrogen_rate),
        ("temp_production_rate", rates.temp_production_rate),
        ("temp_transfer_rate", rates.temp_transfer_rate),
    ];
    match scalars.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, _)) => Err(ModelError::NonFiniteParameter(name)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_presets_are_valid() {
        assert_eq!(validate_preset(mushroom_preset()), Ok(()));
        assert_eq!(validate_preset(mycelium_preset()), Ok(()));
    }

    #[test]
    fn test_canonical_presets_differ_only_in_identity_and_phase() {
        let mush = mushroom_preset();
        let myc = mycelium_preset();
        assert_eq!(mush.phase, GrowthPhase::Mushroom);
        assert_eq!(myc.phase, GrowthPhase::Mycelium);
        assert_eq!(mush.coefficients, myc.coefficients);
        assert_eq!(mush.curves, myc.curves);
        assert_eq!(canonical_preset(GrowthPhase::Mycelium).preset_id, MYCELIUM_PRESET_ID);
    }

    #[test]
    fn test_canonical_preset_is_shared() {
        assert!(std::ptr::eq(mushroom_preset(), canonical_preset(GrowthPhase::Mushroom)));
    }

    #[test]
    fn test_rejects_empty_curve() {
        let mut preset = mushroom_preset().clone();
        preset.curves.ph_effect_on_mycelium = ResponseCurve::default();
        assert_eq!(validate_preset(&preset), Err(ModelError::EmptyCurve("ph_effect_on_mycelium")));
    }

    #[test]
    fn test_rejects_unordered_curve() {
        let mut preset = mushroom_preset().clone();
        preset.curves.temp_effect_on_mushroom = ResponseCurve::from([(20.0, 1.0), (20.0, 2.0)]);
        assert_eq!(
            validate_preset(&preset),
            Err(ModelError::UnorderedCurve("temp_effect_on_mushroom"))
        );
    }

    #[test]
    fn test_rejects_non_finite_scalar() {
        let mut preset = mycelium_preset().clone();
        preset.rates.nitrogen_rate = f64::NAN;
        assert_eq!(validate_preset(&preset), Err(ModelError::NonFiniteParameter("nitrogen_rate")));
    }
}
