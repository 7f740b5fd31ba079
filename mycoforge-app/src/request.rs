use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use mycoforge_schemas::inputs::{PresetOverrides, SimulationInputs};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

const DEFAULT_TIME_STEP: f64 = 0.2;

/// Dry substrate ingredients, in grams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstrateMix {
    pub rice_bran: f64,
    pub corn_cob: f64,
    pub sugarcane: f64,
    pub sawdust: f64,
}

impl SubstrateMix {
    pub fn total_weight(&self) -> f64 {
        self.rice_bran + self.corn_cob + self.sugarcane + self.sawdust
    }

    pub fn components(&self) -> [(&'static str, f64); 4] {
        [
            ("Rice bran", self.rice_bran),
            ("Corn cob", self.corn_cob),
            ("Sugarcane", self.sugarcane),
            ("Sawdust", self.sawdust),
        ]
    }
}

/// A grower's request for a growth projection, read from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRequest {
    pub batch_name: String,
    /// Inoculation date, `YYYY-MM-DD`.
    #[serde(default)]
    pub start_date: Option<String>,
    pub temperature: f64,
    pub ph: f64,
    pub substrate: SubstrateMix,
    /// Days to simulate. Defaults to the preset's time length.
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub initial_cn_ratio: Option<f64>,
    #[serde(default)]
    pub time_step: Option<f64>,
    #[serde(default)]
    pub mushroom_preset: Option<String>,
    #[serde(default)]
    pub mycelium_preset: Option<String>,
    #[serde(default)]
    pub overrides: PresetOverrides,
}

impl GrowthRequest {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn start_date(&self) -> Result<Option<NaiveDate>> {
        self.start_date
            .as_deref()
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .with_context(|| format!("start_date '{s}' is not a YYYY-MM-DD date"))
            })
            .transpose()
    }

    pub fn harvest_date(&self, duration_days: u32) -> Result<Option<NaiveDate>> {
        Ok(self
            .start_date()?
            .map(|start| start + Duration::days(i64::from(duration_days))))
    }

    /// Builds the per-run inputs. `default_days` applies when the request names no duration.
    pub fn to_simulation_inputs(&self, default_days: u32) -> SimulationInputs {
        let mut overrides = self.overrides.clone();
        if self.initial_cn_ratio.is_some() {
            overrides.initial_cn_ratio = self.initial_cn_ratio;
        }

        SimulationInputs::new(
            self.temperature,
            self.ph,
            self.substrate.total_weight(),
            self.duration_days.unwrap_or(default_days),
        )
        .with_time_step(self.time_step.unwrap_or(DEFAULT_TIME_STEP))
        .with_overrides(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"
batch_name: Shelf B
start_date: 2024-03-01
temperature: 25.0
ph: 6.9
substrate:
  rice_bran: 100.0
  corn_cob: 150.0
  sawdust: 150.0
duration_days: 40
initial_cn_ratio: 39.0
"#;

    #[test]
    fn test_request_to_inputs() {
        let request: GrowthRequest = serde_yaml::from_str(REQUEST).unwrap();
        assert_eq!(request.substrate.sugarcane, 0.0);

        let inputs = request.to_simulation_inputs(100);
        assert_eq!(inputs.initial_dry_substrate_weight, 400.0);
        assert_eq!(inputs.duration_days, 40);
        assert_eq!(inputs.time_step, 0.2);
        assert_eq!(inputs.phase_overrides.initial_cn_ratio, Some(39.0));
    }

    #[test]
    fn test_duration_defaults() {
        let mut request: GrowthRequest = serde_yaml::from_str(REQUEST).unwrap();
        request.duration_days = None;
        assert_eq!(request.to_simulation_inputs(100).duration_days, 100);
    }

    #[test]
    fn test_harvest_date() {
        let request: GrowthRequest = serde_yaml::from_str(REQUEST).unwrap();
        assert_eq!(
            request.harvest_date(40).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 10)
        );
    }

    #[test]
    fn test_bad_start_date() {
        let mut request: GrowthRequest = serde_yaml::from_str(REQUEST).unwrap();
        request.start_date = Some("01/03/2024".to_string());
        assert!(request.start_date().is_err());
        request.start_date = None;
        assert_eq!(request.harvest_date(10).unwrap(), None);
    }
}
