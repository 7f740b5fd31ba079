use crate::preset::ParameterPreset;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PresetFile {
    pub schema_version: String,
    pub presets: Vec<ParameterPreset>,
}
