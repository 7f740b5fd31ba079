use anyhow::{Context, Result};
use mycoforge_core::{
    error::MycoforgeError,
    presets::{canonical_preset, validate_preset},
};
use mycoforge_schemas::{
    file_formats::PresetFile,
    preset::{GrowthPhase, ParameterPreset},
};
use std::{collections::HashMap, fs, path::Path};
use tracing::info;

/// Parameter presets loaded from YAML, keyed by preset id.
///
/// Lookups that miss the library fall back to the built-in canonical presets
/// only when no specific id was asked for.
#[derive(Debug, Default)]
pub struct PresetLibrary {
    pub presets: HashMap<String, ParameterPreset>,
}

impl PresetLibrary {
    /// Loads and validates every preset file in `base_path`.
    pub fn load<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref();
        info!(path = ?base_path, "loading preset library");

        let presets = load_yaml_files_into_map(
            base_path,
            |file: PresetFile| file.presets,
            |item: &ParameterPreset| item.preset_id.clone(),
        )?;

        for preset in presets.values() {
            validate_preset(preset)
                .map_err(|e| MycoforgeError::InvalidPreset(preset.preset_id.clone(), e))?;
        }

        info!(count = presets.len(), "preset library loaded");
        Ok(Self { presets })
    }

    /// Resolves the base preset for `phase`.
    ///
    /// An explicit id must exist in the library and carry the right phase.
    /// Without one, the library's copy of the canonical id wins over the
    /// built-in preset.
    pub fn resolve(&self, phase: GrowthPhase, preset_id: Option<&str>) -> Result<ParameterPreset, MycoforgeError> {
        let canonical = canonical_preset(phase);
        let preset = match preset_id {
            Some(id) => self
                .presets
                .get(id)
                .ok_or_else(|| MycoforgeError::PresetNotFound(id.to_string()))?,
            None => self.presets.get(&canonical.preset_id).unwrap_or(canonical),
        };

        if preset.phase != phase {
            return Err(MycoforgeError::ConfigError(format!(
                "preset '{}' is a {} preset, expected {}",
                preset.preset_id, preset.phase, phase
            )));
        }
        Ok(preset.clone())
    }
}

/// Generic helper to load all YAML files in a directory into a HashMap.
fn load_yaml_files_into_map<P, F, E, T, K>(
    dir_path: P,
    extract_vec: E,
    get_key: K,
) -> Result<HashMap<String, T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>, // The file wrapper struct (e.g., PresetFile)
    E: Fn(F) -> Vec<T>,                  // A closure to extract the Vec<T> from the wrapper
    K: Fn(&T) -> String,                 // A closure to get the key for the map from an item T
{
    let mut map = HashMap::new();
    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            let content = fs::read_to_string(&path)?;
            let file_wrapper: F = serde_yaml::from_str(&content)
                .map_err(|e| MycoforgeError::YamlParsing(path.display().to_string(), e))?;

            for item in extract_vec(file_wrapper) {
                map.insert(get_key(&item), item);
            }
        }
    }
    Ok(map)
}
