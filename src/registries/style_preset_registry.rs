use crate::data::StyleRuleSet;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use yaml_rust::{Yaml, YamlLoader};

/// Errors that can occur while loading a style preset
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("style preset '{0}' not found")]
    NotFound(String),
    #[error("style preset is invalid: {0}")]
    Invalid(String),
}

/// Trait for loading saved style rule sets by name
pub trait StylePresetRegistry {
    fn get_preset(&self, name: &str) -> Result<StyleRuleSet, PresetError>;
}

/// File-based implementation of StylePresetRegistry
/// Loads presets from YAML files in the presets/ directory
#[derive(Clone)]
pub struct FileStylePresetRegistry {
    presets_dir: PathBuf,
}

impl FileStylePresetRegistry {
    /// Creates a new FileStylePresetRegistry
    ///
    /// # Arguments
    /// * `presets_dir` - Optional path to presets directory (defaults to "presets")
    pub fn new(presets_dir: Option<PathBuf>) -> Self {
        Self {
            presets_dir: presets_dir.unwrap_or_else(|| PathBuf::from("presets")),
        }
    }

    /// Names of all presets in the directory, sorted
    pub fn list(&self) -> Result<Vec<String>, PresetError> {
        if !self.presets_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.presets_dir).map_err(|e| {
            PresetError::Invalid(format!("Failed to read {}: {}", self.presets_dir.display(), e))
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("yml"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

impl StylePresetRegistry for FileStylePresetRegistry {
    fn get_preset(&self, name: &str) -> Result<StyleRuleSet, PresetError> {
        let preset_path = self.presets_dir.join(format!("{}.yml", name));

        if !preset_path.exists() {
            return Err(PresetError::NotFound(name.to_string()));
        }

        let content = fs::read_to_string(&preset_path).map_err(|e| {
            PresetError::Invalid(format!("Failed to read preset {}: {}", preset_path.display(), e))
        })?;

        parse_preset(&content)
    }
}

/// Parses a YAML preset document into a StyleRuleSet
/// Missing fields fall back to the rule set defaults
fn parse_preset(yaml_content: &str) -> Result<StyleRuleSet, PresetError> {
    let docs = YamlLoader::load_from_str(yaml_content)
        .map_err(|e| PresetError::Invalid(format!("Invalid YAML: {}", e)))?;

    let Some(doc) = docs.first() else {
        return Ok(StyleRuleSet::default());
    };

    if doc.as_hash().is_none() {
        return Err(PresetError::Invalid("preset must be a mapping".to_string()));
    }

    let flag = |key: &str| doc[key].as_bool().unwrap_or(false);

    let forbidden_words = match &doc["forbidden_words"] {
        Yaml::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        // A single comma-separated string is accepted too
        Yaml::String(s) => s.split(',').map(|w| w.trim().to_string()).filter(|w| !w.is_empty()).collect(),
        _ => Vec::new(),
    };

    Ok(StyleRuleSet {
        british_english: flag("british_english"),
        no_full_stops: flag("no_full_stops"),
        include_descriptors: flag("include_descriptors"),
        avoid_repetition: flag("avoid_repetition"),
        custom_instructions: doc["custom_instructions"].as_str().unwrap_or("").to_string(),
        forbidden_words,
    })
}
