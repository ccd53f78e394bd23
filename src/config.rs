use crate::error::LineageError;
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::Path,
};

pub const DEFAULT_MAX_ANCESTOR_STEPS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Upper bound on the paternal walk performed to find the layout anchor.
    pub max_ancestor_steps: usize,
    /// Individual to start the anchor search from instead of the first one in the file.
    pub anchor: Option<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            max_ancestor_steps: DEFAULT_MAX_ANCESTOR_STEPS,
            anchor: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// NAME given to individuals created by the add-relative operations.
    pub unknown_name: String,
}

impl Default for MutationConfig {
    fn default() -> Self {
        MutationConfig {
            unknown_name: "Unknown".to_string(),
        }
    }
}

/// Names used for the three-person tree synthesized when there is no input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarterConfig {
    pub self_name: String,
    pub father_name: String,
    pub mother_name: String,
}

impl Default for StarterConfig {
    fn default() -> Self {
        StarterConfig {
            self_name: "You".to_string(),
            father_name: "Father".to_string(),
            mother_name: "Mother".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageConfig {
    pub layout: LayoutConfig,
    pub mutation: MutationConfig,
    pub starter: StarterConfig,
}

impl LineageConfig {
    /// Reads a TOML config, falling back to defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LineageConfig, LineageError> {
        tracing::debug!("Attempting to read config from: {:?}", path.as_ref());
        if !path.as_ref().exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(LineageConfig::default());
        }
        let content = read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), LineageError> {
        tracing::debug!("Attempting to write config to: {:?}", path.as_ref());
        let toml_string = toml::to_string(self)?;
        write(path, toml_string)?;
        Ok(())
    }
}

pub fn get_content<P: AsRef<Path>>(path: P) -> Result<String, LineageError> {
    tracing::debug!("Reading {:?}", path.as_ref());
    Ok(read_to_string(path)?)
}
