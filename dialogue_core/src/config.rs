//! Dialogue settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid dialogue settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings shared by authoring and play sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueSettings {
    /// Whether players may open dialogue at all. GM previews ignore this.
    pub enable_prompts: bool,

    /// Editor preference: show raw JSON for requirements and results.
    pub advanced_json: bool,

    /// Namespace of the slot the graph is stored under on its NPC.
    pub storage_namespace: String,

    /// Key of the slot the graph is stored under on its NPC.
    pub storage_key: String,

    /// Key of the slot holding editor node positions, next to the graph.
    pub positions_key: String,

    /// World-level key holding saved presets.
    pub presets_key: String,

    /// DC used when a check's value is missing or not a number.
    pub default_check_dc: i32,

    /// Base of passive scores (`base + modifier`).
    pub passive_base: i32,

    /// Speaker for nodes created without a known NPC name.
    pub default_speaker: String,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            enable_prompts: true,
            advanced_json: false,
            storage_namespace: "npc-dialogue".to_string(),
            storage_key: "dialogue".to_string(),
            positions_key: "nodePositions".to_string(),
            presets_key: "dialogue-presets".to_string(),
            default_check_dc: 10,
            passive_base: 10,
            default_speaker: String::new(),
        }
    }
}

impl DialogueSettings {
    /// Parse settings from TOML; omitted fields keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }
}
