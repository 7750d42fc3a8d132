//! Assistant configuration.
//!
//! Configuration can be built in code or read from TOML:
//!
//! ```toml
//! grammar = "grammars/home.cfg"
//! events = "events.jsonl"
//! fallback = true
//! min_confidence = 0.6
//!
//! [default_rooms]
//! light = "living room"
//! fan = "kitchen"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};
use crate::grammar::Grammar;
use crate::semantics::{DeviceClass, DeviceResolver, Room};

/// Configuration for an [`Assistant`](crate::Assistant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssistantConfig {
    /// Grammar file; the built-in home grammar when unset.
    pub grammar: Option<PathBuf>,
    /// Room assumed for a device class mentioned without one.
    pub default_rooms: BTreeMap<DeviceClass, Room>,
    /// Consult the rule-based classifier when no pattern matches.
    pub fallback: bool,
    /// Minimum confidence for a fallback answer to be acted on.
    pub min_confidence: f32,
    /// JSON lines file for action records; kept in memory when unset.
    pub events: Option<PathBuf>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            grammar: None,
            default_rooms: BTreeMap::new(),
            fallback: false,
            min_confidence: crate::DEFAULT_MIN_CONFIDENCE,
            events: None,
        }
    }
}

impl AssistantConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a grammar file instead of the built-in grammar.
    pub fn with_grammar(mut self, path: impl Into<PathBuf>) -> Self {
        self.grammar = Some(path.into());
        self
    }

    /// Set the default room for a device class.
    pub fn with_default_room(mut self, class: DeviceClass, room: Room) -> Self {
        self.default_rooms.insert(class, room);
        self
    }

    /// Enable or disable the fallback classifier.
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set the fallback confidence threshold.
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Persist action records to a JSON lines file.
    pub fn with_events(mut self, path: impl Into<PathBuf>) -> Self {
        self.events = Some(path.into());
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| HearthError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file. Relative paths inside it resolve against the file's
    /// directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| HearthError::FileReadError {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(base) = path.parent() {
            config.grammar = config.grammar.map(|p| base.join(p));
            config.events = config.events.map(|p| base.join(p));
        }
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(HearthError::invalid_config(format!(
                "min_confidence must be between 0 and 1, got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }

    /// Resolver built from the default room table.
    pub fn device_resolver(&self) -> DeviceResolver {
        DeviceResolver::with_default_rooms(self.default_rooms.clone())
    }

    /// The configured grammar, or the built-in one.
    pub fn load_grammar(&self) -> Result<Grammar> {
        match &self.grammar {
            Some(path) => Grammar::from_file(path),
            None => Grammar::home_automation(),
        }
    }
}
