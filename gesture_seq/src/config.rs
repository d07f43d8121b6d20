//! TOML-backed sequence table.
//!
//! ```toml
//! [[sequence]]
//! command  = "CREATE_CUBE"
//! sequence = ["OPEN_PALM", "FIST"]
//! timeout  = 2000
//! ```
//!
//! A file without any `[[sequence]]` entries falls back to
//! [`default_sequences`].  Loading never rejects a single bad entry: one
//! that names an unknown gesture is dropped with a warning, and any other
//! invalid one is left for [`GestureSequencer`](crate::GestureSequencer) to
//! skip.  [`SequenceConfig::validate`] is the strict check.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::definition::{default_sequences, GestureSequenceDefinition};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    #[serde(
        rename = "sequence",
        default = "default_sequences",
        deserialize_with = "crate::definition::deserialize_lenient"
    )]
    pub sequences: Vec<GestureSequenceDefinition>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        SequenceConfig { sequences: default_sequences() }
    }
}

impl SequenceConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| Error::Config(format!("failed to parse sequence config: {}", e)))
    }

    /// Read a sequences file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), sequences = config.sequences.len(), "loaded sequence config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize sequence config: {}", e)))
    }

    /// Strict check: the first definition the sequencer would skip.
    pub fn validate(&self) -> Result<()> {
        self.sequences.iter().try_for_each(|def| def.validate())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
