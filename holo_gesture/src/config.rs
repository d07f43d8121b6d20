//! Application configuration (`holo-gesture.toml`).
//!
//! ```toml
//! [classifier]
//! extension_min_rel_dist_y = 0.05
//!
//! [tracking]
//! hand_lost_reset_frames = 30
//! frame_interval_ms      = 33
//!
//! [[sequence]]
//! command  = "CREATE_CUBE"
//! sequence = ["OPEN_PALM", "FIST"]
//! timeout  = 2000
//! ```
//!
//! Every section is optional; missing values take their defaults.  A bad
//! `[[sequence]]` entry never fails the load: it is dropped (unknown
//! gesture) or skipped by the sequencer (empty, zero timeout), with a
//! warning either way.

use std::path::Path;

use gesture_seq::{default_sequences, GestureSequenceDefinition, SequenceConfig};
use hand_pose::ClassifierOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

// ════════════════════════════════════════════════════════════════════════════
// TrackingConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Consecutive hand-less frames before every sequence is reset.
    /// `0` disables the hard reset.
    pub hand_lost_reset_frames: u32,
    /// Frame spacing for synthetic sources (script ranges, simulator).
    pub frame_interval_ms:      u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            hand_lost_reset_frames: 30,
            frame_interval_ms:      33,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classifier: ClassifierOptions,
    pub tracking:   TrackingConfig,
    #[serde(
        rename = "sequence",
        default = "default_sequences",
        deserialize_with = "gesture_seq::definition::deserialize_lenient"
    )]
    pub sequences:  Vec<GestureSequenceDefinition>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            classifier: ClassifierOptions::default(),
            tracking:   TrackingConfig::default(),
            sequences:  default_sequences(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(s)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// [`load`](Self::load) when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))
    }

    /// Classifier and tracking settings.  Sequence entries are not checked
    /// here; see the module docs.
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;
        if self.tracking.frame_interval_ms == 0 {
            return Err(Error::Config("tracking.frame_interval_ms must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn sequence_config(&self) -> SequenceConfig {
        SequenceConfig { sequences: self.sequences.clone() }
    }

    /// Swap in the sequence table from a standalone sequences file.
    pub fn with_sequences(mut self, sequences: SequenceConfig) -> Self {
        self.sequences = sequences.sequences;
        self
    }

    /// [`with_sequences`](Self::with_sequences) from a file on disk.
    pub fn with_sequences_file(self, path: &Path) -> Result<Self> {
        let sequences = SequenceConfig::load(path)?;
        Ok(self.with_sequences(sequences))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::GestureLabel::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [classifier]
            victory_min_tip_dist_rel = 0.08

            [tracking]
            hand_lost_reset_frames = 5

            [[sequence]]
            command = "POINT_THEN_V"
            sequence = ["POINTING_UP", "VICTORY"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.classifier.victory_min_tip_dist_rel, 0.08);
        assert_eq!(cfg.classifier.tip_margin_rel, ClassifierOptions::default().tip_margin_rel);
        assert_eq!(cfg.tracking.hand_lost_reset_frames, 5);
        assert_eq!(cfg.tracking.frame_interval_ms, 33);
        assert_eq!(cfg.sequences.len(), 1);
        assert_eq!(cfg.sequences[0].sequence, vec![PointingUp, Victory]);
        assert_eq!(cfg.sequences[0].timeout_ms, gesture_seq::DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_toml_str("[classifier]\ntip_margin_rel = -1.0"),
            Err(Error::Classifier(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[tracking]\nframe_interval_ms = 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(AppConfig::from_toml_str("tracking = 3"), Err(Error::Config(_))));
    }

    #[test]
    fn bad_sequences_do_not_fail_the_load() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [[sequence]]
            command = "GOOD"
            sequence = ["OPEN_PALM", "FIST"]

            [[sequence]]
            command = "BAD"
            sequence = ["FIST"]
            timeout = 0

            [[sequence]]
            command = "THUMBS"
            sequence = ["THUMBS_UP"]
            "#,
        )
        .unwrap();
        let commands: Vec<_> = cfg.sequences.iter().map(|d| d.command.as_str()).collect();
        assert_eq!(commands, vec!["GOOD", "BAD"]);
        assert!(cfg.sequence_config().validate().is_err());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holo-gesture.toml");
        let cfg = AppConfig::default();
        cfg.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[classifier]"));
        assert!(text.contains("[tracking]"));
        assert!(text.contains("[[sequence]]"));

        assert_eq!(AppConfig::load(&path).unwrap(), cfg);
        assert_eq!(AppConfig::load_or_default(Some(&path)).unwrap(), cfg);
        assert_eq!(AppConfig::load_or_default(None).unwrap(), cfg);
    }

    #[test]
    fn sequences_file_is_loaded_leniently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.toml");
        std::fs::write(
            &path,
            "[[sequence]]\ncommand = \"SPIN\"\nsequence = [\"VICTORY\", \"WAVE\"]\n\n\
             [[sequence]]\ncommand = \"POKE\"\nsequence = [\"POINTING_UP\"]\ntimeout = 300\n",
        )
        .unwrap();
        let cfg = AppConfig::default().with_sequences_file(&path).unwrap();
        assert_eq!(cfg.sequences, vec![GestureSequenceDefinition::new("POKE", vec![PointingUp], 300)]);

        let missing = AppConfig::default().with_sequences_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(Error::Sequence(gesture_seq::Error::Io(_)))));
    }

    #[test]
    fn sequences_file_overrides_table() {
        let seqs = SequenceConfig {
            sequences: vec![GestureSequenceDefinition::new("ONLY", vec![Fist], 100)],
        };
        let cfg = AppConfig::default().with_sequences(seqs.clone());
        assert_eq!(cfg.sequence_config(), seqs);
    }
}
