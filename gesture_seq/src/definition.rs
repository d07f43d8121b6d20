//! Static sequence definitions.

use std::time::Duration;

use hand_pose::GestureLabel;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::Error;

/// Per-step timeout used when a definition omits one.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

fn default_timeout_ms() -> u64 { DEFAULT_TIMEOUT_MS }

/// A command triggered by an ordered list of gestures.
///
/// `timeout_ms` bounds the gap between consecutive matched steps, not the
/// whole sequence.  On the wire the field is called `timeout`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureSequenceDefinition {
    pub command:    String,
    pub sequence:   Vec<GestureLabel>,
    #[serde(rename = "timeout", alias = "timeout_ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl GestureSequenceDefinition {
    pub fn new(command: impl Into<String>, sequence: Vec<GestureLabel>, timeout_ms: u64) -> Self {
        GestureSequenceDefinition { command: command.into(), sequence, timeout_ms }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn len(&self) -> usize { self.sequence.len() }

    pub fn is_empty(&self) -> bool { self.sequence.is_empty() }

    /// `"OPEN_PALM → FIST"`.
    pub fn describe(&self) -> String {
        self.sequence
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    }

    pub fn validate(&self) -> crate::Result<()> {
        let reason = if self.command.trim().is_empty() {
            "command must not be empty"
        } else if self.sequence.is_empty() {
            "sequence must contain at least one gesture"
        } else if self.timeout_ms == 0 {
            "timeout must be greater than zero"
        } else {
            return Ok(());
        };
        Err(Error::InvalidDefinition {
            command: self.command.clone(),
            reason:  reason.to_string(),
        })
    }
}

/// Wire form with the labels still as text.
#[derive(Deserialize)]
struct RawDefinition {
    #[serde(default)]
    command:    String,
    #[serde(default)]
    sequence:   Vec<String>,
    #[serde(rename = "timeout", alias = "timeout_ms", default = "default_timeout_ms")]
    timeout_ms: u64,
}

/// `deserialize_with` for a `[[sequence]]` list.
///
/// A definition naming an unknown gesture is dropped with a warning.  Every
/// other definition is kept as written, invalid or not; the sequencer skips
/// the invalid ones when it is built.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Vec<GestureSequenceDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<RawDefinition>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|r| {
            match r.sequence.iter().map(|s| s.parse()).collect::<Result<Vec<GestureLabel>, _>>() {
                Ok(sequence) => Some(GestureSequenceDefinition::new(r.command, sequence, r.timeout_ms)),
                Err(e) => {
                    warn!(command = %r.command, error = %e, "dropping gesture sequence with unknown gesture");
                    None
                }
            }
        })
        .collect())
}

/// The built-in command table.
pub fn default_sequences() -> Vec<GestureSequenceDefinition> {
    use GestureLabel::*;
    vec![
        GestureSequenceDefinition::new("CREATE_CUBE",        vec![OpenPalm, Fist], 2000),
        GestureSequenceDefinition::new("DELETE_LAST_OBJECT", vec![Fist, Victory],  2500),
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
