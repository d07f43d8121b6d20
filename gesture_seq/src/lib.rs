//! # gesture_seq
//!
//! Detects timed *sequences* of single-frame gesture labels and publishes a
//! named command when one completes.
//!
//! * [`GestureSequenceDefinition`] — `command`, ordered `sequence`, per-step
//!   `timeout`.
//! * [`GestureSequenceFsm`] — progress through one definition.  A matching
//!   label advances it and arms a deadline; the next step must arrive before
//!   the deadline or the machine falls back to idle.
//! * [`GestureSequencer`] — fans each frame's label out to every FSM and
//!   publishes completions on a [`CommandBus`].
//!
//! Time is always passed in explicitly (`Instant`), so the host frame loop
//! owns the clock and tests are deterministic.
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use gesture_seq::{GestureSequencer, default_sequences};
//! use hand_pose::GestureLabel;
//!
//! let mut seq = GestureSequencer::new(default_sequences());
//! let (_id, commands) = seq.subscribe_channel();
//!
//! let t0 = Instant::now();
//! seq.emit_gesture_at(Some(GestureLabel::OpenPalm), t0);
//! seq.emit_gesture_at(Some(GestureLabel::Fist), t0 + Duration::from_millis(500));
//!
//! assert_eq!(commands.try_recv().unwrap().command, "CREATE_CUBE");
//! ```

pub mod definition;
pub mod bus;
pub mod fsm;
pub mod sequencer;
pub mod config;

pub use definition::{GestureSequenceDefinition, default_sequences, DEFAULT_TIMEOUT_MS};
pub use bus::{CommandBus, CommandEvent, SubscriptionId};
pub use fsm::{CommandCallback, GestureSequenceFsm, SequenceProgress, Step};
pub use sequencer::GestureSequencer;
pub use config::SequenceConfig;

/// Result alias for fallible `gesture_seq` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or loading sequence machinery.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid gesture sequence {command:?}: {reason}")]
    InvalidDefinition { command: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a command callback or bus subscriber.
///
/// These never propagate past the point of invocation; they are logged.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The receiving end of a channel subscription is gone.
    #[error("subscriber disconnected")]
    Disconnected,

    #[error("handler failed: {0}")]
    Handler(String),
}
