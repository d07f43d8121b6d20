//! # hand_pose
//!
//! Single-frame hand pose recognition over the 21-point hand landmark
//! layout produced by MediaPipe-style hand trackers.
//!
//! ## Landmark layout
//!
//! | Index | Joint | Index | Joint |
//! |---|---|---|---|
//! | 0 | wrist | 11 | middle DIP |
//! | 1–4 | thumb CMC, MCP, IP, tip | 12 | middle tip |
//! | 5 | index MCP | 13–16 | ring MCP, PIP, DIP, tip |
//! | 6 | index PIP | 17–20 | pinky MCP, PIP, DIP, tip |
//! | 7–8 | index DIP, tip | | |
//! | 9–10 | middle MCP, PIP | | |
//!
//! Coordinates are normalized to the camera frame: `x`, `y` in `[0, 1]`,
//! smaller `y` is higher on screen; `z` is a relative depth signal.
//!
//! ## Quick start
//!
//! ```rust
//! use hand_pose::{AtomicGestureClassifier, GestureLabel, synth};
//!
//! let classifier = AtomicGestureClassifier::default();
//! let hand = synth::pose(GestureLabel::Fist, &synth::PoseParams::default());
//! assert_eq!(classifier.classify_frame(&hand), Some(GestureLabel::Fist));
//! ```

pub mod landmark;
pub mod classifier;
pub mod synth;

pub use landmark::{BoundingBox, Finger, HandFrame, HandLandmark, Landmark, LANDMARK_COUNT};
pub use classifier::{AtomicGestureClassifier, ClassifierOptions, DigitState, DigitStates, GestureLabel};

/// Result alias for fallible `hand_pose` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by `hand_pose`.
///
/// Malformed landmark input is *not* an error: classification simply
/// yields no gesture.  Errors are reserved for configuration and parsing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown gesture label: {0:?}")]
    UnknownLabel(String),

    #[error("invalid classifier option `{name}`: {value}")]
    InvalidOption { name: &'static str, value: f32 },
}
