//! # holo_gesture
//!
//! Hand-tracking front end for the gesture sequencer.  Frames of hand
//! landmarks arrive from a [`source::FrameSource`] over a channel; the
//! [`pipeline::GesturePipeline`] classifies the first hand of every frame
//! and feeds the label to the [`gesture_seq::GestureSequencer`], which
//! publishes named commands.
//!
//! ## Frame sources
//!
//! | Source | Input | Notes |
//! |---|---|---|
//! | [`source::ScriptFrameSource`] | text script of `<t_ms> <LABEL>` lines | synthetic hands via `hand_pose::synth` |
//! | [`source::ReplayFrameSource`] | JSON-lines recording | optional real-time pacing |
//! | [`source::SimFrameSource`] | [`source::SimInput`] keys | fixed frame rate, used by the window |
//!
//! ## Default commands
//!
//! | Command | Sequence | Step timeout |
//! |---|---|---|
//! | `CREATE_CUBE` | `OPEN_PALM → FIST` | 2000 ms |
//! | `DELETE_LAST_OBJECT` | `FIST → VICTORY` | 2500 ms |
//!
//! ## Feature flags
//!
//! * (default) — script and replay sources only; no display needed.
//! * `window` — keyboard simulator with a `minifb` progress visualizer.
//!
//! ### Simulator keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `1` | OPEN_PALM |
//! | `2` | FIST |
//! | `3` | POINTING_UP |
//! | `4` | VICTORY |
//! | `0` | neutral hand (no gesture) |
//! | `H` | hide hand |
//! | `R` | hard reset of all sequences |
//! | `Q` | quit |

pub mod source;
pub mod recorder;
pub mod pipeline;
pub mod config;
pub mod app;
pub mod cli;
pub mod canvas;
#[cfg(feature = "window")]
pub mod visualizer;

/// Result alias for fallible `holo_gesture` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("recording line {line}: {source}")]
    Frame {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Classifier(#[from] hand_pose::Error),

    #[error(transparent)]
    Sequence(#[from] gesture_seq::Error),

    #[error("window error: {0}")]
    Window(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
