//! Per-frame glue between the classifier and the sequencer.
//!
//! Each frame is stamped onto a fixed clock origin (`origin + t_ms`), so a
//! replayed or scripted session sees exactly the timing it was recorded
//! with, however fast it is fed.

use std::time::{Duration, Instant};

use gesture_seq::GestureSequencer;
use hand_pose::{AtomicGestureClassifier, GestureLabel};
use tracing::{debug, info};

use crate::config::TrackingConfig;
use crate::source::TrackingFrame;

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Classifier output for the first hand, if any.
    pub label:        Option<GestureLabel>,
    pub hand_present: bool,
    /// The hand appeared this frame after being absent.
    pub hand_found:   bool,
    /// The hand disappeared this frame.
    pub hand_lost:    bool,
    /// Sequences completed by this frame.
    pub completed:    usize,
    /// Sequences expired by time before the label was applied.
    pub expired:      usize,
    /// Tracking was absent long enough to force a reset.
    pub hard_reset:   bool,
}

pub struct GesturePipeline {
    classifier:             AtomicGestureClassifier,
    sequencer:              GestureSequencer,
    origin:                 Instant,
    hand_lost_reset_frames: u32,
    lost_frames:            u32,
    hand_visible:           bool,
    frames:                 u64,
    last_t_ms:              u64,
}

impl GesturePipeline {
    pub fn new(
        classifier: AtomicGestureClassifier,
        sequencer: GestureSequencer,
        tracking: &TrackingConfig,
    ) -> Self {
        GesturePipeline {
            classifier,
            sequencer,
            origin:                 Instant::now(),
            hand_lost_reset_frames: tracking.hand_lost_reset_frames,
            lost_frames:            0,
            hand_visible:           false,
            frames:                 0,
            last_t_ms:              0,
        }
    }

    pub fn classifier(&self) -> &AtomicGestureClassifier { &self.classifier }

    pub fn sequencer(&self) -> &GestureSequencer { &self.sequencer }

    pub fn frames_processed(&self) -> u64 { self.frames }

    /// The instant a frame at `t_ms` maps to.
    pub fn instant_at(&self, t_ms: u64) -> Instant {
        self.origin + Duration::from_millis(t_ms)
    }

    /// Classify the first hand, forward the label, and watch for lost
    /// tracking.  A frame without hands forwards `None`.
    pub fn process_frame(&mut self, frame: &TrackingFrame) -> FrameOutcome {
        let now = self.instant_at(frame.t_ms);
        self.frames += 1;
        self.last_t_ms = frame.t_ms;

        let mut out = FrameOutcome {
            expired: self.sequencer.poll_timeouts(now),
            ..FrameOutcome::default()
        };

        match frame.first_hand() {
            Some(hand) => {
                out.hand_present = true;
                out.hand_found = !self.hand_visible;
                if out.hand_found {
                    info!(t_ms = frame.t_ms, hands = frame.hands.len(), "hand detected");
                }
                self.hand_visible = true;
                self.lost_frames = 0;
                out.label = self.classifier.classify(hand);
            }
            None => {
                out.hand_lost = self.hand_visible;
                if out.hand_lost {
                    info!(t_ms = frame.t_ms, "hand lost");
                }
                self.hand_visible = false;
                self.lost_frames = self.lost_frames.saturating_add(1);
                if self.hand_lost_reset_frames > 0 && self.lost_frames == self.hand_lost_reset_frames {
                    debug!(frames = self.lost_frames, "tracking lost, hard reset");
                    self.sequencer.reset_all_fsms();
                    out.hard_reset = true;
                }
            }
        }

        out.completed = self.sequencer.emit_gesture_at(out.label, now);
        out
    }

    /// Expire overdue sequence steps without a frame, `elapsed` after the
    /// last processed frame.
    pub fn tick(&mut self, elapsed: Duration) -> usize {
        let now = self.instant_at(self.last_t_ms) + elapsed;
        self.sequencer.poll_timeouts(now)
    }

    /// Drop all sequence progress, e.g. on an explicit user reset.
    pub fn hard_reset(&mut self) {
        debug!("hard reset requested");
        self.sequencer.reset_all_fsms();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
