//! Frame sources — scripted, recorded, or keyboard-simulated hand tracking.
//!
//! Every source runs on its own thread and delivers [`SourceEvent`]s over a
//! `mpsc` channel.  Consumers don't know whether frames came from a script,
//! a recording or the simulator.  A source that runs out of input simply
//! returns, which disconnects the channel.

use std::path::Path;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use hand_pose::synth::{self, PoseParams};
use hand_pose::{GestureLabel, HandFrame, Landmark};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

// ════════════════════════════════════════════════════════════════════════════
// TrackingFrame / SourceEvent
// ════════════════════════════════════════════════════════════════════════════

/// One tracker result: zero or more hands of 21 (possibly missing) points.
///
/// `t_ms` is the capture time relative to the start of the source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingFrame {
    pub t_ms:  u64,
    #[serde(default)]
    pub hands: Vec<Vec<Option<Landmark>>>,
}

impl TrackingFrame {
    /// A frame in which the tracker found no hand.
    pub fn empty(t_ms: u64) -> Self {
        TrackingFrame { t_ms, hands: Vec::new() }
    }

    pub fn with_hand(t_ms: u64, hand: &HandFrame) -> Self {
        TrackingFrame { t_ms, hands: vec![hand.to_partial()] }
    }

    pub fn first_hand(&self) -> Option<&[Option<Landmark>]> {
        self.hands.first().map(|h| h.as_slice())
    }

    pub fn has_hand(&self) -> bool { !self.hands.is_empty() }
}

/// What a source delivers.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    Frame(TrackingFrame),
    /// Drop all sequence progress.
    Reset,
    /// Stop the session.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SourceEvent`]s over a channel.
pub trait FrameSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>);
}

/// Spawn a frame source on its own thread and return the receiving end.
pub fn spawn_frame_source<S: FrameSource>(source: S) -> Receiver<SourceEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

/// Sleep until `t_ms` after `start`; no-op if already past.
fn pace(start: Instant, t_ms: u64) {
    let due = start + Duration::from_millis(t_ms);
    let now = Instant::now();
    if due > now {
        thread::sleep(due - now);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptFrameSource
// ════════════════════════════════════════════════════════════════════════════

/// Hand state for one scripted frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptPose {
    /// A hand shaped as this gesture.
    Gesture(GestureLabel),
    /// A visible hand that matches no gesture.
    Neutral,
    /// No hand in view.
    Lost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptAction {
    Pose(ScriptPose),
    Reset,
}

/// Replays a text script through synthetic hands.
///
/// ```text
/// # t_ms   action
/// 0        OPEN_PALM
/// 100..400 OPEN_PALM     # held: one frame every frame interval
/// 500      FIST
/// 900      NONE          # neutral hand
/// 1000     LOST          # no hand
/// 1200     RESET
/// ```
///
/// Labels are case-insensitive.  Times must not go backwards.
#[derive(Clone, Debug)]
pub struct ScriptFrameSource {
    steps:    Vec<(u64, ScriptAction)>,
    params:   PoseParams,
    realtime: bool,
}

impl ScriptFrameSource {
    /// Parse a script.  Ranges expand to one frame every `frame_interval_ms`.
    pub fn parse(text: &str, frame_interval_ms: u64) -> Result<Self> {
        let step_ms = frame_interval_ms.max(1);
        let mut steps = Vec::new();
        let mut last_t = 0u64;

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() { continue; }

            let err = |message: String| Error::Script { line, message };
            let mut tokens = content.split_whitespace();
            let (time, action) = match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(t), Some(a), None) => (t, a),
                _ => return Err(err(format!("expected `<t_ms> <action>`, got {:?}", content))),
            };

            let (start, end) = parse_time(time).map_err(&err)?;
            if start < last_t {
                return Err(err(format!("time {} ms goes backwards (previous {} ms)", start, last_t)));
            }
            last_t = end;

            let action = parse_action(action).map_err(&err)?;
            if action == ScriptAction::Reset && start != end {
                return Err(err("RESET cannot span a range".to_string()));
            }

            let mut t = start;
            loop {
                steps.push((t, action));
                match t.checked_add(step_ms) {
                    Some(next) if next <= end => t = next,
                    _ => break,
                }
            }
        }

        Ok(ScriptFrameSource { steps, params: PoseParams::default(), realtime: false })
    }

    pub fn from_path(path: &Path, frame_interval_ms: u64) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, frame_interval_ms)
    }

    /// Sleep between steps so they arrive at their scripted times.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn pose_params(mut self, params: PoseParams) -> Self {
        self.params = params;
        self
    }

    pub fn steps(&self) -> &[(u64, ScriptAction)] { &self.steps }

    /// The events this script produces, in order.
    pub fn events(&self) -> impl Iterator<Item = SourceEvent> + '_ {
        self.steps.iter().map(move |&(t_ms, action)| match action {
            ScriptAction::Reset => SourceEvent::Reset,
            ScriptAction::Pose(ScriptPose::Lost) => SourceEvent::Frame(TrackingFrame::empty(t_ms)),
            ScriptAction::Pose(ScriptPose::Neutral) => {
                SourceEvent::Frame(TrackingFrame::with_hand(t_ms, &synth::neutral(&self.params)))
            }
            ScriptAction::Pose(ScriptPose::Gesture(label)) => {
                SourceEvent::Frame(TrackingFrame::with_hand(t_ms, &synth::pose(label, &self.params)))
            }
        })
    }
}

impl FrameSource for ScriptFrameSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        debug!(steps = self.steps.len(), realtime = self.realtime, "script source started");
        let start = Instant::now();
        for (event, &(t_ms, _)) in self.events().zip(self.steps.iter()) {
            if self.realtime {
                pace(start, t_ms);
            }
            if tx.send(event).is_err() { return; }
        }
    }
}

fn parse_time(token: &str) -> std::result::Result<(u64, u64), String> {
    let num = |s: &str| s.parse::<u64>().map_err(|_| format!("invalid time {:?}", s));
    match token.split_once("..") {
        Some((a, b)) => {
            let (start, end) = (num(a)?, num(b)?);
            if end < start {
                return Err(format!("empty range {}", token));
            }
            Ok((start, end))
        }
        None => {
            let t = num(token)?;
            Ok((t, t))
        }
    }
}

fn parse_action(token: &str) -> std::result::Result<ScriptAction, String> {
    match token.to_ascii_uppercase().as_str() {
        "NONE" | "NEUTRAL" => Ok(ScriptAction::Pose(ScriptPose::Neutral)),
        "LOST"             => Ok(ScriptAction::Pose(ScriptPose::Lost)),
        "RESET"            => Ok(ScriptAction::Reset),
        _ => GestureLabel::from_str(token)
            .map(|l| ScriptAction::Pose(ScriptPose::Gesture(l)))
            .map_err(|e| e.to_string()),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplayFrameSource
// ════════════════════════════════════════════════════════════════════════════

/// Replays frames captured by [`crate::recorder::FrameRecorder`].
#[derive(Clone, Debug)]
pub struct ReplayFrameSource {
    frames:   Vec<TrackingFrame>,
    realtime: bool,
}

impl ReplayFrameSource {
    pub fn new(frames: Vec<TrackingFrame>) -> Self {
        ReplayFrameSource { frames, realtime: false }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(crate::recorder::load_frames(path)?))
    }

    /// Keep the recorded spacing between frames.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn frames(&self) -> &[TrackingFrame] { &self.frames }
}

impl FrameSource for ReplayFrameSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        debug!(frames = self.frames.len(), realtime = self.realtime, "replay source started");
        let base = self.frames.first().map(|f| f.t_ms).unwrap_or(0);
        let start = Instant::now();
        for frame in self.frames {
            if self.realtime {
                pace(start, frame.t_ms.saturating_sub(base));
            }
            if tx.send(SourceEvent::Frame(frame)).is_err() { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimFrameSource — keyboard simulation
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulator window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    /// Show a hand in this pose; `None` is the neutral hand.
    Pose(Option<GestureLabel>),
    /// Take the hand out of view.
    Hide,
    Reset,
    Quit,
}

/// Emits a synthetic frame every `interval`, shaped by the latest
/// [`SimInput`].  The hand starts hidden.
pub struct SimFrameSource {
    pub rx:       Receiver<SimInput>,
    pub interval: Duration,
    pub params:   PoseParams,
}

impl SimFrameSource {
    pub fn new(rx: Receiver<SimInput>, interval: Duration) -> Self {
        SimFrameSource { rx, interval, params: PoseParams::default() }
    }

    fn frame(&self, t_ms: u64, pose: Option<Option<GestureLabel>>) -> TrackingFrame {
        match pose {
            Some(label) => TrackingFrame::with_hand(t_ms, &synth::pose_or_neutral(label, &self.params)),
            None => TrackingFrame::empty(t_ms),
        }
    }
}

impl FrameSource for SimFrameSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        let interval = self.interval.max(Duration::from_millis(1));
        let start = Instant::now();
        let mut next_tick = start + interval;
        let mut pose: Option<Option<GestureLabel>> = None;

        loop {
            let wait = next_tick.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(wait) {
                Ok(SimInput::Pose(p)) => pose = Some(p),
                Ok(SimInput::Hide) => pose = None,
                Ok(SimInput::Reset) => {
                    if tx.send(SourceEvent::Reset).is_err() { return; }
                }
                Ok(SimInput::Quit) => {
                    let _ = tx.send(SourceEvent::Quit);
                    return;
                }
                Err(RecvTimeoutError::Timeout) => {
                    let t_ms = start.elapsed().as_millis() as u64;
                    if tx.send(SourceEvent::Frame(self.frame(t_ms, pose))).is_err() { return; }
                    next_tick += interval;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::AtomicGestureClassifier;

    fn labels(src: &ScriptFrameSource) -> Vec<Option<GestureLabel>> {
        let classifier = AtomicGestureClassifier::default();
        src.events()
            .filter_map(|e| match e {
                SourceEvent::Frame(f) => Some(f.first_hand().and_then(|h| classifier.classify(h))),
                _ => None,
            })
            .collect()
    }

    // ── script parsing ────────────────────────────────────────────────────

    #[test]
    fn parses_single_frames() {
        let src = ScriptFrameSource::parse("0 OPEN_PALM\n500 fist\n", 33).unwrap();
        assert_eq!(src.steps(), &[
            (0,   ScriptAction::Pose(ScriptPose::Gesture(GestureLabel::OpenPalm))),
            (500, ScriptAction::Pose(ScriptPose::Gesture(GestureLabel::Fist))),
        ]);
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let text = "# header\n\n  100 VICTORY   # trailing\n";
        let src = ScriptFrameSource::parse(text, 33).unwrap();
        assert_eq!(src.steps().len(), 1);
        assert_eq!(src.steps()[0].0, 100);
    }

    #[test]
    fn range_expands_by_interval() {
        let src = ScriptFrameSource::parse("0..100 FIST", 40).unwrap();
        let times: Vec<u64> = src.steps().iter().map(|s| s.0).collect();
        assert_eq!(times, vec![0, 40, 80]);
    }

    #[test]
    fn special_actions() {
        let src = ScriptFrameSource::parse("0 NONE\n10 LOST\n20 reset", 33).unwrap();
        let actions: Vec<ScriptAction> = src.steps().iter().map(|s| s.1).collect();
        assert_eq!(actions, vec![
            ScriptAction::Pose(ScriptPose::Neutral),
            ScriptAction::Pose(ScriptPose::Lost),
            ScriptAction::Reset,
        ]);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = ScriptFrameSource::parse("0 FIST\n\n5 THUMBS_UP", 33).unwrap_err();
        assert!(matches!(err, Error::Script { line: 3, .. }), "{:?}", err);

        let err = ScriptFrameSource::parse("100 FIST\n50 FIST", 33).unwrap_err();
        assert!(err.to_string().contains("backwards"), "{}", err);

        assert!(ScriptFrameSource::parse("abc FIST", 33).is_err());
        assert!(ScriptFrameSource::parse("10", 33).is_err());
        assert!(ScriptFrameSource::parse("10 FIST extra", 33).is_err());
        assert!(ScriptFrameSource::parse("20..10 FIST", 33).is_err());
        assert!(ScriptFrameSource::parse("0..100 RESET", 33).is_err());
    }

    // ── script frames ─────────────────────────────────────────────────────

    #[test]
    fn scripted_hands_classify_as_scripted() {
        let src = ScriptFrameSource::parse(
            "0 OPEN_PALM\n10 FIST\n20 POINTING_UP\n30 VICTORY\n40 NONE",
            33,
        )
        .unwrap();
        assert_eq!(labels(&src), vec![
            Some(GestureLabel::OpenPalm),
            Some(GestureLabel::Fist),
            Some(GestureLabel::PointingUp),
            Some(GestureLabel::Victory),
            None,
        ]);
    }

    #[test]
    fn lost_produces_empty_frame() {
        let src = ScriptFrameSource::parse("70 LOST", 33).unwrap();
        let events: Vec<SourceEvent> = src.events().collect();
        assert_eq!(events, vec![SourceEvent::Frame(TrackingFrame::empty(70))]);
    }

    #[test]
    fn spawned_script_delivers_then_disconnects() {
        let src = ScriptFrameSource::parse("0 FIST\n5 RESET\n10 LOST", 33).unwrap();
        let rx = spawn_frame_source(src);
        let events: Vec<SourceEvent> = rx.iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], SourceEvent::Reset);
    }

    // ── replay ────────────────────────────────────────────────────────────

    #[test]
    fn replay_sends_frames_in_order() {
        let frames = vec![TrackingFrame::empty(0), TrackingFrame::empty(16), TrackingFrame::empty(33)];
        let rx = spawn_frame_source(ReplayFrameSource::new(frames.clone()));
        let got: Vec<SourceEvent> = rx.iter().collect();
        let want: Vec<SourceEvent> = frames.into_iter().map(SourceEvent::Frame).collect();
        assert_eq!(got, want);
    }

    // ── simulator ─────────────────────────────────────────────────────────

    #[test]
    fn sim_source_follows_inputs() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let rx = spawn_frame_source(SimFrameSource::new(sim_rx, Duration::from_millis(2)));

        // Hidden at first.
        match rx.recv().unwrap() {
            SourceEvent::Frame(f) => assert!(!f.has_hand()),
            other => panic!("unexpected {:?}", other),
        }

        sim_tx.send(SimInput::Pose(Some(GestureLabel::Victory))).unwrap();
        let classifier = AtomicGestureClassifier::default();
        let saw_victory = rx.iter().take(50).any(|e| match e {
            SourceEvent::Frame(f) => f.first_hand().and_then(|h| classifier.classify(h)) == Some(GestureLabel::Victory),
            _ => false,
        });
        assert!(saw_victory);

        sim_tx.send(SimInput::Quit).unwrap();
        assert!(rx.iter().any(|e| e == SourceEvent::Quit));
    }

    #[test]
    fn sim_source_stops_when_input_closes() {
        let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
        let rx = spawn_frame_source(SimFrameSource::new(sim_rx, Duration::from_millis(1)));
        drop(sim_tx);
        // Channel closes once the source notices its input is gone.
        assert!(rx.iter().take(10_000).count() < 10_000);
    }

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn frame_json_shape() {
        let frame: TrackingFrame = serde_json::from_str(r#"{"t_ms": 5}"#).unwrap();
        assert_eq!(frame, TrackingFrame::empty(5));

        let hand = synth::pose(GestureLabel::Fist, &PoseParams::default());
        let frame = TrackingFrame::with_hand(9, &hand);
        assert_eq!(frame.first_hand().map(|h| h.len()), Some(21));
        let back: TrackingFrame = serde_json::from_str(&serde_json::to_string(&frame).unwrap()).unwrap();
        assert_eq!(back, frame);
    }
}
