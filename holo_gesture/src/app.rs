//! Session state and the run loops.
//!
//! A [`Session`] owns the pipeline, the command subscription and an optional
//! recorder.  It processes [`SourceEvent`]s and keeps a log of every command
//! fired.  [`run_source`] drains a headless source into a session;
//! [`run_window`] drives the keyboard simulator and visualizer at ~60 fps.

use std::sync::mpsc::Receiver;

use gesture_seq::{CommandEvent, GestureSequencer};
use hand_pose::{AtomicGestureClassifier, DigitStates, GestureLabel, HandFrame};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::pipeline::{FrameOutcome, GesturePipeline};
use crate::recorder::FrameRecorder;
use crate::source::{spawn_frame_source, FrameSource, SourceEvent, TrackingFrame};
use crate::Result;

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

/// A command as it was fired, stamped with the frame time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandRecord {
    pub t_ms:    u64,
    pub command: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames:   u64,
    pub commands: Vec<CommandRecord>,
}

pub struct Session {
    pipeline:  GesturePipeline,
    commands:  Receiver<CommandEvent>,
    recorder:  Option<FrameRecorder>,
    log:       Vec<CommandRecord>,
    last:      FrameOutcome,
    last_t_ms: u64,
    pub status: String,
}

impl Session {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        cfg.validate()?;
        let classifier = AtomicGestureClassifier::new(cfg.classifier.clone());
        let sequencer = GestureSequencer::new(cfg.sequences.iter().cloned());
        let (_id, commands) = sequencer.subscribe_channel();
        let pipeline = GesturePipeline::new(classifier, sequencer, &cfg.tracking);

        let names: Vec<&str> = pipeline.sequencer().commands().collect();
        let status = format!("Ready — commands: {}", names.join(", "));
        Ok(Session {
            pipeline,
            commands,
            recorder:  None,
            log:       Vec::new(),
            last:      FrameOutcome::default(),
            last_t_ms: 0,
            status,
        })
    }

    pub fn with_recorder(mut self, recorder: FrameRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Handle one event.  Returns `false` when the session should stop.
    pub fn handle(&mut self, event: SourceEvent) -> Result<bool> {
        match event {
            SourceEvent::Frame(frame) => self.handle_frame(&frame)?,
            SourceEvent::Reset => {
                self.pipeline.hard_reset();
                self.status = "RESET — all sequences idle".to_string();
            }
            SourceEvent::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn handle_frame(&mut self, frame: &TrackingFrame) -> Result<()> {
        if let Some(rec) = self.recorder.as_mut() {
            rec.record(frame)?;
        }

        let outcome = self.pipeline.process_frame(frame);
        self.last = outcome;
        self.last_t_ms = frame.t_ms;

        for event in self.commands.try_iter() {
            info!(t_ms = frame.t_ms, command = %event.command, "command");
            self.status = format!("▶ {}  at {} ms", event.command, frame.t_ms);
            self.log.push(CommandRecord { t_ms: frame.t_ms, command: event.command });
        }
        if outcome.hard_reset {
            self.status = "Tracking lost — sequences reset".to_string();
        }
        Ok(())
    }

    pub fn pipeline(&self) -> &GesturePipeline { &self.pipeline }

    pub fn last_outcome(&self) -> &FrameOutcome { &self.last }

    pub fn last_t_ms(&self) -> u64 { self.last_t_ms }

    pub fn commands_fired(&self) -> &[CommandRecord] { &self.log }

    /// Flush the recorder and return what happened.
    pub fn finish(mut self) -> Result<RunSummary> {
        if let Some(rec) = self.recorder.as_mut() {
            rec.flush()?;
            debug!(frames = rec.frames_written(), "recording flushed");
        }
        Ok(RunSummary {
            frames:   self.pipeline.frames_processed(),
            commands: self.log,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Headless run
// ════════════════════════════════════════════════════════════════════════════

/// Run `source` on its own thread until it finishes or sends `Quit`.
pub fn run_source<S: FrameSource>(mut session: Session, source: S) -> Result<RunSummary> {
    let rx = spawn_frame_source(source);
    for event in rx {
        if !session.handle(event)? {
            break;
        }
    }
    session.finish()
}

// ════════════════════════════════════════════════════════════════════════════
// Offline classification
// ════════════════════════════════════════════════════════════════════════════

/// Classification of one recorded frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub t_ms:   u64,
    pub hands:  usize,
    pub label:  Option<GestureLabel>,
    /// Per-digit verdicts, when the first hand is complete.
    #[serde(skip)]
    pub digits: Option<DigitStates>,
}

pub fn classify_frames(classifier: &AtomicGestureClassifier, frames: &[TrackingFrame]) -> Vec<FrameReport> {
    frames
        .iter()
        .map(|frame| {
            let first = frame.first_hand();
            FrameReport {
                t_ms:   frame.t_ms,
                hands:  frame.hands.len(),
                label:  first.and_then(|h| classifier.classify(h)),
                digits: first
                    .and_then(HandFrame::from_partial)
                    .and_then(|h| classifier.digit_states(&h)),
            }
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Windowed run (feature = "window")
// ════════════════════════════════════════════════════════════════════════════

/// Keyboard simulator with the progress visualizer.
#[cfg(feature = "window")]
pub fn run_window(mut session: Session, frame_interval_ms: u64) -> Result<RunSummary> {
    use std::sync::mpsc::{self, TryRecvError};
    use std::time::Duration;

    use crate::source::{SimFrameSource, SimInput};
    use crate::visualizer::Visualizer;

    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let rx = spawn_frame_source(SimFrameSource::new(sim_rx, Duration::from_millis(frame_interval_ms)));
    let mut vis = Visualizer::new(sim_tx)?;
    let mut last_frame: Option<TrackingFrame> = None;

    'frames: while vis.is_open() {
        if !vis.poll_input() { break; }

        loop {
            match rx.try_recv() {
                Ok(SourceEvent::Frame(frame)) => {
                    session.handle_frame(&frame)?;
                    last_frame = Some(frame);
                }
                Ok(event) => {
                    if !session.handle(event)? { break 'frames; }
                }
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => break 'frames,
            }
        }

        vis.render(&session, last_frame.as_ref());
    }

    session.finish()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ScriptFrameSource;
    use hand_pose::synth::{self, PoseParams};
    use GestureLabel::*;

    fn session() -> Session {
        Session::new(&AppConfig::default()).unwrap()
    }

    fn frame(t_ms: u64, label: GestureLabel) -> SourceEvent {
        SourceEvent::Frame(TrackingFrame::with_hand(t_ms, &synth::pose(label, &PoseParams::default())))
    }

    #[test]
    fn session_logs_commands_with_time() {
        let mut s = session();
        assert!(s.handle(frame(0, OpenPalm)).unwrap());
        assert!(s.handle(frame(300, Fist)).unwrap());
        assert_eq!(s.commands_fired(), &[CommandRecord { t_ms: 300, command: "CREATE_CUBE".into() }]);
        assert!(s.status.contains("CREATE_CUBE"));
        assert_eq!(s.last_outcome().completed, 1);
    }

    #[test]
    fn reset_event_clears_progress() {
        let mut s = session();
        s.handle(frame(0, OpenPalm)).unwrap();
        s.handle(SourceEvent::Reset).unwrap();
        s.handle(frame(100, Fist)).unwrap();
        assert!(s.commands_fired().is_empty());
        assert!(s.status.starts_with("RESET"));
    }

    #[test]
    fn quit_stops_session() {
        let mut s = session();
        assert!(!s.handle(SourceEvent::Quit).unwrap());
    }

    #[test]
    fn invalid_config_rejected() {
        let mut cfg = AppConfig::default();
        cfg.tracking.frame_interval_ms = 0;
        assert!(Session::new(&cfg).is_err());
    }

    #[test]
    fn bad_sequence_entry_leaves_the_rest_working() {
        let mut cfg = AppConfig::default();
        cfg.sequences.push(gesture_seq::GestureSequenceDefinition::new("EMPTY", vec![], 1000));
        cfg.sequences.push(gesture_seq::GestureSequenceDefinition::new("ZERO", vec![Fist], 0));
        let mut s = Session::new(&cfg).unwrap();
        assert_eq!(s.pipeline().sequencer().len(), 2);

        s.handle(frame(0, OpenPalm)).unwrap();
        s.handle(frame(300, Fist)).unwrap();
        assert_eq!(s.commands_fired(), &[CommandRecord { t_ms: 300, command: "CREATE_CUBE".into() }]);
    }

    #[test]
    fn run_source_drains_script() {
        let script = "0 OPEN_PALM\n400 FIST\n800 VICTORY\n";
        let src = ScriptFrameSource::parse(script, 33).unwrap();
        let summary = run_source(session(), src).unwrap();
        assert_eq!(summary.frames, 3);
        let names: Vec<&str> = summary.commands.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(names, vec!["CREATE_CUBE", "DELETE_LAST_OBJECT"]);
        assert_eq!(summary.commands[1].t_ms, 800);
    }

    #[test]
    fn classify_frames_reports_each_frame() {
        let classifier = AtomicGestureClassifier::default();
        let frames = vec![
            TrackingFrame::with_hand(0, &synth::pose(Victory, &PoseParams::default())),
            TrackingFrame::empty(33),
            TrackingFrame::with_hand(66, &synth::neutral(&PoseParams::default())),
        ];
        let reports = classify_frames(&classifier, &frames);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].label, Some(Victory));
        assert!(reports[0].digits.is_some());
        assert_eq!((reports[1].hands, reports[1].label, reports[1].digits), (0, None, None));
        assert_eq!(reports[2].label, None);
        assert!(reports[2].digits.is_some());
    }
}
