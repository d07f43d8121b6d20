//! JSON-lines capture of tracking frames.
//!
//! One [`TrackingFrame`] per line, so a recording can be tailed while it is
//! written and replayed with [`crate::source::ReplayFrameSource`].

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::source::TrackingFrame;
use crate::{Error, Result};

pub struct FrameRecorder {
    out:    Box<dyn Write + Send>,
    frames: u64,
}

impl std::fmt::Debug for FrameRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRecorder").field("frames", &self.frames).finish()
    }
}

impl FrameRecorder {
    /// Create (or truncate) `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        debug!(path = %path.display(), "recording frames");
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer(out: impl Write + Send + 'static) -> Self {
        FrameRecorder { out: Box::new(out), frames: 0 }
    }

    pub fn record(&mut self, frame: &TrackingFrame) -> Result<()> {
        serde_json::to_writer(&mut self.out, frame)?;
        self.out.write_all(b"\n")?;
        self.frames += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 { self.frames }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Parse a JSON-lines recording.  Blank lines are skipped.
pub fn read_frames(reader: impl BufRead) -> Result<Vec<TrackingFrame>> {
    let mut frames = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_text = line?;
        if line_text.trim().is_empty() { continue; }
        let frame = serde_json::from_str(&line_text)
            .map_err(|source| Error::Frame { line: idx + 1, source })?;
        frames.push(frame);
    }
    Ok(frames)
}

pub fn load_frames(path: &Path) -> Result<Vec<TrackingFrame>> {
    read_frames(BufReader::new(File::open(path)?))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::synth::{self, PoseParams};
    use hand_pose::GestureLabel;

    #[test]
    fn record_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");

        let hand = synth::pose(GestureLabel::OpenPalm, &PoseParams::default());
        let frames = vec![
            TrackingFrame::with_hand(0, &hand),
            TrackingFrame::empty(33),
        ];

        let mut rec = FrameRecorder::create(&path).unwrap();
        for f in &frames {
            rec.record(f).unwrap();
        }
        assert_eq!(rec.frames_written(), 2);
        rec.flush().unwrap();
        drop(rec);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert_eq!(load_frames(&path).unwrap(), frames);
    }

    #[test]
    fn blank_lines_skipped() {
        let input = "{\"t_ms\":1}\n\n   \n{\"t_ms\":2,\"hands\":[]}\n";
        let frames = read_frames(input.as_bytes()).unwrap();
        assert_eq!(frames, vec![TrackingFrame::empty(1), TrackingFrame::empty(2)]);
    }

    #[test]
    fn bad_line_reports_position() {
        let input = "{\"t_ms\":1}\nnot json\n";
        let err = read_frames(input.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Frame { line: 2, .. }), "{:?}", err);
    }

    #[test]
    fn missing_points_survive() {
        let input = r#"{"t_ms":3,"hands":[[null,{"x":0.5,"y":0.5}]]}"#;
        let frames = read_frames(input.as_bytes()).unwrap();
        let hand = frames[0].first_hand().unwrap();
        assert_eq!(hand.len(), 2);
        assert!(hand[0].is_none());
        assert_eq!(hand[1].map(|p| p.z), Some(0.0));
    }
}
