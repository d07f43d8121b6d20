//! Runs a short scripted session headlessly and prints the per-frame labels
//! and the commands that fired.

use holo_gesture::app::{self, Session};
use holo_gesture::config::AppConfig;
use holo_gesture::source::{ScriptFrameSource, SourceEvent};

const SCRIPT: &str = "
    0..200     OPEN_PALM
    300        FIST
    600        VICTORY
    900        NONE
    1200       POINTING_UP
    1500..1700 LOST
";

fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::default();
    let source = ScriptFrameSource::parse(SCRIPT, cfg.tracking.frame_interval_ms)?;

    println!("\n=== Holo gesture demo ===\n");

    let frames: Vec<_> = source
        .events()
        .filter_map(|e| match e {
            SourceEvent::Frame(f) => Some(f),
            _ => None,
        })
        .collect();
    let classifier = hand_pose::AtomicGestureClassifier::new(cfg.classifier.clone());
    for report in app::classify_frames(&classifier, &frames) {
        let label = report.label.map(|l| l.as_str()).unwrap_or("-");
        println!("   t={:>5} ms  hands={}  {}", report.t_ms, report.hands, label);
    }

    let summary = app::run_source(Session::new(&cfg)?, source)?;
    println!("\n   {} frames, {} command(s):", summary.frames, summary.commands.len());
    for c in &summary.commands {
        println!("      ▶ {:<20} at {} ms", c.command, c.t_ms);
    }
    println!();
    Ok(())
}
