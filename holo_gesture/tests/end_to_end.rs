//! Script → frames → classifier → sequencer → commands, through the public API.

use holo_gesture::app::{self, Session};
use holo_gesture::config::AppConfig;
use holo_gesture::recorder::{self, FrameRecorder};
use holo_gesture::source::{ReplayFrameSource, ScriptFrameSource};

fn run_script(script: &str, cfg: &AppConfig) -> Vec<(u64, String)> {
    let src = ScriptFrameSource::parse(script, cfg.tracking.frame_interval_ms).unwrap();
    let summary = app::run_source(Session::new(cfg).unwrap(), src).unwrap();
    summary.commands.into_iter().map(|c| (c.t_ms, c.command)).collect()
}

// ── default table ─────────────────────────────────────────────────────────

#[test]
fn create_cube_inside_timeout() {
    let fired = run_script("0 OPEN_PALM\n500 FIST\n", &AppConfig::default());
    assert_eq!(fired, vec![(500, "CREATE_CUBE".to_string())]);
}

#[test]
fn create_cube_outside_timeout() {
    let fired = run_script("0 OPEN_PALM\n2500 FIST\n", &AppConfig::default());
    assert!(fired.is_empty(), "{:?}", fired);
}

#[test]
fn held_first_pose_keeps_sequence_alive() {
    // Holding OPEN_PALM re-arms the step timeout on every frame.
    let fired = run_script("0..1800 OPEN_PALM\n3000 FIST\n", &AppConfig::default());
    assert_eq!(fired, vec![(3000, "CREATE_CUBE".to_string())]);
}

#[test]
fn chained_commands() {
    let script = "\
        0    OPEN_PALM
        300  FIST        # CREATE_CUBE; DELETE_LAST_OBJECT armed
        600  VICTORY     # DELETE_LAST_OBJECT
        900  POINTING_UP
    ";
    let fired = run_script(script, &AppConfig::default());
    assert_eq!(fired, vec![
        (300, "CREATE_CUBE".to_string()),
        (600, "DELETE_LAST_OBJECT".to_string()),
    ]);
}

#[test]
fn neutral_hand_breaks_sequence() {
    let fired = run_script("0 OPEN_PALM\n100 NONE\n200 FIST\n", &AppConfig::default());
    assert!(fired.is_empty());
}

#[test]
fn explicit_reset_breaks_sequence() {
    let fired = run_script("0 OPEN_PALM\n100 RESET\n200 FIST\n", &AppConfig::default());
    assert!(fired.is_empty());
}

// ── configured table ──────────────────────────────────────────────────────

#[test]
fn custom_sequences_from_toml() {
    let cfg = AppConfig::from_toml_str(
        r#"
        [[sequence]]
        command  = "SPIN"
        sequence = ["POINTING_UP", "POINTING_UP", "VICTORY"]
        timeout  = 400
        "#,
    )
    .unwrap();
    let fired = run_script("0 POINTING_UP\n300 POINTING_UP\n650 VICTORY\n", &cfg);
    assert_eq!(fired, vec![(650, "SPIN".to_string())]);

    let late = run_script("0 POINTING_UP\n300 POINTING_UP\n800 VICTORY\n", &cfg);
    assert!(late.is_empty());
}

#[test]
fn bad_entries_do_not_silence_good_ones() {
    let cfg = AppConfig::from_toml_str(
        r#"
        [[sequence]]
        command  = "GOOD"
        sequence = ["VICTORY", "FIST"]
        timeout  = 1000

        [[sequence]]
        command  = "BAD"
        sequence = ["FIST"]
        timeout  = 0

        [[sequence]]
        command  = "EMPTY"
        sequence = []

        [[sequence]]
        command  = "THUMBS"
        sequence = ["THUMBS_UP", "FIST"]
        "#,
    )
    .unwrap();
    let fired = run_script("0 VICTORY\n400 FIST\n", &cfg);
    assert_eq!(fired, vec![(400, "GOOD".to_string())]);
}

#[test]
fn lost_tracking_triggers_hard_reset() {
    let mut cfg = AppConfig::default();
    cfg.tracking.hand_lost_reset_frames = 2;
    // A hand-less frame already breaks the sequence; after the reset a
    // fresh sequence still works.
    let fired = run_script("0 OPEN_PALM\n30 LOST\n60 LOST\n90 OPEN_PALM\n120 FIST\n", &cfg);
    assert_eq!(fired, vec![(120, "CREATE_CUBE".to_string())]);
}

// ── record / replay ───────────────────────────────────────────────────────

#[test]
fn recorded_session_replays_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");
    let cfg = AppConfig::default();

    let script = "0 OPEN_PALM\n200 FIST\n400 LOST\n700 FIST\n900 VICTORY\n";
    let src = ScriptFrameSource::parse(script, 33).unwrap();
    let session = Session::new(&cfg).unwrap().with_recorder(FrameRecorder::create(&path).unwrap());
    let first = app::run_source(session, src).unwrap();

    assert_eq!(recorder::load_frames(&path).unwrap().len(), 5);

    let replay = ReplayFrameSource::from_path(&path).unwrap();
    let second = app::run_source(Session::new(&cfg).unwrap(), replay).unwrap();
    assert_eq!(first, second);
    assert_eq!(second.commands.len(), 2);
}
