//! Drives the default sequence table with a scripted label stream on a
//! simulated clock and prints every step and command.

use std::time::{Duration, Instant};

use gesture_seq::{default_sequences, GestureSequencer};
use hand_pose::GestureLabel::{self, *};

fn main() {
    let mut sequencer = GestureSequencer::new(default_sequences());
    let (_id, commands) = sequencer.subscribe_channel();

    println!("\n=== Gesture sequencer demo ===\n");
    for def in sequencer.definitions() {
        println!("   {:<20} {}  ({} ms)", def.command, def.describe(), def.timeout_ms);
    }
    println!();

    let script: &[(u64, Option<GestureLabel>)] = &[
        (0,    Some(OpenPalm)),
        (400,  Some(Fist)),       // CREATE_CUBE, and DELETE_LAST_OBJECT starts
        (900,  Some(Victory)),    // DELETE_LAST_OBJECT
        (2000, Some(OpenPalm)),
        (4500, Some(Fist)),       // too late for CREATE_CUBE
        (4600, None),             // breaks DELETE_LAST_OBJECT
        (4700, Some(Victory)),
    ];

    let t0 = Instant::now();
    for &(t_ms, label) in script {
        let now = t0 + Duration::from_millis(t_ms);
        sequencer.poll_timeouts(now);
        let completed = sequencer.emit_gesture_at(label, now);

        let name = label.map(|l| l.as_str()).unwrap_or("-");
        let progress: Vec<String> = sequencer
            .progress()
            .iter()
            .map(|p| format!("{}/{}", p.matched, p.len))
            .collect();
        println!("   t={:>5} ms  {:<12} progress [{}]", t_ms, name, progress.join(", "));

        for event in commands.try_iter().take(completed) {
            println!("      ▶ {}", event.command);
        }
    }
    println!();
}
