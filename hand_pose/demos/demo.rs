//! Classifies every synthetic pose at a few sizes and prints the per-digit
//! verdicts behind each label.

use hand_pose::{AtomicGestureClassifier, GestureLabel, synth::{self, PoseParams}};

fn main() {
    let classifier = AtomicGestureClassifier::default();

    println!("\n=== Atomic gesture classifier demo ===\n");

    for scale in [0.15_f32, 0.35, 0.6] {
        println!("scale {:.2}", scale);
        let params = PoseParams { scale, ..PoseParams::default() };

        let mut poses: Vec<(String, _)> = GestureLabel::ALL
            .iter()
            .map(|l| (l.to_string(), synth::pose(*l, &params)))
            .collect();
        poses.push(("neutral".to_string(), synth::neutral(&params)));

        for (name, hand) in &poses {
            let label = classifier
                .classify_frame(hand)
                .map(|l| l.as_str())
                .unwrap_or("(none)");
            let states = classifier
                .digit_states(hand)
                .map(|s| s.to_string())
                .unwrap_or_default();
            println!("   {:<12} → {:<12} {}", name, label, states);
        }
        println!();
    }
}
