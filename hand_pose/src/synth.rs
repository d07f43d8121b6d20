//! Synthetic hand poses.
//!
//! Canonical, hand-built landmark sets for every [`GestureLabel`] plus a
//! neutral pose that matches no rule.  Used by tests, demos and the
//! keyboard/script frame sources, which have no camera behind them.
//!
//! Poses are authored in "hand units": wrist at the origin, fingers
//! pointing toward negative `y` (up on screen), overall height ≈ 0.86.
//! [`PoseParams`] places and scales them in normalized image space.

use crate::classifier::GestureLabel;
use crate::landmark::{HandFrame, Landmark, LANDMARK_COUNT};

// ════════════════════════════════════════════════════════════════════════════
// PoseParams
// ════════════════════════════════════════════════════════════════════════════

/// Where to put a synthetic hand in the camera frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseParams {
    /// Wrist position.
    pub center_x: f32,
    pub center_y: f32,
    /// Multiplier from hand units to image units.
    pub scale:    f32,
    /// Base depth for every point.
    pub depth:    f32,
}

impl Default for PoseParams {
    fn default() -> Self {
        PoseParams { center_x: 0.5, center_y: 0.8, scale: 0.5, depth: 0.0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Canonical digits (hand units)
// ════════════════════════════════════════════════════════════════════════════

type Digit = [(f32, f32); 4];

const WRIST: (f32, f32) = (0.0, 0.0);

const THUMB_OPEN:   Digit = [(-0.15, -0.05), (-0.28, -0.15), (-0.38, -0.25), (-0.46, -0.35)];
const THUMB_TUCKED: Digit = [(-0.15, -0.05), (-0.22, -0.15), (-0.16, -0.28), (-0.08, -0.36)];

const INDEX_UP:  Digit = [(-0.12, -0.40), (-0.14, -0.58), (-0.15, -0.70), (-0.16, -0.82)];
const MIDDLE_UP: Digit = [( 0.00, -0.42), ( 0.00, -0.62), ( 0.00, -0.75), ( 0.00, -0.86)];
const RING_UP:   Digit = [( 0.11, -0.40), ( 0.12, -0.58), ( 0.13, -0.69), ( 0.14, -0.78)];
const PINKY_UP:  Digit = [( 0.21, -0.36), ( 0.24, -0.50), ( 0.26, -0.59), ( 0.28, -0.67)];

// Index and middle fanned apart for VICTORY.
const INDEX_V:  Digit = [(-0.12, -0.40), (-0.16, -0.58), (-0.19, -0.70), (-0.22, -0.82)];
const MIDDLE_V: Digit = [( 0.00, -0.42), ( 0.03, -0.60), ( 0.05, -0.72), ( 0.07, -0.83)];

// Digits folded down onto the palm: tip drops below its own knuckle.
const INDEX_DOWN:  Digit = [(-0.12, -0.40), (-0.11, -0.50), (-0.10, -0.42), (-0.11, -0.28)];
const MIDDLE_DOWN: Digit = [( 0.00, -0.42), ( 0.01, -0.52), ( 0.02, -0.44), ( 0.01, -0.30)];
const RING_DOWN:   Digit = [( 0.11, -0.40), ( 0.12, -0.50), ( 0.13, -0.42), ( 0.12, -0.28)];
const PINKY_DOWN:  Digit = [( 0.21, -0.36), ( 0.22, -0.46), ( 0.23, -0.38), ( 0.22, -0.24)];

// ════════════════════════════════════════════════════════════════════════════
// Builders
// ════════════════════════════════════════════════════════════════════════════

/// A hand the default classifier recognises as `label`.
pub fn pose(label: GestureLabel, params: &PoseParams) -> HandFrame {
    let digits = match label {
        GestureLabel::OpenPalm   => [THUMB_OPEN,   INDEX_UP,   MIDDLE_UP,   RING_UP,   PINKY_UP],
        GestureLabel::Fist       => [THUMB_TUCKED, INDEX_DOWN, MIDDLE_DOWN, RING_DOWN, PINKY_DOWN],
        GestureLabel::PointingUp => [THUMB_TUCKED, INDEX_UP,   MIDDLE_DOWN, RING_DOWN, PINKY_DOWN],
        GestureLabel::Victory    => [THUMB_TUCKED, INDEX_V,    MIDDLE_V,    RING_DOWN, PINKY_DOWN],
    };
    assemble(&digits, params)
}

/// Three fingers up, pinky and thumb tucked: matches no rule.
pub fn neutral(params: &PoseParams) -> HandFrame {
    assemble(&[THUMB_TUCKED, INDEX_UP, MIDDLE_UP, RING_UP, PINKY_DOWN], params)
}

/// Optional-label convenience: `None` gives the neutral pose.
pub fn pose_or_neutral(label: Option<GestureLabel>, params: &PoseParams) -> HandFrame {
    match label {
        Some(l) => pose(l, params),
        None    => neutral(params),
    }
}

fn assemble(digits: &[Digit; 5], params: &PoseParams) -> HandFrame {
    let place = |(u, v): (f32, f32), i: usize| Landmark {
        x: params.center_x + u * params.scale,
        y: params.center_y + v * params.scale,
        // Fingertips sit slightly nearer the camera than the wrist.
        z: params.depth - i as f32 * 0.002 * params.scale,
    };

    let mut points = [Landmark::default(); LANDMARK_COUNT];
    points[0] = place(WRIST, 0);
    for (d, digit) in digits.iter().enumerate() {
        for (j, uv) in digit.iter().enumerate() {
            let i = 1 + d * 4 + j;
            points[i] = place(*uv, i);
        }
    }
    HandFrame::new(points)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::HandLandmark;

    #[test]
    fn wrist_sits_at_center() {
        let p = PoseParams { center_x: 0.3, center_y: 0.7, scale: 0.2, depth: -0.1 };
        let hand = pose(GestureLabel::OpenPalm, &p);
        let w = hand[HandLandmark::Wrist];
        assert_eq!((w.x, w.y, w.z), (0.3, 0.7, -0.1));
    }

    #[test]
    fn scale_controls_hand_height() {
        let small = pose(GestureLabel::OpenPalm, &PoseParams { scale: 0.1, ..PoseParams::default() });
        let large = pose(GestureLabel::OpenPalm, &PoseParams { scale: 0.4, ..PoseParams::default() });
        let ratio = large.bounding_box().height() / small.bounding_box().height();
        assert!((ratio - 4.0).abs() < 1e-3);
    }

    #[test]
    fn fingers_point_up_in_open_palm() {
        let hand = pose(GestureLabel::OpenPalm, &PoseParams::default());
        assert!(hand[HandLandmark::MiddleTip].y < hand[HandLandmark::MiddleMcp].y);
        assert!(hand[HandLandmark::MiddleMcp].y < hand[HandLandmark::Wrist].y);
    }

    #[test]
    fn pose_or_neutral_maps_none() {
        let p = PoseParams::default();
        assert_eq!(pose_or_neutral(None, &p), neutral(&p));
        assert_eq!(pose_or_neutral(Some(GestureLabel::Fist), &p), pose(GestureLabel::Fist, &p));
    }
}
