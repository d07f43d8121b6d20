//! Atomic (single-frame) gesture classification.
//!
//! The classifier is a pure function of one hand's landmarks plus its
//! [`ClassifierOptions`].  Every threshold is relative to the hand's own
//! bounding box, so the result does not depend on how far the hand is from
//! the camera.
//!
//! # Algorithm
//!
//! 1. Bounding box of all 21 points → `hand_width`, `hand_height`.
//!    A zero-area box means the tracker gave us nothing usable.
//! 2. Each long finger is tested for *extended* (tip above PIP above MCP,
//!    with height-relative gaps, tip reaching away from the knuckle) and
//!    *curled* (tip folded back down near the palm).
//! 3. The thumb uses its own tests: extended = tip above its MCP and
//!    laterally away from the index knuckle; curled = tip resting near the
//!    index or middle MCP.
//! 4. First matching rule wins:
//!
//! | Order | Label | Rule |
//! |---|---|---|
//! | 1 | `OPEN_PALM` | all five digits extended |
//! | 2 | `FIST` | all five curled, index tip not far above the palm centre |
//! | 3 | `POINTING_UP` | index extended, others curled, index tip clearly highest |
//! | 4 | `VICTORY` | index + middle extended and spread, ring/pinky/thumb curled |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::landmark::{Finger, HandFrame, HandLandmark, Landmark};
use crate::Error;

// ════════════════════════════════════════════════════════════════════════════
// GestureLabel
// ════════════════════════════════════════════════════════════════════════════

/// A recognised single-frame hand pose.  "No gesture" is `Option::None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureLabel {
    OpenPalm,
    Fist,
    PointingUp,
    Victory,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 4] = [
        GestureLabel::OpenPalm,
        GestureLabel::Fist,
        GestureLabel::PointingUp,
        GestureLabel::Victory,
    ];

    /// Wire name, e.g. `"OPEN_PALM"`.
    pub fn as_str(self) -> &'static str {
        match self {
            GestureLabel::OpenPalm   => "OPEN_PALM",
            GestureLabel::Fist       => "FIST",
            GestureLabel::PointingUp => "POINTING_UP",
            GestureLabel::Victory    => "VICTORY",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GestureLabel::ALL
            .iter()
            .copied()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownLabel(s.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ClassifierOptions
// ════════════════════════════════════════════════════════════════════════════

/// Heuristic thresholds.  All distances are fractions of the hand's
/// bounding-box width or height.  The defaults are empirical starting
/// points, not calibrated values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierOptions {
    /// Minimum tip→PIP rise, relative to hand height, for an extended finger.
    pub extension_min_rel_dist_y: f32,
    /// Fraction of `extension_min_rel_dist_y` required for the PIP→MCP rise.
    pub pip_mcp_extension_ratio: f32,
    /// Slack, relative to hand width, allowed when testing a curled tip.
    pub curl_max_rel_dist_y: f32,
    /// A curled tip lies within this multiple of the PIP–DIP segment of its MCP.
    pub curl_tip_to_mcp_pip_dip_ratio: f32,
    /// Minimum lateral thumb-tip offset from the index MCP, relative to width.
    pub thumb_extension_min_rel_dist_x: f32,
    /// Extended thumb: tip→CMC must exceed MCP→CMC times this.
    pub thumb_tip_to_cmc_ratio: f32,
    /// Extended thumb: tip→MCP must exceed MCP→CMC times this.
    pub thumb_tip_to_mcp_ratio: f32,
    /// Base fist radius (tip to knuckle), relative to width.
    pub fist_max_tip_to_mcp_rel_dist: f32,
    /// Curled thumb: tip within `fist_max_tip_to_mcp_rel_dist` times this of a knuckle.
    pub thumb_curl_rel_dist_factor: f32,
    /// FIST: how far above the palm centre the index tip may sit, relative to height.
    pub fist_palm_margin_rel: f32,
    /// Margin by which a raised tip must clear the lowered ones, relative to height.
    pub tip_margin_rel: f32,
    /// Minimum index/middle tip spread for VICTORY, relative to width.
    pub victory_min_tip_dist_rel: f32,
    /// Maximum index/middle tip height difference for VICTORY, relative to height.
    pub victory_tip_level_rel: f32,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        ClassifierOptions {
            extension_min_rel_dist_y:       0.05,
            pip_mcp_extension_ratio:        0.5,
            curl_max_rel_dist_y:            0.05,
            curl_tip_to_mcp_pip_dip_ratio:  2.0,
            thumb_extension_min_rel_dist_x: 0.03,
            thumb_tip_to_cmc_ratio:         1.2,
            thumb_tip_to_mcp_ratio:         0.5,
            fist_max_tip_to_mcp_rel_dist:   0.1,
            thumb_curl_rel_dist_factor:     2.0,
            fist_palm_margin_rel:           0.1,
            tip_margin_rel:                 0.05,
            victory_min_tip_dist_rel:       0.05,
            victory_tip_level_rel:          0.05,
        }
    }
}

impl ClassifierOptions {
    /// Reject negative or non-finite thresholds.
    pub fn validate(&self) -> crate::Result<()> {
        let fields: [(&'static str, f32); 13] = [
            ("extension_min_rel_dist_y",       self.extension_min_rel_dist_y),
            ("pip_mcp_extension_ratio",        self.pip_mcp_extension_ratio),
            ("curl_max_rel_dist_y",            self.curl_max_rel_dist_y),
            ("curl_tip_to_mcp_pip_dip_ratio",  self.curl_tip_to_mcp_pip_dip_ratio),
            ("thumb_extension_min_rel_dist_x", self.thumb_extension_min_rel_dist_x),
            ("thumb_tip_to_cmc_ratio",         self.thumb_tip_to_cmc_ratio),
            ("thumb_tip_to_mcp_ratio",         self.thumb_tip_to_mcp_ratio),
            ("fist_max_tip_to_mcp_rel_dist",   self.fist_max_tip_to_mcp_rel_dist),
            ("thumb_curl_rel_dist_factor",     self.thumb_curl_rel_dist_factor),
            ("fist_palm_margin_rel",           self.fist_palm_margin_rel),
            ("tip_margin_rel",                 self.tip_margin_rel),
            ("victory_min_tip_dist_rel",       self.victory_min_tip_dist_rel),
            ("victory_tip_level_rel",          self.victory_tip_level_rel),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            Some(&(name, value)) => Err(Error::InvalidOption { name, value }),
            None => Ok(()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DigitStates — per-finger diagnostics
// ════════════════════════════════════════════════════════════════════════════

/// Extended/curled verdict for one digit.  Both can be false (half bent);
/// for the thumb both can be true.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigitState {
    pub extended: bool,
    pub curled:   bool,
}

/// Verdicts for all five digits of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigitStates {
    pub thumb:  DigitState,
    pub index:  DigitState,
    pub middle: DigitState,
    pub ring:   DigitState,
    pub pinky:  DigitState,
}

impl DigitStates {
    pub fn get(&self, finger: Finger) -> DigitState {
        match finger {
            Finger::Thumb  => self.thumb,
            Finger::Index  => self.index,
            Finger::Middle => self.middle,
            Finger::Ring   => self.ring,
            Finger::Pinky  => self.pinky,
        }
    }

    fn all_extended(&self) -> bool {
        Finger::ALL.iter().all(|f| self.get(*f).extended)
    }

    fn all_curled(&self) -> bool {
        Finger::ALL.iter().all(|f| self.get(*f).curled)
    }
}

impl fmt::Display for DigitStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, finger) in Finger::ALL.iter().enumerate() {
            let s = self.get(*finger);
            let mark = match (s.extended, s.curled) {
                (true,  true)  => "ext+curl",
                (true,  false) => "ext",
                (false, true)  => "curl",
                (false, false) => "-",
            };
            if i > 0 { f.write_str(" ")?; }
            write!(f, "{}={}", finger.as_str(), mark)?;
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AtomicGestureClassifier
// ════════════════════════════════════════════════════════════════════════════

/// Stateless heuristic classifier.  See the module docs for the rule table.
#[derive(Clone, Debug, Default)]
pub struct AtomicGestureClassifier {
    options: ClassifierOptions,
}

/// Hand size used to normalize every threshold in one frame.
#[derive(Clone, Copy, Debug)]
struct HandSize {
    width:  f32,
    height: f32,
}

impl AtomicGestureClassifier {
    pub fn new(options: ClassifierOptions) -> Self {
        AtomicGestureClassifier { options }
    }

    pub fn options(&self) -> &ClassifierOptions {
        &self.options
    }

    /// Classify tracker output in which points may be missing.
    ///
    /// Wrong length, a missing or non-finite point, or a zero-area hand
    /// all yield `None`.
    pub fn classify(&self, landmarks: &[Option<Landmark>]) -> Option<GestureLabel> {
        match HandFrame::from_partial(landmarks) {
            Some(hand) => self.classify_frame(&hand),
            None => {
                trace!(len = landmarks.len(), "incomplete landmark set");
                None
            }
        }
    }

    /// Classify a plain point slice; `None` unless it has exactly 21 points.
    pub fn classify_points(&self, landmarks: &[Landmark]) -> Option<GestureLabel> {
        HandFrame::from_points(landmarks).and_then(|hand| self.classify_frame(&hand))
    }

    pub fn classify_frame(&self, hand: &HandFrame) -> Option<GestureLabel> {
        let size = hand_size(hand)?;
        let states = self.states_for(hand, size);
        self.apply_rules(hand, size, &states)
    }

    /// Per-digit verdicts, or `None` for a zero-area hand.
    pub fn digit_states(&self, hand: &HandFrame) -> Option<DigitStates> {
        hand_size(hand).map(|size| self.states_for(hand, size))
    }

    // ── rule table ───────────────────────────────────────────────────────

    fn apply_rules(&self, hand: &HandFrame, size: HandSize, s: &DigitStates) -> Option<GestureLabel> {
        use HandLandmark::*;
        let o = &self.options;
        let tip_margin = size.height * o.tip_margin_rel;

        if s.all_extended() {
            return Some(GestureLabel::OpenPalm);
        }

        if s.all_curled() {
            let palm_center_y = (hand[Wrist].y + hand[IndexMcp].y + hand[PinkyMcp].y) / 3.0;
            if hand[IndexTip].y > palm_center_y - size.height * o.fist_palm_margin_rel {
                return Some(GestureLabel::Fist);
            }
        }

        if s.index.extended
            && s.middle.curled && s.ring.curled && s.pinky.curled
            && (s.thumb.curled || s.thumb.extended)
        {
            let index_y = hand[IndexTip].y;
            let clears = |other: HandLandmark| index_y < hand[other].y - tip_margin;
            if clears(MiddleTip) && clears(RingTip) && clears(PinkyTip) {
                return Some(GestureLabel::PointingUp);
            }
        }

        if s.index.extended && s.middle.extended
            && s.ring.curled && s.pinky.curled && s.thumb.curled
        {
            let index  = hand[IndexTip];
            let middle = hand[MiddleTip];
            let spread = index.distance_2d(&middle) / size.width;
            let level  = (index.y - middle.y).abs() / size.height;
            let ring_y = hand[RingTip].y;
            if spread > o.victory_min_tip_dist_rel
                && level < o.victory_tip_level_rel
                && index.y  < ring_y - tip_margin
                && middle.y < ring_y - tip_margin
            {
                return Some(GestureLabel::Victory);
            }
        }

        None
    }

    // ── per-digit tests ──────────────────────────────────────────────────

    fn states_for(&self, hand: &HandFrame, size: HandSize) -> DigitStates {
        let long = |finger: Finger| {
            let [mcp, pip, dip, tip] = finger.joints().map(|j| hand[j]);
            DigitState {
                extended: self.finger_extended(&mcp, &pip, &tip, size),
                curled:   self.finger_curled(&mcp, &pip, &dip, &tip, size),
            }
        };
        let [index, middle, ring, pinky] = Finger::LONG.map(long);
        DigitStates {
            thumb: DigitState {
                extended: self.thumb_extended(hand, size),
                curled:   self.thumb_curled(hand, size),
            },
            index,
            middle,
            ring,
            pinky,
        }
    }

    fn finger_extended(&self, mcp: &Landmark, pip: &Landmark, tip: &Landmark, size: HandSize) -> bool {
        let o = &self.options;
        let straight = tip.y < pip.y && pip.y < mcp.y;

        let tip_pip_rel = (pip.y - tip.y) / size.height;
        let pip_mcp_rel = (mcp.y - pip.y) / size.height;
        let reaches = tip_pip_rel > o.extension_min_rel_dist_y
            && pip_mcp_rel > o.extension_min_rel_dist_y * o.pip_mcp_extension_ratio;

        // A locally monotonic but bent finger keeps its tip close to the knuckle.
        let tip_mcp = tip.distance_2d(mcp);
        let outward = tip_mcp > pip.distance_2d(mcp) && tip_mcp > tip.distance_2d(pip);

        straight && reaches && outward
    }

    fn finger_curled(
        &self,
        mcp: &Landmark,
        pip: &Landmark,
        dip: &Landmark,
        tip: &Landmark,
        size: HandSize,
    ) -> bool {
        let slack = size.width * self.options.curl_max_rel_dist_y;

        let near_pip = tip.y > pip.y - slack * 0.5;
        let near_dip = tip.y > dip.y - slack * 0.25;
        let folded   = tip.distance_2d(mcp)
            < pip.distance_2d(dip) * self.options.curl_tip_to_mcp_pip_dip_ratio;
        let below_knuckle = tip.y > mcp.y - slack;

        (near_pip && near_dip && folded) || below_knuckle
    }

    fn thumb_extended(&self, hand: &HandFrame, size: HandSize) -> bool {
        use HandLandmark::*;
        let o = &self.options;
        let (cmc, mcp, tip) = (hand[ThumbCmc], hand[ThumbMcp], hand[ThumbTip]);

        let raised  = tip.y < mcp.y;
        let lateral = (tip.x - hand[IndexMcp].x).abs() / size.width > o.thumb_extension_min_rel_dist_x;

        let mcp_cmc = mcp.distance_2d(&cmc);
        let reaches = tip.distance_2d(&cmc) > mcp_cmc * o.thumb_tip_to_cmc_ratio
            && tip.distance_2d(&mcp) > mcp_cmc * o.thumb_tip_to_mcp_ratio;

        raised && lateral && reaches
    }

    fn thumb_curled(&self, hand: &HandFrame, size: HandSize) -> bool {
        use HandLandmark::*;
        let o = &self.options;
        let tip = hand[ThumbTip];
        let radius = o.fist_max_tip_to_mcp_rel_dist * o.thumb_curl_rel_dist_factor;

        tip.distance_2d(&hand[IndexMcp])  / size.width < radius
            || tip.distance_2d(&hand[MiddleMcp]) / size.width < radius
    }
}

fn hand_size(hand: &HandFrame) -> Option<HandSize> {
    let bbox = hand.bounding_box();
    if bbox.is_degenerate() {
        trace!("zero-area hand bounding box");
        return None;
    }
    Some(HandSize { width: bbox.width(), height: bbox.height() })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
