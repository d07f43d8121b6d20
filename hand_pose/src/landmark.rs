//! Hand landmark model and the small amount of geometry the classifier needs.

use serde::{Deserialize, Serialize};

/// Number of landmarks in one tracked hand.
pub const LANDMARK_COUNT: usize = 21;

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// A tracked point in normalized image space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth; sign and scale depend on the tracker.
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Planar distance, ignoring depth.
    pub fn distance_2d(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn distance_3d(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLandmark — anatomical index names
// ════════════════════════════════════════════════════════════════════════════

/// The 21 anatomical landmark positions, in tracker order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandLandmark {
    Wrist       = 0,
    ThumbCmc    = 1,
    ThumbMcp    = 2,
    ThumbIp     = 3,
    ThumbTip    = 4,
    IndexMcp    = 5,
    IndexPip    = 6,
    IndexDip    = 7,
    IndexTip    = 8,
    MiddleMcp   = 9,
    MiddlePip   = 10,
    MiddleDip   = 11,
    MiddleTip   = 12,
    RingMcp     = 13,
    RingPip     = 14,
    RingDip     = 15,
    RingTip     = 16,
    PinkyMcp    = 17,
    PinkyPip    = 18,
    PinkyDip    = 19,
    PinkyTip    = 20,
}

impl HandLandmark {
    pub const ALL: [HandLandmark; LANDMARK_COUNT] = [
        Self::Wrist,
        Self::ThumbCmc,  Self::ThumbMcp,  Self::ThumbIp,   Self::ThumbTip,
        Self::IndexMcp,  Self::IndexPip,  Self::IndexDip,  Self::IndexTip,
        Self::MiddleMcp, Self::MiddlePip, Self::MiddleDip, Self::MiddleTip,
        Self::RingMcp,   Self::RingPip,   Self::RingDip,   Self::RingTip,
        Self::PinkyMcp,  Self::PinkyPip,  Self::PinkyDip,  Self::PinkyTip,
    ];

    /// Array index (0–20).
    pub fn index(self) -> usize { self as usize }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wrist     => "wrist",
            Self::ThumbCmc  => "thumb-cmc",
            Self::ThumbMcp  => "thumb-mcp",
            Self::ThumbIp   => "thumb-ip",
            Self::ThumbTip  => "thumb-tip",
            Self::IndexMcp  => "index-mcp",
            Self::IndexPip  => "index-pip",
            Self::IndexDip  => "index-dip",
            Self::IndexTip  => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp   => "ring-mcp",
            Self::RingPip   => "ring-pip",
            Self::RingDip   => "ring-dip",
            Self::RingTip   => "ring-tip",
            Self::PinkyMcp  => "pinky-mcp",
            Self::PinkyPip  => "pinky-pip",
            Self::PinkyDip  => "pinky-dip",
            Self::PinkyTip  => "pinky-tip",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

/// One of the five digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky,
    ];

    /// The four long fingers, which share the MCP/PIP/DIP/TIP topology.
    pub const LONG: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// Joints from palm to tip.  For the thumb these are CMC, MCP, IP, TIP.
    pub fn joints(self) -> [HandLandmark; 4] {
        use HandLandmark::*;
        match self {
            Finger::Thumb  => [ThumbCmc,  ThumbMcp,  ThumbIp,   ThumbTip],
            Finger::Index  => [IndexMcp,  IndexPip,  IndexDip,  IndexTip],
            Finger::Middle => [MiddleMcp, MiddlePip, MiddleDip, MiddleTip],
            Finger::Ring   => [RingMcp,   RingPip,   RingDip,   RingTip],
            Finger::Pinky  => [PinkyMcp,  PinkyPip,  PinkyDip,  PinkyTip],
        }
    }

    pub fn tip(self) -> HandLandmark { self.joints()[3] }

    pub fn as_str(self) -> &'static str {
        match self {
            Finger::Thumb  => "thumb",
            Finger::Index  => "index",
            Finger::Middle => "middle",
            Finger::Ring   => "ring",
            Finger::Pinky  => "pinky",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BoundingBox
// ════════════════════════════════════════════════════════════════════════════

/// Axis-aligned 2D bounding box of a set of landmarks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    /// Bounding box of `points`, or `None` for an empty slice.
    pub fn of(points: &[Landmark]) -> Option<Self> {
        let first = points.first()?;
        let init = BoundingBox {
            min_x: first.x, min_y: first.y,
            max_x: first.x, max_y: first.y,
        };
        Some(points[1..].iter().fold(init, |b, p| BoundingBox {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self)  -> f32 { (self.max_x - self.min_x).abs() }
    pub fn height(&self) -> f32 { (self.max_y - self.min_y).abs() }

    pub fn center(&self) -> (f32, f32) {
        ((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    /// True when the box has no usable area for normalization.
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame — a complete, validated hand
// ════════════════════════════════════════════════════════════════════════════

/// Exactly 21 landmarks for one hand in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandFrame {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        HandFrame { points }
    }

    /// Build from a full slice.  `None` unless the slice has exactly 21 points.
    pub fn from_points(points: &[Landmark]) -> Option<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(HandFrame { points })
    }

    /// Build from tracker output in which individual points may be absent.
    /// `None` on wrong length or any missing point.  A NaN or infinite
    /// coordinate counts as missing.
    pub fn from_partial(points: &[Option<Landmark>]) -> Option<Self> {
        if points.len() != LANDMARK_COUNT {
            return None;
        }
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        for (slot, p) in out.iter_mut().zip(points) {
            *slot = p.filter(Landmark::is_finite)?;
        }
        Some(HandFrame { points: out })
    }

    pub fn get(&self, id: HandLandmark) -> &Landmark {
        &self.points[id.index()]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Tracker-shaped copy with every point present.
    pub fn to_partial(&self) -> Vec<Option<Landmark>> {
        self.points.iter().copied().map(Some).collect()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        // Non-empty by construction.
        BoundingBox::of(&self.points).unwrap_or(BoundingBox {
            min_x: 0.0, min_y: 0.0, max_x: 0.0, max_y: 0.0,
        })
    }

    /// Apply `f` to every point.
    pub fn map(&self, mut f: impl FnMut(Landmark) -> Landmark) -> Self {
        let mut points = self.points;
        for p in points.iter_mut() {
            *p = f(*p);
        }
        HandFrame { points }
    }
}

impl std::ops::Index<HandLandmark> for HandFrame {
    type Output = Landmark;
    fn index(&self, id: HandLandmark) -> &Landmark { self.get(id) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
