//! Software-rendered simulator window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────┬───────────────────────────────────────────┐
//! │  HAND                │  SEQUENCES                                │
//! │                      │                                           │
//! │   [landmark          │  CREATE_CUBE         [■■][  ]  ▬▬▬▬▬      │
//! │    skeleton]         │  DELETE_LAST_OBJECT  [  ][  ]             │
//! │                      │                                           │
//! │  label: FIST         │  recent commands                          │
//! ├──────────────────────┴───────────────────────────────────────────┤
//! │  status bar                                                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Duration;

use hand_pose::{BoundingBox, Finger, GestureLabel, HandLandmark, Landmark};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::app::Session;
use crate::canvas::Canvas;
use crate::source::{SimInput, TrackingFrame};
use crate::{Error, Result};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:      usize = 900;
pub const WIN_H:      usize = 420;
const HAND_W:         usize = 320;
const HAND_BOX:       usize = 280;
const HAND_X:         usize = 20;
const HAND_Y:         usize = 40;
const SEQ_X:          usize = HAND_W + 20;
const SEQ_Y:          usize = 40;
const ROW_H:          usize = 44;
const STEP_W:         usize = 56;
const STEP_H:         usize = 14;
const TIMER_W:        usize = 160;
const STATUS_Y:       usize = WIN_H - 40;
const BG_COLOR:       u32   = 0xFF1A1A2E;
const PANEL_BG:       u32   = 0xFF16213E;
const TEXT_BG:        u32   = 0xFF0F3460;
const BONE_COLOR:     u32   = 0xFF5DADE2;
const JOINT_COLOR:    u32   = 0xFFEEEEEE;
const STEP_DONE:      u32   = 0xFFFFD700;  // gold
const STEP_TODO:      u32   = 0xFF2E4057;
const TIMER_COLOR:    u32   = 0xFFE67E22;

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    sim_tx: Sender<SimInput>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self> {
        let mut window = Window::new(
            "Holo Gesture — sequence simulator",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| Error::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            canvas: Canvas::new(WIN_W, WIN_H, BG_COLOR),
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard inputs and translate to [`SimInput`] events.
    /// Returns false when the window should close.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return false;
        }

        let input = if pressed(Key::Key1) {
            Some(SimInput::Pose(Some(GestureLabel::OpenPalm)))
        } else if pressed(Key::Key2) {
            Some(SimInput::Pose(Some(GestureLabel::Fist)))
        } else if pressed(Key::Key3) {
            Some(SimInput::Pose(Some(GestureLabel::PointingUp)))
        } else if pressed(Key::Key4) {
            Some(SimInput::Pose(Some(GestureLabel::Victory)))
        } else if pressed(Key::Key0) {
            Some(SimInput::Pose(None))
        } else if pressed(Key::H) {
            Some(SimInput::Hide)
        } else if pressed(Key::R) {
            Some(SimInput::Reset)
        } else {
            None
        };

        if let Some(input) = input {
            if self.sim_tx.send(input).is_err() { return false; }
        }
        true
    }

    /// Render one frame.
    pub fn render(&mut self, session: &Session, frame: Option<&TrackingFrame>) {
        self.canvas.clear(BG_COLOR);

        // ── Hand panel ────────────────────────────────────────────────────
        self.canvas.fill_rect(0, 0, HAND_W, STATUS_Y, PANEL_BG);
        self.canvas.text("HAND", HAND_X, 14, 0xFFAADDFF);
        match frame.and_then(|f| f.first_hand()) {
            Some(hand) => self.draw_hand(hand),
            None => {
                self.canvas.text("no hand", HAND_X + HAND_BOX / 2 - 14, HAND_Y + HAND_BOX / 2, 0xFF888888);
            }
        }
        let label = session.last_outcome().label.map(|l| l.as_str()).unwrap_or("-");
        self.canvas.text(&format!("label: {}", label), HAND_X, HAND_Y + HAND_BOX + 16, 0xFFFFD700);

        // ── Sequence progress ─────────────────────────────────────────────
        self.canvas.text("SEQUENCES", SEQ_X, 14, 0xFFAADDFF);
        let pipeline = session.pipeline();
        let now = pipeline.instant_at(session.last_t_ms());
        let rows: Vec<_> = pipeline
            .sequencer()
            .definitions()
            .zip(pipeline.sequencer().progress())
            .map(|(def, p)| (def.clone(), p))
            .collect();

        let mut y = SEQ_Y;
        for (def, progress) in &rows {
            self.canvas.text(&progress.command, SEQ_X, y, 0xFFEEEEEE);
            for (i, step) in def.sequence.iter().enumerate() {
                let x = SEQ_X + i * (STEP_W + 4);
                let color = if i < progress.matched { STEP_DONE } else { STEP_TODO };
                self.canvas.fill_rect(x, y + 10, STEP_W, STEP_H, color);
                self.canvas.text(step.as_str(), x + 2, y + 14, 0xFF000000);
            }
            if let Some(left) = progress.remaining(now) {
                let frac = left.as_secs_f32() / def.timeout().as_secs_f32().max(f32::EPSILON);
                let x = SEQ_X + def.sequence.len() * (STEP_W + 4) + 8;
                self.canvas.outline_rect(x, y + 10, TIMER_W, STEP_H, TIMER_COLOR);
                self.canvas.fill_rect(x, y + 10, (TIMER_W as f32 * frac.clamp(0.0, 1.0)) as usize, STEP_H, TIMER_COLOR);
            }
            y += ROW_H;
            if y + ROW_H > STATUS_Y { break; }
        }

        // ── Recent commands ───────────────────────────────────────────────
        let mut cy = y + 10;
        for record in session.commands_fired().iter().rev().take(5) {
            if cy + 10 > STATUS_Y { break; }
            self.canvas.text(&format!("{} ms  {}", record.t_ms, record.command), SEQ_X, cy, 0xFF7DCEA0);
            cy += 10;
        }

        // ── Status bar ────────────────────────────────────────────────────
        self.canvas.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, TEXT_BG);
        self.canvas.text(&session.status, 10, STATUS_Y + 8, 0xFFEEEEEE);
        self.canvas.text(
            "1=palm  2=fist  3=point  4=victory  0=neutral  H=hide  R=reset  Q=quit",
            10, WIN_H - 14, 0xFF888888,
        );

        self.window.update_with_buffer(self.canvas.pixels(), WIN_W, WIN_H).ok();
    }

    // ── Hand skeleton ─────────────────────────────────────────────────────

    /// Skeleton of the tracked hand, centred in the hand panel.
    fn draw_hand(&mut self, hand: &[Option<Landmark>]) {
        let present: Vec<Landmark> = hand.iter().flatten().copied().collect();
        let Some(bbox) = BoundingBox::of(&present) else { return };
        let (cx, cy) = bbox.center();
        let to_px = |p: &Landmark| {
            let x = HAND_X as f32 + (p.x - cx + 0.5).clamp(0.0, 1.0) * HAND_BOX as f32;
            let y = HAND_Y as f32 + (p.y - cy + 0.5).clamp(0.0, 1.0) * HAND_BOX as f32;
            (x as usize, y as usize)
        };
        let point = |id: HandLandmark| hand.get(id.index()).copied().flatten();

        for finger in Finger::ALL {
            let mut prev = point(HandLandmark::Wrist);
            for joint in finger.joints() {
                let cur = point(joint);
                if let (Some(a), Some(b)) = (prev, cur) {
                    let ((x0, y0), (x1, y1)) = (to_px(&a), to_px(&b));
                    self.canvas.line((x0, y0), (x1, y1), BONE_COLOR);
                    self.canvas.line((x0 + 1, y0), (x1 + 1, y1), BONE_COLOR);
                }
                prev = cur;
            }
        }
        for &p in &present {
            let (x, y) = to_px(&p);
            self.canvas.fill_rect(x.saturating_sub(2), y.saturating_sub(2), 5, 5, JOINT_COLOR);
        }
    }
}
