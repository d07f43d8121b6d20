//! One finite-state machine per sequence definition.
//!
//! | state                | input `g`                          | result                                  |
//! |----------------------|------------------------------------|-----------------------------------------|
//! | `i`                  | `g == sequence[i]`, `i + 1 < n`    | advance to `i + 1`, re-arm deadline     |
//! | `i`                  | `g == sequence[i]`, `i + 1 == n`   | fire callback, back to idle             |
//! | `i > 0`              | `g == sequence[0]`                 | restart at `1`, re-arm deadline         |
//! | `i > 0`              | anything else (incl. `None`)       | back to idle                            |
//! | `0`                  | anything else (incl. `None`)       | no-op                                   |
//! | deadline passed      | —                                  | back to idle                            |
//!
//! The deadline is owned state, so cancelling it is just clearing it.  A
//! deadline that passed before an input arrives is expired first, and the
//! input is then applied to the idle machine.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use hand_pose::GestureLabel;
use tracing::{debug, info, warn};

use crate::bus::{panic_message, CommandEvent};
use crate::definition::GestureSequenceDefinition;
use crate::DispatchError;

/// Invoked once per completed sequence.
pub type CommandCallback = Box<dyn FnMut(&CommandEvent) -> Result<(), DispatchError> + Send>;

/// What a single input did to the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Still idle.
    Idle,
    /// Matched the next step; now waiting on this index.
    Advanced(usize),
    /// Mismatch that equals the first step: progress restarted at 1.
    Restarted,
    /// Final step matched; callback invoked.
    Completed,
    /// Mismatch mid-sequence; back to idle.
    Reset,
    /// The pending deadline had passed before this input; back to idle.
    TimedOut,
}

/// Snapshot of one machine's progress, for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceProgress {
    pub command:  String,
    pub matched:  usize,
    pub len:      usize,
    pub deadline: Option<Instant>,
}

impl SequenceProgress {
    /// Time left before the pending step expires, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSequenceFsm
// ════════════════════════════════════════════════════════════════════════════

pub struct GestureSequenceFsm {
    definition:    GestureSequenceDefinition,
    callback:      CommandCallback,
    current_index: usize,
    deadline:      Option<Instant>,
}

impl std::fmt::Debug for GestureSequenceFsm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureSequenceFsm")
            .field("definition", &self.definition)
            .field("current_index", &self.current_index)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl GestureSequenceFsm {
    /// Fails with [`crate::Error::InvalidDefinition`] for an empty sequence,
    /// blank command or zero timeout.
    pub fn new(definition: GestureSequenceDefinition, callback: CommandCallback) -> crate::Result<Self> {
        definition.validate()?;
        Ok(GestureSequenceFsm { definition, callback, current_index: 0, deadline: None })
    }

    pub fn definition(&self) -> &GestureSequenceDefinition { &self.definition }

    pub fn command(&self) -> &str { &self.definition.command }

    /// Number of steps matched so far.
    pub fn current_index(&self) -> usize { self.current_index }

    pub fn is_idle(&self) -> bool { self.current_index == 0 }

    pub fn deadline(&self) -> Option<Instant> { self.deadline }

    pub fn progress(&self) -> SequenceProgress {
        SequenceProgress {
            command:  self.definition.command.clone(),
            matched:  self.current_index,
            len:      self.definition.len(),
            deadline: self.deadline,
        }
    }

    /// Feed one frame's label (or `None` for "no recognised gesture").
    pub fn process_gesture(&mut self, label: Option<GestureLabel>, now: Instant) -> Step {
        let timed_out = self.poll_timeout(now);
        let i = self.current_index;
        let expected = self.definition.sequence[i];
        let first = self.definition.sequence[0];

        match label {
            Some(g) if g == expected => {
                let next = i + 1;
                if next == self.definition.len() {
                    self.fire();
                    self.reset();
                    Step::Completed
                } else {
                    self.current_index = next;
                    self.arm(now);
                    debug!(command = %self.definition.command, step = next, gesture = %g, "sequence advanced");
                    Step::Advanced(next)
                }
            }
            Some(g) if i > 0 && g == first => {
                self.current_index = 1;
                self.arm(now);
                debug!(command = %self.definition.command, gesture = %g, "sequence restarted");
                Step::Restarted
            }
            _ if i > 0 => {
                debug!(command = %self.definition.command, at = i, ?label, "sequence broken");
                self.reset();
                Step::Reset
            }
            _ if timed_out => Step::TimedOut,
            _ => Step::Idle,
        }
    }

    /// Expire the pending step if its deadline is at or before `now`.
    pub fn poll_timeout(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                debug!(
                    command = %self.definition.command,
                    at = self.current_index,
                    "sequence timed out"
                );
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Back to idle, dropping any pending deadline.
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.deadline = None;
    }

    fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.definition.timeout());
    }

    fn fire(&mut self) {
        let event = CommandEvent {
            command:  self.definition.command.clone(),
            sequence: self.definition.sequence.clone(),
        };
        let described = self.definition.describe();
        info!(command = %event.command, sequence = %described, "command triggered");

        let callback = &mut self.callback;
        match panic::catch_unwind(AssertUnwindSafe(|| callback(&event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(
                command = %event.command, sequence = %described, error = %e,
                "command callback failed"
            ),
            Err(payload) => warn!(
                command = %event.command, sequence = %described,
                panic = panic_message(payload.as_ref()),
                "command callback panicked"
            ),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
