//! Fan-out of per-frame labels to every sequence FSM.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Instant;

use hand_pose::GestureLabel;
use tracing::{debug, warn};

use crate::bus::{CommandBus, CommandEvent, SubscriptionId};
use crate::definition::GestureSequenceDefinition;
use crate::fsm::{CommandCallback, GestureSequenceFsm, SequenceProgress, Step};
use crate::DispatchError;

/// Owns one [`GestureSequenceFsm`] per valid definition and publishes their
/// completions on a shared [`CommandBus`].
///
/// Call [`emit_gesture`](Self::emit_gesture) exactly once per frame with
/// that frame's classifier output, and [`poll_timeouts`](Self::poll_timeouts)
/// whenever the host loop ticks without a frame.
pub struct GestureSequencer {
    fsms: Vec<GestureSequenceFsm>,
    bus:  Arc<CommandBus>,
}

impl std::fmt::Debug for GestureSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureSequencer")
            .field("fsms", &self.fsms)
            .field("bus", &self.bus)
            .finish()
    }
}

impl GestureSequencer {
    /// Build with a private bus.  Invalid definitions are logged and skipped.
    pub fn new(definitions: impl IntoIterator<Item = GestureSequenceDefinition>) -> Self {
        Self::with_bus(definitions, Arc::new(CommandBus::new()))
    }

    /// Build on an existing bus, e.g. one shared with a UI thread.
    pub fn with_bus(
        definitions: impl IntoIterator<Item = GestureSequenceDefinition>,
        bus: Arc<CommandBus>,
    ) -> Self {
        let mut fsms = Vec::new();
        for def in definitions {
            let command = def.command.clone();
            let sink = Arc::clone(&bus);
            let callback: CommandCallback = Box::new(move |event: &CommandEvent| {
                sink.publish(event);
                Ok(())
            });
            match GestureSequenceFsm::new(def, callback) {
                Ok(fsm) => {
                    debug!(command = %command, sequence = %fsm.definition().describe(), "sequence registered");
                    fsms.push(fsm);
                }
                Err(e) => warn!(command = %command, error = %e, "skipping invalid gesture sequence"),
            }
        }
        GestureSequencer { fsms, bus }
    }

    pub fn bus(&self) -> &Arc<CommandBus> { &self.bus }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&CommandEvent) -> Result<(), DispatchError> + Send + 'static,
    {
        self.bus.subscribe(callback)
    }

    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<CommandEvent>) {
        self.bus.subscribe_channel()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// [`emit_gesture_at`](Self::emit_gesture_at) with the current time.
    pub fn emit_gesture(&mut self, label: Option<GestureLabel>) -> usize {
        self.emit_gesture_at(label, Instant::now())
    }

    /// Forward `label` to every FSM, in definition order.  Returns how many
    /// sequences completed on this frame.
    pub fn emit_gesture_at(&mut self, label: Option<GestureLabel>, now: Instant) -> usize {
        self.fsms
            .iter_mut()
            .map(|fsm| fsm.process_gesture(label, now))
            .filter(|step| *step == Step::Completed)
            .count()
    }

    /// Expire every FSM whose deadline is at or before `now`.  Returns the
    /// number that were reset.
    pub fn poll_timeouts(&mut self, now: Instant) -> usize {
        self.fsms
            .iter_mut()
            .map(|fsm| fsm.poll_timeout(now))
            .filter(|expired| *expired)
            .count()
    }

    /// Put every FSM back to idle and drop all pending deadlines.
    pub fn reset_all_fsms(&mut self) {
        debug!("resetting all gesture sequences");
        for fsm in &mut self.fsms {
            fsm.reset();
        }
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> + '_ {
        self.fsms.iter().map(|f| f.command())
    }

    pub fn definitions(&self) -> impl Iterator<Item = &GestureSequenceDefinition> + '_ {
        self.fsms.iter().map(|f| f.definition())
    }

    pub fn progress(&self) -> Vec<SequenceProgress> {
        self.fsms.iter().map(|f| f.progress()).collect()
    }

    pub fn len(&self) -> usize { self.fsms.len() }

    pub fn is_empty(&self) -> bool { self.fsms.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
