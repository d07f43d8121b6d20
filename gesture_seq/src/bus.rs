//! In-process command bus.
//!
//! Completed sequences are announced here instead of being wired to any
//! consumer directly.  Consumers either register a callback or take a
//! channel receiver; both can be removed with the returned
//! [`SubscriptionId`].
//!
//! A subscriber that returns an error or panics is logged and skipped; the
//! remaining subscribers still receive the event.  Channel subscribers whose
//! receiver has been dropped are pruned on the next publish.
//!
//! Subscribers run with the list unlocked, so they may subscribe or
//! unsubscribe (themselves included).  One added during a publish first sees
//! the next event.  Publishes are serialized; a subscriber must not publish.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};

use hand_pose::GestureLabel;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{trace, warn};

use crate::DispatchError;

// ════════════════════════════════════════════════════════════════════════════
// CommandEvent
// ════════════════════════════════════════════════════════════════════════════

/// Published once per completed sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandEvent {
    pub command:  String,
    /// The gesture sequence that produced the command.
    pub sequence: Vec<GestureLabel>,
}

// ════════════════════════════════════════════════════════════════════════════
// CommandBus
// ════════════════════════════════════════════════════════════════════════════

/// Handle returned by [`CommandBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&CommandEvent) -> Result<(), DispatchError> + Send>;

struct BusInner {
    next_id:     u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    /// Taken out of `subscribers` by the publish in progress.
    in_flight:   Vec<SubscriptionId>,
    /// In-flight ids unsubscribed before that publish finished.
    cancelled:   Vec<SubscriptionId>,
}

/// Observer list for [`CommandEvent`]s.  Share it with `Arc`.
pub struct CommandBus {
    inner:    Mutex<BusInner>,
    dispatch: Mutex<()>,
}

impl Default for CommandBus {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for CommandBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl CommandBus {
    pub fn new() -> Self {
        CommandBus {
            inner: Mutex::new(BusInner {
                next_id:     0,
                subscribers: Vec::new(),
                in_flight:   Vec::new(),
                cancelled:   Vec::new(),
            }),
            dispatch: Mutex::new(()),
        }
    }

    /// Register a callback for every future event.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&CommandEvent) -> Result<(), DispatchError> + Send + 'static,
    {
        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Register a channel; events are cloned into it.
    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<CommandEvent>) {
        let (tx, rx) = mpsc::channel();
        let id = self.subscribe(move |event: &CommandEvent| {
            tx.send(event.clone()).map_err(|_| DispatchError::Disconnected)
        });
        (id, rx)
    }

    /// Remove a subscriber.  Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.subscribers.iter().position(|(sid, _)| *sid == id) {
            inner.subscribers.remove(pos);
            return true;
        }
        if let Some(pos) = inner.in_flight.iter().position(|sid| *sid == id) {
            inner.in_flight.swap_remove(pos);
            inner.cancelled.push(id);
            return true;
        }
        false
    }

    pub fn subscriber_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.subscribers.len() + inner.in_flight.len()
    }

    /// Deliver `event` to every subscriber.  Returns how many accepted it.
    pub fn publish(&self, event: &CommandEvent) -> usize {
        let _dispatch = self.dispatch.lock();
        let mut taken = {
            let mut inner = self.inner.lock();
            let taken = std::mem::take(&mut inner.subscribers);
            inner.in_flight = taken.iter().map(|(id, _)| *id).collect();
            taken
        };
        let mut delivered = 0;
        let mut dropped = Vec::new();

        for (id, subscriber) in taken.iter_mut() {
            match panic::catch_unwind(AssertUnwindSafe(|| subscriber(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(DispatchError::Disconnected)) => {
                    trace!(?id, "pruning disconnected subscriber");
                    dropped.push(*id);
                }
                Ok(Err(e)) => {
                    warn!(command = %event.command, ?id, error = %e, "command subscriber failed");
                }
                Err(payload) => {
                    warn!(
                        command = %event.command, ?id,
                        panic = panic_message(payload.as_ref()),
                        "command subscriber panicked"
                    );
                }
            }
        }

        let mut inner = self.inner.lock();
        let cancelled = std::mem::take(&mut inner.cancelled);
        inner.in_flight.clear();
        taken.retain(|(id, _)| !dropped.contains(id) && !cancelled.contains(id));
        let added = std::mem::replace(&mut inner.subscribers, taken);
        inner.subscribers.extend(added);
        delivered
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn event(cmd: &str) -> CommandEvent {
        CommandEvent { command: cmd.to_string(), sequence: vec![GestureLabel::Fist] }
    }

    #[test]
    fn callback_receives_events() {
        let bus = CommandBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(move |e: &CommandEvent| {
            sink.lock().push(e.command.clone());
            Ok(())
        });
        assert_eq!(bus.publish(&event("A")), 1);
        assert_eq!(bus.publish(&event("B")), 1);
        assert_eq!(*seen.lock(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn channel_subscription() {
        let bus = CommandBus::new();
        let (_id, rx) = bus.subscribe_channel();
        bus.publish(&event("CREATE_CUBE"));
        assert_eq!(rx.try_recv().unwrap().command, "CREATE_CUBE");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = CommandBus::new();
        let (id, rx) = bus.subscribe_channel();
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.publish(&event("A")), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_pruned() {
        let bus = CommandBus::new();
        let (_id, rx) = bus.subscribe_channel();
        drop(rx);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.publish(&event("A")), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn failing_subscriber_does_not_block_others() {
        let bus = CommandBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        bus.subscribe(|_: &CommandEvent| Err(DispatchError::Handler("boom".into())));
        bus.subscribe(|_: &CommandEvent| -> Result<(), DispatchError> { panic!("handler panic") });
        let h = Arc::clone(&hits);
        bus.subscribe(move |_: &CommandEvent| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(bus.publish(&event("A")), 1);
        assert_eq!(bus.publish(&event("B")), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        // Failing subscribers are kept; only disconnected channels are pruned.
        assert_eq!(bus.subscriber_count(), 3);
    }

    // ── changes during delivery ───────────────────────────────────────────

    #[test]
    fn subscriber_can_unsubscribe_itself() {
        let bus = Arc::new(CommandBus::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None::<SubscriptionId>));

        let (b, h, slot) = (Arc::clone(&bus), Arc::clone(&hits), Arc::clone(&own_id));
        let id = bus.subscribe(move |_: &CommandEvent| {
            h.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot.lock() {
                assert!(b.unsubscribe(id));
            }
            Ok(())
        });
        *own_id.lock() = Some(id);
        let (_id, rx) = bus.subscribe_channel();

        assert_eq!(bus.publish(&event("A")), 2);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.publish(&event("B")), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(rx.try_iter().count(), 2);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn subscriber_added_during_publish_sees_next_event() {
        let bus = Arc::new(CommandBus::new());
        let late = Arc::new(AtomicUsize::new(0));

        let (b, l) = (Arc::clone(&bus), Arc::clone(&late));
        let mut armed = false;
        bus.subscribe(move |_: &CommandEvent| {
            if !armed {
                armed = true;
                let l = Arc::clone(&l);
                b.subscribe(move |_: &CommandEvent| {
                    l.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            }
            Ok(())
        });

        assert_eq!(bus.publish(&event("A")), 1);
        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(late.load(Ordering::SeqCst), 0);
        assert_eq!(bus.publish(&event("B")), 2);
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panic_message_extracts_text() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("oops"));
        assert_eq!(panic_message(payload.as_ref()), "oops");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
