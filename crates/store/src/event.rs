//! One-shot event payloads carried inside state snapshots.

use std::fmt;
use std::sync::{Arc, Mutex};

/// A single-slot, consume-once payload carrier.
///
/// Persistent state survives re-renders; a toast or a one-time navigation
/// trigger must not. Mutators embed an `EventBox` in the snapshot they
/// produce, and the rendering layer drains it with [`read`](Self::read) or
/// [`handle`](Self::handle) once per received snapshot.
///
/// Clones share the slot. Snapshots are cloned on every `current()` call and
/// every publication, so consumption has to be an observation on the shared
/// slot rather than a field of any one copy — otherwise draining would
/// require a follow-up store mutation just to mark the event seen.
///
/// The take happens under a lock, so concurrent readers of the same snapshot
/// get exactly-once delivery: one of them receives the payload, the rest see
/// an empty box.
pub struct EventBox<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> EventBox<T> {
    /// A box holding `payload`, not yet consumed.
    pub fn new(payload: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(payload))),
        }
    }

    /// A box with nothing to deliver. Useful as the initial-state value of
    /// an event field.
    pub fn empty() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Takes the payload if it has not been consumed yet.
    ///
    /// The first call on any clone of the box returns the payload; every
    /// later call returns `None` until a mutator installs a fresh box.
    pub fn read(&self) -> Option<T> {
        match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Runs `action` on the payload if one is still pending. Sugar over
    /// [`read`](Self::read) for the common drain-and-render call site.
    pub fn handle(&self, action: impl FnOnce(T)) {
        if let Some(payload) = self.read() {
            action(payload);
        }
    }
}

impl<T> Clone for EventBox<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for EventBox<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for EventBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = match self.slot.lock() {
            Ok(slot) => slot.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        };
        f.debug_struct("EventBox").field("pending", &pending).finish()
    }
}
