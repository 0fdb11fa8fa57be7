//! Single-slot handoff between the interaction surface and a blocked caller.
//!
//! The first `resolve` wins; later ones are discarded. `wait` blocks until a
//! value arrives or the deadline passes, and closes the bridge either way, so
//! a resolve racing with expiry has no observable effect.

use std::time::Instant;

use parking_lot::{Condvar, Mutex};

/// Result of [`Bridge::wait`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// A value was written before the deadline.
    Resolved(T),
    /// The deadline passed first.
    Expired,
}

enum Slot<T> {
    Open,
    Filled(T),
    Closed,
}

/// First-writer-wins rendezvous with a bounded wait.
pub struct Bridge<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Bridge<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Open),
            ready: Condvar::new(),
        }
    }

    /// Write the terminal value. Returns `false` if a value was already
    /// written or the waiter has already returned.
    pub fn resolve(&self, value: T) -> bool {
        let mut slot = self.slot.lock();
        if !matches!(*slot, Slot::Open) {
            return false;
        }
        *slot = Slot::Filled(value);
        self.ready.notify_all();
        true
    }

    /// Whether a `resolve` would still be accepted.
    pub fn is_open(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Open)
    }

    /// Close without waiting, discarding any written value.
    pub fn close(&self) {
        *self.slot.lock() = Slot::Closed;
    }

    /// Block until resolved or `deadline` passes. Closes the bridge.
    ///
    /// Only one waiter is supported; a second call returns `Expired`.
    pub fn wait(&self, deadline: Instant) -> WaitOutcome<T> {
        let mut slot = self.slot.lock();
        while matches!(*slot, Slot::Open) {
            if self.ready.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }
        match std::mem::replace(&mut *slot, Slot::Closed) {
            Slot::Filled(value) => WaitOutcome::Resolved(value),
            Slot::Open | Slot::Closed => WaitOutcome::Expired,
        }
    }
}

impl<T> Default for Bridge<T> {
    fn default() -> Self {
        Self::new()
    }
}
