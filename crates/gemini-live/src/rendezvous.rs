//! Single-slot handoff between the socket reader and the caller waiting on a turn.
//!
//! The caller arms the slot before writing a request, then waits. The reader task
//! pushes response fragments as they arrive and signals the slot; the first signal
//! after an arm releases the waiter. The slot starts out released, so a wait before
//! the first arm returns at once.

use std::time::Duration;
use tokio::sync::watch;

/// How a wait on the slot ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// At least one signal was observed since the most recent arm.
    Signaled,
    /// The timeout elapsed while the slot was still armed.
    TimedOut,
    /// The channel feeding the slot went away while it was armed.
    Closed,
}

#[derive(Debug)]
struct Slot<T> {
    turn: u64,
    armed: bool,
    closed: bool,
    fragments: Vec<T>,
}

/// A reusable single-slot rendezvous carrying the fragments of the current turn.
///
/// `push`, `signal` and `deliver` never block, so the delivery path can call them
/// from inside its receive loop.
#[derive(Debug)]
pub struct Rendezvous<T> {
    slot: watch::Sender<Slot<T>>,
}

impl<T> Default for Rendezvous<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Rendezvous<T> {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(Slot {
            turn: 0,
            armed: false,
            closed: false,
            fragments: Vec::new(),
        });
        Self { slot }
    }

    /// Starts a new turn: drops fragments left over from the previous one and
    /// blocks the next `wait` until a fresh signal. Returns the turn number.
    pub fn arm(&self) -> u64 {
        let mut turn = 0;
        self.slot.send_modify(|slot| {
            slot.turn += 1;
            slot.armed = true;
            slot.fragments.clear();
            turn = slot.turn;
        });
        turn
    }

    /// Adds a fragment to the current turn without releasing the waiter.
    pub fn push(&self, fragment: T) {
        self.slot.send_if_modified(|slot| {
            slot.fragments.push(fragment);
            false
        });
    }

    /// Releases the waiter. Only the first signal after an arm changes state.
    pub fn signal(&self) {
        self.slot.send_if_modified(|slot| {
            if slot.armed {
                slot.armed = false;
                true
            } else {
                false
            }
        });
    }

    /// `push` followed by `signal` as one update.
    pub fn deliver(&self, fragment: T) {
        self.slot.send_if_modified(|slot| {
            slot.fragments.push(fragment);
            if slot.armed {
                slot.armed = false;
                true
            } else {
                false
            }
        });
    }

    /// Marks the feeding channel as gone and wakes any waiter.
    pub fn close(&self) {
        self.slot.send_if_modified(|slot| {
            if slot.closed {
                false
            } else {
                slot.closed = true;
                true
            }
        });
    }

    /// Waits until the slot is signaled, closed, or `timeout` elapses.
    ///
    /// The slot is not reset by waiting; only `arm` does that.
    pub async fn wait(&self, timeout: Duration) -> WaitOutcome {
        let mut rx = self.slot.subscribe();
        let released = rx.wait_for(|slot| !slot.armed || slot.closed);
        match tokio::time::timeout(timeout, released).await {
            Ok(Ok(slot)) if !slot.armed => WaitOutcome::Signaled,
            Ok(_) => WaitOutcome::Closed,
            Err(_) => WaitOutcome::TimedOut,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot.borrow().armed
    }

    pub fn is_closed(&self) -> bool {
        self.slot.borrow().closed
    }

    pub fn turn(&self) -> u64 {
        self.slot.borrow().turn
    }

    /// Removes and returns the fragments gathered so far.
    pub fn take_fragments(&self) -> Vec<T> {
        let mut taken = Vec::new();
        self.slot.send_if_modified(|slot| {
            taken = std::mem::take(&mut slot.fragments);
            false
        });
        taken
    }
}

impl<T: Clone> Rendezvous<T> {
    /// Snapshot of the fragments gathered since the most recent arm.
    pub fn fragments(&self) -> Vec<T> {
        self.slot.borrow().fragments.clone()
    }
}
