//! One-shot readiness gates for pivot columns.
//!
//! Each column of the working matrix gets one [`ReadyGate`]. A gate starts
//! closed and transitions to open exactly once, when the thread that
//! normalizes that column calls [`ReadyGate::release`]. Any thread that needs
//! the column as a pivot source calls [`ReadyGate::wait`], which blocks until
//! the gate is open and is a no-op afterwards.
//!
//! This replaces a global barrier after every elimination step with a
//! pointwise dependency check: threads whose assigned columns do not yet need
//! the next pivot keep working, producing a pipelined (wavefront) schedule.
//!
//! The open flag is the sole cross-thread memory-ordering dependency in the
//! engine: `release` stores it with `Release` after the column data is
//! written, and `wait` loads it with `Acquire` before the column data is
//! read, so a returned `wait` guarantees the normalized values are visible.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

/// A single-use not-ready → ready signal
///
/// Constructed closed. [`release`](Self::release) opens it; once open it can
/// never close again. Unlike a mutex, [`wait`](Self::wait) is a pass-through
/// synchronization point: it does not take ownership of anything and every
/// waiter proceeds once the gate is open.
///
/// # Example
///
/// ```
/// use columna::ReadyGate;
///
/// let gate = ReadyGate::new();
/// assert!(!gate.is_open());
/// gate.release();
/// gate.wait(); // returns immediately
/// assert!(gate.is_open());
/// ```
#[derive(Debug, Default)]
pub struct ReadyGate {
    open: AtomicBool,
    lock: Mutex<()>,
    cond: Condvar,
}

impl ReadyGate {
    /// Creates a closed gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate, waking every current and future waiter
    ///
    /// The protocol calls this exactly once per gate, after the associated
    /// column has been normalized.
    pub fn release(&self) {
        // Publish the flag before touching the mutex so fast-path waiters
        // never block. Taking the lock before notifying closes the window
        // where a waiter has re-checked the flag but not yet parked.
        let was_open = self.open.swap(true, Ordering::Release);
        debug_assert!(!was_open, "ReadyGate released twice");

        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.cond.notify_all();
    }

    /// Blocks until the gate is open; returns immediately if it already is
    pub fn wait(&self) {
        if self.open.load(Ordering::Acquire) {
            return;
        }

        let mut guard = self
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while !self.open.load(Ordering::Acquire) {
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Returns true if the gate has been released
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}
