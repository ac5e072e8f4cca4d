/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Readiness gate.
//!
//! A manually reset event: once set, every waiter is released and later
//! waits return immediately until the gate is reset.

use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// Blocking flag meaning "logged on and connected".
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: Mutex<bool>,
    changed: Condvar,
}

impl ReadinessGate {
    /// Creates a cleared gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the gate and wakes every waiter. Returns true if it was clear.
    pub fn set(&self) -> bool {
        let mut ready = self.ready.lock();
        let was_clear = !*ready;
        *ready = true;
        self.changed.notify_all();
        was_clear
    }

    /// Clears the gate. Returns true if it was set.
    pub fn reset(&self) -> bool {
        let mut ready = self.ready.lock();
        std::mem::replace(&mut *ready, false)
    }

    /// Returns whether the gate is set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.ready.lock()
    }

    /// Blocks until the gate is set. There is no timeout.
    pub fn wait(&self) {
        let mut ready = self.ready.lock();
        while !*ready {
            self.changed.wait(&mut ready);
        }
    }

    /// Blocks until the gate is set or `timeout` elapses.
    ///
    /// Returns whether the gate was set. A timeout too large to form a
    /// deadline waits without limit.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut ready = self.ready.lock();
        if *ready {
            return true;
        }
        self.changed.wait_while_for(&mut ready, |ready| !*ready, timeout);
        *ready
    }
}
