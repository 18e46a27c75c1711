//! Transient boundary notice with a timed expiry.

use crate::schedule::Deferred;
use std::time::Duration;
use std::time::Instant;

/// At most one transient message; showing a new one restarts the expiry.
#[derive(Clone, Debug)]
pub struct Toast {
    message: Option<String>,
    expiry: Deferred<()>,
    duration: Duration,
    shown: u64,
}

impl Toast {
    pub fn new(duration: Duration) -> Self {
        Self {
            message: None,
            expiry: Deferred::new(),
            duration,
            shown: 0,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some(message.into());
        self.expiry.schedule(now, self.duration, ());
        self.shown += 1;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Total number of `show` calls.
    pub fn shown(&self) -> u64 {
        self.shown
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.expiry.deadline()
    }

    /// Clears the message once expired; returns `true` when it was cleared by this call.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.expiry.poll(now).is_some() {
            self.message = None;
            return true;
        }
        false
    }
}
