//! Single-slot cancellable deferred tasks.
//!
//! The engine never queues timers. Each kind of deferred work (settle animation, toast expiry)
//! owns one [`Deferred`] slot, and scheduling into an occupied slot replaces the pending task.
//! Hosts drive the slots by calling `poll` with the current time, typically from the event loop
//! right after waiting up to [`Deferred::deadline`].

use std::time::Duration;
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct Deferred<T> {
    pending: Option<(Instant, T)>,
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Deferred<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the slot to fire `delay` after `now`, cancelling any pending task.
    ///
    /// Returns `true` when a previous task was displaced.
    pub fn schedule(&mut self, now: Instant, delay: Duration, payload: T) -> bool {
        let displaced = self.pending.is_some();
        self.pending = Some((now + delay, payload));
        displaced
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, payload)| payload)
    }

    /// Takes the payload if its deadline has been reached.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((at, _)) if now >= *at => self.pending.take().map(|(_, payload)| payload),
            _ => None,
        }
    }
}

/// Earliest of several optional deadlines.
pub fn earliest(deadlines: impl IntoIterator<Item = Option<Instant>>) -> Option<Instant> {
    deadlines.into_iter().flatten().min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_at_deadline() {
        let t0 = Instant::now();
        let mut d = Deferred::new();
        d.schedule(t0, Duration::from_millis(150), 7u32);
        assert_eq!(d.poll(t0 + Duration::from_millis(149)), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(150)), Some(7));
        assert_eq!(d.poll(t0 + Duration::from_millis(500)), None);
        assert!(!d.is_pending());
    }

    #[test]
    fn rescheduling_replaces_and_pushes_deadline_out() {
        let t0 = Instant::now();
        let mut d = Deferred::new();
        assert!(!d.schedule(t0, Duration::from_millis(150), 1u32));
        let t1 = t0 + Duration::from_millis(100);
        assert!(d.schedule(t1, Duration::from_millis(150), 2u32));
        assert_eq!(d.poll(t0 + Duration::from_millis(200)), None);
        assert_eq!(d.poll(t1 + Duration::from_millis(150)), Some(2));
    }

    #[test]
    fn cancel_clears_pending() {
        let t0 = Instant::now();
        let mut d = Deferred::new();
        d.schedule(t0, Duration::from_millis(10), "x");
        assert_eq!(d.cancel(), Some("x"));
        assert_eq!(d.deadline(), None);
        assert_eq!(d.poll(t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn earliest_ignores_empty_slots() {
        let t0 = Instant::now();
        let later = t0 + Duration::from_millis(5);
        assert_eq!(earliest([None, Some(later), Some(t0)]), Some(t0));
        assert_eq!(earliest([None::<Instant>, None]), None);
    }
}
