//! Two-stage scroll animation.
//!
//! Every navigation target is applied to the surface immediately (no animation), then a smooth
//! "settle" to the same target is armed after a quiet period. Arming again before the quiet
//! period elapses replaces the pending settle, so a burst of input produces exactly one
//! animation, towards the last target.

use crate::schedule::Deferred;
use std::time::Duration;
use std::time::Instant;

/// Something that scrolls horizontally to a pixel offset.
pub trait ScrollSurface {
    fn jump_to(&mut self, offset: u32);
    fn smooth_to(&mut self, offset: u32, now: Instant);
}

#[derive(Clone, Debug)]
pub struct ScrollAnimator {
    settle: Deferred<u32>,
    delay: Duration,
}

impl ScrollAnimator {
    pub fn new(delay: Duration) -> Self {
        Self {
            settle: Deferred::new(),
            delay,
        }
    }

    pub fn request<S: ScrollSurface + ?Sized>(&mut self, target: u32, now: Instant, surface: &mut S) {
        surface.jump_to(target);
        if self.settle.schedule(now, self.delay, target) {
            tracing::trace!(target, "settle rescheduled");
        }
    }

    /// Drops any pending settle without touching the surface.
    pub fn cancel(&mut self) {
        self.settle.cancel();
    }

    pub fn pending_target(&self) -> Option<u32> {
        self.settle.peek().copied()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.settle.deadline()
    }

    /// Runs the settle if its quiet period has elapsed; returns the settled offset.
    pub fn poll<S: ScrollSurface + ?Sized>(&mut self, now: Instant, surface: &mut S) -> Option<u32> {
        let target = self.settle.poll(now)?;
        tracing::debug!(target, "settle");
        surface.smooth_to(target, now);
        Some(target)
    }
}

/// Ease-out tween of a scroll offset, advanced once per frame.
#[derive(Clone, Debug)]
pub struct SmoothScroll {
    from: f64,
    to: f64,
    position: f64,
    started: Option<Instant>,
    duration: Duration,
}

impl SmoothScroll {
    pub fn new(duration: Duration) -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            position: 0.0,
            started: None,
            duration,
        }
    }

    /// Moves to `to` instantly, abandoning any tween in flight.
    pub fn jump(&mut self, to: f64) {
        self.from = to;
        self.to = to;
        self.position = to;
        self.started = None;
    }

    pub fn animate_to(&mut self, to: f64, now: Instant) {
        if (to - self.position).abs() < f64::EPSILON {
            self.jump(to);
            return;
        }
        self.from = self.position;
        self.to = to;
        self.started = Some(now);
    }

    pub fn tick(&mut self, now: Instant) -> f64 {
        let Some(started) = self.started else {
            return self.position;
        };
        let elapsed = now.saturating_duration_since(started);
        if self.duration.is_zero() || elapsed >= self.duration {
            self.jump(self.to);
            return self.position;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.position = self.from + (self.to - self.from) * ease_out_cubic(t);
        self.position
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn is_animating(&self) -> bool {
        self.started.is_some()
    }
}

fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        ops: Vec<(&'static str, u32)>,
    }

    impl ScrollSurface for Recorder {
        fn jump_to(&mut self, offset: u32) {
            self.ops.push(("jump", offset));
        }

        fn smooth_to(&mut self, offset: u32, _now: Instant) {
            self.ops.push(("smooth", offset));
        }
    }

    #[test]
    fn jump_happens_before_settle_is_armed() {
        let t0 = Instant::now();
        let mut anim = ScrollAnimator::new(Duration::from_millis(150));
        let mut surface = Recorder::default();
        anim.request(240, t0, &mut surface);
        assert_eq!(surface.ops, vec![("jump", 240)]);
        assert_eq!(anim.pending_target(), Some(240));
        assert_eq!(anim.deadline(), Some(t0 + Duration::from_millis(150)));
    }

    #[test]
    fn rapid_requests_coalesce_into_one_settle() {
        let t0 = Instant::now();
        let mut anim = ScrollAnimator::new(Duration::from_millis(150));
        let mut surface = Recorder::default();
        for (i, target) in [240u32, 480, 720, 960].into_iter().enumerate() {
            let now = t0 + Duration::from_millis(50 * i as u64);
            anim.request(target, now, &mut surface);
            assert_eq!(anim.poll(now, &mut surface), None);
        }
        let quiet = t0 + Duration::from_millis(150 + 150);
        assert_eq!(anim.poll(quiet, &mut surface), Some(960));
        assert_eq!(anim.poll(quiet + Duration::from_secs(1), &mut surface), None);

        let smooth: Vec<_> = surface.ops.iter().filter(|(k, _)| *k == "smooth").collect();
        assert_eq!(smooth, vec![&("smooth", 960)]);
        assert_eq!(surface.ops.iter().filter(|(k, _)| *k == "jump").count(), 4);
    }

    #[test]
    fn cancel_drops_pending_settle() {
        let t0 = Instant::now();
        let mut anim = ScrollAnimator::new(Duration::from_millis(150));
        let mut surface = Recorder::default();
        anim.request(100, t0, &mut surface);
        anim.cancel();
        assert_eq!(anim.poll(t0 + Duration::from_secs(1), &mut surface), None);
    }

    #[test]
    fn tween_eases_out_and_lands_on_target() {
        let t0 = Instant::now();
        let mut s = SmoothScroll::new(Duration::from_millis(200));
        s.jump(0.0);
        s.animate_to(100.0, t0);
        assert!(s.is_animating());
        let mid = s.tick(t0 + Duration::from_millis(100));
        assert!(mid > 50.0 && mid < 100.0, "ease-out is ahead of linear: {mid}");
        assert_eq!(s.tick(t0 + Duration::from_millis(200)), 100.0);
        assert!(!s.is_animating());
    }

    #[test]
    fn animating_to_current_position_is_a_no_op() {
        let t0 = Instant::now();
        let mut s = SmoothScroll::new(Duration::from_millis(200));
        s.jump(42.0);
        s.animate_to(42.0, t0);
        assert!(!s.is_animating());
        assert_eq!(s.position(), 42.0);
    }
}
