use pagemark_core::animate::ScrollSurface;
use pagemark_core::animate::SmoothScroll;
use std::time::Duration;
use std::time::Instant;

/// The horizontally scrolling output panel.
///
/// Holds the scroll offset in pixels; drawing converts it to cells once per frame.
#[derive(Clone, Debug)]
pub struct OutputSurface {
    scroll: SmoothScroll,
}

impl OutputSurface {
    pub fn new(settle_duration: Duration) -> Self {
        Self {
            scroll: SmoothScroll::new(settle_duration),
        }
    }

    /// Advances a running settle. Returns `true` while it is still moving.
    pub fn advance(&mut self, now: Instant) -> bool {
        self.scroll.tick(now);
        self.scroll.is_animating()
    }

    pub fn is_animating(&self) -> bool {
        self.scroll.is_animating()
    }

    pub fn offset_px(&self) -> f64 {
        self.scroll.position()
    }
}

impl ScrollSurface for OutputSurface {
    fn jump_to(&mut self, offset: u32) {
        self.scroll.jump(offset as f64);
    }

    fn smooth_to(&mut self, offset: u32, now: Instant) {
        self.scroll.animate_to(offset as f64, now);
    }
}
