//! Split between the source panel and the output panel.

use crate::classify::DeviceClass;
use crate::classify::device_class;
use crate::config::ViewerConfig;

/// Resolved panel widths in pixels; always sums to the window width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelGeometry {
    pub source: f64,
    pub divider: f64,
    pub output: f64,
}

#[derive(Clone, Debug)]
pub struct PanelLayout {
    window_width: f64,
    device: DeviceClass,
    source_visible: bool,
    /// Last width chosen by dragging; `None` means "half the window".
    split: Option<f64>,
    dragging: bool,
    config: ViewerConfig,
}

impl PanelLayout {
    pub fn new(window_width: f64, config: &ViewerConfig) -> Self {
        let device = device_class(window_width, config);
        Self {
            window_width,
            device,
            source_visible: device.default_source_visible(),
            split: None,
            dragging: false,
            config: config.clone(),
        }
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn window_width(&self) -> f64 {
        self.window_width
    }

    pub fn source_visible(&self) -> bool {
        self.source_visible
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn stored_split(&self) -> Option<f64> {
        self.split
    }

    /// Records a new window width. Returns the new class only on an actual class transition,
    /// which is also the only time visibility and split are reset.
    pub fn observe_window(&mut self, width: f64) -> Option<DeviceClass> {
        self.window_width = width;
        let next = device_class(width, &self.config);
        if next == self.device {
            return None;
        }
        tracing::debug!(from = ?self.device, to = ?next, width, "device class transition");
        self.device = next;
        self.source_visible = next.default_source_visible();
        self.split = None;
        self.dragging = false;
        Some(next)
    }

    pub fn toggle_source(&mut self) -> bool {
        self.source_visible = !self.source_visible;
        if !self.source_visible {
            self.dragging = false;
        }
        self.source_visible
    }

    /// Drags only start on a wide window with the source panel showing.
    pub fn begin_drag(&mut self) -> bool {
        self.dragging = self.device == DeviceClass::Wide && self.source_visible;
        self.dragging
    }

    /// Moves the split to the pointer, kept `drag_margin` away from both window edges.
    pub fn drag_to(&mut self, pointer_x: f64) -> Option<f64> {
        if !self.dragging {
            return None;
        }
        let split = self.clamp_split(pointer_x);
        self.split = Some(split);
        Some(split)
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Source panel width when shown on a wide window.
    pub fn split_width(&self) -> f64 {
        let split = self.split.unwrap_or(self.window_width / 2.0);
        self.clamp_split(split)
    }

    pub fn resolve(&self, divider_width: f64) -> PanelGeometry {
        let width = self.window_width.max(0.0);
        match (self.device, self.source_visible) {
            (DeviceClass::Wide, true) => {
                let divider = divider_width.min(width);
                let source = self.split_width().min(width - divider);
                PanelGeometry {
                    source,
                    divider,
                    output: (width - source - divider).max(0.0),
                }
            }
            (DeviceClass::Narrow, true) => PanelGeometry {
                source: width,
                divider: 0.0,
                output: 0.0,
            },
            (_, false) => PanelGeometry {
                source: 0.0,
                divider: 0.0,
                output: width,
            },
        }
    }

    fn clamp_split(&self, x: f64) -> f64 {
        let lo = self.config.drag_margin;
        let hi = self.window_width - self.config.drag_margin;
        if hi < lo {
            return self.window_width / 2.0;
        }
        x.clamp(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(width: f64) -> PanelLayout {
        PanelLayout::new(width, &ViewerConfig::default())
    }

    #[test]
    fn defaults_follow_device_class() {
        assert!(layout(1200.0).source_visible());
        assert!(!layout(600.0).source_visible());
    }

    #[test]
    fn wide_split_defaults_to_half() {
        let p = layout(1200.0);
        assert_eq!(
            p.resolve(10.0),
            PanelGeometry {
                source: 600.0,
                divider: 10.0,
                output: 590.0
            }
        );
    }

    #[test]
    fn drag_is_clamped_to_margins_and_persisted() {
        let mut p = layout(1200.0);
        assert!(p.begin_drag());
        assert_eq!(p.drag_to(40.0), Some(100.0));
        assert_eq!(p.drag_to(1190.0), Some(1100.0));
        assert_eq!(p.drag_to(300.0), Some(300.0));
        p.end_drag();
        assert_eq!(p.drag_to(500.0), None);
        assert_eq!(p.split_width(), 300.0);

        // split survives a hide/show round trip and same-class resizes
        p.toggle_source();
        assert_eq!(p.resolve(10.0).source, 0.0);
        p.toggle_source();
        assert_eq!(p.observe_window(1000.0), None);
        assert_eq!(p.resolve(10.0).source, 300.0);
    }

    #[test]
    fn drag_requires_visible_wide_source() {
        let mut p = layout(1200.0);
        p.toggle_source();
        assert!(!p.begin_drag());
        let mut p = layout(600.0);
        p.toggle_source();
        assert!(!p.begin_drag());
    }

    #[test]
    fn class_transition_resets_once() {
        let mut p = layout(1200.0);
        p.begin_drag();
        p.drag_to(300.0);
        p.end_drag();
        p.toggle_source();
        assert!(!p.source_visible());

        // same-class resize keeps the user's toggle
        assert_eq!(p.observe_window(900.0), None);
        assert!(!p.source_visible());

        assert_eq!(p.observe_window(700.0), Some(DeviceClass::Narrow));
        assert!(!p.source_visible());
        p.toggle_source();
        assert_eq!(p.observe_window(650.0), None);
        assert!(p.source_visible());

        assert_eq!(p.observe_window(1400.0), Some(DeviceClass::Wide));
        assert!(p.source_visible());
        assert_eq!(p.stored_split(), None);
        assert_eq!(p.split_width(), 700.0);
    }

    #[test]
    fn transitions_agree_with_classifier_at_custom_breakpoint() {
        let config = ViewerConfig {
            wide_breakpoint: 1000.0,
            ..ViewerConfig::default()
        };
        let mut p = PanelLayout::new(1200.0, &config);
        assert_eq!(p.observe_window(999.0), Some(device_class(999.0, &config)));
        assert_eq!(p.device(), DeviceClass::Narrow);
        assert_eq!(p.observe_window(1000.0), Some(DeviceClass::Wide));
        assert_eq!(p.observe_window(768.0), Some(DeviceClass::Narrow));
    }

    #[test]
    fn narrow_visible_source_takes_the_whole_window() {
        let mut p = layout(600.0);
        p.toggle_source();
        assert_eq!(
            p.resolve(10.0),
            PanelGeometry {
                source: 600.0,
                divider: 0.0,
                output: 0.0
            }
        );
    }

    #[test]
    fn stored_split_is_clamped_after_shrinking() {
        let mut p = layout(1600.0);
        p.begin_drag();
        p.drag_to(1400.0);
        p.end_drag();
        p.observe_window(900.0);
        assert_eq!(p.split_width(), 800.0);
    }
}
