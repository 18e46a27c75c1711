//! Behavioral constants for the layout and navigation engine.
//!
//! [`ViewerConfig::default`] is the canonical tuning; hosts override individual fields (usually
//! from command-line flags) and call [`ViewerConfig::validate`] before building a session.

use crate::error::PagemarkError;
use crate::error::PagemarkResult;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Strictly increasing widths (px); a width *above* `column_thresholds[i]` gets `i + 2`
    /// columns.
    pub column_thresholds: [f64; 3],
    /// Widths at or above this are [`crate::classify::DeviceClass::Wide`].
    pub wide_breakpoint: f64,
    /// Minimum distance (px) between the split divider and either window edge.
    pub drag_margin: f64,
    /// Quiet period before the smooth settle runs.
    pub settle_delay: Duration,
    /// Length of the smooth settle tween itself.
    pub settle_duration: Duration,
    pub toast_message: String,
    pub toast_duration: Duration,
    /// Maximum press duration of a two-finger tap.
    pub tap_window: Duration,
    /// Pixel width of one terminal cell, used by cell-based hosts.
    pub cell_width_px: f64,
    /// Horizontal padding of the output surface, per side, in cells.
    pub output_padding_cells: u16,
    /// Gap between output columns, in cells.
    pub column_gap_cells: u16,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            column_thresholds: [700.0, 1100.0, 1500.0],
            wide_breakpoint: 768.0,
            drag_margin: 100.0,
            settle_delay: Duration::from_millis(150),
            settle_duration: Duration::from_millis(200),
            toast_message: "boundary reached".to_string(),
            toast_duration: Duration::from_millis(2500),
            tap_window: Duration::from_millis(300),
            cell_width_px: 10.0,
            output_padding_cells: 1,
            column_gap_cells: 3,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> PagemarkResult<()> {
        let [a, b, c] = self.column_thresholds;
        if !(a >= 0.0 && a < b && b < c) {
            return Err(PagemarkError::invalid_config(format!(
                "column thresholds must be non-negative and strictly increasing, got {a}, {b}, {c}"
            )));
        }
        if !(self.wide_breakpoint > 0.0) {
            return Err(PagemarkError::invalid_config(
                "wide breakpoint must be positive",
            ));
        }
        if !(self.drag_margin >= 0.0) {
            return Err(PagemarkError::invalid_config(
                "drag margin must not be negative",
            ));
        }
        if !(self.cell_width_px > 0.0) {
            return Err(PagemarkError::invalid_config(
                "cell width must be positive",
            ));
        }
        if self.settle_delay.is_zero() || self.toast_duration.is_zero() || self.tap_window.is_zero()
        {
            return Err(PagemarkError::invalid_config(
                "settle delay, toast duration and tap window must be non-zero",
            ));
        }
        Ok(())
    }

    pub fn cells_to_px(&self, cells: u16) -> f64 {
        cells as f64 * self.cell_width_px
    }

    /// Nearest cell for a pixel offset.
    pub fn px_to_cells(&self, px: f64) -> u32 {
        (px / self.cell_width_px).round().max(0.0) as u32
    }
}
