//! Snap points: the horizontal scroll offsets at which each page (column) starts.
//!
//! A page is one column stride. The calculator mirrors how a multi-column container lays out
//! overflowing content: columns of equal width separated by a fixed gap, inside a padded
//! surface, scrolled horizontally.

use crate::classify::ColumnCount;
use crate::error::PagemarkError;
use crate::error::PagemarkResult;

/// Measured geometry of the output surface, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceGeometry {
    /// Visible width of the scrolling surface, padding included.
    pub client_width: f64,
    /// Left plus right padding.
    pub padding_x: f64,
    pub column_gap: f64,
    /// Total scrollable width of the laid-out content.
    pub scroll_width: f64,
}

impl SurfaceGeometry {
    pub fn validate(&self) -> PagemarkResult<()> {
        let fields = [
            self.client_width,
            self.padding_x,
            self.column_gap,
            self.scroll_width,
        ];
        if fields.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(PagemarkError::geometry_unavailable(format!(
                "non-finite or negative measurement in {self:?}"
            )));
        }
        if self.client_width == 0.0 {
            return Err(PagemarkError::geometry_unavailable(
                "output surface has no width",
            ));
        }
        Ok(())
    }

    /// Content-box width: what the column classifier sees.
    pub fn content_width(&self) -> f64 {
        (self.client_width - self.padding_x).max(0.0)
    }

    pub fn max_scroll(&self) -> f64 {
        (self.scroll_width - self.client_width).max(0.0)
    }
}

/// Width of one column and the distance between the starts of adjacent columns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnGeometry {
    pub columns: ColumnCount,
    pub column_width: f64,
    pub gap: f64,
    pub stride: f64,
}

impl ColumnGeometry {
    pub fn new(client_width: f64, padding_x: f64, gap: f64, columns: ColumnCount) -> Self {
        let n = columns.get() as f64;
        let usable = (client_width - padding_x).max(0.0);
        let column_width = ((usable - gap * (n - 1.0)) / n).max(0.0);
        Self {
            columns,
            column_width,
            gap,
            stride: column_width + gap,
        }
    }

    pub fn from_surface(geometry: &SurfaceGeometry, columns: ColumnCount) -> Self {
        Self::new(
            geometry.client_width,
            geometry.padding_x,
            geometry.column_gap,
            columns,
        )
    }

    /// Scroll width produced by `content_columns` columns laid out at this geometry.
    pub fn scroll_width_for(&self, content_columns: usize, padding_x: f64) -> f64 {
        if content_columns == 0 {
            return padding_x;
        }
        padding_x + content_columns as f64 * self.stride - self.gap
    }
}

/// Strictly increasing, integer-pixel offsets; always starts at 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapPoints(Vec<u32>);

impl Default for SnapPoints {
    fn default() -> Self {
        Self::single()
    }
}

impl SnapPoints {
    /// No pagination: the only page starts at 0.
    pub fn single() -> Self {
        Self(vec![0])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_paginated(&self) -> bool {
        self.0.len() > 1
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.0.get(index).copied()
    }

    pub fn last(&self) -> u32 {
        self.0.last().copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

/// Derives snap points for `geometry` laid out in `columns` columns.
///
/// Offsets advance by one column stride while below the maximum scroll, then the maximum
/// scroll itself is appended so the last page is always reachable. Offsets are rounded to
/// whole pixels and adjacent duplicates dropped.
pub fn compute(geometry: &SurfaceGeometry, columns: ColumnCount) -> SnapPoints {
    if columns.get() <= 1 || geometry.scroll_width <= geometry.client_width {
        return SnapPoints::single();
    }

    let max_scroll = geometry.max_scroll();
    let stride = ColumnGeometry::from_surface(geometry, columns).stride;

    let mut raw: Vec<f64> = Vec::new();
    if stride >= 1.0 {
        let mut offset = 0.0;
        let mut k = 0u32;
        while offset < max_scroll {
            raw.push(offset);
            k += 1;
            offset = k as f64 * stride;
        }
    } else {
        tracing::debug!(stride, "column stride below one pixel; paging by whole surface");
        raw.push(0.0);
    }
    raw.push(max_scroll);

    let mut points: Vec<u32> = Vec::with_capacity(raw.len());
    for v in raw {
        let px = v.round() as u32;
        if points.last().is_none_or(|&last| px > last) {
            points.push(px);
        }
    }
    SnapPoints(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom(client: f64, padding: f64, gap: f64, scroll: f64) -> SurfaceGeometry {
        SurfaceGeometry {
            client_width: client,
            padding_x: padding,
            column_gap: gap,
            scroll_width: scroll,
        }
    }

    fn assert_well_formed(points: &SnapPoints, max_scroll: u32) {
        let s = points.as_slice();
        assert_eq!(s[0], 0);
        assert_eq!(*s.last().unwrap(), max_scroll);
        assert!(s.windows(2).all(|w| w[0] < w[1]), "not increasing: {s:?}");
    }

    #[test]
    fn content_that_fits_has_a_single_page() {
        let g = geom(1000.0, 80.0, 40.0, 1000.0);
        assert_eq!(compute(&g, ColumnCount::Four), SnapPoints::single());
        let g = geom(1000.0, 80.0, 40.0, 400.0);
        assert_eq!(compute(&g, ColumnCount::Two), SnapPoints::single());
    }

    #[test]
    fn single_column_never_paginates() {
        let g = geom(600.0, 0.0, 40.0, 5000.0);
        assert_eq!(compute(&g, ColumnCount::One).as_slice(), &[0]);
    }

    #[test]
    fn four_columns_step_by_stride_and_end_on_max_scroll() {
        // usable 920, column (920 - 120) / 4 = 200, stride 240
        let g = geom(1000.0, 80.0, 40.0, 4000.0);
        let points = compute(&g, ColumnCount::Four);
        let mut expected: Vec<u32> = (0..=12).map(|k| k * 240).collect();
        expected.push(3000);
        assert_eq!(points.as_slice(), expected.as_slice());
        assert_well_formed(&points, 3000);
    }

    #[test]
    fn final_point_is_forced_when_stride_divides_evenly() {
        // stride 500, max scroll 1000: offsets 0, 500 then forced 1000
        let g = geom(1000.0, 0.0, 0.0, 2000.0);
        let points = compute(&g, ColumnCount::Two);
        assert_eq!(points.as_slice(), &[0, 500, 1000]);
    }

    #[test]
    fn rounding_collisions_are_deduplicated() {
        // stride 333.33.., max scroll 1.4 rounds to 1
        let g = geom(1000.0, 0.0, 0.0, 1001.4);
        let points = compute(&g, ColumnCount::Three);
        assert_eq!(points.as_slice(), &[0, 1]);

        let g = geom(1000.0, 0.0, 0.0, 1000.3);
        let points = compute(&g, ColumnCount::Three);
        assert_eq!(points.as_slice(), &[0]);
    }

    #[test]
    fn fractional_strides_stay_strictly_increasing() {
        for scroll in [1333.0, 2718.28, 5000.5, 9999.9] {
            let g = geom(1037.0, 13.0, 17.0, scroll);
            for cols in [ColumnCount::Two, ColumnCount::Three, ColumnCount::Four] {
                let points = compute(&g, cols);
                assert_well_formed(&points, g.max_scroll().round() as u32);
            }
        }
    }

    #[test]
    fn degenerate_stride_pages_by_whole_surface() {
        let g = geom(100.0, 100.0, 0.0, 300.0);
        assert_eq!(compute(&g, ColumnCount::Two).as_slice(), &[0, 200]);
    }

    #[test]
    fn geometry_validation_rejects_unmounted_surfaces() {
        assert!(geom(0.0, 0.0, 0.0, 0.0).validate().is_err());
        assert!(geom(f64::NAN, 0.0, 0.0, 0.0).validate().is_err());
        assert!(geom(800.0, 20.0, 30.0, 900.0).validate().is_ok());
    }

    #[test]
    fn scroll_width_matches_laid_out_columns() {
        let cg = ColumnGeometry::new(1000.0, 80.0, 40.0, ColumnCount::Four);
        assert_eq!(cg.column_width, 200.0);
        assert_eq!(cg.stride, 240.0);
        // four columns exactly fill the client width
        assert_eq!(cg.scroll_width_for(4, 80.0), 1000.0);
        assert_eq!(cg.scroll_width_for(5, 80.0), 1240.0);
    }
}
