//! Viewport classification: width → column count, width → device class.

use crate::config::ViewerConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnCount {
    #[default]
    One,
    Two,
    Three,
    Four,
}

impl ColumnCount {
    pub fn get(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Narrow,
    Wide,
}

impl DeviceClass {
    /// Source panel visibility a fresh session (or a class transition) starts from.
    pub fn default_source_visible(self) -> bool {
        matches!(self, Self::Wide)
    }
}

/// Thresholds are exclusive: exactly 700px is still one column.
pub fn column_count(width: f64, config: &ViewerConfig) -> ColumnCount {
    let [two, three, four] = config.column_thresholds;
    if width > four {
        ColumnCount::Four
    } else if width > three {
        ColumnCount::Three
    } else if width > two {
        ColumnCount::Two
    } else {
        ColumnCount::One
    }
}

pub fn device_class(width: f64, config: &ViewerConfig) -> DeviceClass {
    if width >= config.wide_breakpoint {
        DeviceClass::Wide
    } else {
        DeviceClass::Narrow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_thresholds_are_exclusive() {
        let cfg = ViewerConfig::default();
        assert_eq!(column_count(0.0, &cfg), ColumnCount::One);
        assert_eq!(column_count(700.0, &cfg), ColumnCount::One);
        assert_eq!(column_count(700.5, &cfg), ColumnCount::Two);
        assert_eq!(column_count(1100.0, &cfg), ColumnCount::Two);
        assert_eq!(column_count(1101.0, &cfg), ColumnCount::Three);
        assert_eq!(column_count(1500.0, &cfg), ColumnCount::Three);
        assert_eq!(column_count(1600.0, &cfg), ColumnCount::Four);
    }

    #[test]
    fn column_count_is_monotonic() {
        let cfg = ViewerConfig::default();
        let mut prev = ColumnCount::One;
        for w in (0..=2400).step_by(7) {
            let c = column_count(w as f64, &cfg);
            assert!(c >= prev, "width {w} went from {prev:?} to {c:?}");
            assert!((1..=4).contains(&c.get()));
            prev = c;
        }
    }

    #[test]
    fn device_breakpoint_is_inclusive() {
        let cfg = ViewerConfig::default();
        assert_eq!(device_class(767.9, &cfg), DeviceClass::Narrow);
        assert_eq!(device_class(768.0, &cfg), DeviceClass::Wide);
        assert!(DeviceClass::Wide.default_source_visible());
        assert!(!DeviceClass::Narrow.default_source_visible());
    }
}
