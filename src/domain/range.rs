//! Padded value-axis bounds.
//!
//! S = prices ∪ {open, close} ∪ {pre_close}; padding = max(range × ratio, min_padding).

use crate::domain::bar::DayLevels;
use serde::Serialize;

pub const DEFAULT_PADDING_RATIO: f64 = 0.2;
pub const DEFAULT_MIN_PADDING: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeConfig {
    pub padding_ratio: f64,
    pub min_padding: f64,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            padding_ratio: DEFAULT_PADDING_RATIO,
            min_padding: DEFAULT_MIN_PADDING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

pub fn compute_value_range(prices: &[f64], levels: &DayLevels, config: &RangeConfig) -> ValueRange {
    let values = prices
        .iter()
        .copied()
        .chain([levels.open, levels.close])
        .chain(levels.pre_close)
        .filter(|v| v.is_finite());

    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo > hi {
        // nothing finite to bound; centre an empty window on zero
        return ValueRange {
            min: -config.min_padding,
            max: config.min_padding,
        };
    }

    let padding = ((hi - lo) * config.padding_ratio).max(config.min_padding);
    ValueRange {
        min: lo - padding,
        max: hi + padding,
    }
}
