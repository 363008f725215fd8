//! Canonical ordered bar sequence with optional market-open anchor.
//!
//! When the first bar lands shortly after the open (e.g. 09:31), a synthetic
//! bar is prepended at the open time priced at the day open so the price
//! line starts at the open. Every position after it shifts by `index_offset`.

use crate::domain::bar::{Bar, VolumeTrend};
use crate::domain::session::SessionConfig;
use serde::Serialize;

/// One volume column: `[index, volume, sign]` when serialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "(usize, i64, i8)")]
pub struct VolumePoint {
    pub index: usize,
    pub volume: i64,
    pub trend: VolumeTrend,
}

impl From<VolumePoint> for (usize, i64, i8) {
    fn from(p: VolumePoint) -> Self {
        (p.index, p.volume, p.trend.sign())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSeries {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
    pub volumes: Vec<VolumePoint>,
    pub index_offset: usize,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn price_at(&self, index: usize) -> Option<f64> {
        self.prices.get(index).copied()
    }

    pub fn has_anchor(&self) -> bool {
        self.index_offset == 1
    }
}

/// Builds the normalized series. Returns `None` for an empty bar slice.
pub fn normalize(bars: &[Bar], day_open: f64, session: &SessionConfig) -> Option<NormalizedSeries> {
    let first = bars.first()?;
    let anchor = anchor_label(first, session);
    let index_offset = usize::from(anchor.is_some());

    let len = bars.len() + index_offset;
    let mut dates = Vec::with_capacity(len);
    let mut prices = Vec::with_capacity(len);
    let mut volumes = Vec::with_capacity(len);

    if let Some(label) = anchor {
        tracing::debug!(anchor = %label, first = %first.timestamp, "synthesized open anchor");
        dates.push(label);
        prices.push(day_open);
        volumes.push(VolumePoint {
            index: 0,
            volume: 0,
            trend: VolumeTrend::Up,
        });
    }

    for (i, bar) in bars.iter().enumerate() {
        dates.push(bar.timestamp.clone());
        prices.push(bar.close);
        volumes.push(VolumePoint {
            index: i + index_offset,
            volume: bar.volume,
            trend: bar.trend(),
        });
    }

    Some(NormalizedSeries {
        dates,
        prices,
        volumes,
        index_offset,
    })
}

/// Label for the synthetic open bar, or `None` when no anchor is needed or
/// the first timestamp cannot be read.
fn anchor_label(first: &Bar, session: &SessionConfig) -> Option<String> {
    let time = first.time_of_day()?;
    if !session.within_anchor_window(time) {
        return None;
    }
    let date = first.trading_date()?;
    let time_fmt = if first.has_seconds() { "%H:%M:%S" } else { "%H:%M" };
    Some(format!(
        "{} {}",
        date.format("%Y-%m-%d"),
        session.market_open.format(time_fmt)
    ))
}
