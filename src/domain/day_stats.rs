//! Intraday amplitude statistics shown next to the chart.

use crate::domain::bar::Bar;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStats {
    pub high: f64,
    pub low: f64,
    /// (high - low) / low * 100
    pub amplitude_pct: Option<f64>,
    /// amplitude / 4
    pub volatility_factor: Option<f64>,
}

pub fn compute_day_stats(bars: &[Bar]) -> Option<DayStats> {
    if bars.is_empty() {
        return None;
    }
    let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

    let amplitude_pct = (low > 0.0).then(|| (high - low) / low * 100.0);
    Some(DayStats {
        high,
        low,
        amplitude_pct,
        volatility_factor: amplitude_pct.map(|a| a / 4.0),
    })
}
