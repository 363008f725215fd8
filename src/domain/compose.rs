//! Full chart composition: one pure pass from raw inputs to a render spec.
//!
//! Normalization runs first; its series and index offset feed the range,
//! reference-line and trade-overlay stages independently. The measurement is
//! re-derived from the freshly normalized prices on every call.

use crate::domain::bar::{Bar, DailySummary, DayLevels};
use crate::domain::day_stats::{DayStats, compute_day_stats};
use crate::domain::grid::{GridConfig, GridLineMode};
use crate::domain::measurement::{Measurement, Selection};
use crate::domain::normalize::{VolumePoint, normalize};
use crate::domain::range::{RangeConfig, ValueRange, compute_value_range};
use crate::domain::reference_line::{ReferenceLine, build_reference_lines};
use crate::domain::session::SessionConfig;
use crate::domain::trade::Trade;
use crate::domain::trade_overlay::{TradeMarker, map_trades};
use serde::Serialize;

/// Caller-supplied snapshot for one composition pass.
#[derive(Debug, Clone, Copy)]
pub struct ChartInputs<'a> {
    pub bars: &'a [Bar],
    pub daily_summary: Option<&'a DailySummary>,
    pub grid: Option<&'a GridConfig>,
    pub trades: &'a [Trade],
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComposeOptions {
    pub session: SessionConfig,
    pub range: RangeConfig,
    pub grid_lines: GridLineMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSpec {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
    pub volumes: Vec<VolumePoint>,
    pub index_offset: usize,
    pub day: DayLevels,
    pub value_range: ValueRange,
    pub reference_lines: Vec<ReferenceLine>,
    pub buy_markers: Vec<TradeMarker>,
    pub sell_markers: Vec<TradeMarker>,
    pub measurement: Option<Measurement>,
    pub stats: Option<DayStats>,
}

impl RenderSpec {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Returns `None` when there are no bars; the caller shows its empty state.
pub fn compose(
    inputs: &ChartInputs<'_>,
    selection: &Selection,
    options: &ComposeOptions,
) -> Option<RenderSpec> {
    let day = DayLevels::resolve(inputs.bars, inputs.daily_summary)?;
    let series = normalize(inputs.bars, day.open, &options.session)?;

    let value_range = compute_value_range(&series.prices, &day, &options.range);
    let reference_lines = build_reference_lines(inputs.grid, &day, options.grid_lines);
    let overlay = map_trades(series.index_offset, series.len(), inputs.trades);
    if overlay.dropped > 0 {
        tracing::debug!(dropped = overlay.dropped, "trades outside the series were skipped");
    }
    let measurement = selection.measure(&series.prices);

    Some(RenderSpec {
        dates: series.dates,
        prices: series.prices,
        volumes: series.volumes,
        index_offset: series.index_offset,
        day,
        value_range,
        reference_lines,
        buy_markers: overlay.buy_markers,
        sell_markers: overlay.sell_markers,
        measurement,
        stats: compute_day_stats(inputs.bars),
    })
}
