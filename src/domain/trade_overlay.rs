//! Maps trades onto normalized-series positions, split by side.

use crate::domain::trade::{Trade, TradeSide};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMarker {
    pub chart_index: usize,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOverlay {
    pub buy_markers: Vec<TradeMarker>,
    pub sell_markers: Vec<TradeMarker>,
    /// Trades whose position fell outside the series.
    #[serde(skip)]
    pub dropped: usize,
}

impl TradeOverlay {
    pub fn marker_count(&self) -> usize {
        self.buy_markers.len() + self.sell_markers.len()
    }
}

/// chart_index = raw_index + index_offset, kept only when < series_len.
///
/// Markers sharing a position are all retained.
pub fn map_trades(index_offset: usize, series_len: usize, trades: &[Trade]) -> TradeOverlay {
    let mut overlay = TradeOverlay::default();

    for trade in trades {
        let chart_index = match trade.raw_index.checked_add(index_offset) {
            Some(i) if i < series_len => i,
            _ => {
                tracing::debug!(
                    raw_index = trade.raw_index,
                    series_len,
                    "dropping trade outside series"
                );
                overlay.dropped += 1;
                continue;
            }
        };

        let marker = TradeMarker {
            chart_index,
            price: trade.price,
        };
        match trade.side {
            TradeSide::Buy => overlay.buy_markers.push(marker),
            TradeSide::Sell => overlay.sell_markers.push(marker),
        }
    }

    overlay
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(raw_index: usize, side: TradeSide, price: f64) -> Trade {
        Trade {
            raw_index,
            time: String::new(),
            price,
            side,
        }
    }

    #[test]
    fn applies_index_offset() {
        let overlay = map_trades(1, 5, &[trade(0, TradeSide::Buy, 1.005)]);
        assert_eq!(
            overlay.buy_markers,
            vec![TradeMarker {
                chart_index: 1,
                price: 1.005
            }]
        );
        assert!(overlay.sell_markers.is_empty());
    }

    #[test]
    fn drops_out_of_range_trades() {
        let overlay = map_trades(
            1,
            3,
            &[
                trade(1, TradeSide::Sell, 1.0),
                trade(2, TradeSide::Sell, 1.1),
                trade(9, TradeSide::Buy, 1.2),
            ],
        );
        assert_eq!(overlay.sell_markers.len(), 1);
        assert_eq!(overlay.sell_markers[0].chart_index, 2);
        assert!(overlay.buy_markers.is_empty());
        assert_eq!(overlay.dropped, 2);
    }

    #[test]
    fn same_position_both_sides_are_kept() {
        let overlay = map_trades(
            0,
            4,
            &[
                trade(2, TradeSide::Buy, 0.99),
                trade(2, TradeSide::Sell, 1.01),
                trade(2, TradeSide::Buy, 0.98),
            ],
        );
        assert_eq!(overlay.buy_markers.len(), 2);
        assert_eq!(overlay.sell_markers.len(), 1);
        assert_eq!(overlay.marker_count(), 3);
        assert!(overlay.buy_markers.iter().all(|m| m.chart_index == 2));
    }

    #[test]
    fn empty_series_drops_everything() {
        let overlay = map_trades(0, 0, &[trade(0, TradeSide::Buy, 1.0)]);
        assert_eq!(overlay.marker_count(), 0);
        assert_eq!(overlay.dropped, 1);
    }

    #[test]
    fn overflowing_index_is_dropped() {
        let overlay = map_trades(1, 10, &[trade(usize::MAX, TradeSide::Buy, 1.0)]);
        assert_eq!(overlay.dropped, 1);
    }
}
