//! End-to-end composition tests and property checks.

mod common;

use common::*;
use gridchart::adapters::file_config_adapter::FileConfigAdapter;
use gridchart::cli;
use gridchart::domain::bar::DayLevels;
use gridchart::domain::compose::{ChartInputs, ComposeOptions, compose};
use gridchart::domain::grid::{GridConfig, GridLineMode, StepUnit};
use gridchart::domain::measurement::{MeasurementSelector, Selection};
use gridchart::domain::normalize::normalize;
use gridchart::domain::range::{RangeConfig, compute_value_range};
use gridchart::domain::reference_line::{ReferenceKind, build_reference_lines};
use gridchart::domain::session::SessionConfig;
use gridchart::domain::trade::{Trade, TradeSide, index_executions};
use gridchart::domain::trade_overlay::map_trades;
use proptest::prelude::*;

fn inputs<'a>(
    bars: &'a [Bar],
    summary: Option<&'a DailySummary>,
    grid: Option<&'a GridConfig>,
    trades: &'a [Trade],
) -> ChartInputs<'a> {
    ChartInputs {
        bars,
        daily_summary: summary,
        grid,
        trades,
    }
}

mod examples {
    use super::*;

    #[test]
    fn single_bar_after_open_gets_anchor() {
        let bars = vec![
            Bar::new("2024-01-02 09:31", 1.000, 1.012, 0.999, 1.010, 1000).unwrap(),
        ];
        let summary = DailySummary {
            open: 1.000,
            close: 1.010,
            pre_close: None,
        };
        let spec = compose(
            &inputs(&bars, Some(&summary), None, &[]),
            &Selection::Empty,
            &ComposeOptions::default(),
        )
        .unwrap();

        assert_eq!(spec.len(), 2);
        assert_eq!(spec.dates[0], "2024-01-02 09:30");
        assert_eq!(spec.prices[0], 1.000);
        assert_eq!(spec.index_offset, 1);
    }

    #[test]
    fn base_equal_to_close_is_suppressed() {
        let bars = minute_bars("2024-01-02", 1.170, &[1.172, 1.174]);
        let summary = DailySummary {
            open: 1.170,
            close: 1.174,
            pre_close: Some(1.168),
        };
        let grid = GridConfig {
            base_price: 1.174,
            step: 0.5,
            step_unit: StepUnit::Percent,
        };
        let spec = compose(
            &inputs(&bars, Some(&summary), Some(&grid), &[]),
            &Selection::Empty,
            &ComposeOptions::default(),
        )
        .unwrap();

        assert!(spec.reference_lines.iter().all(|l| l.kind != ReferenceKind::Base));
        assert!(spec.reference_lines.iter().any(|l| l.kind == ReferenceKind::PreClose));
    }

    #[test]
    fn buy_at_first_bar_lands_after_anchor() {
        let bars = minute_bars("2024-01-02", 1.000, &[1.005, 1.010]);
        let trades = vec![Trade {
            raw_index: 0,
            time: "2024-01-02 09:31".into(),
            price: 1.005,
            side: TradeSide::Buy,
        }];
        let spec = compose(
            &inputs(&bars, None, None, &trades),
            &Selection::Empty,
            &ComposeOptions::default(),
        )
        .unwrap();

        assert_eq!(spec.index_offset, 1);
        assert_eq!(spec.buy_markers.len(), 1);
        assert_eq!(spec.buy_markers[0].chart_index, 1);
        assert_eq!(spec.buy_markers[0].price, 1.005);
    }

    #[test]
    fn opposite_trades_on_same_bar_both_render() {
        let bars = minute_bars("2024-01-02", 1.000, &[1.005, 1.010, 1.008]);
        let executions = vec![
            make_execution("2024-01-02 09:32", TradeSide::Buy, 1.006),
            make_execution("2024-01-02 09:32", TradeSide::Sell, 1.009),
        ];
        let trades = index_executions(&bars, &executions);
        let spec = compose(
            &inputs(&bars, None, None, &trades),
            &Selection::Empty,
            &ComposeOptions::default(),
        )
        .unwrap();

        assert_eq!(spec.buy_markers.len(), 1);
        assert_eq!(spec.sell_markers.len(), 1);
        assert_eq!(spec.buy_markers[0].chart_index, 2);
        assert_eq!(spec.sell_markers[0].chart_index, 2);
    }

    #[test]
    fn selector_survives_recomposition_with_new_data() {
        let mut selector = MeasurementSelector::new();
        selector.click(1);
        selector.click(3);

        let options = ComposeOptions::default();
        let day_one = minute_bars("2024-01-02", 1.000, &[1.010, 1.020, 1.030]);
        let spec = compose(&inputs(&day_one, None, None, &[]), &selector.state(), &options).unwrap();
        let m = spec.measurement.unwrap();
        assert_eq!((m.p1, m.p2), (1.010, 1.030));

        // Shorter day: index 3 no longer exists, the overlay disappears.
        let day_two = minute_bars("2024-01-03", 1.000, &[0.990]);
        let spec = compose(&inputs(&day_two, None, None, &[]), &selector.state(), &options).unwrap();
        assert!(spec.measurement.is_none());
        assert_eq!(selector.state(), Selection::TwoPicked(1, 3));
    }

    #[test]
    fn non_finite_grid_keeps_open_close() {
        let bars = minute_bars("2024-01-02", 1.000, &[1.010]);
        let grid = GridConfig {
            base_price: f64::NAN,
            step: 0.5,
            step_unit: StepUnit::Percent,
        };
        let spec = compose(
            &inputs(&bars, None, Some(&grid), &[]),
            &Selection::Empty,
            &ComposeOptions::default(),
        )
        .unwrap();
        let kinds: Vec<_> = spec.reference_lines.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![ReferenceKind::Open, ReferenceKind::Close]);
    }

    #[test]
    fn grid_without_step_draws_no_base() {
        let config = FileConfigAdapter::from_string("[grid]\nbase_price = 1.050\n").unwrap();
        let grid = cli::build_grid_config(&config).unwrap();
        assert_eq!(grid, None);

        let levels = DayLevels { open: 1.0, close: 1.02, pre_close: None };
        let lines = build_reference_lines(grid.as_ref(), &levels, GridLineMode::BaseOnly);
        let kinds: Vec<_> = lines.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![ReferenceKind::Open, ReferenceKind::Close]);
    }

    #[test]
    fn zero_step_grid_draws_no_base() {
        let bars = minute_bars("2024-01-02", 1.000, &[1.010]);
        let grid = GridConfig {
            base_price: 1.050,
            step: 0.0,
            step_unit: StepUnit::Percent,
        };
        let spec = compose(
            &inputs(&bars, None, Some(&grid), &[]),
            &Selection::Empty,
            &ComposeOptions::default(),
        )
        .unwrap();
        assert!(spec.reference_lines.iter().all(|l| l.kind != ReferenceKind::Base));
    }

    #[test]
    fn fan_mode_adds_grid_levels() {
        let bars = minute_bars("2024-01-02", 1.000, &[1.010]);
        let grid = GridConfig {
            base_price: 1.050,
            step: 1.0,
            step_unit: StepUnit::Percent,
        };
        let options = ComposeOptions {
            grid_lines: GridLineMode::Fan { levels: 2 },
            ..ComposeOptions::default()
        };
        let spec = compose(&inputs(&bars, None, Some(&grid), &[]), &Selection::Empty, &options)
            .unwrap();
        let grid_levels: Vec<_> = spec
            .reference_lines
            .iter()
            .filter_map(|l| l.grid_index)
            .collect();
        assert_eq!(grid_levels, vec![-2, -1, 1, 2]);
    }
}

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.5f64..2.0, 1..40)
}

proptest! {
    #[test]
    fn anchor_iff_first_bar_in_window(minute in 0u32..120, closes in arb_closes()) {
        let total = 9 * 60 + minute;
        let ts = format!("2024-01-02 {:02}:{:02}", total / 60, total % 60);
        let mut bars = vec![make_bar(&ts, 1.0, closes[0])];
        bars.extend(closes[1..].iter().map(|&c| make_bar("2024-01-02 11:00", 1.0, c)));

        let series = normalize(&bars, 1.0, &SessionConfig::default()).unwrap();
        let in_window = total > 9 * 60 + 30 && total <= 10 * 60;
        prop_assert_eq!(series.index_offset, usize::from(in_window));
        prop_assert_eq!(series.len(), bars.len() + series.index_offset);
    }

    #[test]
    fn renormalizing_never_adds_second_anchor(closes in arb_closes()) {
        let bars = minute_bars("2024-01-02", 1.0, &closes);
        let session = SessionConfig::default();
        let first = normalize(&bars, 1.0, &session).unwrap();

        let rebuilt: Vec<Bar> = first
            .dates
            .iter()
            .zip(&first.prices)
            .map(|(d, &p)| make_bar(d, p, p))
            .collect();
        let second = normalize(&rebuilt, 1.0, &session).unwrap();
        prop_assert_eq!(second.index_offset, 0);
        prop_assert_eq!(second.len(), first.len());
    }

    #[test]
    fn range_always_has_min_padding(
        prices in prop::collection::vec(0.5f64..2.0, 0..40),
        open in 0.5f64..2.0,
        close in 0.5f64..2.0,
        flat in any::<bool>(),
    ) {
        let prices = if flat { vec![open; prices.len()] } else { prices };
        let close = if flat { open } else { close };
        let levels = DayLevels { open, close, pre_close: None };
        let config = RangeConfig::default();
        let range = compute_value_range(&prices, &levels, &config);
        prop_assert!(range.max - range.min >= 2.0 * config.min_padding - 1e-12);
        for &p in prices.iter().chain([open, close].iter()) {
            prop_assert!(range.min < p && p < range.max);
        }
    }

    #[test]
    fn base_present_iff_clear_of_close(base in 0.9f64..1.1, close in 0.9f64..1.1, snap in any::<bool>()) {
        let close = if snap { base } else { close };
        let grid = GridConfig { base_price: base, step: 0.5, step_unit: StepUnit::Percent };
        let levels = DayLevels { open: 1.0, close, pre_close: None };
        let lines = build_reference_lines(Some(&grid), &levels, GridLineMode::BaseOnly);
        let has_base = lines.iter().any(|l| l.kind == ReferenceKind::Base);
        prop_assert_eq!(has_base, (base - close).abs() >= 0.0001);
    }

    #[test]
    fn markers_always_in_bounds(
        offset in 0usize..2,
        len in 0usize..50,
        raw in prop::collection::vec((0usize..80, any::<bool>()), 0..30),
    ) {
        let trades: Vec<Trade> = raw
            .iter()
            .map(|&(raw_index, buy)| Trade {
                raw_index,
                time: String::new(),
                price: 1.0,
                side: if buy { TradeSide::Buy } else { TradeSide::Sell },
            })
            .collect();
        let overlay = map_trades(offset, len, &trades);
        for m in overlay.buy_markers.iter().chain(&overlay.sell_markers) {
            prop_assert!(m.chart_index < len);
        }
        let kept = raw.iter().filter(|(i, _)| i + offset < len).count();
        prop_assert_eq!(overlay.marker_count(), kept);
    }

    #[test]
    fn selection_never_exceeds_two(clicks in prop::collection::vec(0usize..10, 0..50)) {
        let mut state = Selection::Empty;
        for k in clicks {
            let prev = state;
            state = state.click(k);
            prop_assert!(state.indices().len() <= 2);
            if let Selection::TwoPicked(i, j) = state {
                prop_assert_ne!(i, j);
                prop_assert!(matches!(prev, Selection::OnePicked(p) if p == i));
            }
        }
    }
}
