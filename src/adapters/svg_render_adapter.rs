//! Static SVG rendering of a composed chart.
//!
//! All number formatting for the visual output lives here; a `RenderSpec`
//! carries raw floats only.

use crate::domain::compose::RenderSpec;
use crate::domain::error::ChartError;
use crate::domain::reference_line::{ReferenceKind, ReferenceLine};
use crate::ports::render_port::RenderPort;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const CHART_WIDTH: f64 = 900.0;
const PRICE_HEIGHT: f64 = 360.0;
const VOLUME_HEIGHT: f64 = 90.0;
const PANE_GAP: f64 = 20.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 90.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

pub const DEFAULT_PRICE_DECIMALS: usize = 3;
pub const MAX_PRICE_DECIMALS: usize = 8;

const UP_COLOUR: &str = "#ef5350";
const DOWN_COLOUR: &str = "#26a69a";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgRenderAdapter {
    /// Decimal places for price labels.
    pub price_decimals: usize,
}

impl Default for SvgRenderAdapter {
    fn default() -> Self {
        Self {
            price_decimals: DEFAULT_PRICE_DECIMALS,
        }
    }
}

struct Frame {
    len: usize,
    min: f64,
    max: f64,
    plot_width: f64,
}

impl Frame {
    fn x(&self, i: usize) -> f64 {
        MARGIN_LEFT + (i as f64 / (self.len.saturating_sub(1)).max(1) as f64) * self.plot_width
    }

    fn y(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return MARGIN_TOP + PRICE_HEIGHT / 2.0;
        }
        MARGIN_TOP + PRICE_HEIGHT - ((v - self.min) / span) * PRICE_HEIGHT
    }
}

fn line_colour(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Base => "#fa8c16",
        ReferenceKind::Open => "#1677ff",
        ReferenceKind::Close => "#722ed1",
        ReferenceKind::PreClose => "#8c8c8c",
        ReferenceKind::Grid(_) => "#d9d9d9",
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl SvgRenderAdapter {
    pub fn render(&self, spec: &RenderSpec) -> String {
        let total_height = MARGIN_TOP + PRICE_HEIGHT + PANE_GAP + VOLUME_HEIGHT + MARGIN_BOTTOM;
        let frame = Frame {
            len: spec.len(),
            min: spec.value_range.min,
            max: spec.value_range.max,
            plot_width: CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
        };

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"##,
            w = CHART_WIDTH,
            h = total_height
        );
        svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

        self.push_axes(&mut svg, &frame, spec);
        for line in &spec.reference_lines {
            self.push_reference_line(&mut svg, &frame, line);
        }
        push_price_path(&mut svg, &frame, &spec.prices);
        push_markers(&mut svg, &frame, spec);
        self.push_measurement(&mut svg, &frame, spec);
        push_volumes(&mut svg, &frame, spec);

        svg.push_str("</svg>\n");
        svg
    }

    fn push_axes(&self, svg: &mut String, frame: &Frame, spec: &RenderSpec) {
        let dp = self.price_decimals;
        let bottom = MARGIN_TOP + PRICE_HEIGHT;
        let _ = writeln!(
            svg,
            "  <line x1=\"{MARGIN_LEFT}\" y1=\"{MARGIN_TOP}\" x2=\"{MARGIN_LEFT}\" y2=\"{bottom}\" stroke=\"#ccc\" stroke-width=\"1\"/>"
        );
        for v in [frame.max, (frame.max + frame.min) / 2.0, frame.min] {
            let _ = writeln!(
                svg,
                "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.dp$}</text>",
                MARGIN_LEFT - 5.0,
                frame.y(v) + 3.0,
                v
            );
        }

        let label_y = MARGIN_TOP + PRICE_HEIGHT + PANE_GAP + VOLUME_HEIGHT + 15.0;
        let ticks = [0, spec.len() / 2, spec.len().saturating_sub(1)];
        for (n, &i) in ticks.iter().enumerate() {
            if n > 0 && i == ticks[n - 1] {
                continue;
            }
            if let Some(date) = spec.dates.get(i) {
                let _ = writeln!(
                    svg,
                    "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>",
                    frame.x(i),
                    label_y,
                    escape(time_label(date))
                );
            }
        }
    }

    fn push_reference_line(&self, svg: &mut String, frame: &Frame, line: &ReferenceLine) {
        let dp = self.price_decimals;
        let y = frame.y(line.level);
        let dash = if matches!(line.kind, ReferenceKind::Grid(_)) {
            " stroke-dasharray=\"4 3\""
        } else {
            " stroke-dasharray=\"6 2\""
        };
        let _ = writeln!(
            svg,
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"{}/>",
            MARGIN_LEFT,
            y,
            CHART_WIDTH - MARGIN_RIGHT,
            y,
            line_colour(line.kind),
            dash
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"{}\">{} {:.dp$}</text>",
            CHART_WIDTH - MARGIN_RIGHT + 4.0,
            y + 3.0,
            line_colour(line.kind),
            escape(&line.label),
            line.level
        );
    }

    fn push_measurement(&self, svg: &mut String, frame: &Frame, spec: &RenderSpec) {
        let Some(m) = spec.measurement else {
            return;
        };
        let dp = self.price_decimals;
        let (x1, y1) = (frame.x(m.first_index), frame.y(m.p1));
        let (x2, y2) = (frame.x(m.second_index), frame.y(m.p2));
        let _ = writeln!(
            svg,
            "  <line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\" stroke=\"#fadb14\" stroke-width=\"2\"/>"
        );
        let pct = match m.pct {
            Some(p) => format!(" ({p:.2}%)"),
            None => String::new(),
        };
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"11\" fill=\"#333\">Δ {:.dp$}{}</text>",
            (x1 + x2) / 2.0,
            y1.min(y2) - 6.0,
            m.diff,
            pct
        );
    }
}

/// Time-of-day part of a `date time` label, or the whole label.
fn time_label(date: &str) -> &str {
    date.split_once([' ', 'T']).map_or(date, |(_, t)| t)
}

fn push_price_path(svg: &mut String, frame: &Frame, prices: &[f64]) {
    let mut path_data = String::new();
    let mut pen_down = false;
    for (i, &p) in prices.iter().enumerate() {
        if !p.is_finite() {
            pen_down = false;
            continue;
        }
        let cmd = if pen_down { " L" } else { " M" };
        let _ = write!(path_data, "{} {:.1} {:.1}", cmd, frame.x(i), frame.y(p));
        pen_down = true;
    }
    let _ = writeln!(
        svg,
        "  <path d=\"{}\" fill=\"none\" stroke=\"#1677ff\" stroke-width=\"1.5\"/>",
        path_data.trim_start()
    );
}

fn push_markers(svg: &mut String, frame: &Frame, spec: &RenderSpec) {
    for m in &spec.buy_markers {
        let (x, y) = (frame.x(m.chart_index), frame.y(m.price));
        let _ = writeln!(
            svg,
            "  <path d=\"M {:.1} {:.1} L {:.1} {:.1} L {:.1} {:.1} Z\" fill=\"{UP_COLOUR}\" class=\"buy\"/>",
            x,
            y,
            x - 5.0,
            y + 9.0,
            x + 5.0,
            y + 9.0
        );
    }
    for m in &spec.sell_markers {
        let (x, y) = (frame.x(m.chart_index), frame.y(m.price));
        let _ = writeln!(
            svg,
            "  <path d=\"M {:.1} {:.1} L {:.1} {:.1} L {:.1} {:.1} Z\" fill=\"{DOWN_COLOUR}\" class=\"sell\"/>",
            x,
            y,
            x - 5.0,
            y - 9.0,
            x + 5.0,
            y - 9.0
        );
    }
}

fn push_volumes(svg: &mut String, frame: &Frame, spec: &RenderSpec) {
    let max_volume = spec.volumes.iter().map(|v| v.volume).max().unwrap_or(0);
    if max_volume <= 0 {
        return;
    }
    let pane_bottom = MARGIN_TOP + PRICE_HEIGHT + PANE_GAP + VOLUME_HEIGHT;
    let bar_width = (frame.plot_width / spec.len().max(1) as f64 * 0.7).max(1.0);

    for v in &spec.volumes {
        let h = v.volume as f64 / max_volume as f64 * VOLUME_HEIGHT;
        let colour = if v.trend.sign() > 0 { UP_COLOUR } else { DOWN_COLOUR };
        let _ = writeln!(
            svg,
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>",
            frame.x(v.index) - bar_width / 2.0,
            pane_bottom - h,
            bar_width,
            h,
            colour
        );
    }
}

impl RenderPort for SvgRenderAdapter {
    fn write(&self, spec: &RenderSpec, output_path: &str) -> Result<(), ChartError> {
        let svg = self.render(spec);
        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, svg)?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::compose::{ChartInputs, ComposeOptions, compose};
    use crate::domain::grid::{GridConfig, StepUnit};
    use crate::domain::measurement::Selection;
    use crate::domain::trade::{Trade, TradeSide};
    use tempfile::TempDir;

    fn spec(selection: Selection) -> RenderSpec {
        let bars = vec![
            Bar::new("2024-01-02 09:31", 1.000, 1.012, 0.998, 1.010, 1200).unwrap(),
            Bar::new("2024-01-02 09:32", 1.010, 1.011, 1.004, 1.005, 900).unwrap(),
            Bar::new("2024-01-02 09:33", 1.005, 1.021, 1.005, 1.020, 1500).unwrap(),
        ];
        let grid = GridConfig {
            base_price: 1.000,
            step: 0.5,
            step_unit: StepUnit::Percent,
        };
        let trades = vec![
            Trade {
                raw_index: 0,
                time: "2024-01-02 09:31".into(),
                price: 1.005,
                side: TradeSide::Buy,
            },
            Trade {
                raw_index: 2,
                time: "2024-01-02 09:33".into(),
                price: 1.018,
                side: TradeSide::Sell,
            },
        ];
        let inputs = ChartInputs {
            bars: &bars,
            daily_summary: None,
            grid: Some(&grid),
            trades: &trades,
        };
        compose(&inputs, &selection, &ComposeOptions::default()).unwrap()
    }

    #[test]
    fn renders_every_layer() {
        let svg = SvgRenderAdapter::default().render(&spec(Selection::TwoPicked(1, 3)));
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Open 1.000"));
        assert!(svg.contains("class=\"buy\""));
        assert!(svg.contains("class=\"sell\""));
        assert!(svg.contains("Δ 0.010"));
        assert!(svg.contains(">09:30<"));
    }

    #[test]
    fn no_measurement_without_two_points() {
        let svg = SvgRenderAdapter::default().render(&spec(Selection::OnePicked(1)));
        assert!(!svg.contains("Δ"));
    }

    #[test]
    fn price_decimals_configurable() {
        let adapter = SvgRenderAdapter { price_decimals: 4 };
        let svg = adapter.render(&spec(Selection::Empty));
        assert!(svg.contains("Open 1.0000"));
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/charts/day.svg");
        SvgRenderAdapter::default()
            .write(&spec(Selection::Empty), path.to_str().unwrap())
            .unwrap();
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("<svg"));
    }

    #[test]
    fn escapes_markup_in_labels() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
        assert_eq!(time_label("2024-01-02 09:31"), "09:31");
        assert_eq!(time_label("09:31"), "09:31");
    }
}
