//! CLI definition and dispatch.

use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvAdapter, read_executions};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_render_adapter::JsonRenderAdapter;
use crate::adapters::svg_render_adapter::{
    DEFAULT_PRICE_DECIMALS, MAX_PRICE_DECIMALS, SvgRenderAdapter,
};
use crate::domain::compose::{ChartInputs, ComposeOptions, RenderSpec, compose};
use crate::domain::config_validation::{
    check_session_window, parse_market_open, validate_chart_config,
};
use crate::domain::error::ChartError;
use crate::domain::grid::{GridConfig, GridLineMode, StepUnit};
use crate::domain::measurement::MeasurementSelector;
use crate::domain::range::{DEFAULT_MIN_PADDING, DEFAULT_PADDING_RATIO, RangeConfig};
use crate::domain::session::{DEFAULT_ANCHOR_GRACE_MINUTES, SessionConfig};
use crate::domain::trade::{TradeExecution, index_executions};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{MarketDataPort, TradePort};
use crate::ports::render_port::RenderPort;

#[derive(Parser, Debug)]
#[command(name = "gridchart", about = "Intraday chart composer for grid-trading review")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Svg,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose one trading day and write it out
    Render {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long)]
        symbol: Option<String>,
        /// Trade executions CSV (time,type,price,amount,comm)
        #[arg(long)]
        trades: Option<PathBuf>,
        /// Chart index to click in the measurement tool; repeatable
        #[arg(long = "click")]
        clicks: Vec<usize>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List trading dates with intraday data
    Dates {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a chart configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Render {
            config,
            date,
            symbol,
            trades,
            clicks,
            format,
            output,
        } => run_render(
            &config,
            date,
            symbol.as_deref(),
            trades.as_deref(),
            &clicks,
            format,
            output.as_deref(),
        ),
        Command::Dates { config, symbol } => run_dates(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &ChartError) -> ExitCode {
    tracing::error!(error = %err, "command failed");
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// `None` when the base price or the step is not configured; no base line is
/// drawn then.
pub fn build_grid_config(adapter: &dyn ConfigPort) -> Result<Option<GridConfig>, ChartError> {
    let (Some(raw_base), Some(raw_step)) = (
        adapter.get_non_empty("grid", "base_price"),
        adapter.get_non_empty("grid", "step"),
    ) else {
        tracing::debug!("grid base_price or step not configured, no grid lines");
        return Ok(None);
    };
    let base_price = raw_base
        .parse::<f64>()
        .map_err(|_| ChartError::config_invalid("grid", "base_price", "base_price must be a number"))?;
    let step = raw_step
        .parse::<f64>()
        .map_err(|_| ChartError::config_invalid("grid", "step", "step must be a number"))?;

    let step_unit = match adapter.get_non_empty("grid", "step_unit") {
        Some(raw) => raw
            .parse::<StepUnit>()
            .map_err(|reason| ChartError::config_invalid("grid", "step_unit", reason))?,
        None => StepUnit::Percent,
    };

    Ok(Some(GridConfig {
        base_price,
        step,
        step_unit,
    }))
}

pub fn build_grid_line_mode(adapter: &dyn ConfigPort) -> Result<GridLineMode, ChartError> {
    let mode = adapter
        .get_non_empty("grid", "mode")
        .unwrap_or_else(|| "base".to_string());
    match mode.to_lowercase().as_str() {
        "base" => Ok(GridLineMode::BaseOnly),
        "fan" => {
            let levels = adapter.get_int("grid", "fan_levels", 5);
            let levels = u32::try_from(levels)
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    ChartError::config_invalid("grid", "fan_levels", "fan_levels must be positive")
                })?;
            Ok(GridLineMode::Fan { levels })
        }
        other => Err(ChartError::config_invalid(
            "grid",
            "mode",
            format!("unknown mode '{other}', expected base or fan"),
        )),
    }
}

pub fn build_session_config(adapter: &dyn ConfigPort) -> Result<SessionConfig, ChartError> {
    let mut session = SessionConfig::default();
    if let Some(raw) = adapter.get_non_empty("session", "market_open") {
        session.market_open = parse_market_open(&raw)?;
    }
    let grace = adapter.get_int("session", "anchor_grace_minutes", DEFAULT_ANCHOR_GRACE_MINUTES);
    if grace < 0 {
        return Err(ChartError::config_invalid(
            "session",
            "anchor_grace_minutes",
            "anchor_grace_minutes must be non-negative",
        ));
    }
    session.anchor_grace = Duration::minutes(grace);
    check_session_window(&session)?;
    Ok(session)
}

pub fn build_range_config(adapter: &dyn ConfigPort) -> RangeConfig {
    RangeConfig {
        padding_ratio: adapter.get_double("chart", "padding_ratio", DEFAULT_PADDING_RATIO),
        min_padding: adapter.get_double("chart", "min_padding", DEFAULT_MIN_PADDING),
    }
}

pub fn build_compose_options(adapter: &dyn ConfigPort) -> Result<ComposeOptions, ChartError> {
    Ok(ComposeOptions {
        session: build_session_config(adapter)?,
        range: build_range_config(adapter),
        grid_lines: build_grid_line_mode(adapter)?,
    })
}

pub fn resolve_symbol(symbol_override: Option<&str>, adapter: &dyn ConfigPort) -> Result<String, ChartError> {
    match symbol_override.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Ok(s.to_string()),
        None => adapter
            .get_non_empty("chart", "symbol")
            .ok_or_else(|| ChartError::ConfigMissing {
                section: "chart".into(),
                key: "symbol".into(),
            }),
    }
}

/// Render adapter for `format`, tuned by the `[output]` section.
pub fn build_renderer(format: OutputFormat, adapter: &dyn ConfigPort) -> Box<dyn RenderPort> {
    match format {
        OutputFormat::Json => Box::new(JsonRenderAdapter {
            compact: adapter.get_bool("output", "compact", false),
        }),
        OutputFormat::Svg => {
            let decimals = adapter.get_int("output", "price_decimals", DEFAULT_PRICE_DECIMALS as i64);
            Box::new(SvgRenderAdapter {
                price_decimals: usize::try_from(decimals)
                    .map_or(DEFAULT_PRICE_DECIMALS, |d| d.min(MAX_PRICE_DECIMALS)),
            })
        }
    }
}

/// Configured market-data port plus, for file-backed sources, a trade port.
pub struct DataSources {
    pub market: Box<dyn MarketDataPort>,
    pub trades: Option<Box<dyn TradePort>>,
}

pub fn open_data_sources(adapter: &dyn ConfigPort) -> Result<DataSources, ChartError> {
    let source = adapter
        .get_non_empty("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => {
            let dir = adapter
                .get_non_empty("data", "dir")
                .ok_or_else(|| ChartError::ConfigMissing {
                    section: "data".into(),
                    key: "dir".into(),
                })?;
            tracing::info!(dir = %dir, "using csv data source");
            Ok(DataSources {
                market: Box::new(CsvAdapter::new(PathBuf::from(&dir))),
                trades: Some(Box::new(CsvAdapter::new(PathBuf::from(dir)))),
            })
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            tracing::info!("using sqlite data source");
            Ok(DataSources {
                market: Box::new(SqliteAdapter::from_config(adapter)?),
                trades: None,
            })
        }
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => Err(ChartError::config_invalid(
            "data",
            "source",
            "sqlite feature is not enabled in this build",
        )),
        other => Err(ChartError::config_invalid(
            "data",
            "source",
            format!("unknown source '{other}', expected csv or sqlite"),
        )),
    }
}

/// Everything the render pipeline needs besides the data ports.
pub struct RenderRequest<'a> {
    pub symbol: &'a str,
    pub date: NaiveDate,
    pub grid: Option<GridConfig>,
    pub clicks: &'a [usize],
    pub options: ComposeOptions,
}

/// Loads one day, indexes executions, replays clicks and composes.
///
/// `executions` overrides the trade port when supplied.
pub fn run_render_pipeline(
    market: &dyn MarketDataPort,
    trade_port: Option<&dyn TradePort>,
    executions: Option<Vec<TradeExecution>>,
    request: &RenderRequest<'_>,
) -> Result<RenderSpec, ChartError> {
    let bars = market.fetch_bars(request.symbol, request.date)?;
    if bars.is_empty() {
        return Err(ChartError::NoData {
            symbol: request.symbol.to_string(),
            date: request.date.to_string(),
        });
    }
    let summary = market.fetch_daily_summary(request.symbol, request.date)?;
    if summary.is_none() {
        tracing::warn!(symbol = request.symbol, date = %request.date, "no daily summary, using bar open/close");
    }

    let executions = match (executions, trade_port) {
        (Some(e), _) => e,
        (None, Some(port)) => port.fetch_executions(request.symbol, request.date)?,
        (None, None) => Vec::new(),
    };
    let trades = index_executions(&bars, &executions);
    if trades.len() < executions.len() {
        tracing::warn!(
            matched = trades.len(),
            total = executions.len(),
            "some executions did not match a bar timestamp"
        );
    }

    let mut selector = MeasurementSelector::new();
    for &k in request.clicks {
        selector.click(k);
    }

    let inputs = ChartInputs {
        bars: &bars,
        daily_summary: summary.as_ref(),
        grid: request.grid.as_ref(),
        trades: &trades,
    };
    compose(&inputs, &selector.state(), &request.options).ok_or_else(|| ChartError::NoData {
        symbol: request.symbol.to_string(),
        date: request.date.to_string(),
    })
}

fn run_render(
    config_path: &Path,
    date: NaiveDate,
    symbol_override: Option<&str>,
    trades_path: Option<&Path>,
    clicks: &[usize],
    format: OutputFormat,
    output_path: Option<&Path>,
) -> ExitCode {
    tracing::info!(config = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_chart_config(&adapter) {
        return fail(&e);
    }

    let symbol = match resolve_symbol(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let grid = match build_grid_config(&adapter) {
        Ok(g) => g,
        Err(e) => return fail(&e),
    };
    let options = match build_compose_options(&adapter) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };
    let sources = match open_data_sources(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let executions = match trades_path {
        Some(path) => match read_executions(path, Some(date)) {
            Ok(e) => Some(e),
            Err(e) => return fail(&e),
        },
        None => None,
    };

    let request = RenderRequest {
        symbol: &symbol,
        date,
        grid,
        clicks,
        options,
    };
    let spec = match run_render_pipeline(
        sources.market.as_ref(),
        sources.trades.as_deref(),
        executions,
        &request,
    ) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let renderer = build_renderer(format, &adapter);
    let output = output_path.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(format!("{}_{}.{}", symbol, date, renderer.extension()))
    });
    let output_str = output.to_string_lossy();
    if let Err(e) = renderer.write(&spec, &output_str) {
        return fail(&e);
    }

    print_summary(&symbol, date, &spec);
    println!("Written to {}", output.display());
    ExitCode::SUCCESS
}

fn print_summary(symbol: &str, date: NaiveDate, spec: &RenderSpec) {
    println!("{symbol} {date}: {} points (anchor: {})", spec.len(), spec.index_offset == 1);
    println!(
        "  open {:.3}  close {:.3}  range [{:.3}, {:.3}]",
        spec.day.open, spec.day.close, spec.value_range.min, spec.value_range.max
    );
    if let Some(stats) = spec.stats {
        if let Some(amp) = stats.amplitude_pct {
            println!("  amplitude {:.2}%  volatility factor {:.2}", amp, stats.volatility_factor.unwrap_or(0.0));
        }
    }
    println!(
        "  {} reference lines, {} buys, {} sells",
        spec.reference_lines.len(),
        spec.buy_markers.len(),
        spec.sell_markers.len()
    );
    if let Some(m) = spec.measurement {
        let pct = m.pct.map_or_else(|| "n/a".to_string(), |p| format!("{p:.2}%"));
        println!(
            "  measure [{}] {:.3} -> [{}] {:.3}: {:.3} ({})",
            m.first_index, m.p1, m.second_index, m.p2, m.diff, pct
        );
    }
}

fn run_dates(config_path: &Path, symbol_override: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let symbol = match resolve_symbol(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let sources = match open_data_sources(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let dates = match sources.market.list_dates(&symbol) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    if dates.is_empty() {
        eprintln!("No intraday data found for {}", symbol);
    } else {
        for date in &dates {
            println!("{}", date);
        }
        eprintln!("{} dates found", dates.len());
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_chart_config(&adapter) {
        return fail(&e);
    }
    if let Err(e) = build_grid_config(&adapter).and_then(|_| build_compose_options(&adapter)) {
        return fail(&e);
    }
    println!("Config is valid.");
    ExitCode::SUCCESS
}
