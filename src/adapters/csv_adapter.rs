//! CSV file data adapter.
//!
//! One directory holds per-symbol files:
//!
//! - `{SYMBOL}_1m.csv`, `{SYMBOL}_5m.csv`, `{SYMBOL}_daily.csv` with header
//!   `timestamp,open,high,low,close,volume`
//! - `{SYMBOL}_trades.csv` with header `time,type,price,amount,comm`
//!
//! A missing per-symbol file is treated as "no rows". A missing file passed
//! to [`read_executions`] and any malformed row are errors.

use crate::domain::bar::{Bar, DailySummary, merge_intervals};
use crate::domain::error::ChartError;
use crate::domain::trade::{TradeExecution, TradeSide};
use crate::ports::data_port::{MarketDataPort, TradePort};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, kind: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, kind))
    }

    /// Reads every bar in `{symbol}_{kind}.csv`, or nothing if it does not exist.
    fn read_bars(&self, symbol: &str, kind: &str) -> Result<Vec<Bar>, ChartError> {
        let path = self.csv_path(symbol, kind);
        let Some(mut rdr) = open_reader(&path)? else {
            return Ok(Vec::new());
        };
        let source = display_name(&path);
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| invalid(&source, e.position().map_or(0, |p| p.line()), e))?;
            let line = record.position().map_or(0, |p| p.line());

            let timestamp = column::<String>(&record, 0, "timestamp", &source, line)?;
            let open = column::<f64>(&record, 1, "open", &source, line)?;
            let high = column::<f64>(&record, 2, "high", &source, line)?;
            let low = column::<f64>(&record, 3, "low", &source, line)?;
            let close = column::<f64>(&record, 4, "close", &source, line)?;
            let volume = column::<f64>(&record, 5, "volume", &source, line)?;
            if !volume.is_finite() {
                return Err(invalid(&source, line, "non-finite volume"));
            }

            let bar = Bar::new(timestamp, open, high, low, close, volume.round() as i64)
                .map_err(|e| invalid(&source, line, e))?;
            bars.push(bar);
        }

        Ok(bars)
    }

    fn read_bars_on(&self, symbol: &str, kind: &str, date: NaiveDate) -> Result<Vec<Bar>, ChartError> {
        let bars = self.read_bars(symbol, kind)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.trading_date() == Some(date))
            .collect())
    }
}

fn open_reader(path: &Path) -> Result<Option<csv::Reader<fs::File>>, ChartError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "csv file not found, treating as empty");
        return Ok(None);
    }
    let file = fs::File::open(path)?;
    Ok(Some(reader(file)))
}

fn reader(file: fs::File) -> csv::Reader<fs::File> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn invalid(source: &str, line: u64, reason: impl std::fmt::Display) -> ChartError {
    ChartError::InvalidRecord {
        source_name: source.to_string(),
        line,
        reason: reason.to_string(),
    }
}

fn column<T>(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    source: &str,
    line: u64,
) -> Result<T, ChartError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = record
        .get(idx)
        .ok_or_else(|| invalid(source, line, format!("missing {} column", name)))?;
    raw.parse::<T>()
        .map_err(|e| invalid(source, line, format!("invalid {} value '{}': {}", name, raw, e)))
}

impl MarketDataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, ChartError> {
        let one_minute = self.read_bars_on(symbol, "1m", date)?;
        let five_minute = self.read_bars_on(symbol, "5m", date)?;
        Ok(merge_intervals(one_minute, five_minute))
    }

    fn fetch_daily_summary(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySummary>, ChartError> {
        let rows = self.read_bars(symbol, "daily")?;

        let mut today = None;
        let mut previous: Option<(NaiveDate, f64)> = None;
        for row in &rows {
            let Some(row_date) = row.trading_date() else {
                continue;
            };
            if row_date == date {
                today = Some(row);
            } else if row_date < date && previous.is_none_or(|(d, _)| row_date > d) {
                previous = Some((row_date, row.close));
            }
        }

        Ok(today.map(|row| DailySummary {
            open: row.open,
            close: row.close,
            pre_close: previous.map(|(_, close)| close),
        }))
    }

    fn list_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>, ChartError> {
        let mut dates = BTreeSet::new();
        for kind in ["1m", "5m"] {
            dates.extend(self.read_bars(symbol, kind)?.iter().filter_map(Bar::trading_date));
        }
        Ok(dates.into_iter().collect())
    }
}

impl TradePort for CsvAdapter {
    fn fetch_executions(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Vec<TradeExecution>, ChartError> {
        let path = self.csv_path(symbol, "trades");
        match open_reader(&path)? {
            Some(rdr) => parse_executions(rdr, &display_name(&path), Some(date)),
            None => Ok(Vec::new()),
        }
    }
}

/// Reads an explicitly named executions file. Unlike the per-symbol files, a
/// missing file here is an error.
pub fn read_executions(
    path: &Path,
    date: Option<NaiveDate>,
) -> Result<Vec<TradeExecution>, ChartError> {
    let file = fs::File::open(path)?;
    parse_executions(reader(file), &display_name(path), date)
}

/// Parses `time,type,price,amount,comm` rows, optionally keeping one date only.
fn parse_executions(
    mut rdr: csv::Reader<fs::File>,
    source: &str,
    date: Option<NaiveDate>,
) -> Result<Vec<TradeExecution>, ChartError> {
    let day_prefix = date.map(|d| d.format("%Y-%m-%d").to_string());
    let mut executions = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| invalid(source, e.position().map_or(0, |p| p.line()), e))?;
        let line = record.position().map_or(0, |p| p.line());

        let time = column::<String>(&record, 0, "time", source, line)?;
        if let Some(prefix) = &day_prefix {
            if !time.starts_with(prefix.as_str()) {
                continue;
            }
        }
        let side = column::<String>(&record, 1, "type", source, line)?
            .parse::<TradeSide>()
            .map_err(|e| invalid(source, line, e))?;
        let price = column::<f64>(&record, 2, "price", source, line)?;
        let amount = column::<f64>(&record, 3, "amount", source, line)?;
        let commission = match record.get(4) {
            Some(raw) if !raw.is_empty() => column::<f64>(&record, 4, "comm", source, line)?,
            _ => 0.0,
        };

        let execution = TradeExecution::new(time, side, price, amount, commission)
            .map_err(|e| invalid(source, line, e))?;
        executions.push(execution);
    }

    Ok(executions)
}
