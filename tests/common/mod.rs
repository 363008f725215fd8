#![allow(dead_code)]

use chrono::NaiveDate;
pub use gridchart::domain::bar::{Bar, DailySummary};
use gridchart::domain::error::ChartError;
use gridchart::domain::trade::{TradeExecution, TradeSide};
use gridchart::ports::data_port::{MarketDataPort, TradePort};
use std::collections::HashMap;

pub struct MockMarketDataPort {
    pub bars: HashMap<String, Vec<Bar>>,
    pub summaries: HashMap<String, DailySummary>,
    pub errors: HashMap<String, String>,
}

impl MockMarketDataPort {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            summaries: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_summary(mut self, symbol: &str, summary: DailySummary) -> Self {
        self.summaries.insert(symbol.to_string(), summary);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check(&self, symbol: &str) -> Result<(), ChartError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(ChartError::Database {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl MarketDataPort for MockMarketDataPort {
    fn fetch_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, ChartError> {
        self.check(symbol)?;
        Ok(self
            .bars
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.trading_date() == Some(date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_daily_summary(
        &self,
        symbol: &str,
        _date: NaiveDate,
    ) -> Result<Option<DailySummary>, ChartError> {
        self.check(symbol)?;
        Ok(self.summaries.get(symbol).copied())
    }

    fn list_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>, ChartError> {
        self.check(symbol)?;
        let mut dates: Vec<NaiveDate> = self
            .bars
            .get(symbol)
            .into_iter()
            .flatten()
            .filter_map(Bar::trading_date)
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }
}

pub struct MockTradePort {
    pub executions: Vec<TradeExecution>,
}

impl TradePort for MockTradePort {
    fn fetch_executions(
        &self,
        _symbol: &str,
        _date: NaiveDate,
    ) -> Result<Vec<TradeExecution>, ChartError> {
        Ok(self.executions.clone())
    }
}

pub fn make_bar(timestamp: &str, open: f64, close: f64) -> Bar {
    Bar::new(timestamp, open, open.max(close), open.min(close), close, 1000).unwrap()
}

/// `closes.len()` one-minute bars starting at `date` 09:31, each opening at
/// the previous close.
pub fn minute_bars(date: &str, first_open: f64, closes: &[f64]) -> Vec<Bar> {
    let mut open = first_open;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let minute = 31 + i as u32;
            let ts = format!("{} {:02}:{:02}", date, 9 + minute / 60, minute % 60);
            let bar = make_bar(&ts, open, close);
            open = close;
            bar
        })
        .collect()
}

pub fn make_execution(time: &str, side: TradeSide, price: f64) -> TradeExecution {
    TradeExecution::new(time, side, price, 1000.0, 0.5).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
