//! Market-data and trade-execution port traits.

use crate::domain::bar::{Bar, DailySummary};
use crate::domain::error::ChartError;
use crate::domain::trade::TradeExecution;
use chrono::NaiveDate;

pub trait MarketDataPort {
    /// Intraday bars for one trading day, ascending by timestamp.
    ///
    /// 1-minute bars are preferred; 5-minute bars fill days with no 1-minute
    /// coverage.
    fn fetch_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, ChartError>;

    /// Daily row for `date`, with `pre_close` taken from the latest daily row
    /// strictly before it.
    fn fetch_daily_summary(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySummary>, ChartError>;

    /// Trading dates with intraday bars, ascending.
    fn list_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>, ChartError>;
}

pub trait TradePort {
    fn fetch_executions(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Vec<TradeExecution>, ChartError>;
}
