//! SQLite data adapter.
//!
//! Reads the kline tables written by the market-data collector:
//! `klines_1m`, `klines_5m` and `klines_daily`, each keyed by
//! `(symbol, timestamp)`.

use crate::domain::bar::{Bar, DailySummary, merge_intervals};
use crate::domain::error::ChartError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlineTable {
    OneMinute,
    FiveMinute,
    Daily,
}

impl KlineTable {
    pub fn table_name(self) -> &'static str {
        match self {
            KlineTable::OneMinute => "klines_1m",
            KlineTable::FiveMinute => "klines_5m",
            KlineTable::Daily => "klines_daily",
        }
    }
}

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ChartError> {
        let db_path =
            config
                .get_non_empty("sqlite", "path")
                .ok_or_else(|| ChartError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).clamp(1, 64) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| ChartError::Database {
                    reason: e.to_string(),
                })?;

        tracing::debug!(path = %db_path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, ChartError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| ChartError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), ChartError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| ChartError::Database {
                reason: e.to_string(),
            })?;

        for table in [KlineTable::OneMinute, KlineTable::FiveMinute, KlineTable::Daily] {
            let name = table.table_name();
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {name} (
                    symbol TEXT NOT NULL,
                    timestamp TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    PRIMARY KEY (symbol, timestamp)
                );
                CREATE INDEX IF NOT EXISTS idx_{name}_symbol ON {name}(symbol);"
            ))
            .map_err(|e: rusqlite::Error| ChartError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    pub fn insert_bars(&self, table: KlineTable, symbol: &str, bars: &[Bar]) -> Result<(), ChartError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| ChartError::Database {
                reason: e.to_string(),
            })?;

        let tx =
            conn.transaction()
                .map_err(|e: rusqlite::Error| ChartError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let sql = format!(
            "INSERT OR REPLACE INTO {} (symbol, timestamp, open, high, low, close, volume)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            table.table_name()
        );
        for bar in bars {
            tx.execute(
                &sql,
                params![
                    symbol,
                    bar.timestamp,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(|e: rusqlite::Error| ChartError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| ChartError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    /// Rows of `table` for `symbol`, optionally restricted to one date.
    fn query_bars(
        &self,
        table: KlineTable,
        symbol: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, ChartError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| ChartError::Database {
                reason: e.to_string(),
            })?;

        let day = date.map(|d| d.format("%Y-%m-%d").to_string());
        let query = format!(
            "SELECT timestamp, open, high, low, close, volume
             FROM {}
             WHERE symbol = ?1 AND (?2 IS NULL OR substr(timestamp, 1, 10) = ?2)
             ORDER BY timestamp ASC",
            table.table_name()
        );

        let mut stmt =
            conn.prepare(&query)
                .map_err(|e: rusqlite::Error| ChartError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![symbol, day], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })
            .map_err(|e: rusqlite::Error| ChartError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut bars = Vec::new();
        for (line, row) in rows.enumerate() {
            let (timestamp, open, high, low, close, volume) =
                row.map_err(|e: rusqlite::Error| ChartError::DatabaseQuery {
                    reason: e.to_string(),
                })?;
            let bar = Bar::new(timestamp, open, high, low, close, volume).map_err(|e| {
                ChartError::InvalidRecord {
                    source_name: table.table_name().to_string(),
                    line: line as u64 + 1,
                    reason: e.to_string(),
                }
            })?;
            bars.push(bar);
        }

        Ok(bars)
    }
}

impl MarketDataPort for SqliteAdapter {
    fn fetch_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, ChartError> {
        let one_minute = self.query_bars(KlineTable::OneMinute, symbol, Some(date))?;
        let five_minute = self.query_bars(KlineTable::FiveMinute, symbol, Some(date))?;
        Ok(merge_intervals(one_minute, five_minute))
    }

    fn fetch_daily_summary(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySummary>, ChartError> {
        let Some(today) = self
            .query_bars(KlineTable::Daily, symbol, Some(date))?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| ChartError::Database {
                reason: e.to_string(),
            })?;

        let query = format!(
            "SELECT close FROM {} WHERE symbol = ?1 AND substr(timestamp, 1, 10) < ?2
             ORDER BY timestamp DESC LIMIT 1",
            KlineTable::Daily.table_name()
        );
        let pre_close: Option<f64> = match conn.query_row(
            &query,
            params![symbol, date.format("%Y-%m-%d").to_string()],
            |row| row.get(0),
        ) {
            Ok(close) => Some(close),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                return Err(ChartError::DatabaseQuery {
                    reason: e.to_string(),
                });
            }
        };

        Ok(Some(DailySummary {
            open: today.open,
            close: today.close,
            pre_close,
        }))
    }

    fn list_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>, ChartError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| ChartError::Database {
                reason: e.to_string(),
            })?;

        let query = format!(
            "SELECT DISTINCT substr(timestamp, 1, 10) AS day FROM {} WHERE symbol = ?1
             UNION
             SELECT DISTINCT substr(timestamp, 1, 10) AS day FROM {} WHERE symbol = ?1
             ORDER BY day",
            KlineTable::OneMinute.table_name(),
            KlineTable::FiveMinute.table_name()
        );

        let mut stmt =
            conn.prepare(&query)
                .map_err(|e: rusqlite::Error| ChartError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![symbol], |row| row.get::<_, String>(0))
            .map_err(|e: rusqlite::Error| ChartError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut dates = Vec::new();
        for row in rows {
            let day = row.map_err(|e: rusqlite::Error| ChartError::DatabaseQuery {
                reason: e.to_string(),
            })?;
            match NaiveDate::parse_from_str(&day, "%Y-%m-%d") {
                Ok(d) => dates.push(d),
                Err(_) => tracing::warn!(day = %day, "skipping unparseable kline date"),
            }
        }

        Ok(dates)
    }
}
