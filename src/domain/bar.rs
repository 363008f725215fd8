//! Intraday bar and daily summary records.

use crate::domain::error::IngestError;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

/// One aggregated price/volume record for a fixed interval within a trading day.
///
/// The timestamp text is kept verbatim since it becomes the x-axis label.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Direction of a bar, used to colour its volume column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Up,
    Down,
}

impl VolumeTrend {
    pub fn sign(self) -> i8 {
        match self {
            VolumeTrend::Up => 1,
            VolumeTrend::Down => -1,
        }
    }
}

impl Bar {
    /// Validating constructor used by every adapter.
    pub fn new(
        timestamp: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Result<Self, IngestError> {
        let timestamp = timestamp.into().trim().to_string();
        if timestamp.is_empty() {
            return Err(IngestError::EmptyTimestamp);
        }
        for (field, value) in [("open", open), ("high", high), ("low", low), ("close", close)] {
            if !value.is_finite() {
                return Err(IngestError::NonFinite { field, value });
            }
        }
        if volume < 0 {
            return Err(IngestError::NegativeVolume(volume));
        }
        Ok(Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Date portion of the timestamp, if it parses as `YYYY-MM-DD`.
    pub fn trading_date(&self) -> Option<NaiveDate> {
        let (date, _) = split_timestamp(&self.timestamp);
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }

    /// Time-of-day portion of the timestamp (`HH:MM` or `HH:MM:SS`).
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        let (_, time) = split_timestamp(&self.timestamp);
        parse_time_of_day(time?)
    }

    /// Whether the time component carries seconds.
    pub fn has_seconds(&self) -> bool {
        matches!(split_timestamp(&self.timestamp), (_, Some(t)) if t.matches(':').count() == 2)
    }

    pub fn trend(&self) -> VolumeTrend {
        if self.close >= self.open {
            VolumeTrend::Up
        } else {
            VolumeTrend::Down
        }
    }
}

fn split_timestamp(ts: &str) -> (&str, Option<&str>) {
    match ts.split_once([' ', 'T']) {
        Some((date, time)) => (date, Some(time.trim())),
        None => (ts, None),
    }
}

pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Day-level summary record for one trading day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySummary {
    pub open: f64,
    pub close: f64,
    pub pre_close: Option<f64>,
}

/// Open/close/previous-close resolved for one composition pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayLevels {
    pub open: f64,
    pub close: f64,
    pub pre_close: Option<f64>,
}

impl DayLevels {
    /// Prefer the daily summary, fall back to the first open and last close.
    pub fn resolve(bars: &[Bar], summary: Option<&DailySummary>) -> Option<Self> {
        let first = bars.first()?;
        let last = bars.last()?;
        let open = summary
            .map(|s| s.open)
            .filter(|v| v.is_finite())
            .unwrap_or(first.open);
        let close = summary
            .map(|s| s.close)
            .filter(|v| v.is_finite())
            .unwrap_or(last.close);
        let pre_close = summary
            .and_then(|s| s.pre_close)
            .filter(|v| v.is_finite());
        Some(Self {
            open,
            close,
            pre_close,
        })
    }
}

/// Keep every 1-minute bar and fill in 5-minute bars for days without any
/// 1-minute coverage.
pub fn merge_intervals(one_minute: Vec<Bar>, five_minute: Vec<Bar>) -> Vec<Bar> {
    let covered: std::collections::HashSet<String> = one_minute
        .iter()
        .map(|b| date_key(&b.timestamp).to_string())
        .collect();

    let mut merged = one_minute;
    merged.extend(
        five_minute
            .into_iter()
            .filter(|b| !covered.contains(date_key(&b.timestamp))),
    );
    merged.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    merged
}

fn date_key(ts: &str) -> &str {
    ts.get(..10).unwrap_or(ts)
}
