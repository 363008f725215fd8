//! Simulated trade executions from the grid simulation engine.

use crate::domain::bar::Bar;
use crate::domain::error::IngestError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl FromStr for TradeSide {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "B" => Ok(TradeSide::Buy),
            "SELL" | "S" => Ok(TradeSide::Sell),
            _ => Err(IngestError::UnknownSide(s.trim().to_string())),
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// A trade keyed by its position in the raw (unnormalized) bar array.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub raw_index: usize,
    pub time: String,
    pub price: f64,
    pub side: TradeSide,
}

/// Execution record as emitted by the simulation engine, keyed by bar time.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeExecution {
    pub time: String,
    pub side: TradeSide,
    pub price: f64,
    pub amount: f64,
    pub commission: f64,
}

impl TradeExecution {
    pub fn new(
        time: impl Into<String>,
        side: TradeSide,
        price: f64,
        amount: f64,
        commission: f64,
    ) -> Result<Self, IngestError> {
        let time = time.into().trim().to_string();
        if time.is_empty() {
            return Err(IngestError::EmptyTimestamp);
        }
        for (field, value) in [("price", price), ("amount", amount), ("comm", commission)] {
            if !value.is_finite() {
                return Err(IngestError::NonFinite { field, value });
            }
        }
        Ok(Self {
            time,
            side,
            price,
            amount,
            commission,
        })
    }
}

/// Resolves each execution's bar position by exact timestamp match.
///
/// Duplicate bar timestamps resolve to the last occurrence. Executions with no
/// matching bar are dropped.
pub fn index_executions(bars: &[Bar], executions: &[TradeExecution]) -> Vec<Trade> {
    let by_time: HashMap<&str, usize> = bars
        .iter()
        .enumerate()
        .map(|(i, b)| (b.timestamp.as_str(), i))
        .collect();

    executions
        .iter()
        .filter_map(|e| match by_time.get(e.time.as_str()) {
            Some(&raw_index) => Some(Trade {
                raw_index,
                time: e.time.clone(),
                price: e.price,
                side: e.side,
            }),
            None => {
                tracing::debug!(time = %e.time, side = %e.side, "execution has no matching bar");
                None
            }
        })
        .collect()
}
