//! Configuration validation.
//!
//! Checks every chart-related INI field before any data is loaded.

use crate::domain::error::ChartError;
use crate::domain::grid::{MAX_FAN_LEVELS, StepUnit};
use crate::domain::session::SessionConfig;
use crate::ports::config_port::ConfigPort;
use chrono::{Duration, NaiveTime};

pub const KNOWN_SOURCES: &[&str] = &["csv", "sqlite"];
pub const MAX_ANCHOR_GRACE_MINUTES: i64 = 240;

pub fn validate_chart_config(config: &dyn ConfigPort) -> Result<(), ChartError> {
    validate_source(config)?;
    validate_padding(config)?;
    validate_session(config)?;
    validate_grid(config)?;
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), ChartError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    let source = source.trim().to_lowercase();
    if !KNOWN_SOURCES.contains(&source.as_str()) {
        return Err(ChartError::config_invalid(
            "data",
            "source",
            format!("unknown source '{source}', expected csv or sqlite"),
        ));
    }

    match source.as_str() {
        "csv" => require_non_empty(config, "data", "dir"),
        _ => require_non_empty(config, "sqlite", "path"),
    }
}

fn require_non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ChartError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(ChartError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_padding(config: &dyn ConfigPort) -> Result<(), ChartError> {
    let ratio = read_double(config, "chart", "padding_ratio")?;
    if let Some(ratio) = ratio {
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(ChartError::config_invalid(
                "chart",
                "padding_ratio",
                "padding_ratio must be a non-negative number",
            ));
        }
    }

    let min = read_double(config, "chart", "min_padding")?;
    if let Some(min) = min {
        if !min.is_finite() || min <= 0.0 {
            return Err(ChartError::config_invalid(
                "chart",
                "min_padding",
                "min_padding must be positive",
            ));
        }
    }
    Ok(())
}

/// `Ok(None)` when absent; an error when present but not a number.
fn read_double(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, ChartError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
            ChartError::config_invalid(section, key, format!("'{}' is not a number", raw.trim()))
        }),
    }
}

fn read_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<i64>, ChartError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
            ChartError::config_invalid(section, key, format!("'{}' is not an integer", raw.trim()))
        }),
    }
}

fn validate_session(config: &dyn ConfigPort) -> Result<(), ChartError> {
    let mut session = SessionConfig::default();
    if let Some(raw) = config.get_string("session", "market_open") {
        session.market_open = parse_market_open(&raw)?;
    }

    if let Some(grace) = read_int(config, "session", "anchor_grace_minutes")? {
        if !(0..=MAX_ANCHOR_GRACE_MINUTES).contains(&grace) {
            return Err(ChartError::config_invalid(
                "session",
                "anchor_grace_minutes",
                format!("anchor_grace_minutes must be between 0 and {MAX_ANCHOR_GRACE_MINUTES}"),
            ));
        }
        session.anchor_grace = Duration::minutes(grace);
    }
    check_session_window(&session)
}

/// Rejects an anchor window that would run past midnight.
pub fn check_session_window(session: &SessionConfig) -> Result<(), ChartError> {
    if session.wraps_midnight() {
        return Err(ChartError::config_invalid(
            "session",
            "anchor_grace_minutes",
            "anchor window must end before midnight",
        ));
    }
    Ok(())
}

pub fn parse_market_open(raw: &str) -> Result<NaiveTime, ChartError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        ChartError::config_invalid(
            "session",
            "market_open",
            "invalid market_open format, expected HH:MM",
        )
    })
}

fn validate_grid(config: &dyn ConfigPort) -> Result<(), ChartError> {
    // A missing base price only means no base line is drawn.
    read_double(config, "grid", "base_price")?;

    if let Some(step) = read_double(config, "grid", "step")? {
        if !step.is_finite() || step <= 0.0 {
            return Err(ChartError::config_invalid(
                "grid",
                "step",
                "step must be a positive number",
            ));
        }
    }

    if let Some(unit) = config.get_string("grid", "step_unit") {
        unit.parse::<StepUnit>()
            .map_err(|reason| ChartError::config_invalid("grid", "step_unit", reason))?;
    }

    let mode = config
        .get_string("grid", "mode")
        .unwrap_or_else(|| "base".to_string());
    match mode.trim().to_lowercase().as_str() {
        "base" => {}
        "fan" => {
            let levels = read_int(config, "grid", "fan_levels")?.unwrap_or(5);
            if !(1..=i64::from(MAX_FAN_LEVELS)).contains(&levels) {
                return Err(ChartError::config_invalid(
                    "grid",
                    "fan_levels",
                    format!("fan_levels must be between 1 and {MAX_FAN_LEVELS}"),
                ));
            }
        }
        other => {
            return Err(ChartError::config_invalid(
                "grid",
                "mode",
                format!("unknown mode '{other}', expected base or fan"),
            ));
        }
    }
    Ok(())
}
