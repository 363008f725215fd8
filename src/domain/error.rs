//! Domain error types.

/// A record rejected at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IngestError {
    #[error("non-finite {field} value: {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("negative volume: {0}")]
    NegativeVolume(i64),

    #[error("unknown trade side: {0}")]
    UnknownSide(String),

    #[error("empty timestamp")]
    EmptyTimestamp,
}

/// Top-level error type for gridchart.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid record in {source_name} line {line}: {reason}")]
    InvalidRecord {
        source_name: String,
        line: u64,
        reason: String,
    },

    #[error("no bars for {symbol} on {date}")]
    NoData { symbol: String, date: String },

    #[error("render error: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChartError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ChartError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&ChartError> for std::process::ExitCode {
    fn from(err: &ChartError) -> Self {
        let code: u8 = match err {
            ChartError::Io(_) => 1,
            ChartError::ConfigParse { .. }
            | ChartError::ConfigMissing { .. }
            | ChartError::ConfigInvalid { .. } => 2,
            ChartError::Database { .. } | ChartError::DatabaseQuery { .. } => 3,
            ChartError::InvalidRecord { .. } => 4,
            ChartError::NoData { .. } => 5,
            ChartError::Render { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
