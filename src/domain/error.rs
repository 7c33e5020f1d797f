//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for tradebench.
#[derive(Debug, thiserror::Error)]
pub enum TradebenchError {
    #[error("bar dated {date} does not follow previous bar dated {previous}")]
    InvalidBarIndex { date: NaiveDate, previous: NaiveDate },

    #[error("missing required column: {column}")]
    MissingColumn { column: String },

    #[error("invalid signal: {reason}")]
    InvalidSignal { reason: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("invalid parameter {key}: {reason}")]
    InvalidParameter { key: String, reason: String },

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

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradebenchError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        TradebenchError::MissingColumn {
            column: column.into(),
        }
    }

    pub fn invalid_parameter(key: impl Into<String>, reason: impl Into<String>) -> Self {
        TradebenchError::InvalidParameter {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<&TradebenchError> for std::process::ExitCode {
    fn from(err: &TradebenchError) -> Self {
        let code: u8 = match err {
            TradebenchError::Io(_) | TradebenchError::Csv(_) => 1,
            TradebenchError::ConfigParse { .. }
            | TradebenchError::ConfigMissing { .. }
            | TradebenchError::ConfigInvalid { .. } => 2,
            TradebenchError::UnknownStrategy { .. } | TradebenchError::InvalidParameter { .. } => {
                3
            }
            TradebenchError::InvalidBarIndex { .. }
            | TradebenchError::MissingColumn { .. }
            | TradebenchError::InvalidSignal { .. } => 4,
            TradebenchError::NoData { .. } | TradebenchError::Data { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
