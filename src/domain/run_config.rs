//! Run settings read and validated from configuration.

use crate::domain::bar::AssetMode;
use crate::domain::error::TradebenchError;
use crate::domain::metrics::TRADING_DAYS_PER_YEAR;
use crate::domain::strategy::StrategyParams;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub strategy: Option<String>,
    pub tickers: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// `None` detects the mode from the loaded series.
    pub mode: Option<AssetMode>,
    pub risk_free_rate: f64,
    pub periods_per_year: u32,
    pub results_dir: PathBuf,
    /// Raw `[params]` entries; values may hold `|` separated sweep candidates.
    pub params: StrategyParams,
}

impl RunConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradebenchError> {
        Ok(Self {
            data_dir: PathBuf::from(
                non_empty(config.get_string("data", "dir")).unwrap_or_else(|| "data".into()),
            ),
            strategy: non_empty(config.get_string("backtest", "strategy")),
            tickers: config
                .get_string("backtest", "tickers")
                .map(|s| parse_tickers(&s))
                .unwrap_or_default(),
            start_date: optional_date(config, "start_date")?,
            end_date: optional_date(config, "end_date")?,
            mode: parse_mode(config)?,
            risk_free_rate: validate_risk_free_rate(config)?,
            periods_per_year: validate_periods_per_year(config)?,
            results_dir: PathBuf::from(
                non_empty(config.get_string("backtest", "results_dir"))
                    .unwrap_or_else(|| "results".into()),
            ),
            params: StrategyParams::from_pairs(config.section_entries("params")),
        })
    }

    /// The backtest window; both ends required and `start < end`.
    pub fn window(&self) -> Result<(NaiveDate, NaiveDate), TradebenchError> {
        let start = self.start_date.ok_or_else(|| missing("start_date"))?;
        let end = self.end_date.ok_or_else(|| missing("end_date"))?;
        if start >= end {
            return Err(invalid("start_date", "start_date must be before end_date"));
        }
        Ok((start, end))
    }

    pub fn require_tickers(&self) -> Result<&[String], TradebenchError> {
        if self.tickers.is_empty() {
            return Err(missing("tickers"));
        }
        Ok(&self.tickers)
    }

    pub fn require_strategy(&self) -> Result<&str, TradebenchError> {
        self.strategy.as_deref().ok_or_else(|| missing("strategy"))
    }
}

/// Comma separated, trimmed, empties dropped.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn parse_date(raw: &str, key: &str) -> Result<NaiveDate, TradebenchError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| invalid(key, "invalid date format (expected YYYY-MM-DD)"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn optional_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, TradebenchError> {
    non_empty(config.get_string("backtest", key))
        .map(|raw| parse_date(&raw, key))
        .transpose()
}

fn parse_mode(config: &dyn ConfigPort) -> Result<Option<AssetMode>, TradebenchError> {
    match non_empty(config.get_string("backtest", "mode")) {
        None => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("auto") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|e: String| invalid("mode", e)),
    }
}

/// `None` when the key is absent or blank; a value that does not parse is
/// `ConfigInvalid`.
fn parsed<T: FromStr>(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<T>, TradebenchError> {
    non_empty(config.get_string("backtest", key))
        .map(|raw| {
            raw.parse()
                .map_err(|_| invalid(key, format!("'{raw}' is not a valid {key}")))
        })
        .transpose()
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<f64, TradebenchError> {
    let value = parsed::<f64>(config, "risk_free_rate")?.unwrap_or(0.0);
    if !value.is_finite() || !(0.0..1.0).contains(&value) {
        return Err(invalid("risk_free_rate", "risk_free_rate must be between 0 and 1"));
    }
    Ok(value)
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<u32, TradebenchError> {
    match parsed::<u32>(config, "periods_per_year")? {
        None => Ok(TRADING_DAYS_PER_YEAR),
        Some(0) => Err(invalid(
            "periods_per_year",
            "periods_per_year must be a positive integer",
        )),
        Some(value) => Ok(value),
    }
}

fn missing(key: &str) -> TradebenchError {
    TradebenchError::ConfigMissing {
        section: "backtest".to_string(),
        key: key.to_string(),
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> TradebenchError {
    TradebenchError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}
