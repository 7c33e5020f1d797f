//! Result persistence port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradebenchError;
use crate::domain::strategy::StrategyParams;
use std::path::PathBuf;

/// What identifies one run in its persisted form.
#[derive(Debug, Clone, Copy)]
pub struct RunLabel<'a> {
    pub strategy: &'a str,
    pub params: &'a StrategyParams,
    pub tickers: &'a [String],
}

/// Port for writing the rows of a finished backtest.
pub trait ReportPort {
    /// Returns where the rows were written.
    fn write(&self, result: &BacktestResult, run: &RunLabel<'_>)
    -> Result<PathBuf, TradebenchError>;
}
