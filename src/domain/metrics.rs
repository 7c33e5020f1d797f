//! Performance metrics over a backtest result.

use crate::domain::backtest::BacktestResult;
use chrono::NaiveDate;

pub const DAYS_PER_YEAR: f64 = 365.25;
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Deviations below this are rounding noise on a constant series.
const STD_FLOOR: f64 = 1e-12;

/// Compound annual growth rate of an equity curve starting at 1.0.
/// `years = (end - start) / 365.25`; 0 for an empty curve or zero span.
pub fn cagr(equity: &[f64], start: NaiveDate, end: NaiveDate) -> f64 {
    let years = (end - start).num_days() as f64 / DAYS_PER_YEAR;
    match equity.last() {
        Some(&final_equity) => annualized_growth(final_equity, years),
        None => 0.0,
    }
}

/// `final_equity^(1/years) - 1`, 0 when `years == 0`.
pub fn annualized_growth(final_equity: f64, years: f64) -> f64 {
    if years == 0.0 {
        return 0.0;
    }
    final_equity.powf(1.0 / years) - 1.0
}

/// Most negative drawdown; 0 for an empty series.
pub fn max_drawdown(drawdowns: &[f64]) -> f64 {
    if drawdowns.is_empty() {
        return 0.0;
    }
    drawdowns.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Annualized Sharpe ratio using the population standard deviation of
/// excess returns. 0 for an empty series or zero deviation.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> f64 {
    if returns.is_empty() || periods_per_year == 0 {
        return 0.0;
    }
    let ppy = periods_per_year as f64;
    let per_period_rf = risk_free_rate / ppy;
    let n = returns.len() as f64;
    let mean = returns.iter().map(|r| r - per_period_rf).sum::<f64>() / n;
    let variance = returns
        .iter()
        .map(|r| {
            let d = r - per_period_rf - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let std = variance.sqrt();
    if std < STD_FLOOR || !std.is_finite() {
        return 0.0;
    }
    mean / std * ppy.sqrt()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_return: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub trades: usize,
    pub bars: usize,
}

impl Summary {
    pub fn compute(
        result: &BacktestResult,
        start: NaiveDate,
        end: NaiveDate,
        risk_free_rate: f64,
        periods_per_year: u32,
    ) -> Self {
        let equity = result.equity_curve();
        Self {
            total_return: result.final_equity() - 1.0,
            cagr: cagr(&equity, start, end),
            max_drawdown: max_drawdown(&result.drawdowns()),
            sharpe_ratio: sharpe_ratio(&result.returns(), risk_free_rate, periods_per_year),
            trades: result.trades.len(),
            bars: result.rows.len(),
        }
    }
}
