//! Weekly SMA trend filter, meant for leveraged index ETFs.

use super::{Chronology, Strategy, StrategyParams};
use crate::domain::bar::Bar;
use crate::domain::error::TradebenchError;
use crate::domain::indicator::{RollingWindow, WeeklyCloses};
use crate::domain::signal::Signal;

#[derive(Debug, Clone)]
pub struct LeveragedTrendStrategy {
    weeks: usize,
    clock: Chronology,
    weekly: WeeklyCloses,
    sma: RollingWindow,
    long: bool,
}

impl LeveragedTrendStrategy {
    /// SMA over `weeks` weekly closes.
    pub fn with_weeks(weeks: usize) -> Result<Self, TradebenchError> {
        if weeks == 0 {
            return Err(TradebenchError::invalid_parameter("sma_weeks", "must be at least 1"));
        }
        Ok(Self::build(weeks))
    }

    /// `sma_len` trading days, five to a week.
    pub fn with_days(sma_len: usize) -> Self {
        Self::build((sma_len / 5).max(1))
    }

    fn build(weeks: usize) -> Self {
        Self {
            weeks,
            clock: Chronology::default(),
            weekly: WeeklyCloses::new(),
            sma: RollingWindow::new(weeks),
            long: false,
        }
    }

    /// `sma_weeks` wins over `sma_len` when both are given.
    pub fn from_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        if params.contains("sma_weeks") {
            return Self::with_weeks(params.get_usize("sma_weeks", 40)?);
        }
        Ok(Self::with_days(params.get_usize("sma_len", 200)?))
    }

    pub fn weeks(&self) -> usize {
        self.weeks
    }
}

impl Strategy for LeveragedTrendStrategy {
    fn name(&self) -> &str {
        "leveragedtrend"
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.weekly = WeeklyCloses::new();
        self.sma.clear();
        self.long = false;
    }

    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError> {
        self.clock.advance(bar.date)?;
        let close = bar.close()?;
        self.weekly.push(bar.date, close).apply(&mut self.sma, close);
        let Some(sma) = self.sma.mean() else {
            return Ok(Signal::Hold);
        };

        if !self.long && close > sma {
            self.long = true;
            return Ok(Signal::Buy);
        }
        if self.long && close <= sma {
            self.long = false;
            return Ok(Signal::Sell);
        }
        Ok(Signal::Hold)
    }
}
