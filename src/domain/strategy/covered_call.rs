//! Median band reversion for covered-call ETFs.

use super::{Chronology, Strategy, StrategyParams};
use crate::domain::bar::Bar;
use crate::domain::error::TradebenchError;
use crate::domain::indicator::RollingMedian;
use crate::domain::signal::Signal;

/// Buys a dip below the rolling median of daily closes and sells a rally
/// above it.
#[derive(Debug, Clone)]
pub struct CoveredCallMedianStrategy {
    id: &'static str,
    band: f64,
    window: usize,
    clock: Chronology,
    median: RollingMedian,
    long: bool,
}

impl CoveredCallMedianStrategy {
    /// `band >= 1` is read as a percentage.
    pub fn new(band: f64, window: usize) -> Result<Self, TradebenchError> {
        if band < 0.0 {
            return Err(TradebenchError::invalid_parameter("band", "must not be negative"));
        }
        if window == 0 {
            return Err(TradebenchError::invalid_parameter("window", "must be at least 1"));
        }
        let band = if band >= 1.0 { band / 100.0 } else { band };
        Ok(Self {
            id: "covered_call_median",
            band,
            window,
            clock: Chronology::default(),
            median: RollingMedian::new(window),
            long: false,
        })
    }

    /// Registered as `covered_call_median`, window key `window`.
    pub fn from_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        Self::new(
            params.get_f64("band", 0.01)?,
            params.get_usize("window", 60)?,
        )
    }

    /// Registered as `median_cc`, window key `median_len`.
    pub fn from_median_cc_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        let mut strategy = Self::new(
            params.get_f64("band", 0.01)?,
            params.get_usize("median_len", 60)?,
        )?;
        strategy.id = "median_cc";
        Ok(strategy)
    }

    /// Band as a fraction.
    pub fn band(&self) -> f64 {
        self.band
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Strategy for CoveredCallMedianStrategy {
    fn name(&self) -> &str {
        self.id
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.median.clear();
        self.long = false;
    }

    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError> {
        self.clock.advance(bar.date)?;
        let close = bar.close()?;
        self.median.push(close);
        let Some(median) = self.median.median() else {
            return Ok(Signal::Hold);
        };

        if !self.long && close <= median * (1.0 - self.band) {
            self.long = true;
            return Ok(Signal::Buy);
        }
        if self.long && close >= median * (1.0 + self.band) {
            self.long = false;
            return Ok(Signal::Sell);
        }
        Ok(Signal::Hold)
    }
}
