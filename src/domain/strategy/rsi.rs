//! Weekly RSI mean reversion.

use super::{Chronology, Strategy, StrategyParams};
use crate::domain::bar::Bar;
use crate::domain::error::TradebenchError;
use crate::domain::indicator::{WeeklyCloses, WilderRsi};
use crate::domain::signal::Signal;

#[derive(Debug, Clone)]
pub struct RsiStrategy {
    rsi_buy: f64,
    rsi_sell: f64,
    length: usize,
    clock: Chronology,
    weekly: WeeklyCloses,
    rsi: WilderRsi,
}

impl RsiStrategy {
    pub fn new(rsi_buy: f64, rsi_sell: f64, length: usize) -> Result<Self, TradebenchError> {
        if length == 0 {
            return Err(TradebenchError::invalid_parameter("length", "must be at least 1"));
        }
        Ok(Self {
            rsi_buy,
            rsi_sell,
            length,
            clock: Chronology::default(),
            weekly: WeeklyCloses::new(),
            rsi: WilderRsi::new(length),
        })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        Self::new(
            params.get_f64("rsi_buy", 30.0)?,
            params.get_f64("rsi_sell", 70.0)?,
            params.get_usize("length", 14)?,
        )
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Current weekly RSI, once warmed up.
    pub fn value(&self) -> Option<f64> {
        self.rsi.value()
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        "rsi"
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.weekly = WeeklyCloses::new();
        self.rsi.clear();
    }

    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError> {
        self.clock.advance(bar.date)?;
        let close = bar.close()?;
        self.weekly.push(bar.date, close).apply(&mut self.rsi, close);

        match self.rsi.value() {
            Some(v) if v <= self.rsi_buy => Ok(Signal::Buy),
            Some(v) if v >= self.rsi_sell => Ok(Signal::Sell),
            _ => Ok(Signal::Hold),
        }
    }
}
