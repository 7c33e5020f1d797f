//! Weekly MACD crossover.

use super::{Chronology, Strategy, StrategyParams};
use crate::domain::bar::Bar;
use crate::domain::error::TradebenchError;
use crate::domain::indicator::{Ema, WeeklyCloses};
use crate::domain::signal::Signal;

#[derive(Debug, Clone)]
pub struct MacdStrategy {
    fast: usize,
    slow: usize,
    signal: usize,
    clock: Chronology,
    weekly: WeeklyCloses,
    fast_ema: Ema,
    slow_ema: Ema,
    signal_ema: Ema,
}

impl MacdStrategy {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, TradebenchError> {
        for (key, span) in [("fast", fast), ("slow", slow), ("signal", signal)] {
            if span == 0 {
                return Err(TradebenchError::invalid_parameter(key, "must be at least 1"));
            }
        }
        Ok(Self {
            fast,
            slow,
            signal,
            clock: Chronology::default(),
            weekly: WeeklyCloses::new(),
            fast_ema: Ema::with_span(fast),
            slow_ema: Ema::with_span(slow),
            signal_ema: Ema::with_span(signal),
        })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        Self::new(
            params.get_usize("fast", 12)?,
            params.get_usize("slow", 26)?,
            params.get_usize("signal", 9)?,
        )
    }

    pub fn spans(&self) -> (usize, usize, usize) {
        (self.fast, self.slow, self.signal)
    }
}

impl Strategy for MacdStrategy {
    fn name(&self) -> &str {
        "macd"
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.weekly = WeeklyCloses::new();
        self.fast_ema.clear();
        self.slow_ema.clear();
        self.signal_ema.clear();
    }

    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError> {
        self.clock.advance(bar.date)?;
        let close = bar.close()?;
        let update = self.weekly.push(bar.date, close);
        update.apply(&mut self.fast_ema, close);
        update.apply(&mut self.slow_ema, close);

        let (Some(fast), Some(slow)) = (self.fast_ema.value(), self.slow_ema.value()) else {
            return Ok(Signal::Hold);
        };
        update.apply(&mut self.signal_ema, fast - slow);

        if self.weekly.len() < 2 {
            return Ok(Signal::Hold);
        }
        let (Some(prev_fast), Some(prev_slow), Some(prev_signal), Some(curr_signal)) = (
            self.fast_ema.previous(),
            self.slow_ema.previous(),
            self.signal_ema.previous(),
            self.signal_ema.value(),
        ) else {
            return Ok(Signal::Hold);
        };
        let prev_macd = prev_fast - prev_slow;
        let curr_macd = fast - slow;

        if prev_macd <= prev_signal && curr_macd > curr_signal {
            Ok(Signal::Buy)
        } else if prev_macd >= prev_signal && curr_macd < curr_signal {
            Ok(Signal::Sell)
        } else {
            Ok(Signal::Hold)
        }
    }
}
