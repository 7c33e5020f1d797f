//! Weekly Bollinger band mean reversion.

use super::{Chronology, Strategy, StrategyParams};
use crate::domain::bar::Bar;
use crate::domain::error::TradebenchError;
use crate::domain::indicator::{RollingWindow, WeeklyCloses};
use crate::domain::signal::Signal;

/// BUY below the lower band, SELL at or above the midline. Carries no
/// position state, so repeated BUY/SELL signals are normal.
#[derive(Debug, Clone)]
pub struct BollingerStrategy {
    length: usize,
    dev: f64,
    clock: Chronology,
    weekly: WeeklyCloses,
    window: RollingWindow,
}

impl BollingerStrategy {
    pub fn new(length: usize, dev: f64) -> Result<Self, TradebenchError> {
        if length == 0 {
            return Err(TradebenchError::invalid_parameter("length", "must be at least 1"));
        }
        Ok(Self {
            length,
            dev,
            clock: Chronology::default(),
            weekly: WeeklyCloses::new(),
            window: RollingWindow::new(length),
        })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        Self::new(
            params.get_usize("length", 20)?,
            params.get_f64("dev", 2.0)?,
        )
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Strategy for BollingerStrategy {
    fn name(&self) -> &str {
        "boll"
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.weekly = WeeklyCloses::new();
        self.window.clear();
    }

    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError> {
        self.clock.advance(bar.date)?;
        let close = bar.close()?;
        self.weekly.push(bar.date, close).apply(&mut self.window, close);

        let (Some(mid), Some(std)) = (self.window.mean(), self.window.sample_std()) else {
            return Ok(Signal::Hold);
        };
        let lower = mid - self.dev * std;
        if close < lower {
            Ok(Signal::Buy)
        } else if close >= mid {
            Ok(Signal::Sell)
        } else {
            Ok(Signal::Hold)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn friday(week: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap() + Duration::weeks(week)
    }

    fn run(strategy: &mut BollingerStrategy, closes: &[f64]) -> Vec<Signal> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                strategy
                    .next_bar(&Bar::new(friday(i as i64)).with("close", c))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn holds_until_window_full() {
        let mut s = BollingerStrategy::new(3, 2.0).unwrap();
        assert_eq!(run(&mut s, &[10.0, 10.0]), vec![Signal::Hold, Signal::Hold]);
    }

    #[test]
    fn flat_series_sells_at_midline() {
        let mut s = BollingerStrategy::new(3, 2.0).unwrap();
        let signals = run(&mut s, &[10.0, 10.0, 10.0]);
        assert_eq!(signals[2], Signal::Sell);
    }

    #[test]
    fn buys_below_lower_band() {
        // mean 10, sample std 2
        let mut tight = BollingerStrategy::new(3, 0.5).unwrap();
        assert_eq!(run(&mut tight, &[10.0, 12.0, 8.0])[2], Signal::Buy);

        let mut wide = BollingerStrategy::new(3, 1.0).unwrap();
        assert_eq!(run(&mut wide, &[10.0, 12.0, 8.0])[2], Signal::Hold);
    }

    #[test]
    fn daily_bars_revise_the_open_week() {
        let mut s = BollingerStrategy::new(2, 0.1).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut sig = |d: i64, c: f64| {
            s.next_bar(&Bar::new(monday + Duration::days(d)).with("close", c))
                .unwrap()
        };
        assert_eq!(sig(0, 10.0), Signal::Hold);
        // second week opens at 12: window [10, 12], mid 11 -> SELL
        assert_eq!(sig(7, 12.0), Signal::Sell);
        // same week revised down to 8: window [10, 8], mid 9, std ~1.41
        assert_eq!(sig(8, 8.0), Signal::Buy);
    }

    #[test]
    fn length_one_never_signals() {
        let mut s = BollingerStrategy::new(1, 2.0).unwrap();
        assert!(run(&mut s, &[1.0, 2.0, 3.0]).iter().all(Signal::is_hold));
    }

    #[test]
    fn zero_length_is_rejected() {
        let params = StrategyParams::from_pairs([("length", "0")]);
        assert!(BollingerStrategy::from_params(&params).is_err());
        let s = BollingerStrategy::from_params(&StrategyParams::new()).unwrap();
        assert_eq!(s.length(), 20);
    }
}
