//! Weekly-high breakout with a trailing stop and a 200-day SMA exit.

use super::{Chronology, Strategy, StrategyParams};
use crate::domain::bar::Bar;
use crate::domain::error::TradebenchError;
use crate::domain::indicator::{
    Incremental, RollingMax, RollingWindow, WeeklyCloses, WeeklyUpdate,
};
use crate::domain::signal::Signal;

const SMA_DAYS: usize = 200;

#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    lookback_weeks: usize,
    stop_pct: f64,
    clock: Chronology,
    weekly: WeeklyCloses,
    /// Closes of the last `lookback_weeks` completed weeks.
    prior_highs: RollingMax,
    daily_sma: RollingWindow,
    long: bool,
    peak: Option<f64>,
}

impl BreakoutStrategy {
    pub fn new(lookback_weeks: usize, stop_pct: f64) -> Result<Self, TradebenchError> {
        if !(0.0..1.0).contains(&stop_pct) {
            return Err(TradebenchError::invalid_parameter(
                "stop_pct",
                "must be in [0, 1)",
            ));
        }
        Ok(Self {
            lookback_weeks,
            stop_pct,
            clock: Chronology::default(),
            weekly: WeeklyCloses::new(),
            prior_highs: RollingMax::new(lookback_weeks),
            daily_sma: RollingWindow::new(SMA_DAYS),
            long: false,
            peak: None,
        })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        Self::new(
            params.get_usize("lookback_weeks", 52)?,
            params.get_f64("stop_pct", 0.08)?,
        )
    }

    pub fn lookback_weeks(&self) -> usize {
        self.lookback_weeks
    }
}

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &str {
        "breakout"
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.weekly = WeeklyCloses::new();
        self.prior_highs.clear();
        self.daily_sma.clear();
        self.long = false;
        self.peak = None;
    }

    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError> {
        self.clock.advance(bar.date)?;
        let close = bar.close()?;

        if self.weekly.push(bar.date, close) == WeeklyUpdate::NewWeek {
            if let Some(done) = self.weekly.last_completed() {
                self.prior_highs.push(done);
            }
        }
        let week_close = close;
        let highest = self.prior_highs.max().unwrap_or(f64::NEG_INFINITY);

        self.daily_sma.push(close);
        let sma = self.daily_sma.mean();

        if !self.long {
            if week_close > highest {
                self.long = true;
                self.peak = Some(week_close);
                return Ok(Signal::Buy);
            }
            return Ok(Signal::Hold);
        }

        let peak = self.peak.map_or(week_close, |p| p.max(week_close));
        self.peak = Some(peak);
        let stopped = week_close < peak * (1.0 - self.stop_pct);
        let below_trend = sma.is_some_and(|s| close < s);
        if stopped || below_trend {
            self.long = false;
            self.peak = None;
            return Ok(Signal::Sell);
        }
        Ok(Signal::Hold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn friday(week: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap() + Duration::weeks(week)
    }

    fn run(strategy: &mut BreakoutStrategy, closes: &[f64]) -> Vec<Signal> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let bar = Bar::new(friday(i as i64)).with("close", c);
                strategy.next_bar(&bar).unwrap()
            })
            .collect()
    }

    #[test]
    fn first_bar_buys_on_empty_window() {
        let mut s = BreakoutStrategy::new(2, 0.1).unwrap();
        assert_eq!(run(&mut s, &[10.0]), vec![Signal::Buy]);
    }

    #[test]
    fn trailing_stop_then_new_breakout() {
        let mut s = BreakoutStrategy::new(2, 0.1).unwrap();
        let signals = run(&mut s, &[10.0, 9.0, 8.5, 9.5]);
        // 9.0 is not below 10 * 0.9; 8.5 is. 9.5 clears the 2-week max of 9.0.
        assert_eq!(
            signals,
            vec![Signal::Buy, Signal::Hold, Signal::Sell, Signal::Buy]
        );
    }

    #[test]
    fn peak_ratchets_up_while_long() {
        let mut s = BreakoutStrategy::new(1, 0.1).unwrap();
        let signals = run(&mut s, &[10.0, 20.0, 18.5, 17.9]);
        assert_eq!(
            signals,
            vec![Signal::Buy, Signal::Hold, Signal::Hold, Signal::Sell]
        );
    }

    #[test]
    fn no_breakout_while_below_prior_high() {
        let mut s = BreakoutStrategy::new(4, 0.05).unwrap();
        let signals = run(&mut s, &[10.0, 5.0, 9.0, 9.5, 10.0, 10.5]);
        // 10.0 only ties the prior high; 10.5 clears max(5, 9, 9.5, 10)
        assert_eq!(
            signals,
            vec![
                Signal::Buy,
                Signal::Sell,
                Signal::Hold,
                Signal::Hold,
                Signal::Hold,
                Signal::Buy
            ]
        );
    }

    #[test]
    fn intra_week_bars_compare_against_completed_weeks_only() {
        let mut s = BreakoutStrategy::new(1, 0.5).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let sig = |s: &mut BreakoutStrategy, d: NaiveDate, c: f64| {
            s.next_bar(&Bar::new(d).with("close", c)).unwrap()
        };
        assert_eq!(sig(&mut s, monday, 10.0), Signal::Buy);
        // same week, long: 9.0 is above the 50% stop
        assert_eq!(sig(&mut s, monday + Duration::days(1), 9.0), Signal::Hold);
        // same week, price collapses below the stop measured from peak 10
        assert_eq!(sig(&mut s, monday + Duration::days(2), 4.0), Signal::Sell);
        // next week: the completed week closed at 4.0, so 4.5 breaks out
        assert_eq!(sig(&mut s, monday + Duration::days(7), 4.5), Signal::Buy);
    }

    #[test]
    fn sma_exit_after_two_hundred_days() {
        let mut s = BreakoutStrategy::new(0, 0.99).unwrap();
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut last = Signal::Hold;
        for i in 0..200 {
            let bar = Bar::new(start + Duration::days(i)).with("close", 100.0);
            last = s.next_bar(&bar).unwrap();
        }
        // long since day one, never stopped
        assert_eq!(last, Signal::Hold);
        let bar = Bar::new(start + Duration::days(200)).with("close", 99.0);
        assert_eq!(s.next_bar(&bar).unwrap(), Signal::Sell);
    }

    #[test]
    fn rejects_out_of_order_bars() {
        let mut s = BreakoutStrategy::new(2, 0.1).unwrap();
        s.next_bar(&Bar::new(friday(1)).with("close", 1.0)).unwrap();
        let err = s.next_bar(&Bar::new(friday(0)).with("close", 1.0));
        assert!(matches!(err, Err(TradebenchError::InvalidBarIndex { .. })));
    }

    #[test]
    fn missing_close_is_reported() {
        let mut s = BreakoutStrategy::new(2, 0.1).unwrap();
        let err = s.next_bar(&Bar::new(friday(0)).with("open", 1.0));
        assert!(
            matches!(err, Err(TradebenchError::MissingColumn { ref column }) if column == "close")
        );
    }

    #[test]
    fn reset_replays_identically() {
        let closes = [10.0, 9.0, 8.5, 9.5, 12.0, 7.0];
        let mut s = BreakoutStrategy::new(2, 0.1).unwrap();
        let first = run(&mut s, &closes);
        s.reset();
        assert_eq!(run(&mut s, &closes), first);
    }

    #[test]
    fn from_params_defaults_and_validation() {
        let s = BreakoutStrategy::from_params(&StrategyParams::new()).unwrap();
        assert_eq!(s.lookback_weeks(), 52);
        let bad = StrategyParams::from_pairs([("stop_pct", "1.5")]);
        assert!(BreakoutStrategy::from_params(&bad).is_err());
    }
}
