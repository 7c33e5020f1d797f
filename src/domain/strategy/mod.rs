//! Strategy contract and the concrete strategy family.
//!
//! A strategy consumes one bar at a time, in date order, and answers with a
//! [`Signal`]. It keeps whatever history it needs internally and never sees
//! the engine's position state.

pub mod bollinger;
pub mod breakout;
pub mod covered_call;
pub mod dual_momentum;
pub mod eom_bond;
pub mod hfea55;
pub mod ibs;
pub mod leveraged_trend;
pub mod macd;
pub mod params;
pub mod registry;
pub mod rsi;

pub use bollinger::BollingerStrategy;
pub use breakout::BreakoutStrategy;
pub use covered_call::CoveredCallMedianStrategy;
pub use dual_momentum::DualMomentumStrategy;
pub use eom_bond::EndOfMonthBondPopStrategy;
pub use hfea55::Hfea55Strategy;
pub use ibs::IbsStrategy;
pub use leveraged_trend::LeveragedTrendStrategy;
pub use macd::MacdStrategy;
pub use params::StrategyParams;
pub use registry::{StrategyEntry, StrategyRegistry};
pub use rsi::RsiStrategy;

use crate::domain::bar::Bar;
use crate::domain::error::TradebenchError;
use crate::domain::signal::Signal;
use chrono::NaiveDate;

pub trait Strategy: Send {
    /// Registry id of the strategy.
    fn name(&self) -> &str;

    /// Clears all accumulated state so the instance can run again.
    fn reset(&mut self);

    /// Consumes the next bar. Bars must arrive in strictly increasing date
    /// order, otherwise `InvalidBarIndex` is returned.
    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError>;
}

/// Enforces strictly increasing bar dates.
#[derive(Debug, Clone, Default)]
pub struct Chronology {
    last: Option<NaiveDate>,
}

impl Chronology {
    pub fn advance(&mut self, date: NaiveDate) -> Result<(), TradebenchError> {
        if let Some(previous) = self.last {
            if date <= previous {
                return Err(TradebenchError::InvalidBarIndex { date, previous });
            }
        }
        self.last = Some(date);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn chronology_accepts_increasing_dates() {
        let mut clock = Chronology::default();
        assert!(clock.advance(date(2024, 1, 1)).is_ok());
        assert!(clock.advance(date(2024, 1, 2)).is_ok());
        assert!(clock.advance(date(2024, 2, 1)).is_ok());
    }

    #[test]
    fn chronology_rejects_repeats_and_regressions() {
        let mut clock = Chronology::default();
        clock.advance(date(2024, 1, 2)).unwrap();
        let err = clock.advance(date(2024, 1, 2)).unwrap_err();
        assert!(matches!(
            err,
            TradebenchError::InvalidBarIndex { date: d, previous: p }
                if d == date(2024, 1, 2) && p == date(2024, 1, 2)
        ));
        assert!(clock.advance(date(2024, 1, 1)).is_err());
    }

    #[test]
    fn chronology_reset_forgets_last_date() {
        let mut clock = Chronology::default();
        clock.advance(date(2024, 1, 2)).unwrap();
        clock.reset();
        assert!(clock.advance(date(2024, 1, 1)).is_ok());
    }
}
