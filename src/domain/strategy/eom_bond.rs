//! Hold a bond ETF over the last business days of each month.

use super::{Chronology, Strategy, StrategyParams};
use crate::domain::bar::Bar;
use crate::domain::calendar::{business_month_end_on_or_after, sub_business_days};
use crate::domain::error::TradebenchError;
use crate::domain::signal::Signal;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct EndOfMonthBondPopStrategy {
    hold_days: u32,
    clock: Chronology,
    long: bool,
}

impl EndOfMonthBondPopStrategy {
    pub fn new(hold_days: usize) -> Result<Self, TradebenchError> {
        let hold_days = u32::try_from(hold_days)
            .map_err(|_| TradebenchError::invalid_parameter("hold_days", "too large"))?;
        Ok(Self {
            hold_days,
            clock: Chronology::default(),
            long: false,
        })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        Self::new(params.get_usize("hold_days", 7)?)
    }

    /// True when `date` falls in the last `hold_days` business days up to
    /// the coming business month end.
    pub fn in_window(&self, date: NaiveDate) -> bool {
        if self.hold_days == 0 {
            return false;
        }
        let end = business_month_end_on_or_after(date);
        let start = sub_business_days(end, self.hold_days - 1);
        start <= date && date <= end
    }
}

impl Strategy for EndOfMonthBondPopStrategy {
    fn name(&self) -> &str {
        "eom_bond"
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.long = false;
    }

    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError> {
        self.clock.advance(bar.date)?;
        let active = self.in_window(bar.date);
        if !self.long && active {
            self.long = true;
            return Ok(Signal::Buy);
        }
        if self.long && !active {
            self.long = false;
            return Ok(Signal::Sell);
        }
        Ok(Signal::Hold)
    }
}
