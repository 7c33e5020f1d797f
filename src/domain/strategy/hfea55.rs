//! Fixed 55/45 allocation between a leveraged equity and a leveraged bond
//! fund, rebalanced at business month ends.

use super::{Chronology, Strategy, StrategyParams};
use crate::domain::bar::Bar;
use crate::domain::calendar::is_business_month_end;
use crate::domain::error::TradebenchError;
use crate::domain::signal::{Signal, Weights};
use chrono::NaiveDate;

const EQUITY_WEIGHT: f64 = 0.55;
const BOND_WEIGHT: f64 = 0.45;

#[derive(Debug, Clone)]
pub struct Hfea55Strategy {
    rebalance_days: i64,
    equity_ticker: String,
    bond_ticker: String,
    clock: Chronology,
    last_rebalance: Option<NaiveDate>,
}

impl Hfea55Strategy {
    pub fn new(
        rebalance_days: usize,
        equity_ticker: impl Into<String>,
        bond_ticker: impl Into<String>,
    ) -> Result<Self, TradebenchError> {
        let equity_ticker = equity_ticker.into();
        let bond_ticker = bond_ticker.into();
        if equity_ticker == bond_ticker {
            return Err(TradebenchError::invalid_parameter(
                "bond_ticker",
                "must differ from equity_ticker",
            ));
        }
        let rebalance_days = i64::try_from(rebalance_days)
            .map_err(|_| TradebenchError::invalid_parameter("rebalance_days", "too large"))?;
        Ok(Self {
            rebalance_days,
            equity_ticker,
            bond_ticker,
            clock: Chronology::default(),
            last_rebalance: None,
        })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        Self::new(
            params.get_usize("rebalance_days", 21)?,
            params.get_str("equity_ticker").unwrap_or("3USL"),
            params.get_str("bond_ticker").unwrap_or("3TYL"),
        )
    }

    pub fn target_weights(&self) -> Weights {
        Weights::from([
            (self.equity_ticker.clone(), EQUITY_WEIGHT),
            (self.bond_ticker.clone(), BOND_WEIGHT),
        ])
    }

    fn due(&self, date: NaiveDate) -> bool {
        match self.last_rebalance {
            None => true,
            Some(last) => {
                is_business_month_end(date) && (date - last).num_days() >= self.rebalance_days
            }
        }
    }
}

impl Strategy for Hfea55Strategy {
    fn name(&self) -> &str {
        "hfea55"
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.last_rebalance = None;
    }

    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError> {
        self.clock.advance(bar.date)?;
        if !self.due(bar.date) {
            return Ok(Signal::Hold);
        }
        self.last_rebalance = Some(bar.date);
        Ok(Signal::rebalance(self.target_weights()))
    }
}
