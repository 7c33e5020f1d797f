//! Engine-owned position state and the trade log record.

use crate::domain::signal::{Side, Weights};
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    /// Fully invested in one instrument (`close` in single-asset mode).
    Long(String),
    /// Notional weights per instrument; the remainder is cash.
    Allocated(Weights),
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    /// 0 when flat, 1 otherwise.
    pub fn flag(&self) -> u8 {
        u8::from(!self.is_flat())
    }

    /// The instrument held by a single-instrument position.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Position::Long(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// Holdings as weights; a single instrument is weight 1.
    pub fn weights(&self) -> Weights {
        match self {
            Position::Flat => Weights::new(),
            Position::Long(symbol) => Weights::from([(symbol.clone(), 1.0)]),
            Position::Allocated(weights) => weights.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub side: Side,
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
}

impl Trade {
    pub fn buy(symbol: impl Into<String>, date: NaiveDate, price: f64) -> Self {
        Self {
            side: Side::Buy,
            symbol: symbol.into(),
            date,
            price,
        }
    }

    pub fn sell(symbol: impl Into<String>, date: NaiveDate, price: f64) -> Self {
        Self {
            side: Side::Sell,
            symbol: symbol.into(),
            date,
            price,
        }
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} @ {:.4}", self.date, self.side, self.symbol, self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert_eq!(Position::Flat.flag(), 0);
        assert_eq!(Position::Long("close".into()).flag(), 1);
        let book = Weights::from([("A".to_string(), 0.5)]);
        assert_eq!(Position::Allocated(book).flag(), 1);
    }

    #[test]
    fn symbol_only_for_single_holdings() {
        assert_eq!(Position::Long("SPY".into()).symbol(), Some("SPY"));
        assert_eq!(Position::Flat.symbol(), None);
        assert_eq!(Position::Allocated(Weights::new()).symbol(), None);
    }

    #[test]
    fn long_as_weights() {
        let w = Position::Long("SPY".into()).weights();
        assert_eq!(w.get("SPY"), Some(&1.0));
        assert!(Position::Flat.weights().is_empty());
    }

    #[test]
    fn trade_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Trade::buy("SPY", date, 10.0).to_string(), "2024-03-01 BUY SPY @ 10.0000");
    }
}
