//! Trading signals emitted by strategies.
//!
//! The legacy string forms (`BUY`, `SELL`, `HOLD`, `BUY:<ticker>`,
//! `SELL:<ticker>`) are kept for display and parsing only.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Ticker → fraction of equity.
pub type Weights = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Hold,
    /// Go long the single instrument.
    Buy,
    /// Go flat on the single instrument.
    Sell,
    /// Hold this instrument, selling any other first.
    Enter(String),
    /// Stop holding this instrument.
    Exit(String),
    /// Target notional weights. Never empty; see [`Signal::rebalance`].
    Rebalance(Weights),
}

impl Signal {
    /// An empty mapping means "no rebalance this bar".
    pub fn rebalance(weights: Weights) -> Self {
        if weights.is_empty() {
            Signal::Hold
        } else {
            Signal::Rebalance(weights)
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Signal::Hold)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Hold => write!(f, "HOLD"),
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Enter(ticker) => write!(f, "BUY:{}", ticker),
            Signal::Exit(ticker) => write!(f, "SELL:{}", ticker),
            Signal::Rebalance(weights) => {
                let parts: Vec<String> = weights
                    .iter()
                    .map(|(ticker, w)| format!("{}={}", ticker, w))
                    .collect();
                write!(f, "REBALANCE[{}]", parts.join(";"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised signal '{0}'")]
pub struct SignalParseError(pub String);

impl FromStr for Signal {
    type Err = SignalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "HOLD" => return Ok(Signal::Hold),
            "BUY" => return Ok(Signal::Buy),
            "SELL" => return Ok(Signal::Sell),
            _ => {}
        }
        let ticker_of = |rest: &str| {
            if rest.is_empty() {
                Err(SignalParseError(s.to_string()))
            } else {
                Ok(rest.to_string())
            }
        };
        if let Some(rest) = trimmed.strip_prefix("BUY:") {
            return ticker_of(rest).map(Signal::Enter);
        }
        if let Some(rest) = trimmed.strip_prefix("SELL:") {
            return ticker_of(rest).map(Signal::Exit);
        }
        if let Some(body) = trimmed
            .strip_prefix("REBALANCE[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let mut weights = Weights::new();
            for part in body.split(';').filter(|p| !p.trim().is_empty()) {
                let (ticker, weight) = part
                    .split_once('=')
                    .ok_or_else(|| SignalParseError(s.to_string()))?;
                let weight = weight
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| SignalParseError(s.to_string()))?;
                weights.insert(ticker_of(ticker.trim())?, weight);
            }
            return Ok(Signal::rebalance(weights));
        }
        Err(SignalParseError(s.to_string()))
    }
}

/// Direction of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_legacy_forms() {
        assert_eq!(Signal::Hold.to_string(), "HOLD");
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(Signal::Sell.to_string(), "SELL");
        assert_eq!(Signal::Enter("SPY".into()).to_string(), "BUY:SPY");
        assert_eq!(Signal::Exit("TLT".into()).to_string(), "SELL:TLT");
    }

    #[test]
    fn display_rebalance() {
        let weights = Weights::from([("3TYL".to_string(), 0.45), ("3USL".to_string(), 0.55)]);
        assert_eq!(
            Signal::Rebalance(weights).to_string(),
            "REBALANCE[3TYL=0.45;3USL=0.55]"
        );
    }

    #[test]
    fn parse_legacy_forms() {
        assert_eq!("HOLD".parse::<Signal>().unwrap(), Signal::Hold);
        assert_eq!("BUY".parse::<Signal>().unwrap(), Signal::Buy);
        assert_eq!(" SELL ".parse::<Signal>().unwrap(), Signal::Sell);
        assert_eq!(
            "BUY:AAA".parse::<Signal>().unwrap(),
            Signal::Enter("AAA".into())
        );
        assert_eq!(
            "SELL:BBB".parse::<Signal>().unwrap(),
            Signal::Exit("BBB".into())
        );
    }

    #[test]
    fn parse_rebalance() {
        let expected = Weights::from([("3TYL".to_string(), 0.45), ("3USL".to_string(), 0.55)]);
        assert_eq!(
            "REBALANCE[3TYL=0.45;3USL=0.55]".parse::<Signal>().unwrap(),
            Signal::Rebalance(expected)
        );
        assert_eq!("REBALANCE[]".parse::<Signal>().unwrap(), Signal::Hold);
        assert!("REBALANCE[A=x]".parse::<Signal>().is_err());
        assert!("REBALANCE[A]".parse::<Signal>().is_err());
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("buy".parse::<Signal>().is_err());
        assert!("BUY:".parse::<Signal>().is_err());
        assert!("SHORT".parse::<Signal>().is_err());
    }

    #[test]
    fn empty_rebalance_is_hold() {
        assert_eq!(Signal::rebalance(Weights::new()), Signal::Hold);
        assert!(Signal::rebalance(Weights::new()).is_hold());
        let w = Weights::from([("A".to_string(), 1.0)]);
        assert_eq!(Signal::rebalance(w.clone()), Signal::Rebalance(w));
    }
}
