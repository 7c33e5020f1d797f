//! Internal bar strength: where the close sits inside the bar's range.

use super::{Chronology, Strategy, StrategyParams};
use crate::domain::bar::Bar;
use crate::domain::error::TradebenchError;
use crate::domain::signal::Signal;

#[derive(Debug, Clone)]
pub struct IbsStrategy {
    buy_thr: f64,
    sell_thr: f64,
    clock: Chronology,
}

/// Column names holding high, low and close.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RangeColumns {
    high: String,
    low: String,
    close: String,
}

impl RangeColumns {
    /// Plain `high/low/close`, otherwise the first prefix `P` for which
    /// `P_high`, `P_low` and `P_close` all exist (suffixes compared
    /// case-insensitively).
    fn resolve(bar: &Bar) -> Result<Self, TradebenchError> {
        if bar.has_column("high") && bar.has_column("low") && bar.has_column("close") {
            return Ok(Self {
                high: "high".into(),
                low: "low".into(),
                close: "close".into(),
            });
        }
        let find = |prefix: &str, suffix: &str| {
            bar.columns()
                .find(|c| {
                    c.len() == prefix.len() + suffix.len()
                        && c.starts_with(prefix)
                        && c[prefix.len()..].eq_ignore_ascii_case(suffix)
                })
                .map(str::to_string)
        };
        for column in bar.columns() {
            let lower = column.to_ascii_lowercase();
            let Some(stem) = lower.strip_suffix("_high") else {
                continue;
            };
            let prefix = &column[..stem.len()];
            if let (Some(low), Some(close)) = (find(prefix, "_low"), find(prefix, "_close")) {
                return Ok(Self {
                    high: column.to_string(),
                    low,
                    close,
                });
            }
        }
        Err(TradebenchError::missing_column("high/low/close"))
    }
}

/// IBS in `[0, 1]`; 0.5 for a zero-range bar.
pub fn internal_bar_strength(high: f64, low: f64, close: f64) -> f64 {
    if high == low {
        0.5
    } else {
        (close - low) / (high - low)
    }
}

impl IbsStrategy {
    pub fn new(buy_thr: f64, sell_thr: f64) -> Self {
        Self {
            buy_thr,
            sell_thr,
            clock: Chronology::default(),
        }
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        Ok(Self::new(
            params.get_f64("buy_thr", 0.2)?,
            params.get_f64("sell_thr", 0.8)?,
        ))
    }
}

impl Default for IbsStrategy {
    fn default() -> Self {
        Self::new(0.2, 0.8)
    }
}

impl Strategy for IbsStrategy {
    fn name(&self) -> &str {
        "ibs"
    }

    fn reset(&mut self) {
        self.clock.reset();
    }

    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError> {
        self.clock.advance(bar.date)?;
        let cols = RangeColumns::resolve(bar)?;
        let ibs = internal_bar_strength(
            bar.require(&cols.high)?,
            bar.require(&cols.low)?,
            bar.require(&cols.close)?,
        );
        if ibs <= self.buy_thr {
            Ok(Signal::Buy)
        } else if ibs >= self.sell_thr {
            Ok(Signal::Sell)
        } else {
            Ok(Signal::Hold)
        }
    }
}
