//! Name → strategy factory table.

use super::params::GridAxis;
use super::{
    BollingerStrategy, BreakoutStrategy, CoveredCallMedianStrategy, DualMomentumStrategy,
    EndOfMonthBondPopStrategy, Hfea55Strategy, IbsStrategy, LeveragedTrendStrategy,
    MacdStrategy, RsiStrategy, Strategy, StrategyParams,
};
use crate::domain::error::TradebenchError;

pub type StrategyFactory = fn(&StrategyParams) -> Result<Box<dyn Strategy>, TradebenchError>;

pub struct StrategyEntry {
    pub id: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    /// Keys the factory reads; anything else is rejected.
    pub params: &'static [&'static str],
    /// Sweep used when no parameters are configured.
    pub default_grid: &'static [(&'static str, &'static [&'static str])],
    pub factory: StrategyFactory,
}

impl StrategyEntry {
    pub fn matches(&self, name: &str) -> bool {
        self.id.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    pub fn default_axes(&self) -> Vec<GridAxis> {
        self.default_grid
            .iter()
            .map(|(key, values)| {
                (
                    key.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    pub fn create(&self, params: &StrategyParams) -> Result<Box<dyn Strategy>, TradebenchError> {
        self.check_keys(params)?;
        (self.factory)(params)
    }

    fn check_keys(&self, params: &StrategyParams) -> Result<(), TradebenchError> {
        match params
            .iter()
            .find(|(key, _)| !self.params.iter().any(|known| known == key))
        {
            Some((key, _)) => Err(TradebenchError::invalid_parameter(
                key,
                format!(
                    "not a parameter of {} (expected one of: {})",
                    self.id,
                    self.params.join(", ")
                ),
            )),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for StrategyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyEntry")
            .field("id", &self.id)
            .field("aliases", &self.aliases)
            .finish()
    }
}

fn boxed<S: Strategy + 'static>(strategy: S) -> Box<dyn Strategy> {
    Box::new(strategy)
}

#[derive(Debug)]
pub struct StrategyRegistry {
    entries: Vec<StrategyEntry>,
}

impl StrategyRegistry {
    pub fn builtin() -> Self {
        let entries = vec![
            StrategyEntry {
                id: "breakout",
                aliases: &[],
                description: "Weekly-high breakout with trailing stop and 200-day SMA exit",
                params: &["lookback_weeks", "stop_pct"],
                default_grid: &[],
                factory: |p| BreakoutStrategy::from_params(p).map(boxed),
            },
            StrategyEntry {
                id: "boll",
                aliases: &["bollinger"],
                description: "Weekly Bollinger band mean reversion",
                params: &["length", "dev"],
                default_grid: &[],
                factory: |p| BollingerStrategy::from_params(p).map(boxed),
            },
            StrategyEntry {
                id: "rsi",
                aliases: &[],
                description: "Weekly Wilder RSI mean reversion",
                params: &["rsi_buy", "rsi_sell", "length"],
                default_grid: &[],
                factory: |p| RsiStrategy::from_params(p).map(boxed),
            },
            StrategyEntry {
                id: "macd",
                aliases: &[],
                description: "Weekly MACD signal-line crossover",
                params: &["fast", "slow", "signal"],
                default_grid: &[],
                factory: |p| MacdStrategy::from_params(p).map(boxed),
            },
            StrategyEntry {
                id: "covered_call_median",
                aliases: &[],
                description: "Daily median band reversion (window)",
                params: &["band", "window"],
                default_grid: &[],
                factory: |p| CoveredCallMedianStrategy::from_params(p).map(boxed),
            },
            StrategyEntry {
                id: "median_cc",
                aliases: &[],
                description: "Daily median band reversion (median_len)",
                params: &["band", "median_len"],
                default_grid: &[("band", &["0.005", "0.01", "0.015"])],
                factory: |p| CoveredCallMedianStrategy::from_median_cc_params(p).map(boxed),
            },
            StrategyEntry {
                id: "dual_mom",
                aliases: &["dual_momentum"],
                description: "Month-end momentum rotation across a universe",
                params: &["universe", "lookback_weeks", "top_k"],
                default_grid: &[],
                factory: |p| DualMomentumStrategy::from_params(p).map(boxed),
            },
            StrategyEntry {
                id: "leveragedtrend",
                aliases: &["leveraged_trend"],
                description: "Weekly SMA trend filter",
                params: &["sma_len", "sma_weeks"],
                default_grid: &[("sma_len", &["150", "200", "250"])],
                factory: |p| LeveragedTrendStrategy::from_params(p).map(boxed),
            },
            StrategyEntry {
                id: "eom_bond",
                aliases: &[],
                description: "Hold bonds over the last business days of the month",
                params: &["hold_days"],
                default_grid: &[("hold_days", &["5", "7", "9"])],
                factory: |p| EndOfMonthBondPopStrategy::from_params(p).map(boxed),
            },
            StrategyEntry {
                id: "hfea55",
                aliases: &[],
                description: "55/45 leveraged equity/bond allocation, monthly rebalance",
                params: &["rebalance_days", "equity_ticker", "bond_ticker"],
                default_grid: &[("rebalance_days", &["20", "21", "22"])],
                factory: |p| Hfea55Strategy::from_params(p).map(boxed),
            },
            StrategyEntry {
                id: "ibs",
                aliases: &[],
                description: "Internal bar strength",
                params: &["buy_thr", "sell_thr"],
                default_grid: &[],
                factory: |p| IbsStrategy::from_params(p).map(boxed),
            },
        ];
        Self { entries }
    }

    pub fn entries(&self) -> &[StrategyEntry] {
        &self.entries
    }

    /// Case-insensitive lookup by id or alias.
    pub fn find(&self, name: &str) -> Option<&StrategyEntry> {
        let name = name.trim();
        self.entries.iter().find(|e| e.matches(name))
    }

    pub fn get(&self, name: &str) -> Result<&StrategyEntry, TradebenchError> {
        self.find(name).ok_or_else(|| TradebenchError::UnknownStrategy {
            name: name.to_string(),
        })
    }

    pub fn create(
        &self,
        name: &str,
        params: &StrategyParams,
    ) -> Result<Box<dyn Strategy>, TradebenchError> {
        self.get(name)?.create(params)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
