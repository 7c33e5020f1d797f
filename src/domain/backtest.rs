//! Backtest engine: replays a price series through a strategy.
//!
//! Per bar the engine marks the position entering the bar to market using the
//! previous bar's closes, compounds equity, asks the strategy for a signal and
//! then applies it at this bar's prices.

use crate::domain::bar::{AssetMode, Bar, PriceSeries};
use crate::domain::error::TradebenchError;
use crate::domain::position::{Position, Trade};
use crate::domain::signal::{Signal, Weights};
use crate::domain::strategy::Strategy;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Symbol recorded for single-asset trades.
pub const SINGLE_ASSET_SYMBOL: &str = "close";

const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub date: NaiveDate,
    pub price: f64,
    pub position: u8,
    pub signal: Signal,
    pub equity: f64,
    pub drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BacktestResult {
    pub rows: Vec<ResultRow>,
    pub trades: Vec<Trade>,
}

impl BacktestResult {
    pub fn equity_curve(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.equity).collect()
    }

    pub fn drawdowns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.drawdown).collect()
    }

    /// Bar-over-bar equity returns, one fewer than the number of rows.
    pub fn returns(&self) -> Vec<f64> {
        self.rows
            .windows(2)
            .map(|w| {
                if w[0].equity != 0.0 {
                    w[1].equity / w[0].equity - 1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    pub fn final_equity(&self) -> f64 {
        self.rows.last().map_or(1.0, |r| r.equity)
    }

    pub fn last_signal(&self) -> Option<&Signal> {
        self.rows.last().map(|r| &r.signal)
    }
}

/// Mutable state of one run.
#[derive(Debug)]
struct Book {
    mode: AssetMode,
    position: Position,
    previous: HashMap<String, f64>,
    equity: f64,
    peak: f64,
}

impl Book {
    fn new(mode: AssetMode) -> Self {
        Self {
            mode,
            position: Position::Flat,
            previous: HashMap::new(),
            equity: 1.0,
            peak: 1.0,
        }
    }

    fn period_return(&self, symbol: &str, price: f64) -> f64 {
        if !price.is_finite() {
            return 0.0;
        }
        match self.previous.get(symbol) {
            Some(&prev) if prev != 0.0 && prev.is_finite() => (price - prev) / prev,
            _ => 0.0,
        }
    }

    /// Price reported for the bar and the return of the position entering it.
    /// Allocated weights drift with their instruments.
    fn mark(&mut self, bar: &Bar) -> Result<(f64, f64), TradebenchError> {
        let (price, ret, drifted) = match &self.position {
            Position::Long(symbol) => {
                let price = bar.require(symbol)?;
                (price, self.period_return(symbol, price), None)
            }
            Position::Allocated(weights) => {
                let mut ret = 0.0;
                let mut grown = Weights::new();
                for (ticker, &weight) in weights {
                    let r = self.period_return(ticker, bar.require(ticker)?);
                    ret += weight * r;
                    grown.insert(ticker.clone(), weight * (1.0 + r));
                }
                (0.0, ret, Some((grown, 1.0 + ret)))
            }
            Position::Flat => {
                let price = match self.mode {
                    AssetMode::Single => bar.close()?,
                    AssetMode::Multi => 0.0,
                };
                (price, 0.0, None)
            }
        };
        if let Some((grown, scale)) = drifted {
            if scale > 0.0 {
                let weights = grown.into_iter().map(|(t, w)| (t, w / scale)).collect();
                self.position = Position::Allocated(weights);
            }
        }
        Ok((price, ret))
    }

    fn apply(
        &mut self,
        signal: &Signal,
        bar: &Bar,
        trades: &mut Vec<Trade>,
    ) -> Result<(), TradebenchError> {
        match (self.mode, signal) {
            (_, Signal::Hold) => {}
            (AssetMode::Single, Signal::Buy) => {
                if self.position.is_flat() {
                    let price = bar.close()?;
                    self.position = Position::Long(SINGLE_ASSET_SYMBOL.to_string());
                    trades.push(Trade::buy(SINGLE_ASSET_SYMBOL, bar.date, price));
                }
            }
            (AssetMode::Single, Signal::Sell) => {
                if !self.position.is_flat() {
                    let price = bar.close()?;
                    self.position = Position::Flat;
                    trades.push(Trade::sell(SINGLE_ASSET_SYMBOL, bar.date, price));
                }
            }
            (AssetMode::Multi, Signal::Enter(ticker)) => self.enter(ticker, bar, trades)?,
            (AssetMode::Multi, Signal::Exit(ticker)) => self.exit(ticker, bar, trades)?,
            (AssetMode::Multi, Signal::Rebalance(targets)) => {
                self.rebalance(targets, bar, trades)?
            }
            (mode, other) => {
                warn!(
                    date = %bar.date,
                    signal = %other,
                    ?mode,
                    "signal ignored in this asset mode"
                );
            }
        }
        Ok(())
    }

    fn enter(
        &mut self,
        ticker: &str,
        bar: &Bar,
        trades: &mut Vec<Trade>,
    ) -> Result<(), TradebenchError> {
        if self.position.symbol() == Some(ticker) {
            return Ok(());
        }
        let buy_price = bar.require(ticker)?;
        let held = self.position.weights();
        let mut sells = Vec::new();
        for symbol in held.keys().filter(|s| s.as_str() != ticker) {
            sells.push(Trade::sell(symbol.clone(), bar.date, bar.require(symbol)?));
        }
        trades.extend(sells);
        if !held.contains_key(ticker) {
            trades.push(Trade::buy(ticker, bar.date, buy_price));
        }
        self.position = Position::Long(ticker.to_string());
        Ok(())
    }

    fn exit(
        &mut self,
        ticker: &str,
        bar: &Bar,
        trades: &mut Vec<Trade>,
    ) -> Result<(), TradebenchError> {
        let mut held = self.position.weights();
        if held.remove(ticker).is_none() {
            return Ok(());
        }
        trades.push(Trade::sell(ticker, bar.date, bar.require(ticker)?));
        self.position = match self.position {
            Position::Allocated(_) if !held.is_empty() => Position::Allocated(held),
            _ => Position::Flat,
        };
        Ok(())
    }

    fn rebalance(
        &mut self,
        targets: &Weights,
        bar: &Bar,
        trades: &mut Vec<Trade>,
    ) -> Result<(), TradebenchError> {
        validate_weights(targets)?;
        let targets: Weights = targets
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(t, w)| (t.clone(), *w))
            .collect();
        let held = self.position.weights();

        let mut pending = Vec::new();
        for symbol in held.keys().filter(|s| !targets.contains_key(*s)) {
            pending.push(Trade::sell(symbol.clone(), bar.date, bar.require(symbol)?));
        }
        for symbol in targets.keys().filter(|s| !held.contains_key(*s)) {
            pending.push(Trade::buy(symbol.clone(), bar.date, bar.require(symbol)?));
        }
        trades.extend(pending);

        self.position = if targets.is_empty() {
            Position::Flat
        } else {
            Position::Allocated(targets)
        };
        Ok(())
    }

    fn remember(&mut self, bar: &Bar) {
        self.previous.clear();
        self.previous
            .extend(bar.values.iter().map(|(k, v)| (k.clone(), *v)));
    }
}

fn validate_weights(weights: &Weights) -> Result<(), TradebenchError> {
    if let Some((ticker, w)) = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
        return Err(TradebenchError::InvalidSignal {
            reason: format!("weight for {ticker} must be finite and non-negative, got {w}"),
        });
    }
    let total: f64 = weights.values().sum();
    if total > 1.0 + WEIGHT_TOLERANCE {
        return Err(TradebenchError::InvalidSignal {
            reason: format!("weights sum to {total}, more than 1"),
        });
    }
    Ok(())
}

pub struct Backtester {
    strategy: Box<dyn Strategy>,
    series: PriceSeries,
    mode: AssetMode,
    trades: Vec<Trade>,
}

impl Backtester {
    pub fn new(strategy: Box<dyn Strategy>, series: PriceSeries, mode: AssetMode) -> Self {
        Self {
            strategy,
            series,
            mode,
            trades: Vec::new(),
        }
    }

    /// Picks the mode from the series' columns.
    pub fn with_detected_mode(strategy: Box<dyn Strategy>, series: PriceSeries) -> Self {
        let mode = AssetMode::detect(&series);
        Self::new(strategy, series, mode)
    }

    pub fn mode(&self) -> AssetMode {
        self.mode
    }

    /// Trades of the most recent run.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn run(&mut self) -> Result<BacktestResult, TradebenchError> {
        self.strategy.reset();
        self.trades.clear();
        debug!(
            strategy = self.strategy.name(),
            bars = self.series.len(),
            mode = ?self.mode,
            "backtest starting"
        );

        let mut book = Book::new(self.mode);
        let mut rows = Vec::with_capacity(self.series.len());
        for bar in self.series.bars() {
            let (price, ret) = book.mark(bar)?;
            book.equity *= 1.0 + ret;
            book.peak = book.peak.max(book.equity);
            let drawdown = book.equity / book.peak - 1.0;

            let signal = self.strategy.next_bar(bar)?;
            let before = self.trades.len();
            book.apply(&signal, bar, &mut self.trades)?;
            for trade in &self.trades[before..] {
                debug!(%trade, "trade");
            }

            rows.push(ResultRow {
                date: bar.date,
                price,
                position: book.position.flag(),
                signal,
                equity: book.equity,
                drawdown,
            });
            book.remember(bar);
        }

        debug!(
            strategy = self.strategy.name(),
            trades = self.trades.len(),
            final_equity = book.equity,
            "backtest finished"
        );
        Ok(BacktestResult {
            rows,
            trades: self.trades.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Side;
    use crate::domain::strategy::IbsStrategy;
    use approx::assert_relative_eq;
    use chrono::Duration;

    struct Scripted {
        script: Vec<Signal>,
        cursor: usize,
    }

    impl Scripted {
        fn boxed(script: &[&str]) -> Box<dyn Strategy> {
            Box::new(Self {
                script: script.iter().map(|s| s.parse().unwrap()).collect(),
                cursor: 0,
            })
        }
    }

    impl Strategy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn reset(&mut self) {
            self.cursor = 0;
        }

        fn next_bar(&mut self, _bar: &Bar) -> Result<Signal, TradebenchError> {
            let signal = self.script.get(self.cursor).cloned().unwrap_or(Signal::Hold);
            self.cursor += 1;
            Ok(signal)
        }
    }

    fn day(n: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(n as i64)
    }

    fn single(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(day(i)).with("close", c))
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn multi(rows: &[&[(&str, f64)]]) -> PriceSeries {
        let bars = rows
            .iter()
            .enumerate()
            .map(|(i, cols)| {
                cols.iter()
                    .fold(Bar::new(day(i)), |bar, (t, v)| bar.with(*t, *v))
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn weights(pairs: &[(&str, f64)]) -> Weights {
        pairs.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    #[test]
    fn non_finite_price_earns_nothing() {
        let series = single(&[10.0, f64::NAN, 11.0, f64::INFINITY, 12.0]);
        let mut bt = Backtester::new(Scripted::boxed(&["BUY"]), series, AssetMode::Single);

        let result = bt.run().unwrap();

        assert!(result.rows.iter().all(|r| r.equity == 1.0));
        assert!(result.rows.iter().all(|r| r.drawdown == 0.0));
    }

    #[test]
    fn single_asset_compounds_while_long() {
        let series = single(&[10.0, 11.0, 12.1, 11.0]);
        let mut bt = Backtester::new(
            Scripted::boxed(&["BUY", "HOLD", "SELL", "HOLD"]),
            series,
            AssetMode::Single,
        );
        let result = bt.run().unwrap();
        let equity = result.equity_curve();
        assert_relative_eq!(equity[0], 1.0);
        assert_relative_eq!(equity[1], 1.1, epsilon = 1e-12);
        assert_relative_eq!(equity[2], 1.21, epsilon = 1e-12);
        assert_relative_eq!(equity[3], 1.21, epsilon = 1e-12);
        assert_eq!(
            result.rows.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![1, 1, 0, 0]
        );
        assert_eq!(
            result.trades,
            vec![
                Trade::buy("close", day(0), 10.0),
                Trade::sell("close", day(2), 12.1)
            ]
        );
        // single-asset rows always report the close
        assert_eq!(result.rows[3].price, 11.0);
    }

    #[test]
    fn drawdown_tracks_peak() {
        let series = single(&[10.0, 5.0, 10.0, 12.0]);
        let mut bt = Backtester::new(Scripted::boxed(&["BUY"]), series, AssetMode::Single);
        let result = bt.run().unwrap();
        let dd = result.drawdowns();
        assert_relative_eq!(dd[0], 0.0);
        assert_relative_eq!(dd[1], -0.5, epsilon = 1e-12);
        assert_relative_eq!(dd[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(dd[3], 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.final_equity(), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn repeated_buy_is_ignored_while_long() {
        let series = single(&[10.0, 11.0, 12.0]);
        let mut bt = Backtester::new(
            Scripted::boxed(&["BUY", "BUY", "SELL"]),
            series,
            AssetMode::Single,
        );
        let result = bt.run().unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].side, Side::Buy);
        assert_eq!(result.trades[1].side, Side::Sell);
    }

    #[test]
    fn multi_asset_switch_sells_before_buying() {
        let series = multi(&[
            &[("A", 10.0), ("B", 20.0)],
            &[("A", 11.0), ("B", 21.0)],
            &[("A", 12.0), ("B", 22.0)],
        ]);
        let mut bt = Backtester::new(
            Scripted::boxed(&["BUY:A", "BUY:B", "SELL:B"]),
            series,
            AssetMode::Multi,
        );
        let result = bt.run().unwrap();
        assert_eq!(
            result.trades,
            vec![
                Trade::buy("A", day(0), 10.0),
                Trade::sell("A", day(1), 11.0),
                Trade::buy("B", day(1), 21.0),
                Trade::sell("B", day(2), 22.0),
            ]
        );
        // price is 0 while flat, otherwise the held instrument
        let prices: Vec<f64> = result.rows.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![0.0, 11.0, 22.0]);
        assert_relative_eq!(result.final_equity(), 1.1 * (22.0 / 21.0), epsilon = 1e-12);
    }

    #[test]
    fn enter_same_ticker_is_noop_and_exit_other_is_ignored() {
        let series = multi(&[&[("A", 10.0)], &[("A", 11.0)], &[("A", 12.0)]]);
        let mut bt = Backtester::new(
            Scripted::boxed(&["BUY:A", "BUY:A", "SELL:B"]),
            series,
            AssetMode::Multi,
        );
        let result = bt.run().unwrap();
        assert_eq!(result.trades, vec![Trade::buy("A", day(0), 10.0)]);
    }

    #[test]
    fn rebalance_accrues_weighted_returns_with_drift() {
        let series = multi(&[
            &[("A", 100.0), ("B", 100.0)],
            &[("A", 110.0), ("B", 90.0)],
            &[("A", 121.0), ("B", 90.0)],
        ]);
        let mut bt = Backtester::new(
            Scripted::boxed(&["REBALANCE[A=0.5;B=0.5]"]),
            series,
            AssetMode::Multi,
        );
        let result = bt.run().unwrap();
        let equity = result.equity_curve();
        assert_relative_eq!(equity[1], 1.0, epsilon = 1e-12);
        // drifted weights 0.55 / 0.45; A +10%, B flat
        assert_relative_eq!(equity[2], 1.055, epsilon = 1e-12);
        assert_eq!(
            result.trades,
            vec![Trade::buy("A", day(0), 100.0), Trade::buy("B", day(0), 100.0)]
        );
        assert!(result.rows.iter().all(|r| r.position == 1 && r.price == 0.0));
    }

    #[test]
    fn rebalance_sells_dropped_names_first() {
        let series = multi(&[
            &[("A", 1.0), ("B", 2.0), ("C", 3.0)],
            &[("A", 1.0), ("B", 2.0), ("C", 3.0)],
        ]);
        let mut bt = Backtester::new(
            Scripted::boxed(&["REBALANCE[A=0.5;B=0.5]", "REBALANCE[B=0.4;C=0.6]"]),
            series,
            AssetMode::Multi,
        );
        let trades = bt.run().unwrap().trades;
        assert_eq!(
            trades[2..],
            [Trade::sell("A", day(1), 1.0), Trade::buy("C", day(1), 3.0)]
        );
    }

    #[test]
    fn overweight_rebalance_is_invalid() {
        let series = multi(&[&[("A", 1.0), ("B", 1.0)]]);
        let mut bt = Backtester::new(
            Scripted::boxed(&["REBALANCE[A=0.7;B=0.5]"]),
            series,
            AssetMode::Multi,
        );
        assert!(matches!(bt.run(), Err(TradebenchError::InvalidSignal { .. })));
    }

    #[test]
    fn negative_weight_is_invalid() {
        assert!(validate_weights(&weights(&[("A", -0.1)])).is_err());
        assert!(validate_weights(&weights(&[("A", f64::NAN)])).is_err());
        assert!(validate_weights(&weights(&[("A", 0.55), ("B", 0.45)])).is_ok());
    }

    #[test]
    fn mismatched_signal_shapes_are_ignored() {
        let series = single(&[1.0, 2.0]);
        let mut bt = Backtester::new(
            Scripted::boxed(&["BUY:A", "REBALANCE[A=1]"]),
            series,
            AssetMode::Single,
        );
        let result = bt.run().unwrap();
        assert!(result.trades.is_empty());

        let series = multi(&[&[("A", 1.0)]]);
        let mut bt = Backtester::new(Scripted::boxed(&["BUY"]), series, AssetMode::Multi);
        assert!(bt.run().unwrap().trades.is_empty());
    }

    #[test]
    fn run_is_repeatable() {
        let series = single(&[10.0, 12.0, 9.0, 11.0, 13.0]);
        let mut bt = Backtester::new(
            Scripted::boxed(&["BUY", "SELL", "BUY", "HOLD", "SELL"]),
            series,
            AssetMode::Single,
        );
        let first = bt.run().unwrap();
        let second = bt.run().unwrap();
        assert_eq!(first, second);
        assert_eq!(bt.trades(), second.trades.as_slice());
    }

    #[test]
    fn strategy_errors_propagate() {
        let series = multi(&[&[("A", 1.0)]]);
        let mut bt = Backtester::new(Box::new(IbsStrategy::default()), series, AssetMode::Multi);
        assert!(matches!(bt.run(), Err(TradebenchError::MissingColumn { .. })));
    }

    #[test]
    fn rows_match_bars() {
        let series = single(&[1.0, 2.0, 3.0]);
        let mut bt = Backtester::with_detected_mode(Scripted::boxed(&[]), series);
        assert_eq!(bt.mode(), AssetMode::Single);
        let result = bt.run().unwrap();
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.returns().len(), 2);
    }
}
