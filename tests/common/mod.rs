#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use tradebench::domain::backtest::BacktestResult;
use tradebench::domain::bar::Bar;
use tradebench::domain::calendar::is_business_day;
use tradebench::domain::error::TradebenchError;
use tradebench::domain::signal::Signal;
use tradebench::domain::strategy::Strategy;
use tradebench::ports::data_port::DataPort;
use tradebench::ports::report_port::{ReportPort, RunLabel};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days starting at `start`, one close each.
pub fn close_bars(start: NaiveDate, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(start + Duration::days(i as i64)).with("close", c))
        .collect()
}

/// Weekday-only bars starting at `start` (which should be a weekday).
pub fn business_close_bars(start: NaiveDate, closes: &[f64]) -> Vec<Bar> {
    let mut day = start;
    let mut bars = Vec::with_capacity(closes.len());
    for &c in closes {
        while !is_business_day(day) {
            day += Duration::days(1);
        }
        bars.push(Bar::new(day).with("close", c));
        day += Duration::days(1);
    }
    bars
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, TradebenchError> {
        let bars: Vec<Bar> = self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if bars.is_empty() {
            return Err(TradebenchError::NoData {
                ticker: ticker.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradebenchError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

/// Records what would have been written.
#[derive(Default)]
pub struct RecordingReport {
    pub written: RefCell<Vec<(String, String, usize)>>,
}

impl ReportPort for RecordingReport {
    fn write(
        &self,
        result: &BacktestResult,
        run: &RunLabel<'_>,
    ) -> Result<PathBuf, TradebenchError> {
        self.written.borrow_mut().push((
            run.strategy.to_string(),
            run.params.hash(),
            result.rows.len(),
        ));
        Ok(PathBuf::from(format!("{}.csv", run.strategy)))
    }
}

/// Emits a fixed list of signals, then holds.
#[derive(Debug, Clone)]
pub struct ScriptedStrategy {
    script: Vec<Signal>,
    cursor: usize,
}

impl ScriptedStrategy {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: script.iter().map(|s| s.parse().unwrap()).collect(),
            cursor: 0,
        }
    }
}

impl Strategy for ScriptedStrategy {
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
