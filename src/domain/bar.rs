//! Price bars, price series and multi-asset alignment.

use crate::domain::error::TradebenchError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One dated row of a price table: column name → value.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
}

impl Bar {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    /// Single-asset bar with `open`, `high`, `low` and `close` columns.
    pub fn ohlc(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self::new(date)
            .with("open", open)
            .with("high", high)
            .with("low", low)
            .with("close", close)
    }

    pub fn with(mut self, column: impl Into<String>, value: f64) -> Self {
        self.values.insert(column.into(), value);
        self
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub fn require(&self, column: &str) -> Result<f64, TradebenchError> {
        self.get(column)
            .ok_or_else(|| TradebenchError::missing_column(column))
    }

    pub fn close(&self) -> Result<f64, TradebenchError> {
        self.require("close")
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// How the engine interprets a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetMode {
    /// One instrument with a `close` column.
    Single,
    /// One column per tradable instrument.
    Multi,
}

impl AssetMode {
    /// A series is single-asset iff it carries a `close` column.
    pub fn detect(series: &PriceSeries) -> Self {
        if series.has_column("close") {
            AssetMode::Single
        } else {
            AssetMode::Multi
        }
    }
}

impl std::str::FromStr for AssetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(AssetMode::Single),
            "multi" => Ok(AssetMode::Multi),
            other => Err(format!("unknown asset mode '{other}'")),
        }
    }
}

/// A strictly date-ascending sequence of bars.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Rejects out-of-order and duplicate dates.
    pub fn new(bars: Vec<Bar>) -> Result<Self, TradebenchError> {
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(TradebenchError::InvalidBarIndex {
                    date: pair[1].date,
                    previous: pair[0].date,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Builds a multi-asset series of closing prices, one column per ticker,
    /// on the dates every ticker has a close. A bar without a close drops
    /// its date; a ticker with no close at all is `MissingColumn`.
    pub fn align_closes(per_ticker: &[(String, Vec<Bar>)]) -> Result<Self, TradebenchError> {
        let mut indexed: Vec<(&str, HashMap<NaiveDate, f64>)> =
            Vec::with_capacity(per_ticker.len());
        for (ticker, bars) in per_ticker {
            let by_date: HashMap<NaiveDate, f64> = bars
                .iter()
                .filter_map(|bar| bar.get("close").map(|close| (bar.date, close)))
                .collect();
            if by_date.is_empty() && !bars.is_empty() {
                return Err(TradebenchError::missing_column(format!("{ticker}.close")));
            }
            indexed.push((ticker.as_str(), by_date));
        }

        let timeline: BTreeSet<NaiveDate> = indexed
            .iter()
            .flat_map(|(_, by_date)| by_date.keys().copied())
            .filter(|date| indexed.iter().all(|(_, other)| other.contains_key(date)))
            .collect();

        let bars = timeline
            .into_iter()
            .map(|date| {
                indexed
                    .iter()
                    .fold(Bar::new(date), |bar, (ticker, by_date)| {
                        bar.with(*ticker, by_date[&date])
                    })
            })
            .collect();

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.bars.first().is_some_and(|b| b.has_column(column))
    }
}
