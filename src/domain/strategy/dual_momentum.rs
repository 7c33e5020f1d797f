//! Dual momentum rotation across a ticker universe.
//!
//! Evaluated on calendar month-end bars only. Each ticker's trailing total
//! return over `lookback_weeks` weekly closes is ranked; the leader among the
//! top `top_k` with a positive return is held.

use super::{Chronology, Strategy, StrategyParams};
use crate::domain::bar::Bar;
use crate::domain::calendar::is_calendar_month_end;
use crate::domain::error::TradebenchError;
use crate::domain::indicator::{WeeklyCloses, WeeklyUpdate};
use crate::domain::signal::Signal;
use std::collections::VecDeque;

/// The last `lookback + 1` weekly closes of one ticker.
#[derive(Debug, Clone)]
struct WeeklyHistory {
    weekly: WeeklyCloses,
    recent: VecDeque<f64>,
    keep: usize,
}

impl WeeklyHistory {
    fn new(lookback_weeks: usize) -> Self {
        Self {
            weekly: WeeklyCloses::new(),
            recent: VecDeque::with_capacity(lookback_weeks + 1),
            keep: lookback_weeks + 1,
        }
    }

    fn push(&mut self, bar: &Bar, close: f64) {
        match self.weekly.push(bar.date, close) {
            WeeklyUpdate::NewWeek => {
                if self.recent.len() == self.keep {
                    self.recent.pop_front();
                }
                self.recent.push_back(close);
            }
            WeeklyUpdate::SameWeek => {
                if let Some(last) = self.recent.back_mut() {
                    *last = close;
                }
            }
        }
    }

    fn trailing_return(&self) -> f64 {
        if self.weekly.len() < self.keep {
            return f64::NEG_INFINITY;
        }
        match (self.recent.front(), self.recent.back()) {
            (Some(&start), Some(&end)) if start != 0.0 && start.is_finite() => {
                (end - start) / start
            }
            _ => f64::NEG_INFINITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DualMomentumStrategy {
    universe: Vec<String>,
    lookback_weeks: usize,
    top_k: usize,
    clock: Chronology,
    histories: Vec<WeeklyHistory>,
    held: Option<String>,
}

impl DualMomentumStrategy {
    pub fn new(
        universe: Vec<String>,
        lookback_weeks: usize,
        top_k: usize,
    ) -> Result<Self, TradebenchError> {
        if universe.is_empty() {
            return Err(TradebenchError::invalid_parameter(
                "universe",
                "must name at least one ticker",
            ));
        }
        let histories = universe
            .iter()
            .map(|_| WeeklyHistory::new(lookback_weeks))
            .collect();
        Ok(Self {
            universe,
            lookback_weeks,
            top_k,
            clock: Chronology::default(),
            histories,
            held: None,
        })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, TradebenchError> {
        let universe = params
            .get_list("universe")
            .ok_or_else(|| TradebenchError::invalid_parameter("universe", "required"))?;
        Self::new(
            universe,
            params.get_usize("lookback_weeks", 26)?,
            params.get_usize("top_k", 1)?,
        )
    }

    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    pub fn lookback_weeks(&self) -> usize {
        self.lookback_weeks
    }

    /// Universe tickers ordered by trailing return, best first. Ties keep
    /// universe order.
    fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .universe
            .iter()
            .zip(&self.histories)
            .map(|(ticker, history)| (ticker.as_str(), history.trailing_return()))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

impl Strategy for DualMomentumStrategy {
    fn name(&self) -> &str {
        "dual_mom"
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.histories = self
            .universe
            .iter()
            .map(|_| WeeklyHistory::new(self.lookback_weeks))
            .collect();
        self.held = None;
    }

    fn next_bar(&mut self, bar: &Bar) -> Result<Signal, TradebenchError> {
        self.clock.advance(bar.date)?;
        for (ticker, history) in self.universe.iter().zip(self.histories.iter_mut()) {
            let close = bar.require(ticker)?;
            history.push(bar, close);
        }

        if !is_calendar_month_end(bar.date) {
            return Ok(Signal::Hold);
        }

        let leader = self
            .ranked()
            .into_iter()
            .take(self.top_k)
            .find(|&(_, ret)| ret > 0.0)
            .map(|(ticker, _)| ticker.to_string());

        match leader {
            None => Ok(match self.held.take() {
                Some(held) => Signal::Exit(held),
                None => Signal::Hold,
            }),
            Some(leader) if self.held.as_deref() == Some(leader.as_str()) => Ok(Signal::Hold),
            Some(leader) => {
                self.held = Some(leader.clone());
                Ok(Signal::Enter(leader))
            }
        }
    }
}
