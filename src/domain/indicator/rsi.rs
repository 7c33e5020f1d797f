//! Wilder's RSI, computed incrementally.
//!
//! Average gain/loss are exponentially smoothed with alpha = 1/n, seeded
//! with the first change and without bias adjustment. The value is defined
//! once n price changes have been seen.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_gain == avg_loss == 0: RSI = 50
//! If only avg_loss == 0: RSI = 100

use super::Incremental;

#[derive(Debug, Clone, Copy, Default)]
struct RsiState {
    last_close: Option<f64>,
    avg_gain: f64,
    avg_loss: f64,
    changes: usize,
}

#[derive(Debug, Clone)]
pub struct WilderRsi {
    length: usize,
    base: RsiState,
    head: RsiState,
}

impl WilderRsi {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            base: RsiState::default(),
            head: RsiState::default(),
        }
    }

    pub fn value(&self) -> Option<f64> {
        if self.length == 0 || self.head.changes < self.length {
            return None;
        }
        let RsiState {
            avg_gain, avg_loss, ..
        } = self.head;
        if avg_gain == 0.0 && avg_loss == 0.0 {
            return Some(50.0);
        }
        if avg_loss == 0.0 {
            return Some(100.0);
        }
        Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
    }

    pub fn clear(&mut self) {
        self.base = RsiState::default();
        self.head = RsiState::default();
    }

    fn step(&self, prior: RsiState, close: f64) -> RsiState {
        let Some(prev_close) = prior.last_close else {
            return RsiState {
                last_close: Some(close),
                ..RsiState::default()
            };
        };
        let change = close - prev_close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let (avg_gain, avg_loss) = if prior.changes == 0 {
            (gain, loss)
        } else {
            let alpha = 1.0 / self.length as f64;
            (
                prior.avg_gain + alpha * (gain - prior.avg_gain),
                prior.avg_loss + alpha * (loss - prior.avg_loss),
            )
        };
        RsiState {
            last_close: Some(close),
            avg_gain,
            avg_loss,
            changes: prior.changes + 1,
        }
    }
}

impl Incremental for WilderRsi {
    fn push(&mut self, value: f64) {
        self.base = self.head;
        self.head = self.step(self.base, value);
    }

    fn replace_last(&mut self, value: f64) {
        self.head = self.step(self.base, value);
    }
}
