//! Fixed-window accumulators: running mean / standard deviation and
//! rolling maximum.

use super::Incremental;
use std::collections::VecDeque;

/// Ring buffer with running sum and sum of squares.
///
/// Statistics are only reported once the window is full, matching a rolling
/// window whose minimum period equals its length.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
    evictions: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
            sum: 0.0,
            sum_sq: 0.0,
            evictions: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.values.len() == self.capacity
    }

    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.sum = 0.0;
        self.sum_sq = 0.0;
        self.evictions = 0;
    }

    pub fn mean(&self) -> Option<f64> {
        self.is_full().then(|| self.sum / self.capacity as f64)
    }

    /// Sample standard deviation (n - 1 denominator).
    pub fn sample_std(&self) -> Option<f64> {
        if !self.is_full() || self.capacity < 2 {
            return None;
        }
        let n = self.capacity as f64;
        let variance = (self.sum_sq - self.sum * self.sum / n) / (n - 1.0);
        Some(variance.max(0.0).sqrt())
    }

    // Running sums drift after many evictions; rebuild them once per
    // window turnover.
    fn resync(&mut self) {
        self.sum = self.values.iter().sum();
        self.sum_sq = self.values.iter().map(|v| v * v).sum();
        self.evictions = 0;
    }
}

impl Incremental for RollingWindow {
    fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() == self.capacity {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
                self.sum_sq -= old * old;
                self.evictions += 1;
            }
        }
        self.values.push_back(value);
        self.sum += value;
        self.sum_sq += value * value;
        if self.evictions >= self.capacity {
            self.resync();
        }
    }

    fn replace_last(&mut self, value: f64) {
        match self.values.back_mut() {
            Some(last) => {
                let old = *last;
                *last = value;
                self.sum += value - old;
                self.sum_sq += value * value - old * old;
            }
            None => self.push(value),
        }
    }
}

/// Maximum over the last `capacity` pushed values (monotonic deque).
#[derive(Debug, Clone)]
pub struct RollingMax {
    capacity: usize,
    pushed: usize,
    candidates: VecDeque<(usize, f64)>,
}

impl RollingMax {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pushed: 0,
            candidates: VecDeque::new(),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        let index = self.pushed;
        self.pushed += 1;
        while self.candidates.back().is_some_and(|&(_, v)| v <= value) {
            self.candidates.pop_back();
        }
        self.candidates.push_back((index, value));
        while self
            .candidates
            .front()
            .is_some_and(|&(i, _)| i + self.capacity <= index)
        {
            self.candidates.pop_front();
        }
    }

    /// `None` until something has been pushed.
    pub fn max(&self) -> Option<f64> {
        self.candidates.front().map(|&(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.pushed = 0;
        self.candidates.clear();
    }
}
