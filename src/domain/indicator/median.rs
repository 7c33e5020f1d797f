//! Rolling median over a fixed window.

use std::collections::VecDeque;

/// Keeps the window both in arrival order (for eviction) and sorted (for the
/// order statistic).
#[derive(Debug, Clone)]
pub struct RollingMedian {
    capacity: usize,
    arrivals: VecDeque<f64>,
    sorted: Vec<f64>,
}

impl RollingMedian {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            arrivals: VecDeque::with_capacity(capacity),
            sorted: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.arrivals.len() == self.capacity {
            if let Some(old) = self.arrivals.pop_front() {
                let pos = self.sorted.partition_point(|v| v.total_cmp(&old).is_lt());
                self.sorted.remove(pos);
            }
        }
        self.arrivals.push_back(value);
        let pos = self.sorted.partition_point(|v| v.total_cmp(&value).is_lt());
        self.sorted.insert(pos, value);
    }

    /// Median of a full window; the mean of the two middle values for even
    /// lengths.
    pub fn median(&self) -> Option<f64> {
        if self.capacity == 0 || self.sorted.len() < self.capacity {
            return None;
        }
        let n = self.sorted.len();
        let mid = n / 2;
        if n % 2 == 1 {
            Some(self.sorted[mid])
        } else {
            Some((self.sorted[mid - 1] + self.sorted[mid]) / 2.0)
        }
    }

    pub fn clear(&mut self) {
        self.arrivals.clear();
        self.sorted.clear();
    }
}
