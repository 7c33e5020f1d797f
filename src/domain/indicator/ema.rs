//! Exponential Moving Average without bias adjustment.
//!
//! EMA[0] = x[0], EMA[i] = EMA[i-1] + alpha * (x[i] - EMA[i-1]).
//! With a span n, alpha = 2/(n+1).

use super::Incremental;

#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    /// Value before the newest observation.
    base: Option<f64>,
    /// Value including the newest observation.
    head: Option<f64>,
}

impl Ema {
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            base: None,
            head: None,
        }
    }

    pub fn with_span(span: usize) -> Self {
        Self::with_alpha(2.0 / (span as f64 + 1.0))
    }

    pub fn value(&self) -> Option<f64> {
        self.head
    }

    /// Value as of the previous observation.
    pub fn previous(&self) -> Option<f64> {
        self.base
    }

    pub fn clear(&mut self) {
        self.base = None;
        self.head = None;
    }

    fn step(&self, prior: Option<f64>, value: f64) -> f64 {
        match prior {
            Some(prev) => prev + self.alpha * (value - prev),
            None => value,
        }
    }
}

impl Incremental for Ema {
    fn push(&mut self, value: f64) {
        self.base = self.head;
        self.head = Some(self.step(self.base, value));
    }

    fn replace_last(&mut self, value: f64) {
        self.head = Some(self.step(self.base, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_value_seeds() {
        let mut ema = Ema::with_span(3);
        assert_eq!(ema.value(), None);
        ema.push(10.0);
        assert_eq!(ema.value(), Some(10.0));
        assert_eq!(ema.previous(), None);
    }

    #[test]
    fn span_three_recursion() {
        // alpha = 0.5
        let mut ema = Ema::with_span(3);
        ema.push(10.0);
        ema.push(20.0);
        assert_relative_eq!(ema.value().unwrap(), 15.0);
        ema.push(30.0);
        assert_relative_eq!(ema.value().unwrap(), 22.5);
        assert_relative_eq!(ema.previous().unwrap(), 15.0);
    }

    #[test]
    fn replace_last_recomputes_from_base() {
        let mut ema = Ema::with_span(3);
        ema.push(10.0);
        ema.push(20.0);
        ema.replace_last(30.0);
        assert_relative_eq!(ema.value().unwrap(), 20.0);
        assert_relative_eq!(ema.previous().unwrap(), 10.0);
    }

    #[test]
    fn replace_last_without_history_seeds() {
        let mut ema = Ema::with_alpha(0.1);
        ema.replace_last(7.0);
        assert_eq!(ema.value(), Some(7.0));
    }

    #[test]
    fn clear_forgets_state() {
        let mut ema = Ema::with_span(5);
        ema.push(1.0);
        ema.push(2.0);
        ema.clear();
        assert_eq!(ema.value(), None);
        assert_eq!(ema.previous(), None);
    }
}
