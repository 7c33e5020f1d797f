//! Incremental indicator state used by the strategies.
//!
//! Every accumulator here is updated one observation at a time. Weekly
//! indicators also support [`Incremental::replace_last`], because the close
//! of the week in progress is overwritten by every new daily bar until the
//! week completes:
//! - `RollingWindow`: ring buffer with running sum / sum of squares
//! - `RollingMax`: monotonic deque over a fixed window
//! - `RollingMedian`: sorted window for order statistics
//! - `Ema`: exponential moving average without bias adjustment
//! - `WilderRsi`: RSI on Wilder-smoothed gains and losses

pub mod ema;
pub mod median;
pub mod rolling;
pub mod rsi;

pub use ema::Ema;
pub use median::RollingMedian;
pub use rolling::{RollingMax, RollingWindow};
pub use rsi::WilderRsi;

use crate::domain::calendar::week_ending_friday;
use chrono::NaiveDate;

/// An accumulator whose newest observation may be revised in place.
pub trait Incremental {
    fn push(&mut self, value: f64);
    fn replace_last(&mut self, value: f64);
}

/// What a daily bar did to the weekly close series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeeklyUpdate {
    /// The bar opened a new week.
    NewWeek,
    /// The bar revised the close of the week in progress.
    SameWeek,
}

impl WeeklyUpdate {
    pub fn apply<I: Incremental + ?Sized>(self, indicator: &mut I, value: f64) {
        match self {
            WeeklyUpdate::NewWeek => indicator.push(value),
            WeeklyUpdate::SameWeek => indicator.replace_last(value),
        }
    }
}

/// Resamples daily closes into Friday-ending weeks, keeping the last
/// observation of each week.
#[derive(Debug, Clone, Default)]
pub struct WeeklyCloses {
    current_week: Option<NaiveDate>,
    current_close: f64,
    completed: Option<f64>,
    weeks: usize,
}

impl WeeklyCloses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, date: NaiveDate, close: f64) -> WeeklyUpdate {
        let week = week_ending_friday(date);
        let update = if self.current_week == Some(week) {
            WeeklyUpdate::SameWeek
        } else {
            if self.current_week.is_some() {
                self.completed = Some(self.current_close);
            }
            self.current_week = Some(week);
            self.weeks += 1;
            WeeklyUpdate::NewWeek
        };
        self.current_close = close;
        update
    }

    /// Close of the week in progress.
    pub fn current(&self) -> Option<f64> {
        self.current_week.map(|_| self.current_close)
    }

    /// Final close of the most recently completed week.
    pub fn last_completed(&self) -> Option<f64> {
        self.completed
    }

    /// Number of weekly points, including the week in progress.
    pub fn len(&self) -> usize {
        self.weeks
    }

    pub fn is_empty(&self) -> bool {
        self.weeks == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekly_closes_keeps_last_of_week() {
        let mut weekly = WeeklyCloses::new();
        assert!(weekly.is_empty());
        assert_eq!(weekly.push(date(2024, 1, 1), 10.0), WeeklyUpdate::NewWeek);
        assert_eq!(weekly.push(date(2024, 1, 3), 11.0), WeeklyUpdate::SameWeek);
        assert_eq!(weekly.push(date(2024, 1, 5), 12.0), WeeklyUpdate::SameWeek);
        assert_eq!(weekly.current(), Some(12.0));
        assert_eq!(weekly.last_completed(), None);
        assert_eq!(weekly.len(), 1);

        assert_eq!(weekly.push(date(2024, 1, 8), 13.0), WeeklyUpdate::NewWeek);
        assert_eq!(weekly.current(), Some(13.0));
        assert_eq!(weekly.last_completed(), Some(12.0));
        assert_eq!(weekly.len(), 2);
    }

    #[test]
    fn weekend_bar_opens_next_week() {
        let mut weekly = WeeklyCloses::new();
        weekly.push(date(2024, 1, 5), 1.0);
        assert_eq!(weekly.push(date(2024, 1, 6), 2.0), WeeklyUpdate::NewWeek);
        assert_eq!(weekly.push(date(2024, 1, 8), 3.0), WeeklyUpdate::SameWeek);
        assert_eq!(weekly.len(), 2);
    }

    #[test]
    fn update_apply_routes_to_push_or_replace() {
        let mut window = RollingWindow::new(3);
        WeeklyUpdate::NewWeek.apply(&mut window, 1.0);
        WeeklyUpdate::NewWeek.apply(&mut window, 2.0);
        WeeklyUpdate::SameWeek.apply(&mut window, 5.0);
        assert_eq!(window.len(), 2);
        assert_eq!(window.last(), Some(5.0));
    }
}
