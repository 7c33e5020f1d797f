//! Data access port trait.

use crate::domain::bar::Bar;
use crate::domain::error::TradebenchError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `ticker` dated within `[start, end]`, ascending.
    /// `NoData` when nothing falls in the range.
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, TradebenchError>;

    fn list_tickers(&self) -> Result<Vec<String>, TradebenchError>;
}
