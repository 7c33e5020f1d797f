//! CSV file data adapter: one `<TICKER>.csv` per instrument.

use crate::domain::bar::Bar;
use crate::domain::error::TradebenchError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const DATE_COLUMN: &str = "date";
const CLOSE_COLUMN: &str = "close";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }
}

/// `Adj Close` → `adj_close`.
pub fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Finite numbers only; blanks, text, `nan` and `inf` are not prices.
fn parse_cell(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, TradebenchError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| TradebenchError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();
        let date_idx = headers
            .iter()
            .position(|h| h == DATE_COLUMN)
            .ok_or_else(|| TradebenchError::missing_column(DATE_COLUMN))?;

        let has_close = headers.iter().any(|h| h == CLOSE_COLUMN);

        let mut by_date: BTreeMap<NaiveDate, Bar> = BTreeMap::new();
        let mut no_close = 0usize;
        for record in rdr.records() {
            let record = record?;
            let raw_date = record.get(date_idx).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
                TradebenchError::Data {
                    reason: format!("{ticker}: invalid date '{raw_date}': {e}"),
                }
            })?;
            if date < start || date > end {
                continue;
            }

            let mut bar = Bar::new(date);
            for (idx, header) in headers.iter().enumerate() {
                if idx == date_idx {
                    continue;
                }
                let cell = record.get(idx).unwrap_or_default().trim();
                if let Some(value) = parse_cell(cell) {
                    bar = bar.with(header.clone(), value);
                }
            }
            if has_close && !bar.has_column(CLOSE_COLUMN) {
                // last row wins, so the date goes
                by_date.remove(&date);
                no_close += 1;
                continue;
            }
            by_date.insert(date, bar);
        }
        if no_close > 0 {
            debug!(ticker, rows = no_close, "dropped rows without a close");
        }

        if by_date.is_empty() {
            return Err(TradebenchError::NoData {
                ticker: ticker.to_string(),
            });
        }
        debug!(ticker, rows = by_date.len(), "loaded csv bars");
        Ok(by_date.into_values().collect())
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradebenchError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TradebenchError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
