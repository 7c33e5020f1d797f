//! Writes a run's result rows as CSV under a results directory.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradebenchError;
use crate::ports::report_port::{ReportPort, RunLabel};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const HEADER: [&str; 6] = ["date", "price", "position", "signal", "equity", "drawdown"];

pub struct CsvReportAdapter {
    results_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(results_dir: PathBuf) -> Self {
        Self { results_dir }
    }

    /// `<strategy>_<paramhash>_<tickers>.csv`, tickers joined by `-`.
    pub fn file_name(run: &RunLabel<'_>) -> String {
        format!(
            "{}_{}_{}.csv",
            run.strategy,
            run.params.hash(),
            run.tickers.join("-")
        )
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        run: &RunLabel<'_>,
    ) -> Result<PathBuf, TradebenchError> {
        fs::create_dir_all(&self.results_dir)?;
        let path = self.results_dir.join(Self::file_name(run));

        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(HEADER)?;
        for row in &result.rows {
            wtr.write_record([
                row.date.to_string(),
                row.price.to_string(),
                row.position.to_string(),
                row.signal.to_string(),
                row.equity.to_string(),
                row.drawdown.to_string(),
            ])?;
        }
        wtr.flush()?;

        debug!(path = %path.display(), rows = result.rows.len(), "wrote result rows");
        Ok(path)
    }
}
