//! Offline provider backed by a directory of per-symbol CSV files.
//!
//! Layout: `{dir}/{SYMBOL}.csv` with a header row
//! `date,open,high,low,close,volume`. Empty cells are missing values.
//! With an end date set, sessions after it are ignored, so the lookback hint
//! counts back from that date rather than from the end of the file.

use super::canonicalize::canonicalize;
use super::provider::{DataError, DataSource, FetchResult, SeriesProvider};
use crate::domain::TradingSession;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvSession {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    // Some exports write volume as a float ("1200000.0").
    volume: Option<f64>,
}

impl From<CsvSession> for TradingSession {
    fn from(row: CsvSession) -> Self {
        TradingSession {
            date: row.date,
            open: row.open.unwrap_or(f64::NAN),
            high: row.high.unwrap_or(f64::NAN),
            low: row.low.unwrap_or(f64::NAN),
            close: row.close.unwrap_or(f64::NAN),
            volume: row
                .volume
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64),
        }
    }
}

/// Reads sessions from `{dir}/{symbol}.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirProvider {
    dir: PathBuf,
    end_date: Option<NaiveDate>,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            end_date: None,
        }
    }

    /// Serve history only up to `end` (inclusive).
    pub fn with_end_date(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_sessions(path: &Path) -> Result<Vec<TradingSession>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::Io(format!("open {}: {e}", path.display())))?;

        let mut sessions = Vec::new();
        for (line, record) in reader.deserialize::<CsvSession>().enumerate() {
            let row = record.map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "{} row {}: {e}",
                    path.display(),
                    line + 1
                ))
            })?;
            sessions.push(row.into());
        }
        Ok(sessions)
    }
}

impl SeriesProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv_directory"
    }

    fn fetch_series(&self, symbol: &str, lookback_hint: usize) -> Result<FetchResult, DataError> {
        let path = self.symbol_path(symbol);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let sessions = Self::read_sessions(&path)?;
        let mut series = canonicalize(symbol, sessions);
        if let Some(end) = self.end_date {
            series = series.into_until(end);
        }
        let series = series.into_tail(lookback_hint);
        if series.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
            });
        }

        Ok(FetchResult {
            series,
            source: DataSource::CsvDirectory,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
