//! In-memory provider for tests and embedding.

use super::provider::{DataError, DataSource, FetchResult, SeriesProvider};
use crate::domain::TimeSeries;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves pre-built series keyed by symbol. Counts fetches.
///
/// Like the network providers, an end date caps the history served, and the
/// lookback hint counts back from there.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    series: HashMap<String, TimeSeries>,
    end_date: Option<NaiveDate>,
    fetches: AtomicUsize,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series under its own symbol.
    pub fn insert(&mut self, series: TimeSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    pub fn with_series(mut self, series: TimeSeries) -> Self {
        self.insert(series);
        self
    }

    /// Serve history only up to `end` (inclusive).
    pub fn with_end_date(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }

    /// Number of `fetch_series` calls so far, hits and misses alike.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl SeriesProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_series(&self, symbol: &str, lookback_hint: usize) -> Result<FetchResult, DataError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut series = self
            .series
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        if let Some(end) = self.end_date {
            series = series.into_until(end);
        }
        Ok(FetchResult {
            series: series.into_tail(lookback_hint),
            source: DataSource::Memory,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradingSession;

    #[test]
    fn serves_registered_series_and_counts_calls() {
        let series = TimeSeries::new(
            "7203",
            vec![TradingSession::new(
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                1.0,
                2.0,
                0.5,
                1.5,
                10,
            )],
        )
        .unwrap();
        let provider = MemoryProvider::new().with_series(series);

        assert_eq!(provider.fetch_series("7203", 10).unwrap().series.len(), 1);
        assert!(provider.fetch_series("9984", 10).is_err());
        assert_eq!(provider.fetch_count(), 2);
    }

    #[test]
    fn end_date_caps_served_history() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let sessions = (10..=19)
            .map(|d| TradingSession::new(day(d), 1.0, 2.0, 0.5, 1.5, 10))
            .collect();
        let provider = MemoryProvider::new()
            .with_series(TimeSeries::new("7203", sessions).unwrap())
            .with_end_date(day(14));

        let series = provider.fetch_series("7203", 3).unwrap().series;
        assert_eq!(series.first_date(), Some(day(12)));
        assert_eq!(series.last_date(), Some(day(14)));
    }
}
