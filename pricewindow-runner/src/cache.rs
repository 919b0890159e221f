//! Per-run series cache.
//!
//! Inputs often repeat a ticker on many dates. [`CachingProvider`] keeps each
//! fetched series for the lifetime of the run and serves later requests for
//! the same symbol from memory when the cached history is deep enough.
//! Failures are never cached.

use pricewindow_core::data::{DataError, DataSource, FetchResult, SeriesProvider};
use pricewindow_core::domain::TimeSeries;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct CachedSeries {
    lookback: usize,
    series: TimeSeries,
}

/// Wraps a provider with an in-memory, symbol-keyed cache.
#[derive(Debug)]
pub struct CachingProvider<P> {
    inner: P,
    entries: Mutex<HashMap<String, CachedSeries>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<P: SeriesProvider> CachingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedSeries>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lookup(&self, symbol: &str, lookback_hint: usize) -> Option<TimeSeries> {
        self.lock()
            .get(symbol)
            .filter(|cached| cached.lookback >= lookback_hint)
            .map(|cached| cached.series.clone())
    }
}

impl<P: SeriesProvider> SeriesProvider for CachingProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch_series(&self, symbol: &str, lookback_hint: usize) -> Result<FetchResult, DataError> {
        if let Some(series) = self.lookup(symbol, lookback_hint) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(symbol, lookback_hint, "series cache hit");
            return Ok(FetchResult {
                series,
                source: DataSource::Cache,
            });
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        // The lock is not held across the fetch; concurrent misses on the
        // same symbol may both fetch, and the deeper result wins.
        let fetched = self.inner.fetch_series(symbol, lookback_hint)?;
        let mut entries = self.lock();
        let keep = entries
            .get(symbol)
            .map_or(true, |existing| existing.lookback < lookback_hint);
        if keep {
            entries.insert(
                symbol.to_string(),
                CachedSeries {
                    lookback: lookback_hint,
                    series: fetched.series.clone(),
                },
            );
        }
        Ok(fetched)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pricewindow_core::data::MemoryProvider;
    use pricewindow_core::domain::TradingSession;

    fn memory() -> MemoryProvider {
        let sessions = (10..=12)
            .map(|d| {
                TradingSession::new(
                    NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                    1.0,
                    2.0,
                    0.5,
                    1.5,
                    10,
                )
            })
            .collect();
        MemoryProvider::new().with_series(TimeSeries::new("7203", sessions).unwrap())
    }

    #[test]
    fn second_fetch_is_served_from_cache() {
        let cache = CachingProvider::new(memory());

        let first = cache.fetch_series("7203", 100).unwrap();
        let second = cache.fetch_series("7203", 100).unwrap();

        assert_eq!(first.source, DataSource::Memory);
        assert_eq!(second.source, DataSource::Cache);
        assert_eq!(first.series, second.series);
        assert_eq!(cache.inner().fetch_count(), 1);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn deeper_request_refetches() {
        let cache = CachingProvider::new(memory());
        cache.fetch_series("7203", 100).unwrap();
        cache.fetch_series("7203", 50).unwrap();
        cache.fetch_series("7203", 200).unwrap();
        cache.fetch_series("7203", 150).unwrap();

        assert_eq!(cache.inner().fetch_count(), 2);
        assert_eq!(cache.hits(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = CachingProvider::new(memory());
        assert!(cache.fetch_series("9984", 100).is_err());
        assert!(cache.fetch_series("9984", 100).is_err());
        assert_eq!(cache.inner().fetch_count(), 2);
        assert_eq!(cache.hits(), 0);
    }
}
