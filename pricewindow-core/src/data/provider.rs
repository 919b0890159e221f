//! Series provider trait and structured error types.
//!
//! The SeriesProvider trait abstracts over data sources (Yahoo Finance, a
//! directory of CSV files, in-memory fixtures) so the pipeline can swap
//! implementations and mock them in tests.

use crate::domain::TimeSeries;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
///
/// Most variants mean "no usable series for this symbol" and are handled per
/// row. [`DataError::is_systemic`] marks the ones that doom every later fetch.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no sessions returned for '{symbol}'")]
    NoData { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// True when the provider as a whole is unusable, not just this symbol.
    pub fn is_systemic(&self) -> bool {
        matches!(
            self,
            DataError::CircuitBreakerTripped | DataError::AuthenticationRequired(_)
        )
    }
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub series: TimeSeries,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvDirectory,
    Memory,
    Cache,
}

/// Trait for series providers.
///
/// `lookback_hint` is the number of most recent trading sessions the caller
/// would like. Providers may return more or fewer; the window logic checks
/// coverage itself and clips at the series boundary.
pub trait SeriesProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily sessions for `symbol`, ascending by date.
    fn fetch_series(&self, symbol: &str, lookback_hint: usize) -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

impl<P: SeriesProvider + ?Sized> SeriesProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_series(&self, symbol: &str, lookback_hint: usize) -> Result<FetchResult, DataError> {
        (**self).fetch_series(symbol, lookback_hint)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
