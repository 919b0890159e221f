//! Series providers and provider-output canonicalization

pub mod canonicalize;
pub mod circuit_breaker;
pub mod csv_dir;
pub mod memory;
pub mod provider;
pub mod yahoo;

pub use canonicalize::canonicalize;
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_dir::CsvDirProvider;
pub use memory::MemoryProvider;
pub use provider::{DataError, DataSource, FetchResult, SeriesProvider};
pub use yahoo::{calendar_span, YahooProvider, YahooSettings};
