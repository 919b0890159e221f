//! PriceWindow Runner: batch processing of (ticker, date) rows.
//!
//! This crate builds on `pricewindow-core` to provide:
//! - TOML pipeline configuration
//! - The row pipeline (validate, fetch, align, extract, flatten)
//! - A per-run series cache shared across rows
//! - CSV/JSON table input and output
//! - Progress callbacks and an end-of-run summary

pub mod cache;
pub mod config;
pub mod pipeline;
pub mod progress;
pub mod row;
pub mod table;

pub use cache::CachingProvider;
pub use config::{
    ConfigError, ExecutionOptions, InputColumns, PipelineConfig, ProviderConfig, ProviderKind,
};
pub use pipeline::{
    process, BatchOutput, BatchSummary, LookbackPolicy, Pipeline, PipelineError, RowOutcome,
};
pub use progress::{CountingProgress, RowProgress, StderrProgress};
pub use row::{
    output_columns, Cell, FetchStatus, InputRow, OutputRow, ADJUSTED_BASE_DATE, FETCH_STATUS,
};
pub use table::{read_csv, read_csv_from, write_rows, OutputFormat, RowTable, TableError};
