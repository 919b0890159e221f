//! Batch orchestration: validate each row, fetch its series, resolve the window.
//!
//! Every input row produces exactly one output row, in input order. A row
//! ends in one of four outcomes:
//!
//! - invalid ticker code: failed, provider never called
//! - invalid base date: failed, provider never called
//! - no usable series (not found, empty, no session on or before the date): failed
//! - window resolved: success, possibly with clipped (null) offsets
//!
//! Only provider-wide failures ([`DataError::is_systemic`]) abort the batch.

use crate::config::{InputColumns, PipelineConfig};
use crate::progress::RowProgress;
use crate::row::{InputRow, OutputRow};
use chrono::NaiveDate;
use pricewindow_core::data::{DataError, SeriesProvider};
use pricewindow_core::domain::{parse_base_date, TickerCode, ValidationError};
use pricewindow_core::window::{resolve, Anchor, ColumnSchema, WindowSpec};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Errors that stop a whole batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("provider '{provider}' failed at row {row} ({symbol}): {source}")]
    Provider {
        provider: String,
        row: usize,
        symbol: String,
        #[source]
        source: DataError,
    },
}

/// How many sessions to ask a provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackPolicy {
    pub min_bars: usize,
    pub buffer: usize,
}

impl Default for LookbackPolicy {
    fn default() -> Self {
        Self {
            min_bars: 100,
            buffer: 20,
        }
    }
}

impl LookbackPolicy {
    /// `max(min_bars, 2 * (past + future + buffer))`, plus the calendar days
    /// between `nominal` and `as_of`.
    ///
    /// Providers return the latest sessions up to `as_of`, so an old nominal
    /// date needs a deeper history to keep its window inside the result.
    pub fn hint(&self, spec: WindowSpec, nominal: NaiveDate, as_of: NaiveDate) -> usize {
        let base = self
            .min_bars
            .max(
                spec.past
                    .saturating_add(spec.future)
                    .saturating_add(self.buffer)
                    .saturating_mul(2),
            );
        let elapsed = (as_of - nominal).num_days().max(0) as usize;
        base.saturating_add(elapsed)
    }
}

/// What happened to one row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    InvalidSymbol(ValidationError),
    InvalidDate(ValidationError),
    Unavailable { symbol: String, reason: String },
    Resolved { anchor: Anchor, clipped: bool },
}

impl RowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RowOutcome::Resolved { .. })
    }
}

/// Outcome counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub invalid_symbol: usize,
    pub invalid_date: usize,
    pub unavailable: usize,
    /// Successful rows whose window hit the edge of the series.
    pub clipped: usize,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    fn record(&mut self, outcome: &RowOutcome) {
        self.total += 1;
        match outcome {
            RowOutcome::InvalidSymbol(_) => self.invalid_symbol += 1,
            RowOutcome::InvalidDate(_) => self.invalid_date += 1,
            RowOutcome::Unavailable { .. } => self.unavailable += 1,
            RowOutcome::Resolved { clipped, .. } => {
                self.succeeded += 1;
                if *clipped {
                    self.clipped += 1;
                }
            }
        }
    }
}

/// Rows plus counts.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub rows: Vec<OutputRow>,
    pub outcomes: Vec<RowOutcome>,
    pub summary: BatchSummary,
}

/// A configured batch processor.
pub struct Pipeline<'a> {
    provider: &'a dyn SeriesProvider,
    schema: ColumnSchema,
    columns: InputColumns,
    lookback: LookbackPolicy,
    as_of: NaiveDate,
    parallel: bool,
    progress: Option<&'a dyn RowProgress>,
}

impl<'a> Pipeline<'a> {
    /// Pipeline with the default columns, lookback and sequential execution.
    pub fn new(provider: &'a dyn SeriesProvider, spec: WindowSpec) -> Self {
        Self {
            provider,
            schema: ColumnSchema::new(spec),
            columns: InputColumns::default(),
            lookback: LookbackPolicy::default(),
            as_of: chrono::Local::now().date_naive(),
            parallel: false,
            progress: None,
        }
    }

    pub fn from_config(provider: &'a dyn SeriesProvider, config: &PipelineConfig) -> Self {
        Self::new(provider, config.window)
            .with_columns(config.input.clone())
            .with_lookback(LookbackPolicy {
                min_bars: config.provider.min_lookback_bars,
                buffer: config.provider.lookback_buffer,
            })
            .with_parallel(config.pipeline.parallel)
    }

    pub fn with_columns(mut self, columns: InputColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_lookback(mut self, lookback: LookbackPolicy) -> Self {
        self.lookback = lookback;
        self
    }

    /// Date the provider's "latest" history ends on. Defaults to today.
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn RowProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Process every row. Output order matches input order.
    pub fn process(&self, rows: &[InputRow]) -> Result<BatchOutput, PipelineError> {
        let total = rows.len();
        tracing::info!(
            rows = total,
            provider = self.provider.name(),
            past = self.schema.spec().past,
            future = self.schema.spec().future,
            parallel = self.parallel,
            "processing batch"
        );

        let results: Vec<(OutputRow, RowOutcome)> = if self.parallel {
            rows.par_iter()
                .enumerate()
                .map(|(i, row)| self.process_row(i, total, row))
                .collect::<Result<_, _>>()?
        } else {
            rows.iter()
                .enumerate()
                .map(|(i, row)| self.process_row(i, total, row))
                .collect::<Result<_, _>>()?
        };

        let mut summary = BatchSummary::default();
        let mut out = Vec::with_capacity(total);
        let mut outcomes = Vec::with_capacity(total);
        for (row, outcome) in results {
            summary.record(&outcome);
            out.push(row);
            outcomes.push(outcome);
        }

        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed(),
            clipped = summary.clipped,
            "batch complete"
        );
        if let Some(p) = self.progress {
            p.on_batch_complete(&summary);
        }

        Ok(BatchOutput {
            rows: out,
            outcomes,
            summary,
        })
    }

    /// Process one row. `index` is zero-based and only used for reporting.
    pub fn process_row(
        &self,
        index: usize,
        total: usize,
        row: &InputRow,
    ) -> Result<(OutputRow, RowOutcome), PipelineError> {
        let raw_symbol = row.get(&self.columns.symbol_column);
        if let Some(p) = self.progress {
            p.on_row_start(index, total, raw_symbol.unwrap_or(""));
        }

        let (outcome, output) = self.evaluate(index, row, raw_symbol)?;
        let output = output.unwrap_or_else(|| OutputRow::failed(row.clone(), &self.schema));

        if let Some(p) = self.progress {
            p.on_row_complete(index, total, &outcome);
        }
        Ok((output, outcome))
    }

    fn evaluate(
        &self,
        index: usize,
        row: &InputRow,
        raw_symbol: Option<&str>,
    ) -> Result<(RowOutcome, Option<OutputRow>), PipelineError> {
        let line = index + 1;

        let symbol = match raw_symbol
            .ok_or_else(|| ValidationError::MissingField {
                field: self.columns.symbol_column.clone(),
            })
            .and_then(TickerCode::parse)
        {
            Ok(symbol) => symbol,
            Err(e) => {
                tracing::warn!(row = line, error = %e, "invalid ticker code, skipping fetch");
                return Ok((RowOutcome::InvalidSymbol(e), None));
            }
        };

        let nominal = match row
            .get(&self.columns.date_column)
            .ok_or_else(|| ValidationError::MissingField {
                field: self.columns.date_column.clone(),
            })
            .and_then(parse_base_date)
        {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(row = line, symbol = %symbol, error = %e, "invalid base date, skipping fetch");
                return Ok((RowOutcome::InvalidDate(e), None));
            }
        };

        let hint = self.lookback.hint(self.schema.spec(), nominal, self.as_of);
        let fetched = match self.provider.fetch_series(symbol.as_str(), hint) {
            Ok(fetched) => fetched,
            Err(e) if e.is_systemic() => {
                tracing::error!(row = line, symbol = %symbol, error = %e, "provider unusable, aborting batch");
                return Err(PipelineError::Provider {
                    provider: self.provider.name().to_string(),
                    row: line,
                    symbol: symbol.to_string(),
                    source: e,
                });
            }
            Err(e) => {
                tracing::warn!(row = line, symbol = %symbol, error = %e, "no series available");
                return Ok((
                    RowOutcome::Unavailable {
                        symbol: symbol.to_string(),
                        reason: e.to_string(),
                    },
                    None,
                ));
            }
        };

        let Some(resolved) = resolve(&fetched.series, nominal, &self.schema) else {
            tracing::warn!(
                row = line,
                symbol = %symbol,
                base_date = %nominal,
                first_session = ?fetched.series.first_date(),
                "no session on or before base date"
            );
            return Ok((
                RowOutcome::Unavailable {
                    symbol: symbol.to_string(),
                    reason: format!("no session on or before {nominal}"),
                },
                None,
            ));
        };

        let clipped = resolved.window.is_clipped(self.schema.spec());
        if resolved.anchor.date != nominal {
            tracing::debug!(
                row = line,
                symbol = %symbol,
                base_date = %nominal,
                adjusted = %resolved.anchor.date,
                "base date moved to previous session"
            );
        }
        if clipped {
            tracing::debug!(
                row = line,
                symbol = %symbol,
                sessions = resolved.window.len(),
                "window clipped at series edge"
            );
        }
        tracing::info!(
            row = line,
            symbol = %symbol,
            adjusted = %resolved.anchor.date,
            source = ?fetched.source,
            "window resolved"
        );

        let output = OutputRow::success(row.clone(), resolved.anchor.date, resolved.record);
        Ok((
            RowOutcome::Resolved {
                anchor: resolved.anchor,
                clipped,
            },
            Some(output),
        ))
    }
}

/// One-shot convenience: process `rows` with default columns and lookback.
pub fn process(
    provider: &dyn SeriesProvider,
    rows: &[InputRow],
    past: usize,
    future: usize,
) -> Result<Vec<OutputRow>, PipelineError> {
    Pipeline::new(provider, WindowSpec::new(past, future))
        .process(rows)
        .map(|batch| batch.rows)
}
