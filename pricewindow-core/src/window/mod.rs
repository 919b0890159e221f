//! Anchored window extraction and flattening.
//!
//! The pipeline for one symbol and one nominal date:
//! 1. [`align`] finds the latest session on or before the nominal date
//! 2. [`extract`] takes `past` sessions before and `future` after it, clipped to the series
//! 3. [`flatten`] turns the window into `{field}_{offset}` integer columns
//! 4. [`ColumnSchema`] fixes the full column set so clipped windows pad with nulls

pub mod align;
pub mod extract;
pub mod flatten;
pub mod schema;

pub use align::{align, Anchor};
pub use extract::{extract, Window};
pub use flatten::{flatten, floor_to_int, FlatRecord};
pub use schema::{column_key, offset_tag, ColumnSchema};

use crate::domain::TimeSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of sessions to take on each side of the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSpec {
    pub past: usize,
    pub future: usize,
}

impl WindowSpec {
    pub fn new(past: usize, future: usize) -> Self {
        Self { past, future }
    }

    /// Number of offsets covered when nothing is clipped.
    pub fn width(&self) -> usize {
        self.past.saturating_add(self.future).saturating_add(1)
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self { past: 5, future: 5 }
    }
}

/// Result of running align → extract → flatten for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWindow {
    pub anchor: Anchor,
    pub window: Window,
    /// Full-shape record: every schema column present, clipped offsets null.
    pub record: FlatRecord,
}

/// Resolve the window for `nominal` and conform it to `schema`.
///
/// Returns `None` when the series has no session on or before `nominal`.
pub fn resolve(
    series: &TimeSeries,
    nominal: NaiveDate,
    schema: &ColumnSchema,
) -> Option<ResolvedWindow> {
    let anchor = align(series, nominal)?;
    let window = extract(series, anchor, schema.spec());
    let record = flatten(window.sessions(series)).conform(schema);
    Some(ResolvedWindow {
        anchor,
        window,
        record,
    })
}
