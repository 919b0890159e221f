//! Canonicalize provider output into a [`TimeSeries`].
//!
//! Providers hand back sessions in whatever order the source had them.
//! Canonical form: sorted by date, one session per date (first occurrence
//! wins), void sessions dropped.

use crate::domain::{TimeSeries, TradingSession};

/// Sort, dedupe and drop void sessions.
pub fn canonicalize(symbol: &str, mut sessions: Vec<TradingSession>) -> TimeSeries {
    let raw = sessions.len();

    sessions.retain(|s| !s.is_void());
    // Stable sort keeps provider order among equal dates, so dedup keeps the first.
    sessions.sort_by_key(|s| s.date);
    sessions.dedup_by_key(|s| s.date);

    let dropped = raw - sessions.len();
    if dropped > 0 {
        tracing::debug!(symbol, dropped, "canonicalize dropped void or duplicate sessions");
    }

    TimeSeries::from_sorted(symbol.to_string(), sessions)
}
