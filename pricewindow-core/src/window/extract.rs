//! Window extraction around an anchor.

use super::align::Anchor;
use super::WindowSpec;
use crate::domain::{TimeSeries, TradingSession};
use serde::{Deserialize, Serialize};

/// Contiguous index range `[start, end)` around an anchor, clipped to the series.
///
/// Offsets are always relative to the anchor. A window clipped at a series
/// boundary has fewer offsets, never renumbered ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub anchor: Anchor,
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Signed offset of a series index from the anchor.
    pub fn offset_of(&self, index: usize) -> i64 {
        index as i64 - self.anchor.index as i64
    }

    /// First and last offsets present (e.g. `(-5, 5)`, or `(0, 2)` when clipped).
    pub fn offset_range(&self) -> (i64, i64) {
        (self.offset_of(self.start), self.offset_of(self.end) - 1)
    }

    /// True if the window holds fewer sessions than `spec` asks for.
    pub fn is_clipped(&self, spec: WindowSpec) -> bool {
        self.len() < spec.width()
    }

    /// Sessions in the window paired with their offsets, oldest first.
    pub fn sessions<'a>(
        &self,
        series: &'a TimeSeries,
    ) -> impl Iterator<Item = (i64, &'a TradingSession)> + 'a {
        let anchor = self.anchor.index as i64;
        series.sessions()[self.start..self.end]
            .iter()
            .zip(self.start..self.end)
            .map(move |(session, index)| (index as i64 - anchor, session))
    }
}

/// Compute the window for `anchor`.
///
/// `start = max(0, anchor - past)`, `end = min(len, anchor + future + 1)`.
/// The anchor must come from [`align`](super::align) on the same series.
pub fn extract(series: &TimeSeries, anchor: Anchor, spec: WindowSpec) -> Window {
    let start = anchor.index.saturating_sub(spec.past);
    let end = anchor
        .index
        .saturating_add(spec.future)
        .saturating_add(1)
        .min(series.len());
    Window { anchor, start, end }
}
