//! Nominal date → trading session alignment.
//!
//! Weekends and exchange holidays have no session, so a nominal date that
//! falls on one is corrected back to the latest session before it.

use crate::domain::TimeSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The session a window is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Index into the series' sessions.
    pub index: usize,
    /// Date of that session (always `<=` the nominal date).
    pub date: NaiveDate,
}

/// Find the rightmost session with `date <= nominal`.
///
/// `None` when the series is empty or starts after `nominal`. That is a normal
/// outcome (no trading history on or before the requested day), not a fault.
pub fn align(series: &TimeSeries, nominal: NaiveDate) -> Option<Anchor> {
    let sessions = series.sessions();
    let upper = sessions.partition_point(|s| s.date <= nominal);
    let index = upper.checked_sub(1)?;
    Some(Anchor {
        index,
        date: sessions[index].date,
    })
}
