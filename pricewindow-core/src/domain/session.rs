//! TradingSession and TimeSeries: the market data units the window logic runs on.

use super::field::Field;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV session for a single symbol.
///
/// Prices the provider left empty are stored as NaN (a void price);
/// a missing volume is `None`. Both surface as null after flattening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSession {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

impl TradingSession {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume: Some(volume),
        }
    }

    /// Price for one of the four price fields. `None` for `Field::Volume`.
    pub fn price(&self, field: Field) -> Option<f64> {
        match field {
            Field::Open => Some(self.open),
            Field::High => Some(self.high),
            Field::Low => Some(self.low),
            Field::Close => Some(self.close),
            Field::Volume => None,
        }
    }

    /// Returns true if every price is NaN and volume is missing.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            && self.high.is_nan()
            && self.low.is_nan()
            && self.close.is_nan()
            && self.volume.is_none()
    }
}

/// Errors raised when building a [`TimeSeries`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("sessions for '{symbol}' out of order: {previous} is not before {next}")]
    OutOfOrder {
        symbol: String,
        previous: NaiveDate,
        next: NaiveDate,
    },
}

/// Ordered trading sessions for one symbol.
///
/// Invariant: dates are strictly increasing. Non-trading days are simply
/// absent, so gaps between consecutive dates are normal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    symbol: String,
    sessions: Vec<TradingSession>,
}

impl TimeSeries {
    /// Build a series, rejecting unsorted or duplicate dates.
    pub fn new(
        symbol: impl Into<String>,
        sessions: Vec<TradingSession>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        for pair in sessions.windows(2) {
            if pair[0].date >= pair[1].date {
                return Err(SeriesError::OutOfOrder {
                    symbol,
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self { symbol, sessions })
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            sessions: Vec::new(),
        }
    }

    /// Caller guarantees the ordering invariant (used after canonicalization).
    pub(crate) fn from_sorted(symbol: String, sessions: Vec<TradingSession>) -> Self {
        debug_assert!(sessions.windows(2).all(|w| w[0].date < w[1].date));
        Self { symbol, sessions }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn sessions(&self) -> &[TradingSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TradingSession> {
        self.sessions.get(index)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.sessions.first().map(|s| s.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.sessions.last().map(|s| s.date)
    }

    /// Drop sessions dated after `end`.
    pub fn into_until(mut self, end: NaiveDate) -> Self {
        let keep = self.sessions.partition_point(|s| s.date <= end);
        self.sessions.truncate(keep);
        self
    }

    /// Keep only the latest `n` sessions.
    pub fn into_tail(mut self, n: usize) -> Self {
        if self.sessions.len() > n {
            self.sessions.drain(..self.sessions.len() - n);
        }
        self
    }
}
