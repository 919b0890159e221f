//! Row-level validation: ticker codes and nominal dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures for a single input row. Always recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field '{field}'")]
    MissingField { field: String },

    #[error("invalid ticker code '{value}' (expected exactly 4 digits)")]
    InvalidSymbol { value: String },

    #[error("invalid base date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { value: String },
}

/// Exchange ticker code: exactly four ASCII digits (e.g. `7203`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickerCode(String);

impl TickerCode {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(value.to_string()))
        } else {
            Err(ValidationError::InvalidSymbol {
                value: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TickerCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strict `YYYY-MM-DD` parse: zero-padded, no surrounding text, real calendar date.
///
/// chrono alone accepts unpadded fields (`2024-1-5`), so the shape is checked first.
pub fn parse_base_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        value: value.to_string(),
    };

    let bytes = value.as_bytes();
    if bytes.len() != 10 {
        return Err(invalid());
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

/// Render a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
