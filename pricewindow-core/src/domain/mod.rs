//! Domain types for PriceWindow

pub mod field;
pub mod session;
pub mod validate;

pub use field::Field;
pub use session::{SeriesError, TimeSeries, TradingSession};
pub use validate::{format_date, parse_base_date, TickerCode, ValidationError};
