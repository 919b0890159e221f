//! PriceWindow Core: domain types, trading-date alignment, window extraction, providers.
//!
//! This crate contains the window logic the batch runner is built on:
//! - Domain types (trading sessions, time series, ticker codes, base dates)
//! - Nominal date → trading session alignment (holiday/weekend correction)
//! - Window extraction with boundary clipping
//! - Flattening into `{field}_{offset}` integer columns and the column schema
//! - Series providers (Yahoo Finance, CSV directory, in-memory) behind one trait

pub mod data;
pub mod domain;
pub mod window;
