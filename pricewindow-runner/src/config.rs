//! Serializable pipeline configuration.
//!
//! Loaded from TOML; every section and field has a default, so an empty file
//! (or no file at all) gives the stock setup: a 5/5 window, `tyo.code` and
//! `base_date` input columns, Yahoo Finance with the `.T` suffix.
//!
//! ```toml
//! [window]
//! past = 5
//! future = 5
//!
//! [input]
//! symbol_column = "tyo.code"
//! date_column = "base_date"
//!
//! [provider]
//! kind = "csv"
//! bars_dir = "bars"
//!
//! [pipeline]
//! cache_series = true
//! parallel = false
//! ```

use pricewindow_core::window::WindowSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound for `provider.max_retries`.
pub const MAX_RETRIES: u32 = 10;

/// Upper bound for each side of the window (`past`, `future`).
pub const MAX_WINDOW_SIDE: usize = 1_000;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub window: WindowSpec,
    pub input: InputColumns,
    pub provider: ProviderConfig,
    pub pipeline: ExecutionOptions,
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.symbol_column.trim().is_empty() || self.input.date_column.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "input column names must not be empty".into(),
            ));
        }
        if self.input.symbol_column == self.input.date_column {
            return Err(ConfigError::Invalid(format!(
                "symbol and date columns are both '{}'",
                self.input.symbol_column
            )));
        }
        if self.provider.kind == ProviderKind::Csv && self.provider.bars_dir.is_none() {
            return Err(ConfigError::Invalid(
                "provider.kind = \"csv\" requires provider.bars_dir".into(),
            ));
        }
        if self.window.past > MAX_WINDOW_SIDE || self.window.future > MAX_WINDOW_SIDE {
            return Err(ConfigError::Invalid(format!(
                "window past/future must be at most {MAX_WINDOW_SIDE} sessions (got {}/{})",
                self.window.past, self.window.future
            )));
        }
        if self.provider.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "provider.max_retries must be at most {MAX_RETRIES} (got {})",
                self.provider.max_retries
            )));
        }
        if self.provider.min_lookback_bars == 0 {
            return Err(ConfigError::Invalid(
                "provider.min_lookback_bars must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Names of the input columns the pipeline reads. Everything else passes through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputColumns {
    pub symbol_column: String,
    pub date_column: String,
}

impl Default for InputColumns {
    fn default() -> Self {
        Self {
            symbol_column: "tyo.code".into(),
            date_column: "base_date".into(),
        }
    }
}

/// Which series provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Yahoo,
    Csv,
}

/// Provider wiring and lookback sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Appended to ticker codes for Yahoo (`.T` = Tokyo Stock Exchange).
    pub symbol_suffix: String,
    /// Directory of `{symbol}.csv` files for `kind = "csv"`.
    pub bars_dir: Option<PathBuf>,
    /// Floor for the lookback hint, in sessions.
    pub min_lookback_bars: usize,
    /// Extra sessions added to `past + future` before doubling.
    pub lookback_buffer: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            symbol_suffix: ".T".into(),
            bars_dir: None,
            min_lookback_bars: 100,
            lookback_buffer: 20,
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

/// Batch execution switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Reuse one fetched series for every row with the same symbol.
    pub cache_series: bool,
    /// Fetch rows concurrently (output order is still input order).
    pub parallel: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            cache_series: true,
            parallel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.window, WindowSpec::new(5, 5));
        assert_eq!(config.input.symbol_column, "tyo.code");
        assert_eq!(config.input.date_column, "base_date");
        assert_eq!(config.provider.kind, ProviderKind::Yahoo);
        assert_eq!(config.provider.symbol_suffix, ".T");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
[window]
past = 3

[provider]
kind = "csv"
bars_dir = "fixtures/bars"

[pipeline]
parallel = true
"#,
        )
        .unwrap();

        assert_eq!(config.window, WindowSpec::new(3, 5));
        assert_eq!(config.provider.kind, ProviderKind::Csv);
        assert_eq!(
            config.provider.bars_dir.as_deref(),
            Some(Path::new("fixtures/bars"))
        );
        assert_eq!(config.provider.min_lookback_bars, 100);
        assert!(config.pipeline.parallel);
        assert!(config.pipeline.cache_series);
    }

    #[test]
    fn csv_provider_requires_bars_dir() {
        let err = PipelineConfig::from_toml("[provider]\nkind = \"csv\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn same_symbol_and_date_column_is_rejected() {
        let err = PipelineConfig::from_toml(
            "[input]\nsymbol_column = \"code\"\ndate_column = \"code\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("both 'code'"));
    }

    #[test]
    fn negative_window_is_a_parse_error() {
        let err = PipelineConfig::from_toml("[window]\npast = -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_provider_kind_is_a_parse_error() {
        let err = PipelineConfig::from_toml("[provider]\nkind = \"bloomberg\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn oversized_window_is_rejected() {
        let err = PipelineConfig::from_toml("[window]\npast = 5000\n").unwrap_err();
        assert!(err.to_string().contains("at most 1000"));
        assert!(PipelineConfig::from_toml("[window]\nfuture = 1000\n").is_ok());
    }

    #[test]
    fn retry_count_is_capped() {
        let err = PipelineConfig::from_toml("[provider]\nmax_retries = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(PipelineConfig::from_toml("[provider]\nmax_retries = 10\n").is_ok());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/pricewindow.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pricewindow.toml"));
    }
}
