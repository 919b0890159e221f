//! PriceWindow CLI: enrich a table of (ticker, date) rows with price windows.
//!
//! Commands:
//! - `run` read a CSV, fetch each row's series, write the enriched table
//! - `columns` print the window column schema for a given past/future

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use pricewindow_core::data::{
    CircuitBreaker, CsvDirProvider, SeriesProvider, YahooProvider, YahooSettings,
};
use pricewindow_core::domain::parse_base_date;
use pricewindow_core::window::{ColumnSchema, WindowSpec};
use pricewindow_runner::{
    read_csv, write_rows, BatchSummary, CachingProvider, OutputFormat, Pipeline, PipelineConfig,
    ProviderKind, StderrProgress,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pricewindow",
    about = "Attach a window of daily OHLCV sessions around each row's base date"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Process every row of a CSV and write the enriched table.
    Run {
        /// Input CSV with a header row.
        #[arg(long)]
        input: PathBuf,

        /// Output path. Defaults to overwriting the input.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format. Defaults to the output file's extension.
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Sessions before the base date (overrides config).
        #[arg(long)]
        past: Option<usize>,

        /// Sessions after the base date (overrides config).
        #[arg(long)]
        future: Option<usize>,

        /// Offline mode: read sessions from --bars-dir instead of Yahoo Finance.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Directory of {code}.csv session files.
        #[arg(long)]
        bars_dir: Option<PathBuf>,

        /// Fetch rows concurrently.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Fetch every row, even when a symbol repeats.
        #[arg(long, default_value_t = false)]
        no_cache: bool,

        /// Treat this date (YYYY-MM-DD) as today.
        #[arg(long)]
        as_of: Option<String>,

        /// Print one progress line per row to stderr.
        #[arg(long, default_value_t = false)]
        progress: bool,
    },
    /// Print the output column names for a window.
    Columns {
        #[arg(long, default_value_t = 5)]
        past: usize,

        #[arg(long, default_value_t = 5)]
        future: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            input,
            output,
            format,
            config,
            past,
            future,
            offline,
            bars_dir,
            parallel,
            no_cache,
            as_of,
            progress,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::from_file(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(past) = past {
                config.window.past = past;
            }
            if let Some(future) = future {
                config.window.future = future;
            }
            if offline {
                config.provider.kind = ProviderKind::Csv;
            }
            if bars_dir.is_some() {
                config.provider.bars_dir = bars_dir;
            }
            if parallel {
                config.pipeline.parallel = true;
            }
            if no_cache {
                config.pipeline.cache_series = false;
            }
            config.validate()?;

            let as_of = parse_as_of(as_of.as_deref())?;

            let output = output.unwrap_or_else(|| input.clone());
            let format = format
                .map(OutputFormat::from)
                .unwrap_or_else(|| OutputFormat::from_path(&output));

            run_batch(&config, &input, &output, format, as_of, progress)
        }
        Commands::Columns { past, future } => {
            for column in ColumnSchema::new(WindowSpec::new(past, future)).iter() {
                println!("{column}");
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// `--as-of` uses the same strict YYYY-MM-DD rule as base dates. Defaults to today.
fn parse_as_of(value: Option<&str>) -> Result<NaiveDate> {
    match value {
        Some(s) => parse_base_date(s).with_context(|| format!("invalid --as-of '{s}'")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn build_provider(config: &PipelineConfig, as_of: NaiveDate) -> Result<Box<dyn SeriesProvider>> {
    let base: Box<dyn SeriesProvider> = match config.provider.kind {
        ProviderKind::Yahoo => {
            let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
            let settings = YahooSettings {
                symbol_suffix: config.provider.symbol_suffix.clone(),
                max_retries: config.provider.max_retries,
                timeout: Duration::from_secs(config.provider.timeout_secs),
                end_date: Some(as_of),
                ..YahooSettings::default()
            };
            Box::new(YahooProvider::new(circuit_breaker, settings)?)
        }
        ProviderKind::Csv => {
            let dir = config
                .provider
                .bars_dir
                .clone()
                .context("offline mode needs --bars-dir or provider.bars_dir")?;
            let provider = CsvDirProvider::new(dir).with_end_date(as_of);
            if !provider.is_available() {
                anyhow::bail!("bars directory not found: {}", provider.dir().display());
            }
            Box::new(provider)
        }
    };

    if config.pipeline.cache_series {
        Ok(Box::new(CachingProvider::new(base)))
    } else {
        Ok(base)
    }
}

fn run_batch(
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
    format: OutputFormat,
    as_of: NaiveDate,
    show_progress: bool,
) -> Result<()> {
    let table = read_csv(input)?;
    let provider = build_provider(config, as_of)?;
    let progress = StderrProgress::new();

    let mut pipeline = Pipeline::from_config(provider.as_ref(), config).with_as_of(as_of);
    if show_progress {
        pipeline = pipeline.with_progress(&progress);
    }

    let batch = pipeline.process(&table.rows)?;
    write_rows(output, format, &table.headers, pipeline.schema(), &batch.rows)?;

    print_summary(&batch.summary, output);
    Ok(())
}

fn print_summary(summary: &BatchSummary, output: &Path) {
    println!();
    println!("=== PriceWindow Summary ===");
    println!("Rows:            {}", summary.total);
    println!("Succeeded:       {}", summary.succeeded);
    println!("  clipped:       {}", summary.clipped);
    println!("Failed:          {}", summary.failed());
    println!("  bad code:      {}", summary.invalid_symbol);
    println!("  bad date:      {}", summary.invalid_date);
    println!("  no data:       {}", summary.unavailable);
    println!("Output:          {}", output.display());
}
