//! Yahoo Finance series provider.
//!
//! Fetches daily OHLCV sessions from Yahoo's v8 chart API. Handles rate
//! limiting, retries with exponential backoff, response parsing, and the
//! circuit breaker. Tokyo Stock Exchange codes are queried with the `.T`
//! suffix (`7203` → `7203.T`).
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV directory provider is the offline fallback.

use super::canonicalize::canonicalize;
use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataSource, FetchResult, SeriesProvider};
use crate::domain::TradingSession;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Connection and request settings for [`YahooProvider`].
#[derive(Debug, Clone)]
pub struct YahooSettings {
    /// Appended to every symbol (`.T` for the Tokyo Stock Exchange).
    pub symbol_suffix: String,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
    /// Last date to request. `None` means today.
    pub end_date: Option<NaiveDate>,
}

impl Default for YahooSettings {
    fn default() -> Self {
        Self {
            symbol_suffix: ".T".into(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
            end_date: None,
        }
    }
}

/// Calendar days needed to cover `sessions` trading sessions, with slack for
/// weekends and exchange holidays.
pub fn calendar_span(sessions: usize) -> i64 {
    (sessions as i64).saturating_mul(7) / 5 + 14
}

/// Exponential backoff before retry `attempt` (1-based). Saturates instead of overflowing.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

/// Yahoo Finance series provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    settings: YahooSettings,
}

impl YahooProvider {
    pub fn new(
        circuit_breaker: Arc<CircuitBreaker>,
        settings: YahooSettings,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            settings,
        })
    }

    fn provider_symbol(&self, symbol: &str) -> String {
        format!("{symbol}{}", self.settings.symbol_suffix)
    }

    /// Build the chart API URL for a symbol and date range.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// Parse the chart API response into sessions.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<TradingSession>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A symbol with no trading in range comes back without timestamps.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut sessions = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            // Yahoo stamps TSE sessions at 09:00 JST, i.e. 00:00 UTC on the same day.
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Skip rows where all OHLCV are None (holidays/non-trading days)
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            sessions.push(TradingSession {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume,
            });
        }

        Ok(sessions)
    }

    /// Execute the HTTP request with retry and circuit breaker logic.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TradingSession>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.settings.base_delay, attempt);
                tracing::debug!(symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        // IP ban
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(DataError::AuthenticationRequired(
                            "Yahoo Finance requires authentication".into(),
                        ));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    let sessions = Self::parse_response(symbol, chart)?;
                    self.circuit_breaker.record_success();
                    return Ok(sessions);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl SeriesProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_series(&self, symbol: &str, lookback_hint: usize) -> Result<FetchResult, DataError> {
        let end = self
            .settings
            .end_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let start = end - chrono::Duration::days(calendar_span(lookback_hint));

        let provider_symbol = self.provider_symbol(symbol);
        let sessions = self.fetch_with_retry(&provider_symbol, start, end)?;

        let series = canonicalize(symbol, sessions).into_tail(lookback_hint);
        if series.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
            });
        }

        tracing::debug!(
            symbol,
            sessions = series.len(),
            first = ?series.first_date(),
            last = ?series.last_date(),
            "fetched series from Yahoo Finance"
        );

        Ok(FetchResult {
            series,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
