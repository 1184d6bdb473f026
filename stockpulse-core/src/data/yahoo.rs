//! Yahoo Finance data provider.
//!
//! Daily closes and FX spot rates come from Yahoo's v8 chart API; company
//! ratios come from the v10 quoteSummary endpoint, which needs a session
//! cookie plus a crumb token. Handles rate limiting, optional retries with
//! exponential backoff, response parsing, and the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; every parse failure surfaces as `ResponseFormatChanged`.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{ClosesResponse, DataError, DataSource, MarketDataProvider};
use crate::config::ProviderConfig;
use crate::domain::{FundamentalSnapshot, PricePoint};
use chrono::{NaiveDate, NaiveTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const SUMMARY_BASE: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const SUMMARY_MODULES: &str = "financialData,summaryDetail";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    gmtoffset: Option<i64>,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance v10 quoteSummary response.
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SummaryData {
    #[serde(rename = "financialData", default)]
    financial_data: Option<FinancialData>,
    #[serde(rename = "summaryDetail", default)]
    summary_detail: Option<SummaryDetail>,
}

#[derive(Debug, Deserialize)]
struct FinancialData {
    #[serde(rename = "profitMargins", default)]
    profit_margins: Option<RawValue>,
    #[serde(rename = "revenueGrowth", default)]
    revenue_growth: Option<RawValue>,
    #[serde(rename = "debtToEquity", default)]
    debt_to_equity: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct SummaryDetail {
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "dividendYield", default)]
    dividend_yield: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 0.25, "fmt": "25%"}`, or `{}` when absent.
#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(v: Option<RawValue>) -> Option<f64> {
    v.and_then(|v| v.raw).filter(|x| x.is_finite())
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    crumb: Mutex<Option<String>>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(
        circuit_breaker: Arc<CircuitBreaker>,
        config: &ProviderConfig,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .cookie_store(true)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            crumb: Mutex::new(None),
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Build the chart API URL for a symbol and date range.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "{CHART_BASE}/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true"
        )
    }

    fn fx_url(pair: &str) -> String {
        format!("{CHART_BASE}/{pair}?range=5d&interval=1d")
    }

    fn summary_url(symbol: &str, crumb: &str) -> String {
        format!("{SUMMARY_BASE}/{symbol}?modules={SUMMARY_MODULES}&crumb={crumb}")
    }

    /// Unwrap the chart envelope into its first result.
    fn chart_data(symbol: &str, resp: ChartResponse) -> Result<ChartData, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) => api_error(symbol, err),
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))
    }

    /// Parse the chart API response into dated closes.
    ///
    /// Dates are taken in the exchange's local calendar (UTC timestamp plus
    /// the reported `gmtoffset`), so the index carries no timezone. Adjusted
    /// closes are preferred; the raw close fills in where adjusted is absent.
    fn parse_closes(symbol: &str, resp: ChartResponse) -> Result<Vec<PricePoint>, DataError> {
        let data = Self::chart_data(symbol, resp)?;
        let offset = data.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);

        let timestamps = data.timestamp.ok_or_else(|| DataError::NoData {
            symbol: symbol.to_string(),
        })?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let adj = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten());
            let close = adj.or_else(|| quote.close.get(i).copied().flatten());
            points.push(PricePoint { date, close });
        }

        if points.iter().all(|p| p.value().is_none()) {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
            });
        }

        Ok(points)
    }

    fn parse_fx(pair: &str, resp: ChartResponse) -> Result<f64, DataError> {
        let data = Self::chart_data(pair, resp)?;
        let last_close = data
            .indicators
            .quote
            .first()
            .and_then(|q| q.close.iter().rev().find_map(|c| *c));
        last_close
            .or_else(|| data.meta.and_then(|m| m.regular_market_price))
            .filter(|r| r.is_finite() && *r > 0.0)
            .ok_or_else(|| DataError::NoData {
                symbol: pair.to_string(),
            })
    }

    fn parse_summary(symbol: &str, resp: SummaryResponse) -> Result<FundamentalSnapshot, DataError> {
        let result = resp.quote_summary.result.ok_or_else(|| match resp.quote_summary.error {
            Some(err) => api_error(symbol, err),
            None => DataError::ResponseFormatChanged("empty quoteSummary with no error".into()),
        })?;

        let data = result.into_iter().next().ok_or_else(|| DataError::NoData {
            symbol: symbol.to_string(),
        })?;

        let (profit_margin, revenue_growth, debt_to_equity) = match data.financial_data {
            Some(f) => (
                raw(f.profit_margins),
                raw(f.revenue_growth),
                raw(f.debt_to_equity),
            ),
            None => (None, None, None),
        };
        let (price_earnings, dividend_yield) = match data.summary_detail {
            Some(s) => (raw(s.trailing_pe), raw(s.dividend_yield)),
            None => (None, None),
        };

        Ok(FundamentalSnapshot {
            price_earnings,
            debt_to_equity,
            profit_margin,
            dividend_yield,
            revenue_growth,
        })
    }

    /// Cookie + crumb handshake. The crumb is cached for the provider's
    /// lifetime and dropped on 401 so the next call renews it.
    fn crumb(&self) -> Result<String, DataError> {
        let mut cached = self.crumb.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(c) = cached.as_ref() {
            return Ok(c.clone());
        }

        // fc.yahoo.com answers 404 but sets the session cookie.
        self.client
            .get(COOKIE_URL)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let resp = self
            .client
            .get(CRUMB_URL)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(DataError::AuthenticationRequired(format!(
                "crumb request returned HTTP {}",
                resp.status()
            )));
        }
        let crumb = resp
            .text()
            .map_err(|e| DataError::ResponseFormatChanged(format!("crumb body: {e}")))?
            .trim()
            .to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(DataError::AuthenticationRequired(
                "Yahoo returned no crumb".into(),
            ));
        }
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    fn forget_crumb(&self) {
        *self.crumb.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Execute a GET with the retry policy and circuit breaker logic, and
    /// decode the JSON body.
    fn get_json<T: DeserializeOwned>(&self, url: &str, symbol: &str) -> Result<T, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                tracing::debug!(symbol, attempt, ?delay, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
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
                        return Err(DataError::AuthenticationRequired(format!(
                            "Yahoo Finance refused the request for {symbol}"
                        )));
                    }

                    // Yahoo reports unknown symbols as 404 with a JSON error body.
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

                    let body: T = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;
                    self.circuit_breaker.record_success();
                    return Ok(body);
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

    fn fetch_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let chart: ChartResponse = self.get_json(&Self::chart_url(symbol, start, end), symbol)?;
        Self::parse_closes(symbol, chart)
    }
}

/// Exponential backoff before retry `attempt` (1-based), saturating.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

fn api_error(symbol: &str, err: ApiError) -> DataError {
    if err.code == "Not Found" {
        DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        }
    } else {
        DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    /// One chart request per symbol. Symbols that fail are left out of the
    /// labeled result; the batch only fails when every symbol failed.
    fn daily_closes(
        &self,
        symbols: &[&str],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ClosesResponse, DataError> {
        let mut columns = BTreeMap::new();
        let mut first_error = None;

        for symbol in symbols {
            match self.fetch_closes(symbol, start, end) {
                Ok(points) => {
                    columns.insert(symbol.to_string(), points);
                }
                Err(DataError::CircuitBreakerTripped) => {
                    return if columns.is_empty() {
                        Err(DataError::CircuitBreakerTripped)
                    } else {
                        tracing::warn!(symbol, "circuit breaker tripped mid-batch");
                        Ok(ClosesResponse::Labeled(columns))
                    };
                }
                Err(e) => {
                    tracing::warn!(symbol, error = %e, "price history unavailable");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if columns.is_empty() => Err(e),
            _ => Ok(ClosesResponse::Labeled(columns)),
        }
    }

    fn fx_rate(&self, pair: &str) -> Result<f64, DataError> {
        let chart: ChartResponse = self.get_json(&Self::fx_url(pair), pair)?;
        Self::parse_fx(pair, chart)
    }

    fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, DataError> {
        let crumb = self.crumb()?;
        match self.get_json::<SummaryResponse>(&Self::summary_url(symbol, &crumb), symbol) {
            Ok(summary) => Self::parse_summary(symbol, summary),
            Err(e @ DataError::AuthenticationRequired(_)) => {
                self.forget_crumb();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn backoff_doubles_then_saturates() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), base);
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(2000));
        // 2^32 no longer fits; the multiplier pins at u32::MAX.
        assert_eq!(backoff_delay(base, 40), backoff_delay(base, 33));
        assert!(backoff_delay(base, 33) > backoff_delay(base, 32));
    }

    #[test]
    fn chart_url_covers_end_day() {
        let url = YahooProvider::chart_url(
            "SAN.MC",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        assert!(url.contains("/SAN.MC?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1704153600"));
    }

    #[test]
    fn parses_closes_in_exchange_local_dates() {
        // 2024-01-01 23:30 UTC is already 2024-01-02 in Madrid (+3600).
        let resp = chart(
            r#"{"chart":{"result":[{
                "meta":{"gmtoffset":3600},
                "timestamp":[1704151800,1704238200],
                "indicators":{"quote":[{"close":[4.0,null]}],
                              "adjclose":[{"adjclose":[3.9,4.1]}]}
            }],"error":null}}"#,
        );
        let points = YahooProvider::parse_closes("SAN.MC", resp).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(points[0].close, Some(3.9));
        assert_eq!(points[1].close, Some(4.1));
    }

    #[test]
    fn raw_close_used_without_adjclose() {
        let resp = chart(
            r#"{"chart":{"result":[{
                "timestamp":[1704153600],
                "indicators":{"quote":[{"close":[185.5]}]}
            }],"error":null}}"#,
        );
        let points = YahooProvider::parse_closes("AAPL", resp).unwrap();
        assert_eq!(points[0].close, Some(185.5));
    }

    #[test]
    fn not_found_is_symbol_not_found() {
        let resp = chart(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );
        let err = YahooProvider::parse_closes("NOPE", resp).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn all_null_closes_is_no_data() {
        let resp = chart(
            r#"{"chart":{"result":[{
                "timestamp":[1704153600],
                "indicators":{"quote":[{"close":[null]}]}
            }],"error":null}}"#,
        );
        let err = YahooProvider::parse_closes("NEW", resp).unwrap_err();
        assert!(matches!(err, DataError::NoData { .. }));
    }

    #[test]
    fn fx_takes_last_close() {
        let resp = chart(
            r#"{"chart":{"result":[{
                "meta":{"regularMarketPrice":1.09},
                "timestamp":[1,2,3],
                "indicators":{"quote":[{"close":[1.08,1.1,null]}]}
            }],"error":null}}"#,
        );
        assert_eq!(YahooProvider::parse_fx("EURUSD=X", resp).unwrap(), 1.1);
    }

    #[test]
    fn parses_summary_modules() {
        let resp: SummaryResponse = serde_json::from_str(
            r#"{"quoteSummary":{"result":[{
                "financialData":{"profitMargins":{"raw":0.25,"fmt":"25%"},
                                 "revenueGrowth":{"raw":0.061},
                                 "debtToEquity":{}},
                "summaryDetail":{"trailingPE":{"raw":28.4},"dividendYield":{}}
            }],"error":null}}"#,
        )
        .unwrap();
        let snap = YahooProvider::parse_summary("AAPL", resp).unwrap();
        assert_eq!(snap.profit_margin, Some(0.25));
        assert_eq!(snap.revenue_growth, Some(0.061));
        assert_eq!(snap.debt_to_equity, None);
        assert_eq!(snap.price_earnings, Some(28.4));
        assert_eq!(snap.dividend_yield, None);
    }

    #[test]
    fn summary_not_found() {
        let resp: SummaryResponse = serde_json::from_str(
            r#"{"quoteSummary":{"result":null,"error":{"code":"Not Found","description":"Quote not found"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            YahooProvider::parse_summary("ZZZ", resp),
            Err(DataError::SymbolNotFound { .. })
        ));
    }
}
