//! Market data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over data sources (Yahoo Finance,
//! synthetic random walks, in-memory tables) so the fetcher and the ranking
//! pipeline can swap implementations and run against fixtures in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::{FundamentalSnapshot, PricePoint};

/// Structured error types for data operations.
///
/// `SymbolNotFound` (the provider does not know the symbol) and `NoData`
/// (the symbol exists but nothing came back) are deliberately distinct.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no data returned for {symbol}")]
    NoData { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

/// Daily closes as a provider hands them back.
///
/// Batch requests come back as one labeled column per symbol. Many providers
/// collapse a single-symbol request into one unlabeled series; the fetcher
/// relabels that with the requested symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum ClosesResponse {
    Labeled(BTreeMap<String, Vec<PricePoint>>),
    Unlabeled(Vec<PricePoint>),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    InMemory,
    Synthetic,
}

impl DataSource {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic)
    }
}

/// Trait for market data providers.
///
/// Calls are blocking; the pipeline runs them strictly one after another.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Daily closes for a batch of symbols over `[start, end]`.
    fn daily_closes(
        &self,
        symbols: &[&str],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ClosesResponse, DataError>;

    /// Latest spot close of an FX pair symbol (e.g. `EURUSD=X`).
    fn fx_rate(&self, pair: &str) -> Result<f64, DataError>;

    /// Current ratio snapshot for one symbol.
    fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, DataError>;
}
