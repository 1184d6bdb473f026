//! StockPulse Core: domain types, market data, technical and fundamental scoring.
//!
//! This crate holds everything that turns raw provider fields into a verdict:
//! - Domain types (tickers, price series, aligned price tables, snapshots)
//! - The reference watchlist and free-text ticker resolution
//! - Market data providers (Yahoo Finance, synthetic, in-memory) behind one trait
//! - The segment-isolated fetcher and exchange-rate lookup
//! - Indicators (trailing SMA, realized volatility, return statistics)
//! - The technical classifier and the fundamental scorer
//! - TOML configuration with named defaults for every threshold

pub mod config;
pub mod data;
pub mod domain;
pub mod fundamental;
pub mod indicators;
pub mod technical;

pub use config::{ConfigError, PulseConfig};
pub use domain::{
    FundamentalSnapshot, Market, PriceSeries, PriceTable, Ticker, ValidationError,
};
pub use fundamental::{score, BreakdownEntry, FundamentalScore, Indicator, Rating};
pub use technical::{classify, TechnicalVerdict, TrendState};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner hands across request
    /// boundaries is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Ticker>();
        require_sync::<Ticker>();
        require_send::<PriceSeries>();
        require_sync::<PriceSeries>();
        require_send::<PriceTable>();
        require_sync::<PriceTable>();
        require_send::<FundamentalSnapshot>();
        require_sync::<FundamentalSnapshot>();
        require_send::<FundamentalScore>();
        require_sync::<FundamentalScore>();
        require_send::<TechnicalVerdict>();
        require_sync::<TechnicalVerdict>();
        require_send::<PulseConfig>();
        require_sync::<PulseConfig>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
    }

    /// The classifier only sees prices; it cannot reach fundamentals or
    /// provider state. This pins the signature.
    #[test]
    fn classifier_takes_only_a_series_and_settings() {
        fn _check(
            series: &PriceSeries,
            settings: &config::TechnicalConfig,
        ) -> TechnicalVerdict {
            technical::classify_with(series, settings)
        }
    }
}
