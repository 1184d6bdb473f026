//! Fetch and classify through the in-memory provider.

use chrono::NaiveDate;
use stockpulse_core::config::{PulseConfig, TechnicalConfig};
use stockpulse_core::data::{
    DataError, InMemoryProvider, MarketDataFetcher, MarketDataProvider, SyntheticProvider,
    Watchlist,
};
use stockpulse_core::domain::PricePoint;
use stockpulse_core::technical::classify_with;
use stockpulse_core::{classify, score, FundamentalSnapshot, PriceSeries, Ticker, TrendState};

fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(n)
}

fn end() -> NaiveDate {
    day(120)
}

#[test]
fn flat_then_drop_is_downtrend() {
    let mut closes = vec![100.0; 59];
    closes.push(90.0);
    let v = classify(&PriceSeries::from_closes("SAN.MC", day(0), &closes));
    assert_eq!(v.state, TrendState::Bearish);
    assert_eq!(v.reason, "downtrend");
    assert_eq!(v.last_price, 90.0);
}

#[test]
fn strong_snapshot_scores_ten() {
    let s = score(&FundamentalSnapshot {
        price_earnings: Some(20.0),
        debt_to_equity: Some(80.0),
        profit_margin: Some(0.15),
        dividend_yield: Some(0.03),
        revenue_growth: Some(0.08),
    });
    assert_eq!(s.score, 10);
}

#[test]
fn foreign_outage_leaves_domestic_usable() {
    let provider = InMemoryProvider::new()
        .with_series(PriceSeries::from_closes("SAN.MC", day(0), &[4.0, 4.1, 4.2]))
        .with_series(PriceSeries::from_closes("AAPL", day(0), &[190.0, 191.0, 192.0]))
        .failing_batch_with("AAPL");
    let config = PulseConfig::default();
    let fetcher = MarketDataFetcher::ending(&provider, &config.provider, end());

    let table = fetcher.fetch(&[
        Ticker::new("SAN.MC", "Banco Santander"),
        Ticker::new("AAPL", "Apple"),
    ]);

    assert_eq!(table.symbols(), &["SAN.MC".to_string()]);
    let rate = fetcher.exchange_rate();
    assert!(rate.is_finite() && rate > 0.0);
}

#[test]
fn sparse_columns_keep_holes() {
    // Madrid trades on a US holiday and vice versa.
    let provider = InMemoryProvider::new()
        .with_series(PriceSeries::new(
            "BBVA.MC",
            vec![PricePoint::new(day(0), 9.0), PricePoint::new(day(1), 9.1)],
        ))
        .with_series(PriceSeries::new(
            "KO",
            vec![PricePoint::new(day(1), 60.0), PricePoint::new(day(2), 61.0)],
        ));
    let config = PulseConfig::default();
    let fetcher = MarketDataFetcher::ending(&provider, &config.provider, end());
    let table = fetcher.fetch(&[Ticker::new("BBVA.MC", "BBVA"), Ticker::new("KO", "Coca-Cola")]);

    assert_eq!(table.dates, vec![day(0), day(1), day(2)]);
    assert_eq!(table.column("BBVA.MC").unwrap(), &[Some(9.0), Some(9.1), None]);
    assert_eq!(table.column("KO").unwrap(), &[None, Some(60.0), Some(61.0)]);
    // Holes never reach the classifier.
    assert_eq!(table.series("BBVA.MC").unwrap().closes(), vec![9.0, 9.1]);
}

#[test]
fn multi_symbol_segments_are_labeled() {
    let provider = InMemoryProvider::new()
        .with_series(PriceSeries::from_closes("SAN.MC", day(0), &[4.0, 4.1]))
        .with_series(PriceSeries::from_closes("BBVA.MC", day(0), &[9.0, 9.2]));
    let config = PulseConfig::default();
    let fetcher = MarketDataFetcher::ending(&provider, &config.provider, end());
    let table = fetcher.fetch(&[Ticker::new("SAN.MC", "x"), Ticker::new("BBVA.MC", "y")]);
    assert_eq!(provider.calls(), 1);
    assert_eq!(table.symbols().len(), 2);
}

#[test]
fn nothing_fetched_is_empty_not_error() {
    let provider = InMemoryProvider::new();
    let config = PulseConfig::default();
    let fetcher = MarketDataFetcher::ending(&provider, &config.provider, end());
    assert!(fetcher.fetch(&[Ticker::new("NOPE", "NOPE")]).is_empty());
    assert!(fetcher.fetch(&[]).is_empty());
}

#[test]
fn synthetic_watchlist_classifies_everything() {
    let provider = SyntheticProvider::new(3);
    let config = PulseConfig::default();
    let fetcher = MarketDataFetcher::ending(&provider, &config.provider, end());
    let watchlist = Watchlist::reference();
    let table = fetcher.fetch(watchlist.tickers());

    assert_eq!(table.symbols().len(), watchlist.len());
    for symbol in table.symbols() {
        let series = table.series(symbol).unwrap();
        let v = classify_with(&series, &TechnicalConfig::default());
        assert_ne!(v.state, TrendState::Error, "{symbol}");
    }
}

#[test]
fn fundamentals_error_propagates_from_provider() {
    let provider = InMemoryProvider::new()
        .with_fundamentals_error("TEF.MC", DataError::RateLimited { retry_after_secs: 60 });
    assert!(matches!(
        provider.fundamentals("TEF.MC"),
        Err(DataError::RateLimited { .. })
    ));
}
