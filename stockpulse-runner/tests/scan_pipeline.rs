//! End-to-end scans through the in-memory provider.

use chrono::NaiveDate;
use stockpulse_core::config::PulseConfig;
use stockpulse_core::data::{DataError, DataSource, InMemoryProvider};
use stockpulse_core::{FundamentalSnapshot, PriceSeries, Ticker, TrendState};
use stockpulse_runner::{RankingAggregator, Tier};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// 60 closes alternating `+up` and `-down` daily returns, ending on an up day.
fn zigzag(symbol: &str, base: f64, up: f64, down: f64) -> PriceSeries {
    let mut closes = vec![base];
    for i in 0..59 {
        let prev = closes[closes.len() - 1];
        let r = if i % 2 == 0 { up } else { -down };
        closes.push(prev * (1.0 + r));
    }
    PriceSeries::from_closes(symbol, start(), &closes)
}

fn downtrend(symbol: &str) -> PriceSeries {
    let mut closes = vec![100.0; 59];
    closes.push(90.0);
    PriceSeries::from_closes(symbol, start(), &closes)
}

fn strong() -> FundamentalSnapshot {
    FundamentalSnapshot {
        price_earnings: Some(20.0),
        debt_to_equity: Some(80.0),
        profit_margin: Some(0.15),
        dividend_yield: Some(0.03),
        revenue_growth: Some(0.08),
    }
}

/// Scores 7.
fn solid() -> FundamentalSnapshot {
    FundamentalSnapshot {
        price_earnings: Some(30.0),
        dividend_yield: None,
        ..strong()
    }
}

/// Scores 4.
fn thin() -> FundamentalSnapshot {
    FundamentalSnapshot {
        price_earnings: Some(20.0),
        ..Default::default()
    }
}

fn provider() -> InMemoryProvider {
    InMemoryProvider::new()
        .with_series(zigzag("SAN.MC", 4.0, 0.004, 0.002))
        .with_series(zigzag("BBVA.MC", 9.0, 0.014, 0.010))
        .with_series(zigzag("ITX.MC", 40.0, 0.004, 0.002))
        .with_series(zigzag("AAPL", 180.0, 0.004, 0.002))
        .with_series(downtrend("TEF.MC"))
        .with_series(zigzag("REP.MC", 14.0, 0.004, 0.002))
        .with_fundamentals("SAN.MC", strong())
        .with_fundamentals("BBVA.MC", solid())
        .with_fundamentals("ITX.MC", thin())
        .with_fundamentals("AAPL", strong())
        .with_fundamentals_error("REP.MC", DataError::RateLimited { retry_after_secs: 30 })
        .with_fx(1.25)
}

fn tickers() -> Vec<Ticker> {
    [
        ("SAN.MC", "Banco Santander"),
        ("BBVA.MC", "BBVA"),
        ("ITX.MC", "Inditex (Zara)"),
        ("AAPL", "Apple"),
        ("TEF.MC", "Telefónica"),
        ("REP.MC", "Repsol"),
        ("NOPE.MC", "Nope"),
    ]
    .iter()
    .map(|(s, n)| Ticker::new(*s, *n))
    .collect()
}

fn symbols(candidates: &[stockpulse_runner::RankedCandidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.ticker.symbol.as_str()).collect()
}

#[test]
fn scan_buckets_and_orders() {
    let provider = provider();
    let config = PulseConfig::default();
    let report = RankingAggregator::new(&provider, &config)
        .ending(end())
        .rank(&tickers());

    assert_eq!(symbols(&report.bullish), vec!["SAN.MC", "AAPL", "BBVA.MC"]);
    assert_eq!(symbols(&report.caution), vec!["ITX.MC", "REP.MC"]);
    assert_eq!(symbols(&report.bearish), vec!["TEF.MC"]);

    assert_eq!(report.scanned, 7);
    assert_eq!(report.ranked(), 6);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].ticker.symbol, "NOPE.MC");
    assert!(!report.no_data);
    assert_eq!(report.source, DataSource::InMemory);
    assert_eq!(report.as_of, Some(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
}

#[test]
fn fundamentals_failure_scores_zero_but_is_kept() {
    let provider = provider();
    let config = PulseConfig::default();
    let report = RankingAggregator::new(&provider, &config)
        .ending(end())
        .rank(&tickers());

    let rep = report
        .caution
        .iter()
        .find(|c| c.ticker.symbol == "REP.MC")
        .unwrap();
    assert_eq!(rep.score(), 0);
    assert_eq!(rep.verdict.state, TrendState::Bullish);
    assert!(rep.fundamentals.note.as_deref().unwrap().contains("rate limited"));
    assert_eq!(report.degraded(), 2); // REP.MC plus TEF.MC, which has no fundamentals
}

#[test]
fn foreign_prices_are_converted() {
    let provider = provider();
    let config = PulseConfig::default();
    let report = RankingAggregator::new(&provider, &config)
        .ending(end())
        .rank(&tickers());

    assert!((report.exchange_rate - 0.8).abs() < 1e-12);
    let aapl = report.bullish.iter().find(|c| c.ticker.symbol == "AAPL").unwrap();
    assert!((aapl.price - aapl.native_price() * 0.8).abs() < 1e-9);
    let san = report.bullish.iter().find(|c| c.ticker.symbol == "SAN.MC").unwrap();
    assert_eq!(san.price, san.native_price());
}

#[test]
fn rank_is_deterministic() {
    let provider = provider();
    let config = PulseConfig::default();
    let aggregator = RankingAggregator::new(&provider, &config).ending(end());
    let first = aggregator.rank(&tickers());
    let second = aggregator.rank(&tickers());

    for tier in Tier::ALL {
        assert_eq!(symbols(first.tier(tier)), symbols(second.tier(tier)));
    }
    assert_eq!(first.fingerprint, second.fingerprint);
}

#[test]
fn total_outage_is_flagged_not_raised() {
    let provider = InMemoryProvider::new()
        .failing_batch_with("SAN.MC")
        .failing_batch_with("AAPL");
    let config = PulseConfig::default();
    let report = RankingAggregator::new(&provider, &config)
        .ending(end())
        .rank(&[Ticker::new("SAN.MC", "x"), Ticker::new("AAPL", "y")]);

    assert!(report.no_data);
    assert_eq!(report.ranked(), 0);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.exchange_rate, 1.0);
}

#[test]
fn foreign_outage_keeps_domestic_ranking() {
    let provider = provider().failing_batch_with("AAPL");
    let config = PulseConfig::default();
    let report = RankingAggregator::new(&provider, &config)
        .ending(end())
        .rank(&tickers());

    assert_eq!(symbols(&report.bullish), vec!["SAN.MC", "BBVA.MC"]);
    assert!(report.skipped.iter().any(|s| s.ticker.symbol == "AAPL"));
}

#[test]
fn stricter_threshold_moves_candidates_to_caution() {
    let provider = provider();
    let mut config = PulseConfig::default();
    config.ranking.bullish_min_score = 8;
    let report = RankingAggregator::new(&provider, &config)
        .ending(end())
        .rank(&tickers());
    assert_eq!(symbols(&report.bullish), vec!["SAN.MC", "AAPL"]);
    assert_eq!(symbols(&report.caution), vec!["BBVA.MC", "ITX.MC", "REP.MC"]);
}
