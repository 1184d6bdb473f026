//! Sleeve selection and fallback precedence.

use stockpulse_core::config::AllocationConfig;
use stockpulse_core::fundamental::FundamentalScore;
use stockpulse_core::{TechnicalVerdict, Ticker, TrendState};
use stockpulse_runner::{allocate, RankedCandidate, RiskProfile, Sleeve, SleeveSource, Tier};

fn candidate(symbol: &str, price: f64, vol: f64, score: u8) -> RankedCandidate {
    let mut fundamentals = FundamentalScore::unavailable("fixture");
    fundamentals.score = score;
    fundamentals.note = None;
    RankedCandidate {
        ticker: Ticker::new(symbol, symbol),
        verdict: TechnicalVerdict {
            state: TrendState::Bullish,
            reason: "uptrend".into(),
            last_price: price,
            volatility: vol,
            moving_average: price * 0.95,
        },
        fundamentals,
        price,
        tier: Tier::Bullish,
    }
}

fn settings() -> AllocationConfig {
    AllocationConfig::default()
}

fn symbols_in(plan: &stockpulse_runner::AllocationPlan, sleeve: Sleeve) -> Vec<String> {
    plan.lines_in(sleeve).map(|l| l.ticker.symbol.clone()).collect()
}

#[test]
fn conservative_never_buys_high_sleeve() {
    let pool = vec![
        candidate("CALM", 10.0, 0.004, 9),
        candidate("WILD", 10.0, 0.040, 10),
    ];
    let plan = allocate(10_000.0, RiskProfile::Conservative, &pool, &settings()).unwrap();
    assert_eq!(symbols_in(&plan, Sleeve::High), Vec::<String>::new());
    assert_eq!(plan.sleeves[2].source, SleeveSource::Skipped);
    assert_eq!(plan.sleeves[2].weight, 0.0);
}

#[test]
fn empty_high_sleeve_takes_most_volatile_of_pool() {
    let pool = vec![
        candidate("A", 10.0, 0.004, 9),
        candidate("B", 10.0, 0.012, 8),
        candidate("C", 10.0, 0.009, 3),
        candidate("D", 10.0, 0.014, 2),
    ];
    let plan = allocate(10_000.0, RiskProfile::Aggressive, &pool, &settings()).unwrap();
    assert_eq!(plan.sleeves[2].source, SleeveSource::VolatilePool);
    // Pool fallback ignores the quality floor.
    assert_eq!(symbols_in(&plan, Sleeve::High), vec!["D", "B", "C"]);
}

#[test]
fn empty_medium_sleeve_borrows_low() {
    let pool = vec![
        candidate("A", 10.0, 0.004, 9),
        candidate("B", 10.0, 0.006, 10),
    ];
    let plan = allocate(10_000.0, RiskProfile::Moderate, &pool, &settings()).unwrap();
    assert_eq!(plan.sleeves[1].source, SleeveSource::LowSleeve);
    assert_eq!(symbols_in(&plan, Sleeve::Low), vec!["B", "A"]);
    assert_eq!(symbols_in(&plan, Sleeve::Medium), vec!["B", "A"]);
}

#[test]
fn empty_low_sleeve_keeps_cash() {
    let pool = vec![candidate("MID", 10.0, 0.012, 8)];
    let plan = allocate(10_000.0, RiskProfile::Moderate, &pool, &settings()).unwrap();
    assert_eq!(plan.sleeves[0].source, SleeveSource::Skipped);
    assert_eq!(symbols_in(&plan, Sleeve::Medium), vec!["MID"]);
    // 4000 into MID, the low sleeve's 6000 stays as cash.
    assert!((plan.residual - 6_000.0).abs() < 1e-9);
}

#[test]
fn low_quality_does_not_qualify_for_low_or_medium() {
    let pool = vec![candidate("WEAK", 10.0, 0.004, 6)];
    let plan = allocate(10_000.0, RiskProfile::Moderate, &pool, &settings()).unwrap();
    assert!(plan.is_empty());
    assert_eq!(plan.residual, 10_000.0);
}

#[test]
fn at_most_three_picks_per_sleeve() {
    let pool: Vec<_> = (0..6u8)
        .map(|i| candidate(&format!("L{i}"), 10.0, 0.005, 7 + i % 4))
        .collect();
    let plan = allocate(10_000.0, RiskProfile::Conservative, &pool, &settings()).unwrap();
    let low = symbols_in(&plan, Sleeve::Low);
    assert_eq!(low.len(), 3);
    // Scores 7,8,9,10,7,8: top three are L3 (10), L2 (9), L1 (8).
    assert_eq!(low, vec!["L3", "L2", "L1"]);
}

#[test]
fn configured_picks_per_sleeve() {
    let pool: Vec<_> = (0..5u8)
        .map(|i| candidate(&format!("L{i}"), 10.0, 0.005, 9))
        .collect();
    let settings = AllocationConfig {
        picks_per_sleeve: 5,
        ..settings()
    };
    let plan = allocate(10_000.0, RiskProfile::Conservative, &pool, &settings).unwrap();
    assert_eq!(plan.lines_in(Sleeve::Low).count(), 5);
}
