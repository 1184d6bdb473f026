//! Ranking aggregator: scan a watchlist into bullish, caution and bearish tiers.
//!
//! Two phases over one price fetch:
//! 1. Classify every fetched series. Tickers without prices or with an
//!    unclassifiable series are recorded as skipped.
//! 2. Score fundamentals for the survivors only. A fundamentals failure
//!    scores 0 with the failure as a note; the ticker is still bucketed.
//!
//! Foreign prices are converted to the domestic currency before bucketing.
//! The whole pass is sequential and never fails: an empty fetch yields a
//! report flagged `no_data`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use stockpulse_core::config::PulseConfig;
use stockpulse_core::data::{DataSource, MarketDataFetcher, MarketDataProvider};
use stockpulse_core::technical::classify_with;
use stockpulse_core::{score, FundamentalScore, PriceTable, TechnicalVerdict, Ticker, TrendState};

/// Ranking bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bullish,
    Caution,
    Bearish,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Self::Bullish, Self::Caution, Self::Bearish];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Caution => "caution",
            Self::Bearish => "bearish",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket for a (trend, score) pair.
///
/// BULLISH needs the minimum quality score to stay bullish; BEARISH is
/// always bearish; everything else, including a weak BULLISH, is caution.
pub fn assign_tier(state: TrendState, score: u8, bullish_min_score: u8) -> Tier {
    match state {
        TrendState::Bullish if score >= bullish_min_score => Tier::Bullish,
        TrendState::Bearish => Tier::Bearish,
        _ => Tier::Caution,
    }
}

/// A ticker that made it through both phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub ticker: Ticker,
    pub verdict: TechnicalVerdict,
    pub fundamentals: FundamentalScore,
    /// Latest close in domestic currency.
    pub price: f64,
    pub tier: Tier,
}

impl RankedCandidate {
    pub fn score(&self) -> u8 {
        self.fundamentals.score
    }

    pub fn volatility(&self) -> f64 {
        self.verdict.volatility
    }

    /// Latest close in the listing's own currency.
    pub fn native_price(&self) -> f64 {
        self.verdict.last_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTicker {
    pub ticker: Ticker,
    pub reason: String,
}

/// Per-ticker result of a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Ranked(RankedCandidate),
    Skipped(SkippedTicker),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    pub bullish: Vec<RankedCandidate>,
    pub caution: Vec<RankedCandidate>,
    pub bearish: Vec<RankedCandidate>,
    pub skipped: Vec<SkippedTicker>,
    pub scanned: usize,
    /// Nothing could be fetched for any requested ticker.
    pub no_data: bool,
    /// Domestic units per foreign unit applied to foreign prices.
    pub exchange_rate: f64,
    pub source: DataSource,
    /// Last date in the fetched price table.
    pub as_of: Option<NaiveDate>,
    /// BLAKE3 over the ordered tier membership and scores.
    pub fingerprint: String,
}

impl RankingReport {
    pub fn tier(&self, tier: Tier) -> &[RankedCandidate] {
        match tier {
            Tier::Bullish => &self.bullish,
            Tier::Caution => &self.caution,
            Tier::Bearish => &self.bearish,
        }
    }

    pub fn ranked(&self) -> usize {
        self.bullish.len() + self.caution.len() + self.bearish.len()
    }

    /// Ranked candidates whose fundamentals could not be loaded.
    pub fn degraded(&self) -> usize {
        Tier::ALL
            .iter()
            .flat_map(|t| self.tier(*t))
            .filter(|c| c.fundamentals.is_unavailable())
            .count()
    }
}

/// Deterministic digest of tier membership, order and scores.
pub fn tier_fingerprint(
    bullish: &[RankedCandidate],
    caution: &[RankedCandidate],
    bearish: &[RankedCandidate],
) -> String {
    let mut hasher = blake3::Hasher::new();
    for (tier, members) in [
        (Tier::Bullish, bullish),
        (Tier::Caution, caution),
        (Tier::Bearish, bearish),
    ] {
        hasher.update(tier.label().as_bytes());
        for c in members {
            hasher.update(c.ticker.symbol.as_bytes());
            hasher.update(&[c.fundamentals.score]);
        }
        hasher.update(b";");
    }
    hasher.finalize().to_hex().to_string()
}

pub struct RankingAggregator<'a> {
    provider: &'a dyn MarketDataProvider,
    config: &'a PulseConfig,
    end: Option<NaiveDate>,
}

impl<'a> RankingAggregator<'a> {
    pub fn new(provider: &'a dyn MarketDataProvider, config: &'a PulseConfig) -> Self {
        Self {
            provider,
            config,
            end: None,
        }
    }

    /// Pin the end of the price window, for reproducible scans.
    pub fn ending(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    fn fetcher(&self) -> MarketDataFetcher<'a> {
        match self.end {
            Some(end) => MarketDataFetcher::ending(self.provider, &self.config.provider, end),
            None => MarketDataFetcher::new(self.provider, &self.config.provider),
        }
    }

    pub fn rank(&self, tickers: &[Ticker]) -> RankingReport {
        let fetcher = self.fetcher();
        let table = fetcher.fetch(tickers);
        let no_data = table.is_empty();

        // Phase 1: technical.
        let mut survivors: Vec<(&Ticker, TechnicalVerdict)> = Vec::new();
        let mut skipped = Vec::new();
        for ticker in tickers {
            match self.classify(ticker, &table) {
                Ok(verdict) => survivors.push((ticker, verdict)),
                Err(reason) => {
                    tracing::warn!(symbol = %ticker.symbol, %reason, "ticker skipped");
                    skipped.push(SkippedTicker {
                        ticker: ticker.clone(),
                        reason,
                    });
                }
            }
        }

        let exchange_rate = if survivors.iter().any(|(t, _)| !t.is_domestic()) {
            fetcher.exchange_rate()
        } else {
            1.0
        };

        // Phase 2: fundamentals and bucketing.
        let mut bullish = Vec::new();
        let mut caution = Vec::new();
        let mut bearish = Vec::new();
        for (ticker, verdict) in survivors {
            let candidate = self.evaluate(ticker, verdict, exchange_rate);
            match candidate.tier {
                Tier::Bullish => bullish.push(candidate),
                Tier::Caution => caution.push(candidate),
                Tier::Bearish => bearish.push(candidate),
            }
        }

        // Stable: equal scores keep scan order.
        bullish.sort_by(|a, b| b.score().cmp(&a.score()));
        caution.sort_by(|a, b| b.score().cmp(&a.score()));

        let fingerprint = tier_fingerprint(&bullish, &caution, &bearish);
        let report = RankingReport {
            bullish,
            caution,
            bearish,
            skipped,
            scanned: tickers.len(),
            no_data,
            exchange_rate,
            source: self.provider.source(),
            as_of: table.dates.last().copied(),
            fingerprint,
        };

        tracing::info!(
            scanned = report.scanned,
            bullish = report.bullish.len(),
            caution = report.caution.len(),
            bearish = report.bearish.len(),
            skipped = report.skipped.len(),
            no_data = report.no_data,
            "scan complete"
        );
        report
    }

    /// Outcome for a single ticker against an already fetched table.
    pub fn outcome(
        &self,
        ticker: &Ticker,
        table: &PriceTable,
        exchange_rate: f64,
    ) -> TickerOutcome {
        match self.classify(ticker, table) {
            Ok(verdict) => TickerOutcome::Ranked(self.evaluate(ticker, verdict, exchange_rate)),
            Err(reason) => TickerOutcome::Skipped(SkippedTicker {
                ticker: ticker.clone(),
                reason,
            }),
        }
    }

    fn classify(&self, ticker: &Ticker, table: &PriceTable) -> Result<TechnicalVerdict, String> {
        let series = table
            .series(&ticker.symbol)
            .ok_or_else(|| "no price data".to_string())?;
        let verdict = classify_with(&series, &self.config.technical);
        if verdict.is_error() {
            return Err(verdict.reason);
        }
        tracing::debug!(
            symbol = %ticker.symbol,
            state = %verdict.state,
            volatility = verdict.volatility,
            "classified"
        );
        Ok(verdict)
    }

    fn evaluate(
        &self,
        ticker: &Ticker,
        verdict: TechnicalVerdict,
        exchange_rate: f64,
    ) -> RankedCandidate {
        let fundamentals = match self.provider.fundamentals(&ticker.symbol) {
            Ok(snapshot) => score(&snapshot),
            Err(e) => {
                tracing::warn!(
                    symbol = %ticker.symbol,
                    error = %e,
                    "fundamentals unavailable; scoring 0"
                );
                FundamentalScore::unavailable(e.to_string())
            }
        };
        let price = if ticker.is_domestic() {
            verdict.last_price
        } else {
            verdict.last_price * exchange_rate
        };
        let tier = assign_tier(
            verdict.state,
            fundamentals.score,
            self.config.ranking.bullish_min_score,
        );
        RankedCandidate {
            ticker: ticker.clone(),
            verdict,
            fundamentals,
            price,
            tier,
        }
    }
}
