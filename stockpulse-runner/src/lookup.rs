//! Individual lookup: one ticker, fully explained.
//!
//! Resolves free text against the watchlist, then runs the same classify,
//! score and convert path as a scan, and adds a recommendation and a short
//! narrative of what drove it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use stockpulse_core::config::{PulseConfig, TechnicalConfig};
use stockpulse_core::data::{DataSource, MarketDataFetcher, MarketDataProvider, Watchlist};
use stockpulse_core::fundamental::{FundamentalScore, Indicator, Rating};
use stockpulse_core::indicators::ReturnStats;
use stockpulse_core::{TechnicalVerdict, Ticker, TrendState, ValidationError};

use crate::ranking::{RankedCandidate, RankingAggregator, TickerOutcome};

const STRONG_BUY_MIN_SCORE: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Hold,
    Downtrend,
    Avoid,
}

impl Recommendation {
    pub fn from_verdict(state: TrendState, score: u8, bullish_min_score: u8) -> Self {
        match state {
            TrendState::Bullish if score >= STRONG_BUY_MIN_SCORE => Self::StrongBuy,
            TrendState::Bullish if score >= bullish_min_score => Self::Hold,
            TrendState::Caution => Self::Hold,
            TrendState::Bearish => Self::Downtrend,
            _ => Self::Avoid,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Hold => "HOLD / CAUTION",
            Self::Downtrend => "DOWNTREND",
            Self::Avoid => "AVOID (weak)",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the reported price relates to the listing currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceCurrency {
    Domestic,
    Converted { rate: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub technical: String,
    pub fundamental: String,
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.technical, self.fundamental)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupReport {
    pub ticker: Ticker,
    pub verdict: TechnicalVerdict,
    pub fundamentals: FundamentalScore,
    /// Latest close in domestic currency.
    pub price: f64,
    pub currency: PriceCurrency,
    pub recommendation: Recommendation,
    pub narrative: Narrative,
    pub returns: Option<ReturnStats>,
    pub source: DataSource,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(Box<LookupReport>),
    NoData { symbol: String },
}

pub fn technical_sentence(verdict: &TechnicalVerdict, settings: &TechnicalConfig) -> String {
    let pct = verdict.volatility * 100.0;
    let vol = if verdict.volatility > settings.high_volatility_notice {
        format!("High volatility ({pct:.1}%).")
    } else {
        format!("Stable volatility ({pct:.1}%).")
    };
    format!("Technical: {} trend, {}. {vol}", verdict.state, verdict.reason)
}

pub fn fundamental_sentence(score: &FundamentalScore) -> String {
    if let Some(note) = &score.note {
        return format!("Fundamental: unavailable ({note}).");
    }
    let mut s = format!("Fundamental: strength {}/10.", score.score);
    match score.rating(Indicator::Profitability) {
        Rating::High => s.push_str(" High profitability."),
        Rating::Losses => s.push_str(" Losing money."),
        _ => {}
    }
    if score.rating(Indicator::Valuation) == Rating::Expensive {
        s.push_str(" Demanding price.");
    }
    if score.rating(Indicator::Dividend) == Rating::Rich {
        s.push_str(" Good dividend.");
    }
    s
}

pub struct Lookup<'a> {
    provider: &'a dyn MarketDataProvider,
    config: &'a PulseConfig,
    watchlist: &'a Watchlist,
    end: Option<NaiveDate>,
}

impl<'a> Lookup<'a> {
    pub fn new(
        provider: &'a dyn MarketDataProvider,
        config: &'a PulseConfig,
        watchlist: &'a Watchlist,
    ) -> Self {
        Self {
            provider,
            config,
            watchlist,
            end: None,
        }
    }

    pub fn ending(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    /// Look up a ticker by symbol or name. Blank input is rejected before
    /// any provider call.
    pub fn run(&self, query: &str) -> Result<LookupOutcome, ValidationError> {
        let ticker = self.watchlist.resolve(query)?;
        tracing::info!(query, symbol = %ticker.symbol, "lookup");

        let fetcher = match self.end {
            Some(end) => MarketDataFetcher::ending(self.provider, &self.config.provider, end),
            None => MarketDataFetcher::new(self.provider, &self.config.provider),
        };
        let table = fetcher.fetch(std::slice::from_ref(&ticker));
        let Some(series) = table.series(&ticker.symbol) else {
            return Ok(LookupOutcome::NoData {
                symbol: ticker.symbol,
            });
        };

        let rate = if ticker.is_domestic() {
            1.0
        } else {
            fetcher.exchange_rate()
        };

        let mut aggregator = RankingAggregator::new(self.provider, self.config);
        if let Some(end) = self.end {
            aggregator = aggregator.ending(end);
        }
        let candidate = match aggregator.outcome(&ticker, &table, rate) {
            TickerOutcome::Ranked(c) => c,
            TickerOutcome::Skipped(s) => {
                tracing::warn!(symbol = %s.ticker.symbol, reason = %s.reason, "lookup skipped");
                return Ok(LookupOutcome::NoData {
                    symbol: s.ticker.symbol,
                });
            }
        };

        let returns = ReturnStats::from_closes(&series.closes());
        Ok(LookupOutcome::Found(Box::new(self.report(
            candidate,
            rate,
            returns,
            table.dates.last().copied(),
        ))))
    }

    fn report(
        &self,
        candidate: RankedCandidate,
        rate: f64,
        returns: Option<ReturnStats>,
        as_of: Option<NaiveDate>,
    ) -> LookupReport {
        let recommendation = Recommendation::from_verdict(
            candidate.verdict.state,
            candidate.score(),
            self.config.ranking.bullish_min_score,
        );
        let narrative = Narrative {
            technical: technical_sentence(&candidate.verdict, &self.config.technical),
            fundamental: fundamental_sentence(&candidate.fundamentals),
        };
        let currency = if candidate.ticker.is_domestic() {
            PriceCurrency::Domestic
        } else {
            PriceCurrency::Converted { rate }
        };
        LookupReport {
            price: candidate.price,
            ticker: candidate.ticker,
            verdict: candidate.verdict,
            fundamentals: candidate.fundamentals,
            currency,
            recommendation,
            narrative,
            returns,
            source: self.provider.source(),
            as_of,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockpulse_core::score;
    use stockpulse_core::FundamentalSnapshot;

    fn verdict(state: TrendState, vol: f64) -> TechnicalVerdict {
        TechnicalVerdict {
            state,
            reason: "uptrend".into(),
            last_price: 10.0,
            volatility: vol,
            moving_average: 9.0,
        }
    }

    #[test]
    fn recommendation_table() {
        use Recommendation::*;
        assert_eq!(Recommendation::from_verdict(TrendState::Bullish, 8, 5), StrongBuy);
        assert_eq!(Recommendation::from_verdict(TrendState::Bullish, 7, 5), Hold);
        assert_eq!(Recommendation::from_verdict(TrendState::Bullish, 4, 5), Avoid);
        assert_eq!(Recommendation::from_verdict(TrendState::Caution, 0, 5), Hold);
        assert_eq!(Recommendation::from_verdict(TrendState::Bearish, 10, 5), Downtrend);
    }

    #[test]
    fn volatility_notice_threshold() {
        let cfg = TechnicalConfig::default();
        let calm = technical_sentence(&verdict(TrendState::Bullish, 0.025), &cfg);
        assert!(calm.ends_with("Stable volatility (2.5%)."), "{calm}");
        let wild = technical_sentence(&verdict(TrendState::Caution, 0.031), &cfg);
        assert!(wild.contains("High volatility (3.1%)"), "{wild}");
    }

    #[test]
    fn fundamental_highlights() {
        let s = score(&FundamentalSnapshot {
            price_earnings: Some(60.0),
            profit_margin: Some(0.2),
            dividend_yield: Some(0.04),
            ..Default::default()
        });
        let text = fundamental_sentence(&s);
        assert!(text.contains("High profitability."));
        assert!(text.contains("Demanding price."));
        assert!(text.contains("Good dividend."));
    }

    #[test]
    fn unavailable_fundamentals_are_explained() {
        let text = fundamental_sentence(&FundamentalScore::unavailable("rate limited"));
        assert_eq!(text, "Fundamental: unavailable (rate limited).");
    }
}
