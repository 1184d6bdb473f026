//! Capital allocation across volatility sleeves.
//!
//! Candidates (normally the bullish tier) are split into three sleeves by
//! realized volatility. Low and medium sleeves also require a quality score;
//! the high sleeve has no floor. Each sleeve receives `capital * weight` and
//! buys its top picks with an even split.
//!
//! When a weighted sleeve has no members:
//! - high takes the most volatile candidates from the whole pool
//! - medium takes the low sleeve's members
//! - low is skipped and its budget stays as cash
//!
//! Every position buys at least one share, so a pick priced above its budget
//! can push the residual below zero.

use serde::{Deserialize, Serialize};
use std::fmt;

use stockpulse_core::config::AllocationConfig;
use stockpulse_core::domain::validate_capital;
use stockpulse_core::{Ticker, ValidationError};

use crate::ranking::RankedCandidate;
use crate::risk_profile::RiskProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sleeve {
    Low,
    Medium,
    High,
}

impl Sleeve {
    pub const ALL: [Sleeve; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low volatility",
            Self::Medium => "medium volatility",
            Self::High => "high volatility",
        }
    }
}

impl fmt::Display for Sleeve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a sleeve's picks came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleeveSource {
    /// Its own members.
    Members,
    /// High sleeve was empty; most volatile of the whole pool.
    VolatilePool,
    /// Medium sleeve was empty; borrowed the low sleeve's members.
    LowSleeve,
    /// Zero weight, or empty with no fallback. Budget kept as cash.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleeveFill {
    pub sleeve: Sleeve,
    pub weight: f64,
    pub budget: f64,
    pub source: SleeveSource,
    pub picks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub sleeve: Sleeve,
    pub ticker: Ticker,
    pub unit_price: f64,
    pub shares: u64,
    pub line_total: f64,
    pub score: u8,
    pub volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub capital: f64,
    pub profile: RiskProfile,
    pub lines: Vec<AllocationLine>,
    pub sleeves: Vec<SleeveFill>,
    /// `capital` minus the sum of line totals.
    pub residual: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub invested: f64,
    pub cash: f64,
    pub positions: usize,
    /// Mean score of the positions, `None` for an empty plan.
    pub average_quality: Option<f64>,
}

impl AllocationPlan {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn invested(&self) -> f64 {
        self.lines.iter().map(|l| l.line_total).sum()
    }

    pub fn lines_in(&self, sleeve: Sleeve) -> impl Iterator<Item = &AllocationLine> {
        self.lines.iter().filter(move |l| l.sleeve == sleeve)
    }

    pub fn summary(&self) -> AllocationSummary {
        let positions = self.lines.len();
        let average_quality = (positions > 0).then(|| {
            self.lines.iter().map(|l| f64::from(l.score)).sum::<f64>() / positions as f64
        });
        AllocationSummary {
            invested: self.invested(),
            cash: self.residual,
            positions,
            average_quality,
        }
    }
}

/// Sleeve membership by volatility and score.
pub fn sleeve_of(candidate: &RankedCandidate, settings: &AllocationConfig) -> Option<Sleeve> {
    let vol = candidate.volatility();
    let quality = candidate.score() >= settings.quality_floor;
    if vol > settings.medium_volatility_max {
        Some(Sleeve::High)
    } else if vol > settings.low_volatility_max {
        quality.then_some(Sleeve::Medium)
    } else {
        quality.then_some(Sleeve::Low)
    }
}

/// Top `n` by score, then by volatility for the high sleeve. Stable.
fn top_picks<'c>(
    mut members: Vec<&'c RankedCandidate>,
    sleeve: Sleeve,
    n: usize,
) -> Vec<&'c RankedCandidate> {
    match sleeve {
        Sleeve::High => members.sort_by(|a, b| b.volatility().total_cmp(&a.volatility())),
        Sleeve::Low | Sleeve::Medium => members.sort_by(|a, b| b.score().cmp(&a.score())),
    }
    members.truncate(n);
    members
}

pub fn allocate(
    capital: f64,
    profile: RiskProfile,
    candidates: &[RankedCandidate],
    settings: &AllocationConfig,
) -> Result<AllocationPlan, ValidationError> {
    let capital = validate_capital(capital)?;
    let weights = profile.weights();

    let pool: Vec<&RankedCandidate> = candidates.iter().filter(|c| c.price > 0.0).collect();
    let members = |sleeve: Sleeve| {
        pool.iter()
            .copied()
            .filter(|c| sleeve_of(c, settings) == Some(sleeve))
            .collect::<Vec<_>>()
    };

    let mut lines = Vec::new();
    let mut sleeves = Vec::with_capacity(3);

    for sleeve in Sleeve::ALL {
        let weight = match sleeve {
            Sleeve::Low => weights.low,
            Sleeve::Medium => weights.medium,
            Sleeve::High => weights.high,
        };
        let budget = capital * weight;

        let (source, chosen) = if weight <= 0.0 {
            (SleeveSource::Skipped, Vec::new())
        } else {
            let own = members(sleeve);
            if !own.is_empty() {
                (SleeveSource::Members, own)
            } else {
                match sleeve {
                    Sleeve::High if !pool.is_empty() => (
                        SleeveSource::VolatilePool,
                        top_picks(pool.clone(), Sleeve::High, settings.high_fallback_picks),
                    ),
                    Sleeve::Medium => {
                        let low = members(Sleeve::Low);
                        if low.is_empty() {
                            (SleeveSource::Skipped, low)
                        } else {
                            (SleeveSource::LowSleeve, low)
                        }
                    }
                    _ => (SleeveSource::Skipped, Vec::new()),
                }
            }
        };

        let picks = top_picks(chosen, sleeve, settings.picks_per_sleeve);
        if !picks.is_empty() {
            let per_pick = budget / picks.len() as f64;
            for c in &picks {
                let shares = ((per_pick / c.price).floor() as u64).max(1);
                lines.push(AllocationLine {
                    sleeve,
                    ticker: c.ticker.clone(),
                    unit_price: c.price,
                    shares,
                    line_total: shares as f64 * c.price,
                    score: c.score(),
                    volatility: c.volatility(),
                });
            }
        } else if weight > 0.0 {
            tracing::warn!(sleeve = sleeve.label(), budget, "sleeve empty; budget kept as cash");
        }

        sleeves.push(SleeveFill {
            sleeve,
            weight,
            budget,
            source: if picks.is_empty() { SleeveSource::Skipped } else { source },
            picks: picks.len(),
        });
    }

    let invested: f64 = lines.iter().map(|l| l.line_total).sum();
    let plan = AllocationPlan {
        capital,
        profile,
        lines,
        sleeves,
        residual: capital - invested,
    };
    tracing::info!(
        %profile,
        capital,
        positions = plan.lines.len(),
        invested,
        residual = plan.residual,
        "allocation built"
    );
    Ok(plan)
}
