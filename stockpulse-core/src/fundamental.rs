//! Fundamental scorer: a 0-10 quality score from five company ratios.
//!
//! Each present ratio adjusts a raw score that starts at 0. The final score
//! is `clamp(raw + 2, 0, 10)`, so a snapshot with nothing usable lands on 2.
//! The breakdown lists all five indicators in a fixed order, absent ones
//! included, so reports always have the same shape.

use crate::domain::FundamentalSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Offset applied to the raw adjustment sum.
pub const BASELINE: i32 = 2;
pub const MAX_SCORE: u8 = 10;

const PE_GOOD_BELOW: f64 = 25.0;
const PE_EXPENSIVE_ABOVE: f64 = 50.0;
/// Debt/equity arrives in percent: 150 means 1.5x.
const DEBT_HIGH_FROM: f64 = 150.0;
const MARGIN_HIGH_ABOVE: f64 = 0.10;
const DIVIDEND_RICH_ABOVE: f64 = 0.02;
const GROWTH_RISING_ABOVE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Valuation,
    Debt,
    Profitability,
    Dividend,
    Growth,
}

impl Indicator {
    pub const ALL: [Indicator; 5] = [
        Self::Valuation,
        Self::Debt,
        Self::Profitability,
        Self::Dividend,
        Self::Growth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Valuation => "Valuation (P/E)",
            Self::Debt => "Debt",
            Self::Profitability => "Profitability",
            Self::Dividend => "Dividend",
            Self::Growth => "Growth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Good,
    Normal,
    Expensive,
    Low,
    High,
    Losses,
    Rich,
    Modest,
    NoDividend,
    Rising,
    Flat,
    Declining,
    NotAvailable,
}

impl Rating {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Normal => "Normal",
            Self::Expensive => "Expensive",
            Self::Low => "Low",
            Self::High => "High",
            Self::Losses => "Losses",
            Self::Rich => "Rich",
            Self::Modest => "Modest",
            Self::NoDividend => "None",
            Self::Rising => "Rising",
            Self::Flat => "Flat",
            Self::Declining => "Declining",
            Self::NotAvailable => "N/A",
        }
    }
}

/// One line of the score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub indicator: Indicator,
    pub rating: Rating,
    /// The ratio the rating was derived from, in provider units.
    pub value: Option<f64>,
    /// Contribution to the raw score.
    pub adjustment: i32,
}

impl BreakdownEntry {
    fn absent(indicator: Indicator) -> Self {
        Self {
            indicator,
            rating: Rating::NotAvailable,
            value: None,
            adjustment: 0,
        }
    }
}

impl fmt::Display for BreakdownEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(v) = self.value else {
            return f.write_str(self.rating.label());
        };
        match self.indicator {
            Indicator::Valuation => write!(f, "{} ({v:.1})", self.rating.label()),
            Indicator::Debt => write!(f, "{} ({v:.0}%)", self.rating.label()),
            _ => write!(f, "{} ({:.1}%)", self.rating.label(), v * 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalScore {
    pub score: u8,
    pub breakdown: Vec<BreakdownEntry>,
    /// Set when fundamentals could not be obtained at all.
    pub note: Option<String>,
}

impl FundamentalScore {
    /// Score 0 for a ticker whose fundamentals failed to load.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            score: 0,
            breakdown: Indicator::ALL
                .iter()
                .map(|i| BreakdownEntry::absent(*i))
                .collect(),
            note: Some(reason.into()),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.note.is_some()
    }

    pub fn entry(&self, indicator: Indicator) -> Option<&BreakdownEntry> {
        self.breakdown.iter().find(|e| e.indicator == indicator)
    }

    pub fn rating(&self, indicator: Indicator) -> Rating {
        self.entry(indicator)
            .map_or(Rating::NotAvailable, |e| e.rating)
    }

    pub fn raw(&self) -> i32 {
        self.breakdown.iter().map(|e| e.adjustment).sum()
    }
}

/// Finite, and for ratios where the provider uses 0 as "unknown", nonzero.
fn usable(v: Option<f64>, zero_is_missing: bool) -> Option<f64> {
    v.filter(|x| x.is_finite() && !(zero_is_missing && *x == 0.0))
}

fn rate_valuation(pe: f64) -> (Rating, i32) {
    if pe < PE_GOOD_BELOW {
        (Rating::Good, 2)
    } else if pe > PE_EXPENSIVE_ABOVE {
        (Rating::Expensive, -1)
    } else {
        (Rating::Normal, 0)
    }
}

fn rate_debt(de: f64) -> (Rating, i32) {
    if de < DEBT_HIGH_FROM {
        (Rating::Low, 2)
    } else {
        (Rating::High, -2)
    }
}

fn rate_margin(m: f64) -> (Rating, i32) {
    if m > MARGIN_HIGH_ABOVE {
        (Rating::High, 2)
    } else if m > 0.0 {
        (Rating::Normal, 1)
    } else {
        (Rating::Losses, -3)
    }
}

fn rate_dividend(y: f64) -> (Rating, i32) {
    if y > DIVIDEND_RICH_ABOVE {
        (Rating::Rich, 1)
    } else if y > 0.0 {
        (Rating::Modest, 0)
    } else {
        (Rating::NoDividend, 0)
    }
}

fn rate_growth(g: f64) -> (Rating, i32) {
    if g > GROWTH_RISING_ABOVE {
        (Rating::Rising, 1)
    } else if g < 0.0 {
        (Rating::Declining, 0)
    } else {
        (Rating::Flat, 0)
    }
}

/// Score a snapshot. Pure; absent fields contribute nothing.
pub fn score(snapshot: &FundamentalSnapshot) -> FundamentalScore {
    let inputs: [(Indicator, Option<f64>, fn(f64) -> (Rating, i32)); 5] = [
        (
            Indicator::Valuation,
            usable(snapshot.price_earnings, true),
            rate_valuation,
        ),
        (
            Indicator::Debt,
            usable(snapshot.debt_to_equity, true),
            rate_debt,
        ),
        (
            Indicator::Profitability,
            usable(snapshot.profit_margin, false),
            rate_margin,
        ),
        (
            Indicator::Dividend,
            usable(snapshot.dividend_yield, false),
            rate_dividend,
        ),
        (
            Indicator::Growth,
            usable(snapshot.revenue_growth, false),
            rate_growth,
        ),
    ];

    let breakdown: Vec<BreakdownEntry> = inputs
        .into_iter()
        .map(|(indicator, value, rate)| match value {
            Some(v) => {
                let (rating, adjustment) = rate(v);
                BreakdownEntry {
                    indicator,
                    rating,
                    value: Some(v),
                    adjustment,
                }
            }
            None => BreakdownEntry::absent(indicator),
        })
        .collect();

    let raw: i32 = breakdown.iter().map(|e| e.adjustment).sum();
    let clamped = (raw + BASELINE).clamp(0, i32::from(MAX_SCORE));

    FundamentalScore {
        score: clamped as u8,
        breakdown,
        note: None,
    }
}
