//! Technical classifier: trend state from a single close series.
//!
//! The verdict depends only on the series. Price below its trailing average
//! is a downtrend regardless of volatility; above the average, volatility
//! past the caution threshold downgrades the trend to CAUTION. Exactly equal
//! to the average falls through to BULLISH.

use crate::config::TechnicalConfig;
use crate::domain::PriceSeries;
use crate::indicators::{realized_volatility, trailing_sma};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendState {
    Bullish,
    Caution,
    Bearish,
    Error,
}

impl TrendState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bullish => "BULLISH",
            Self::Caution => "CAUTION",
            Self::Bearish => "BEARISH",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for TrendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalVerdict {
    pub state: TrendState,
    /// "uptrend", "downtrend", "high volatility" or "empty series".
    pub reason: String,
    /// Latest close, in the series' own currency.
    pub last_price: f64,
    /// Sample std of recent daily returns.
    pub volatility: f64,
    /// Trailing average the price was compared against.
    pub moving_average: f64,
}

impl TechnicalVerdict {
    pub fn is_error(&self) -> bool {
        self.state == TrendState::Error
    }

    fn error(reason: &str) -> Self {
        Self {
            state: TrendState::Error,
            reason: reason.to_string(),
            last_price: 0.0,
            volatility: 0.0,
            moving_average: 0.0,
        }
    }
}

/// Classify with the default thresholds.
pub fn classify(series: &PriceSeries) -> TechnicalVerdict {
    classify_with(series, &TechnicalConfig::default())
}

pub fn classify_with(series: &PriceSeries, settings: &TechnicalConfig) -> TechnicalVerdict {
    let closes = series.closes();
    classify_closes(&closes, settings)
}

/// Classify a slice of observed closes, oldest first.
pub fn classify_closes(closes: &[f64], settings: &TechnicalConfig) -> TechnicalVerdict {
    let (Some(&price), Some(ma)) = (closes.last(), trailing_sma(closes, settings.ma_window))
    else {
        return TechnicalVerdict::error("empty series");
    };
    let volatility = realized_volatility(closes, settings.volatility_window);

    let (state, reason) = if price < ma {
        (TrendState::Bearish, "downtrend")
    } else if price > ma && volatility > settings.caution_volatility {
        (TrendState::Caution, "high volatility")
    } else {
        (TrendState::Bullish, "uptrend")
    };

    TechnicalVerdict {
        state,
        reason: reason.to_string(),
        last_price: price,
        volatility,
        moving_average: ma,
    }
}
