//! Pipeline configuration.
//!
//! Every window length and threshold the scoring pipeline uses lives here as
//! a named default. A TOML file may override any subset; absent sections and
//! fields keep the defaults, so an empty file reproduces stock behavior.
//!
//! ```toml
//! watchlist = ["BBVA.MC", "AAPL"]
//!
//! [technical]
//! ma_window = 50
//! volatility_window = 30
//!
//! [allocation]
//! quality_floor = 7
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Trailing samples in the trend moving average.
pub const MA_WINDOW: usize = 50;
/// Trailing daily returns in the realized-volatility window.
pub const VOLATILITY_WINDOW: usize = 30;
/// Volatility above which an uptrend is downgraded to caution.
pub const CAUTION_VOLATILITY: f64 = 0.015;
/// Volatility above which an individual report flags "high volatility".
pub const HIGH_VOLATILITY_NOTICE: f64 = 0.025;
/// Minimum fundamental score for the bullish tier.
pub const BULLISH_MIN_SCORE: u8 = 5;
/// Upper volatility bound of the low-volatility sleeve (inclusive).
pub const LOW_VOLATILITY_MAX: f64 = 0.010;
/// Upper volatility bound of the medium-volatility sleeve (inclusive).
pub const MEDIUM_VOLATILITY_MAX: f64 = 0.015;
/// Minimum score for the low and medium sleeves.
pub const QUALITY_FLOOR: u8 = 7;
/// Positions bought per sleeve.
pub const PICKS_PER_SLEEVE: usize = 3;
/// Most-volatile candidates used when the high sleeve is empty.
pub const HIGH_FALLBACK_PICKS: usize = 3;
/// Trailing calendar days of price history fetched.
pub const LOOKBACK_DAYS: i64 = 365;
/// Longest accepted history window, in calendar days.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;
/// Most retries accepted for one provider request.
pub const MAX_RETRIES: u32 = 10;
/// Provider symbol quoting foreign currency units per domestic unit.
pub const FX_SYMBOL: &str = "EURUSD=X";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Technical classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    pub ma_window: usize,
    pub volatility_window: usize,
    pub caution_volatility: f64,
    pub high_volatility_notice: f64,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            ma_window: MA_WINDOW,
            volatility_window: VOLATILITY_WINDOW,
            caution_volatility: CAUTION_VOLATILITY,
            high_volatility_notice: HIGH_VOLATILITY_NOTICE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub bullish_min_score: u8,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            bullish_min_score: BULLISH_MIN_SCORE,
        }
    }
}

/// Sleeve thresholds for the allocator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    pub low_volatility_max: f64,
    pub medium_volatility_max: f64,
    pub quality_floor: u8,
    pub picks_per_sleeve: usize,
    pub high_fallback_picks: usize,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            low_volatility_max: LOW_VOLATILITY_MAX,
            medium_volatility_max: MEDIUM_VOLATILITY_MAX,
            quality_floor: QUALITY_FLOOR,
            picks_per_sleeve: PICKS_PER_SLEEVE,
            high_fallback_picks: HIGH_FALLBACK_PICKS,
        }
    }
}

/// Network provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub lookback_days: i64,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub fx_symbol: String,
    pub circuit_breaker_cooldown_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            lookback_days: LOOKBACK_DAYS,
            timeout_secs: 30,
            max_retries: 0,
            fx_symbol: FX_SYMBOL.to_string(),
            circuit_breaker_cooldown_secs: 30 * 60,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Symbols to scan instead of the built-in reference watchlist.
    pub watchlist: Option<Vec<String>>,
    pub technical: TechnicalConfig,
    pub ranking: RankingConfig,
    pub allocation: AllocationConfig,
    pub provider: ProviderConfig,
}

impl PulseConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.technical;
        if t.ma_window == 0 {
            return Err(ConfigError::Invalid("technical.ma_window must be >= 1".into()));
        }
        if t.volatility_window < 2 {
            return Err(ConfigError::Invalid(
                "technical.volatility_window must be >= 2".into(),
            ));
        }
        check_threshold("technical.caution_volatility", t.caution_volatility)?;
        check_threshold("technical.high_volatility_notice", t.high_volatility_notice)?;

        if self.ranking.bullish_min_score > 10 {
            return Err(ConfigError::Invalid(
                "ranking.bullish_min_score must be within 0..=10".into(),
            ));
        }

        let a = &self.allocation;
        check_threshold("allocation.low_volatility_max", a.low_volatility_max)?;
        check_threshold("allocation.medium_volatility_max", a.medium_volatility_max)?;
        if a.low_volatility_max > a.medium_volatility_max {
            return Err(ConfigError::Invalid(format!(
                "allocation.low_volatility_max ({}) exceeds medium_volatility_max ({})",
                a.low_volatility_max, a.medium_volatility_max
            )));
        }
        if a.quality_floor > 10 {
            return Err(ConfigError::Invalid(
                "allocation.quality_floor must be within 0..=10".into(),
            ));
        }
        if a.picks_per_sleeve == 0 {
            return Err(ConfigError::Invalid(
                "allocation.picks_per_sleeve must be >= 1".into(),
            ));
        }

        let p = &self.provider;
        if !(1..=MAX_LOOKBACK_DAYS).contains(&p.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "provider.lookback_days must be within 1..={MAX_LOOKBACK_DAYS} (got {})",
                p.lookback_days
            )));
        }
        if p.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "provider.max_retries must be <= {MAX_RETRIES} (got {})",
                p.max_retries
            )));
        }
        if self.provider.fx_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.fx_symbol is empty".into()));
        }
        Ok(())
    }
}

fn check_threshold(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid(format!(
            "{name} must be finite and non-negative (got {value})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let c = PulseConfig::from_toml("").unwrap();
        assert_eq!(c, PulseConfig::default());
        assert_eq!(c.technical.ma_window, 50);
        assert_eq!(c.technical.volatility_window, 30);
        assert_eq!(c.allocation.quality_floor, 7);
        assert_eq!(c.provider.max_retries, 0);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let c = PulseConfig::from_toml(
            r#"
            watchlist = ["AAPL", "SAN.MC"]

            [technical]
            ma_window = 20
            "#,
        )
        .unwrap();
        assert_eq!(c.technical.ma_window, 20);
        assert_eq!(c.technical.volatility_window, VOLATILITY_WINDOW);
        assert_eq!(c.watchlist.as_deref().map(|w| w.len()), Some(2));
    }

    #[test]
    fn rejects_inverted_sleeve_bounds() {
        let err = PulseConfig::from_toml(
            r#"
            [allocation]
            low_volatility_max = 0.02
            medium_volatility_max = 0.01
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("low_volatility_max"));
    }

    #[test]
    fn rejects_zero_ma_window() {
        assert!(PulseConfig::from_toml("[technical]\nma_window = 0").is_err());
    }

    #[test]
    fn rejects_negative_threshold() {
        assert!(PulseConfig::from_toml("[technical]\ncaution_volatility = -0.1").is_err());
    }

    #[test]
    fn rejects_out_of_range_lookback() {
        let err = PulseConfig::from_toml("[provider]\nlookback_days = 1000000000").unwrap_err();
        assert!(err.to_string().contains("lookback_days"));
        assert!(PulseConfig::from_toml("[provider]\nlookback_days = 0").is_err());
        assert!(PulseConfig::from_toml("[provider]\nlookback_days = 3650").is_ok());
    }

    #[test]
    fn rejects_excessive_retries() {
        let err = PulseConfig::from_toml("[provider]\nmax_retries = 33").unwrap_err();
        assert!(err.to_string().contains("max_retries"));
        assert!(PulseConfig::from_toml("[provider]\nmax_retries = 10").is_ok());
    }

    #[test]
    fn toml_roundtrip() {
        let c = PulseConfig::default();
        let text = c.to_toml().unwrap();
        assert_eq!(PulseConfig::from_toml(&text).unwrap(), c);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = PulseConfig::from_file(Path::new("/nonexistent/stockpulse.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
