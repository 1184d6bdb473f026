//! Risk profiles and their sleeve weights.
//!
//! Three named profiles split capital across the volatility sleeves:
//! - **Conservative**: mostly low volatility, never the high sleeve
//! - **Moderate**: low and medium volatility only
//! - **Aggressive**: tilted toward medium and high volatility
//!
//! Weights always sum to 1.0.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

/// Fraction of capital per sleeve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleeveWeights {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl SleeveWeights {
    pub fn total(&self) -> f64 {
        self.low + self.medium + self.high
    }
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 3] = [Self::Conservative, Self::Moderate, Self::Aggressive];

    pub fn weights(&self) -> SleeveWeights {
        match self {
            Self::Conservative => SleeveWeights {
                low: 0.8,
                medium: 0.2,
                high: 0.0,
            },
            Self::Moderate => SleeveWeights {
                low: 0.6,
                medium: 0.4,
                high: 0.0,
            },
            Self::Aggressive => SleeveWeights {
                low: 0.2,
                medium: 0.4,
                high: 0.4,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk profile '{0}' (expected conservative, moderate or aggressive)")]
pub struct UnknownProfile(pub String);

impl FromStr for RiskProfile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "moderate" => Ok(Self::Moderate),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(UnknownProfile(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        for p in RiskProfile::ALL {
            assert!((p.weights().total() - 1.0).abs() < 1e-12, "{p}");
        }
    }

    #[test]
    fn only_aggressive_uses_high_sleeve() {
        assert_eq!(RiskProfile::Conservative.weights().high, 0.0);
        assert_eq!(RiskProfile::Moderate.weights().high, 0.0);
        assert_eq!(RiskProfile::Aggressive.weights().high, 0.4);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Aggressive".parse::<RiskProfile>(), Ok(RiskProfile::Aggressive));
        assert!("yolo".parse::<RiskProfile>().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        for p in RiskProfile::ALL {
            let json = serde_json::to_string(&p).unwrap();
            let back: RiskProfile = serde_json::from_str(&json).unwrap();
            assert_eq!(p, back);
        }
    }
}
