use serde::{Deserialize, Serialize};

/// Company ratios as reported by a provider at one point in time.
///
/// Every field is optional: a provider gap is normal and must never stop
/// scoring. Ratios keep the provider's units: margins, yields and growth are
/// fractions (0.15 = 15%), `debt_to_equity` is a percentage (150 = 1.5×).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub price_earnings: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub profit_margin: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub revenue_growth: Option<f64>,
}

impl FundamentalSnapshot {
    /// True when the provider returned no usable field at all.
    pub fn is_blank(&self) -> bool {
        [
            self.price_earnings,
            self.debt_to_equity,
            self.profit_margin,
            self.dividend_yield,
            self.revenue_growth,
        ]
        .iter()
        .all(|f| f.map_or(true, |v| !v.is_finite()))
    }
}
