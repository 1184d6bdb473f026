//! Synthetic provider: seeded random walks for offline runs.
//!
//! Each symbol gets its own RNG stream derived from the base seed and the
//! symbol text, so a symbol's data does not change when the watchlist around
//! it changes. Results built on this provider are tagged `Synthetic`.

use super::provider::{ClosesResponse, DataError, DataSource, MarketDataProvider};
use crate::domain::{FundamentalSnapshot, PricePoint};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, symbol: &str, stream: u64) -> StdRng {
        // FNV-1a over the symbol bytes.
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in symbol.bytes() {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x0100_0000_01b3);
        }
        StdRng::seed_from_u64(self.seed ^ h ^ stream.rotate_left(32))
    }

    /// Weekday closes following a geometric random walk.
    pub fn walk(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
        let mut rng = self.rng_for(symbol, 1);
        let drift: f64 = rng.gen_range(-0.0015..0.0015);
        let daily_vol: f64 = rng.gen_range(0.004..0.03);
        let mut price: f64 = rng.gen_range(5.0..400.0);

        let mut points = Vec::new();
        let mut date = start;
        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let shock: f64 = rng.gen_range(-1.0..1.0) * daily_vol * 3f64.sqrt();
                price = (price * (1.0 + drift + shock)).max(0.01);
                points.push(PricePoint::new(date, (price * 100.0).round() / 100.0));
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        points
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(42)
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn daily_closes(
        &self,
        symbols: &[&str],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ClosesResponse, DataError> {
        let columns: BTreeMap<String, Vec<PricePoint>> = symbols
            .iter()
            .map(|s| (s.to_string(), self.walk(s, start, end)))
            .collect();
        Ok(ClosesResponse::Labeled(columns))
    }

    fn fx_rate(&self, _pair: &str) -> Result<f64, DataError> {
        Ok(1.08)
    }

    fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, DataError> {
        let mut rng = self.rng_for(symbol, 2);
        let mut maybe = |lo: f64, hi: f64| -> Option<f64> {
            if rng.gen_bool(0.9) {
                Some((rng.gen_range(lo..hi) * 1000.0).round() / 1000.0)
            } else {
                None
            }
        };
        Ok(FundamentalSnapshot {
            price_earnings: maybe(5.0, 70.0),
            debt_to_equity: maybe(10.0, 250.0),
            profit_margin: maybe(-0.1, 0.35),
            dividend_yield: maybe(0.0, 0.06),
            revenue_growth: maybe(-0.1, 0.25),
        })
    }
}
