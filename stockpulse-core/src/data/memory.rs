//! In-memory provider backed by fixed tables.
//!
//! Used by tests and by callers that already hold the data. Failures can be
//! injected per symbol to exercise the degrade-and-continue paths.

use super::provider::{ClosesResponse, DataError, DataSource, MarketDataProvider};
use crate::domain::{FundamentalSnapshot, PricePoint, PriceSeries};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct InMemoryProvider {
    closes: BTreeMap<String, Vec<PricePoint>>,
    fundamentals: HashMap<String, FundamentalSnapshot>,
    fundamentals_errors: HashMap<String, DataError>,
    failing_batches: BTreeSet<String>,
    fx: Option<f64>,
    /// Answer single-symbol batches with an unlabeled series.
    labeled_singles: bool,
    calls: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.closes
            .insert(series.symbol.clone(), series.points().to_vec());
        self
    }

    pub fn with_fundamentals(mut self, symbol: &str, snapshot: FundamentalSnapshot) -> Self {
        self.fundamentals.insert(symbol.to_string(), snapshot);
        self
    }

    pub fn with_fundamentals_error(mut self, symbol: &str, error: DataError) -> Self {
        self.fundamentals_errors.insert(symbol.to_string(), error);
        self
    }

    /// Any batch that includes `symbol` fails as a whole.
    pub fn failing_batch_with(mut self, symbol: &str) -> Self {
        self.failing_batches.insert(symbol.to_string());
        self
    }

    /// Quoted foreign units per domestic unit (e.g. EURUSD = 1.08).
    pub fn with_fx(mut self, quote: f64) -> Self {
        self.fx = Some(quote);
        self
    }

    pub fn with_labeled_singles(mut self, labeled: bool) -> Self {
        self.labeled_singles = labeled;
        self
    }

    /// Number of provider calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn in_range(points: &[PricePoint], start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
        points
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .copied()
            .collect()
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn source(&self) -> DataSource {
        DataSource::InMemory
    }

    fn daily_closes(
        &self,
        symbols: &[&str],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ClosesResponse, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(bad) = symbols.iter().find(|s| self.failing_batches.contains(**s)) {
            return Err(DataError::NetworkUnreachable(format!(
                "batch containing {bad} failed"
            )));
        }

        if symbols.len() == 1 && !self.labeled_singles {
            let points = self
                .closes
                .get(symbols[0])
                .map(|p| Self::in_range(p, start, end))
                .unwrap_or_default();
            return Ok(ClosesResponse::Unlabeled(points));
        }

        let columns = symbols
            .iter()
            .filter_map(|s| {
                self.closes
                    .get(*s)
                    .map(|p| (s.to_string(), Self::in_range(p, start, end)))
            })
            .collect();
        Ok(ClosesResponse::Labeled(columns))
    }

    fn fx_rate(&self, pair: &str) -> Result<f64, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fx.ok_or_else(|| DataError::NoData {
            symbol: pair.to_string(),
        })
    }

    fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.fundamentals_errors.get(symbol) {
            return Err(e.clone());
        }
        self.fundamentals
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}
