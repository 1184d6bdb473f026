//! Daily close series and the wide date × ticker table they are aligned into.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One daily observation. `close` is `None` when the provider had no value
/// for that date (holiday in one market, provider gap, alignment hole).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close: Some(close),
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self { date, close: None }
    }

    /// The close, if present and finite.
    pub fn value(&self) -> Option<f64> {
        self.close.filter(|c| c.is_finite())
    }
}

/// Date-ordered closes for one ticker in its native currency.
///
/// Dates are strictly increasing: construction sorts the input and keeps
/// the last observation for a repeated date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => deduped.push(p),
            }
        }
        Self {
            symbol: symbol.into(),
            points: deduped,
        }
    }

    /// Build a series from consecutive calendar days starting at `start`.
    pub fn from_closes(symbol: impl Into<String>, start: NaiveDate, closes: &[f64]) -> Self {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint::new(start + chrono::Duration::days(i as i64), c))
            .collect();
        Self::new(symbol, points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Present closes in date order, missing entries dropped.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.value()).collect()
    }

    /// Number of present closes.
    pub fn observed_len(&self) -> usize {
        self.points.iter().filter(|p| p.value().is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The most recent present close.
    pub fn last_close(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.value())
    }
}

/// Closes for several tickers on one shared, ascending date index.
///
/// Each column has the same length as `dates`; a hole is `None`, never zero.
/// A symbol absent from the table means its fetch failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    pub dates: Vec<NaiveDate>,
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
    /// Column labels in the order they were joined.
    pub symbols: Vec<String>,
}

impl PriceTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// No columns at all: the "no data available" signal.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.columns.contains_key(symbol)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn column(&self, symbol: &str) -> Option<&[Option<f64>]> {
        self.columns.get(symbol).map(|c| c.as_slice())
    }

    /// Extract one ticker's series (holes kept as missing points).
    pub fn series(&self, symbol: &str) -> Option<PriceSeries> {
        let column = self.columns.get(symbol)?;
        let points = self
            .dates
            .iter()
            .zip(column)
            .map(|(&date, &close)| PricePoint { date, close })
            .collect();
        Some(PriceSeries::new(symbol, points))
    }
}
