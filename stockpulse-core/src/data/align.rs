//! Multi-symbol time alignment.
//!
//! Series from different markets trade on different calendars. Alignment
//! takes the union of their dates and leaves a hole (`None`) wherever a
//! symbol has no observation; nothing is forward-filled or zero-filled.

use crate::domain::{PriceSeries, PriceTable};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Align series onto one date index. Column order follows input order; a
/// later series with an already-present symbol replaces the earlier one.
pub fn align_series(series: Vec<PriceSeries>) -> PriceTable {
    let mut all_dates = BTreeSet::new();
    for s in &series {
        for p in s.points() {
            all_dates.insert(p.date);
        }
    }
    let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

    let mut table = PriceTable {
        dates,
        ..PriceTable::default()
    };

    for s in series {
        let by_date: HashMap<NaiveDate, Option<f64>> =
            s.points().iter().map(|p| (p.date, p.value())).collect();

        let column: Vec<Option<f64>> = table
            .dates
            .iter()
            .map(|date| by_date.get(date).copied().flatten())
            .collect();

        if !table.columns.contains_key(&s.symbol) {
            table.symbols.push(s.symbol.clone());
        }
        table.columns.insert(s.symbol, column);
    }

    table
}

/// Outer join of two tables on their date indexes.
pub fn join_tables(left: PriceTable, right: PriceTable) -> PriceTable {
    if right.is_empty() {
        return left;
    }
    if left.is_empty() {
        return right;
    }
    let series: Vec<PriceSeries> = left
        .symbols
        .iter()
        .chain(right.symbols.iter())
        .filter_map(|sym| {
            if right.contains(sym) {
                right.series(sym)
            } else {
                left.series(sym)
            }
        })
        .collect();
    align_series(dedup_by_symbol(series))
}

fn dedup_by_symbol(series: Vec<PriceSeries>) -> Vec<PriceSeries> {
    let mut seen = BTreeSet::new();
    series
        .into_iter()
        .filter(|s| seen.insert(s.symbol.clone()))
        .collect()
}
