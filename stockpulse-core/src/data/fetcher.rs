//! Segment-isolated price fetcher and exchange-rate lookup.
//!
//! Domestic and foreign tickers are fetched through separate provider calls
//! so a rate limit or outage on one market cannot blank out the other. Each
//! segment's response is normalized to labeled columns, aligned, and the two
//! segment tables are outer-joined on date.

use super::align::{align_series, join_tables};
use super::provider::{ClosesResponse, DataError, MarketDataProvider};
use crate::config::{ProviderConfig, MAX_LOOKBACK_DAYS};
use crate::domain::{Market, PriceSeries, PriceTable, Ticker};
use chrono::NaiveDate;

pub struct MarketDataFetcher<'a> {
    provider: &'a dyn MarketDataProvider,
    config: &'a ProviderConfig,
    end: NaiveDate,
}

impl<'a> MarketDataFetcher<'a> {
    /// A fetcher whose window ends today.
    pub fn new(provider: &'a dyn MarketDataProvider, config: &'a ProviderConfig) -> Self {
        Self::ending(provider, config, chrono::Local::now().date_naive())
    }

    /// A fetcher with a fixed window end, for reproducible runs.
    pub fn ending(
        provider: &'a dyn MarketDataProvider,
        config: &'a ProviderConfig,
        end: NaiveDate,
    ) -> Self {
        Self {
            provider,
            config,
            end,
        }
    }

    /// Fetch window ending at `end`. The lookback is clamped to the accepted
    /// config range so an unvalidated config cannot overflow the date math.
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        let days = self.config.lookback_days.clamp(1, MAX_LOOKBACK_DAYS);
        let start = self
            .end
            .checked_sub_signed(chrono::Duration::days(days))
            .unwrap_or(NaiveDate::MIN);
        (start, self.end)
    }

    /// Closes for every requested ticker that could be fetched.
    ///
    /// Never fails: a segment that errors or comes back empty contributes
    /// nothing, and an empty table means no data was available at all.
    pub fn fetch(&self, tickers: &[Ticker]) -> PriceTable {
        let domestic = self.fetch_segment(tickers, Market::Domestic);
        let foreign = self.fetch_segment(tickers, Market::Foreign);
        let table = join_tables(domestic, foreign);

        tracing::info!(
            requested = tickers.len(),
            fetched = table.symbols().len(),
            days = table.dates.len(),
            "price table assembled"
        );
        table
    }

    fn fetch_segment(&self, tickers: &[Ticker], market: Market) -> PriceTable {
        let mut symbols: Vec<&str> = Vec::new();
        for t in tickers.iter().filter(|t| t.market == market) {
            if !symbols.contains(&t.symbol.as_str()) {
                symbols.push(t.symbol.as_str());
            }
        }
        if symbols.is_empty() {
            return PriceTable::empty();
        }

        let (start, end) = self.window();
        match self.provider.daily_closes(&symbols, start, end) {
            Ok(response) => normalize(&symbols, response),
            Err(e) => {
                tracing::warn!(
                    segment = market.label(),
                    symbols = symbols.len(),
                    error = %e,
                    "segment fetch failed; continuing without it"
                );
                PriceTable::empty()
            }
        }
    }

    /// Domestic units per one foreign unit, or 1.0 when the rate is
    /// unavailable.
    ///
    /// The provider quotes foreign units per domestic unit (EURUSD), so the
    /// factor is its reciprocal.
    pub fn exchange_rate(&self) -> f64 {
        match self.try_exchange_rate() {
            Ok(rate) => rate,
            Err(e) => {
                tracing::warn!(error = %e, "exchange rate unavailable; using 1.0");
                1.0
            }
        }
    }

    pub fn try_exchange_rate(&self) -> Result<f64, DataError> {
        let quote = self.provider.fx_rate(&self.config.fx_symbol)?;
        if !quote.is_finite() || quote <= 0.0 {
            return Err(DataError::ResponseFormatChanged(format!(
                "non-positive FX quote {quote}"
            )));
        }
        Ok(1.0 / quote)
    }
}

/// Turn a provider response into an aligned table labeled by symbol.
///
/// Unlabeled responses are only accepted for single-symbol requests, where
/// the label is unambiguous. The same holds for a single-symbol request
/// answered with one column under some other label (e.g. "Close"): it is
/// relabeled with the requested symbol. Otherwise columns for symbols that
/// were not requested are dropped, and empty columns count as absent.
pub fn normalize(requested: &[&str], response: ClosesResponse) -> PriceTable {
    let series: Vec<PriceSeries> = match response {
        ClosesResponse::Unlabeled(points) => match requested {
            [only] => vec![PriceSeries::new(*only, points)],
            _ => {
                tracing::warn!(
                    requested = requested.len(),
                    "unlabeled response for a multi-symbol request; discarding"
                );
                Vec::new()
            }
        },
        ClosesResponse::Labeled(mut columns) => match requested {
            [only] if columns.len() == 1 && !columns.contains_key(*only) => columns
                .into_values()
                .map(|points| PriceSeries::new(*only, points))
                .collect(),
            _ => requested
                .iter()
                .filter_map(|s| columns.remove(*s).map(|points| PriceSeries::new(*s, points)))
                .collect(),
        },
    };

    let series: Vec<PriceSeries> = series
        .into_iter()
        .filter(|s| s.observed_len() > 0)
        .collect();
    align_series(series)
}
