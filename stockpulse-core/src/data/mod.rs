//! Market data: providers, the segment-isolated fetcher, and the watchlist.

pub mod align;
pub mod circuit_breaker;
pub mod fetcher;
pub mod memory;
pub mod provider;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use align::{align_series, join_tables};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use fetcher::MarketDataFetcher;
pub use memory::InMemoryProvider;
pub use provider::{ClosesResponse, DataError, DataSource, MarketDataProvider};
pub use synthetic::SyntheticProvider;
pub use universe::{lookup_symbol, Watchlist, REFERENCE};
pub use yahoo::YahooProvider;
