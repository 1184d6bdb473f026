//! StockPulse Runner: scans, allocation, lookups and report export.
//!
//! This crate builds on `stockpulse-core` to provide:
//! - The ranking aggregator (two-phase scan into bullish/caution/bearish tiers)
//! - Risk profiles and the sleeve-based capital allocator
//! - Individual ticker lookup with recommendation and narrative
//! - CSV and JSON export of reports

pub mod allocation;
pub mod export;
pub mod lookup;
pub mod ranking;
pub mod risk_profile;

pub use allocation::{
    allocate, AllocationLine, AllocationPlan, AllocationSummary, Sleeve, SleeveFill, SleeveSource,
};
pub use export::{ExportError, SCHEMA_VERSION};
pub use lookup::{Lookup, LookupOutcome, LookupReport, Narrative, PriceCurrency, Recommendation};
pub use ranking::{
    assign_tier, RankedCandidate, RankingAggregator, RankingReport, SkippedTicker, Tier,
    TickerOutcome,
};
pub use risk_profile::{RiskProfile, SleeveWeights, UnknownProfile};
