//! Domain types for StockPulse

pub mod fundamentals;
pub mod price;
pub mod ticker;
pub mod validation;

pub use fundamentals::FundamentalSnapshot;
pub use price::{PricePoint, PriceSeries, PriceTable};
pub use ticker::{Market, Ticker, DOMESTIC_SUFFIX};
pub use validation::{validate_capital, validate_search, ValidationError};
