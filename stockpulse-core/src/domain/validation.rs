//! Input checks that run before any provider call.

use thiserror::Error;

/// User input the pipeline refuses to act on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("search text is empty: enter a company name or ticker symbol")]
    EmptySearch,

    #[error("capital must be a positive amount (got {0})")]
    NonPositiveCapital(f64),
}

/// Trim a search string, rejecting blank input.
pub fn validate_search(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptySearch);
    }
    Ok(trimmed)
}

pub fn validate_capital(capital: f64) -> Result<f64, ValidationError> {
    if !capital.is_finite() || capital <= 0.0 {
        return Err(ValidationError::NonPositiveCapital(capital));
    }
    Ok(capital)
}
