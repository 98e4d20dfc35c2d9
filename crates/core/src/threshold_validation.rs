//! Shared range validation helpers.
//!
//! Provides reusable range-checking functions used by multiple domain modules.

use crate::error::CoreError;

/// Upper bound of a percentage discount.
pub const MAX_PERCENT: f64 = 100.0;

/// Validate that a percentage falls within `[0, 100]`. `NaN` is rejected.
pub fn validate_percent(value: f64, name: &str) -> Result<(), CoreError> {
    if !(0.0..=MAX_PERCENT).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a batch size is non-zero and at most `max`.
pub fn validate_count_range(count: usize, max: usize, what: &str) -> Result<(), CoreError> {
    if count == 0 {
        return Err(CoreError::Validation(format!(
            "{what} request must contain at least one item"
        )));
    }
    if count > max {
        return Err(CoreError::Validation(format!(
            "{what} request exceeds the maximum of {max} items (got {count})"
        )));
    }
    Ok(())
}
