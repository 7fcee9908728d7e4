//! Credit constants and validation.
//!
//! Balances are owned by the database; this module never computes a new
//! balance itself. All mutation goes through single atomic statements.

use crate::error::CoreError;

/// Credits granted to a newly provisioned user.
pub const INITIAL_CREDIT_GRANT: i32 = 10;

/// Credits spent by one save of a page.
pub const SAVE_COST: i32 = 1;

/// Upper bound for a single deduction request.
pub const MAX_DEDUCTION: i32 = 1_000;

/// Validate the `amount` of a deduction request.
pub fn validate_deduction_amount(amount: i32) -> Result<(), CoreError> {
    if amount <= 0 {
        return Err(CoreError::Validation(format!(
            "Deduction amount must be positive (got {amount})"
        )));
    }
    if amount > MAX_DEDUCTION {
        return Err(CoreError::Validation(format!(
            "Deduction amount exceeds maximum of {MAX_DEDUCTION} (got {amount})"
        )));
    }
    Ok(())
}
