//! Request bodies and query parameters.

pub mod catalog;
pub mod clients;
pub mod invoices;
pub mod settings;
pub mod tasks;
pub mod users;

use rust_decimal::Decimal;
use validator::ValidationError;

pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Trim, dropping values that end up empty.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
