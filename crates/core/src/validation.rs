//! Input validation, applied before any pricing or I/O.
//!
//! Bounds follow the source product policy: areas in [0.1, 10000] m2,
//! admin-edited unit prices in [0, 100000].

use rust_decimal::Decimal;

use crate::constants::{MAX_AREA, MAX_UNIT_PRICE, MIN_AREA};
use crate::errors::ValidationError;

/// Validates a coverage area for quoting.
pub fn validate_area(area: Decimal) -> Result<(), ValidationError> {
    if area <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveArea);
    }
    if area < MIN_AREA || area > MAX_AREA {
        return Err(ValidationError::AreaOutOfBounds(area, MIN_AREA, MAX_AREA));
    }
    Ok(())
}

/// Validates a unit price for an admin edit.
pub fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price < Decimal::ZERO || price > MAX_UNIT_PRICE {
        return Err(ValidationError::PriceOutOfBounds(price, MAX_UNIT_PRICE));
    }
    Ok(())
}

/// Structural email check for the admin sign-in form.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let valid = email.len() <= 100
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidInput(format!("invalid email address: {email}")))
    }
}

/// Password policy for the admin account: 6 to 128 characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < 6 {
        return Err(ValidationError::InvalidInput(
            "password must be at least 6 characters".to_string(),
        ));
    }
    if password.len() > 128 {
        return Err(ValidationError::InvalidInput(
            "password must be at most 128 characters".to_string(),
        ));
    }
    Ok(())
}
