//! # Validation Module
//!
//! Input validation utilities run before any business rule.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (excluded)                                         │
//! │  └── Deserialization, required fields                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Ranges, lengths, identifier formats                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Entity guards (order.rs, group_item.rs)                      │
//! │  └── State machine preconditions                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  └── NOT NULL, UNIQUE, FOREIGN KEY constraints                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_OBSERVATION_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a free-text observation on an order, group or item.
///
/// ```rust
/// use bistro_core::validation::validate_observation;
///
/// assert!(validate_observation("no onions").is_ok());
/// assert!(validate_observation(&"x".repeat(1000)).is_err());
/// ```
pub fn validate_observation(text: &str) -> ValidationResult<()> {
    if text.chars().count() > MAX_OBSERVATION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "observation".to_string(),
            max: MAX_OBSERVATION_LENGTH,
        });
    }

    Ok(())
}

/// Validates that a reference identifier was supplied.
///
/// Used for shift and attendant references bound at order creation.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an item quantity.
///
/// ## Rules
/// - Must be a finite number greater than zero (fractions allowed)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() || qty <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY as i64,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a payment amount. Zero and negative payments are refused.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a delivery tax. Zero is allowed (free delivery).
pub fn validate_delivery_tax(tax: Money) -> ValidationResult<()> {
    if tax.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "delivery tax".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
