//! # Validation Module
//!
//! Input validation utilities for Tiffin.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: tiffin-service (request DTOs)                                │
//! │  ├── Role / capability check                                           │
//! │  └── THIS MODULE: shape validation (ids, quantities, names)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: tiffin-db (Cart Store, Order Placement)                      │
//! │  └── Business rules (availability, ownership, empty cart)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity BETWEEN 1 AND 10)                                 │
//! │  ├── UNIQUE (cart_id, menu_item_id), UNIQUE payments(order_id)         │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tiffin_core::validation::{validate_quantity, validate_uuid};
//!
//! validate_quantity(3).unwrap();
//! assert!(validate_uuid("not-a-uuid", "menuItemId").is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_PRICE_PAISE, MIN_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be between 1 and 10 inclusive
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(MIN_LINE_QUANTITY..=MAX_LINE_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_LINE_QUANTITY,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a menu price in paise.
///
/// ## Rules
/// - Must be positive; the catalog has no free items
/// - Must not exceed [`MAX_PRICE_PAISE`]
pub fn validate_price_paise(paise: i64) -> ValidationResult<()> {
    if !(1..=MAX_PRICE_PAISE).contains(&paise) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 1,
            max: MAX_PRICE_PAISE,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must not exceed `max` characters
pub fn validate_text(value: &str, field: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a contact phone number.
///
/// ## Rules
/// - 8 to 15 digits, optionally prefixed with `+`
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);

    if !(8..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "contactNumber".to_string(),
            reason: "must be 8 to 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a postal code: 4 to 10 letters, digits or spaces.
pub fn validate_postcode(postcode: &str) -> ValidationResult<()> {
    let postcode = postcode.trim();

    if !(4..=10).contains(&postcode.len())
        || !postcode.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ')
    {
        return Err(ValidationError::InvalidFormat {
            field: "postcode".to_string(),
            reason: "must be 4 to 10 letters or digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use tiffin_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000", "id").is_ok());
/// assert!(validate_uuid("", "id").is_err());
/// ```
pub fn validate_uuid(id: &str, field: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}
