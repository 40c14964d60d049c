//! # Error Types
//!
//! Domain-specific error types for tiffin-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tiffin-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tiffin-db errors (separate crate)                                     │
//! │  └── DbError          - Store failures, wraps CoreError                │
//! │                                                                         │
//! │  tiffin-service errors                                                 │
//! │  └── ApiError         - What callers see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Every variant except [`CoreError::Validation`] needs a caller-side
/// correction; none of them is fixed by retrying the same call.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Delivery address is missing or owned by someone else.
    #[error("Invalid delivery address: {0}")]
    InvalidAddress(String),

    /// The customer's cart has no lines (or no cart exists yet).
    #[error("Cart is empty")]
    EmptyCart,

    /// The serving kitchen does not exist, is not approved, or is inactive.
    #[error("Kitchen not available: {0}")]
    KitchenUnavailable(String),

    /// A cart line points at a menu item that no longer exists.
    ///
    /// ## When This Occurs
    /// - A chef deleted the menu item after it was added to the cart
    #[error("Menu item not found: {0}")]
    ItemNotFound(String),

    /// Adding to a cart line would push it past the per-item maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityExceeded { requested: i64, max: i64 },

    /// Menu item exists but is switched off, or does not exist at all.
    #[error("Menu item not available: {0}")]
    NotAvailable(String),

    /// Cart line not found in the caller's cart.
    #[error("Cart item not found: {0}")]
    CartLineNotFound(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// No payment record exists for the order.
    #[error("Payment not found for order: {0}")]
    PaymentNotFound(String),

    /// Payment is already settled.
    #[error("Order {0} already marked as paid")]
    AlreadyPaid(String),

    /// Kitchen not found.
    #[error("Kitchen not found: {0}")]
    KitchenNotFound(String),

    /// A kitchen already exists; a deployment serves exactly one.
    #[error("Kitchen already exists: {0}")]
    KitchenExists(String),

    /// Kitchen approval was requested twice.
    #[error("Kitchen {0} is already approved")]
    AlreadyApproved(String),

    /// Address not found for this owner.
    #[error("Address not found: {0}")]
    AddressNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Menu item not found (catalog management).
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    /// A line total or order total does not fit in the money type.
    #[error("Order total is too large")]
    TotalOverflow,

    /// Order status change rejected by the linear status policy.
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, invalid phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityExceeded {
            requested: 12,
            max: 10,
        };
        assert_eq!(err.to_string(), "Quantity 12 exceeds maximum allowed (10)");

        let err = CoreError::InvalidTransition {
            from: OrderStatus::Placed,
            to: OrderStatus::Delivered,
        };
        assert_eq!(err.to_string(), "Cannot move order from PLACED to DELIVERED");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "addressId".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: addressId is required");
    }
}
