//! # API Error Type
//!
//! Unified error type for service commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tiffin                                 │
//! │                                                                         │
//! │  Command Function  Result<T, ApiError>                                  │
//! │         │                                                               │
//! │         ├── Caller check ─────── UNAUTHORIZED / FORBIDDEN ──┐           │
//! │         │                                                   │           │
//! │         ├── CoreError ────────── EMPTY_CART, NOT_FOUND... ──┤           │
//! │         │                                                   ▼           │
//! │         └── DbError ─┬── Conflict ── CONCURRENCY_CONFLICT  ApiError     │
//! │                      ├── Timeout ─── STORE_FAILURE        { code,       │
//! │                      └── sqlx ────── STORE_FAILURE          message,    │
//! │                                      (message hidden,       retryable } │
//! │                                       logged instead)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers branch on `code` and decide whether to resubmit from `retryable`.

use serde::Serialize;
use thiserror::Error;
use tiffin_core::{CoreError, ValidationError};
use tiffin_db::DbError;

use crate::config::ConfigError;

/// Error returned from service commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "EMPTY_CART",
///   "message": "Cart is empty",
///   "retryable": false
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Whether resubmitting the same command may succeed
    pub retryable: bool,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Delivery address missing or not the caller's
    InvalidAddress,

    /// Nothing in the cart to order
    EmptyCart,

    /// Serving kitchen missing, unapproved or closed
    KitchenUnavailable,

    /// A cart line's menu item was deleted from the catalog
    ItemNotFound,

    /// Cart line quantity would exceed the per-item maximum
    QuantityExceeded,

    /// Another request changed the same data first
    ConcurrencyConflict,

    /// The store failed or timed out
    StoreFailure,

    /// Menu item switched off or unknown
    NotAvailable,

    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Status change refused by the status policy
    InvalidTransition,

    /// Request conflicts with the resource's current state
    BusinessLogic,

    /// No caller identity
    Unauthorized,

    /// Caller's role lacks the capability
    Forbidden,
}

impl ApiError {
    /// Creates a non-retryable API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a retryable API error.
    pub fn retryable(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a generic store failure; details belong in the log.
    pub fn store_failure(message: impl Into<String>) -> Self {
        ApiError::retryable(ErrorCode::StoreFailure, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let retryable = err.is_retryable();

        let mut api = match err {
            DbError::Domain(core) => return ApiError::from(core),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::BusinessLogic,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::Conflict(reason) => {
                tracing::warn!(reason = %reason, "Concurrent modification");
                ApiError::new(
                    ErrorCode::ConcurrencyConflict,
                    "The data changed while processing the request, please retry",
                )
            }
            DbError::Timeout => {
                tracing::warn!("Store operation timed out");
                ApiError::new(ErrorCode::StoreFailure, "The request timed out, please retry")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::StoreFailure, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::StoreFailure, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::StoreFailure, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::StoreFailure, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::StoreFailure, "Database is busy")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::StoreFailure, "Database operation failed")
            }
        };

        api.retryable = retryable;
        api
    }
}

/// Converts core errors to API errors. None of them is retryable.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match err {
            CoreError::InvalidAddress(_) => ErrorCode::InvalidAddress,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::KitchenUnavailable(_) => ErrorCode::KitchenUnavailable,
            CoreError::ItemNotFound(_) => ErrorCode::ItemNotFound,
            CoreError::QuantityExceeded { .. } => ErrorCode::QuantityExceeded,
            CoreError::NotAvailable(_) => ErrorCode::NotAvailable,
            CoreError::CartLineNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::PaymentNotFound(_)
            | CoreError::KitchenNotFound(_)
            | CoreError::AddressNotFound(_)
            | CoreError::CategoryNotFound(_)
            | CoreError::MenuItemNotFound(_) => ErrorCode::NotFound,
            CoreError::AlreadyPaid(_)
            | CoreError::AlreadyApproved(_)
            | CoreError::KitchenExists(_) => ErrorCode::BusinessLogic,
            CoreError::TotalOverflow => ErrorCode::ValidationError,
            CoreError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };

        ApiError::new(code, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Failures while bringing the service up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database startup failed: {0}")]
    Database(#[from] DbError),
}
