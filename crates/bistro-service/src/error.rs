//! # Service Error Type
//!
//! One error type for every use case, plus a machine-readable code for
//! whatever transport sits on top.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OrderService::finish(id)                                              │
//! │       │                                                                 │
//! │       ├── db.orders().get_by_id  ── None ──────► ServiceError::NotFound │
//! │       ├── order.finish()         ── CoreError ─► ServiceError::Core     │
//! │       └── db.orders().save       ── DbError ───► ServiceError::Db       │
//! │                                                                         │
//! │  error.body()  ──►  { "code": "BUSINESS_LOGIC",                         │
//! │                       "message": "order must be pending" }              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use bistro_core::{CoreError, ErrorKind};
use bistro_db::DbError;

/// Errors returned by the use cases.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A business rule refused the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    /// The aggregate the caller named does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available")]
    NoPath,
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Classifies the error for callers that only need a category.
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::NotFound { .. } => ErrorCode::NotFound,
            ServiceError::Core(err) => match err.kind() {
                ErrorKind::InvalidInput => ErrorCode::ValidationError,
                ErrorKind::OverpaymentDetected => ErrorCode::PaymentError,
                ErrorKind::InvalidTransition
                | ErrorKind::AlreadyInTerminalState
                | ErrorKind::MissingRequiredData => ErrorCode::BusinessLogic,
            },
            ServiceError::Db(DbError::NotFound { .. }) => ErrorCode::NotFound,
            ServiceError::Db(DbError::UniqueViolation { .. })
            | ServiceError::Db(DbError::ForeignKeyViolation { .. }) => ErrorCode::ValidationError,
            ServiceError::Db(_) => ErrorCode::DatabaseError,
            ServiceError::Config(_) => ErrorCode::Internal,
        }
    }

    /// The code plus a message safe to show to a user.
    ///
    /// Database details are logged here and replaced by a generic message.
    pub fn body(&self) -> ErrorBody {
        let message = match self {
            ServiceError::Db(DbError::NotFound { entity, id }) => {
                format!("{} not found: {}", entity, id)
            }
            ServiceError::Db(DbError::UniqueViolation { field, value }) => {
                format!("{} '{}' already exists", field, value)
            }
            ServiceError::Db(DbError::ForeignKeyViolation { message }) => {
                tracing::error!("Foreign key violation: {}", message);
                "Invalid reference".to_string()
            }
            ServiceError::Db(err) => {
                tracing::error!("Database operation failed: {}", err);
                "Database operation failed".to_string()
            }
            ServiceError::Config(err) => {
                tracing::error!("Configuration error: {}", err);
                "Service misconfigured".to_string()
            }
            other => other.to_string(),
        };

        ErrorBody {
            code: self.code(),
            message,
        }
    }
}

/// Error categories for a transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// A state guard refused the operation (422)
    BusinessLogic,

    /// Payments exceed what is owed (422)
    PaymentError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

/// Serializable error payload.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Order not found: 6f1c..." }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

pub type ServiceResult<T> = Result<T, ServiceError>;
