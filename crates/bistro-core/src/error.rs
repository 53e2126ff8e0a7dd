//! # Error Types
//!
//! Domain-specific error types for bistro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bistro-core errors (this file)                                        │
//! │  ├── CoreError          - Umbrella returned by every entity method     │
//! │  │   ├── OrderError     - Order lifecycle and payment guards           │
//! │  │   ├── GroupItemError - Group lifecycle, item acceptance, complement │
//! │  │   ├── ItemError      - Item lifecycle                               │
//! │  │   ├── ShiftError     - Shift numbering                              │
//! │  │   └── ValidationError - Input validation failures                   │
//! │  └── ErrorKind          - Taxonomy used by callers to classify         │
//! │                                                                         │
//! │  bistro-db errors (separate crate)                                     │
//! │  └── DbError            - Database operation failures                  │
//! │                                                                         │
//! │  Flow: OrderError → CoreError → ServiceError → transport layer         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers match variants structurally; the message of each variant is the
//! user-facing text.

use thiserror::Error;

use crate::group_item::GroupItemStatus;
use crate::item::ItemStatus;
use crate::order::OrderStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// Classification of every core failure.
///
/// All core errors are precondition violations: none are transient and none
/// should be retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested state change violates the guard for the current state.
    InvalidTransition,
    /// The aggregate already reached a terminal state.
    AlreadyInTerminalState,
    /// Something the operation needs is absent or does not match.
    MissingRequiredData,
    /// Recorded payments exceed the payable total.
    OverpaymentDetected,
    /// Input failed validation before any business rule ran.
    InvalidInput,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    GroupItem(#[from] GroupItemError),

    #[error(transparent)]
    Item(#[from] ItemError),

    #[error(transparent)]
    Shift(#[from] ShiftError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies this error into the core taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Order(err) => err.kind(),
            CoreError::GroupItem(err) => err.kind(),
            CoreError::Item(err) => err.kind(),
            CoreError::Shift(_) => ErrorKind::AlreadyInTerminalState,
            CoreError::Validation(_) => ErrorKind::InvalidInput,
        }
    }
}

// =============================================================================
// Order Error
// =============================================================================

/// Order lifecycle and payment failures.
///
/// ## Where Each Fires
/// ```text
/// pending()          ──► AlreadyFinished / AlreadyCanceled / AlreadyArchived
///                        WithoutItems
/// finish()           ──► AlreadyFinished / MustBePending
/// cancel()           ──► AlreadyCanceled / AlreadyArchived / AlreadyFinished
/// archive()          ──► AlreadyArchived / MustBeFinishedOrCanceled
/// unarchive()        ──► MustBeArchived
/// validate_payments()──► MustBePending / PaidMoreThanTotal
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order must be pending")]
    MustBePending,

    #[error("order must be canceled or finished")]
    MustBeFinishedOrCanceled,

    #[error("order must be archived")]
    MustBeArchived,

    #[error("order already finished")]
    AlreadyFinished,

    #[error("order already canceled")]
    AlreadyCanceled,

    #[error("order already archived")]
    AlreadyArchived,

    #[error("order must have at least one item")]
    WithoutItems,

    #[error("order paid more than total")]
    PaidMoreThanTotal,

    /// Delivery and table sub-orders are mutually exclusive.
    #[error("order already has a {0} attached")]
    OrderTypeAlreadySet(&'static str),

    #[error("group item {0} not found in order")]
    GroupNotFound(String),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::MustBePending
            | OrderError::MustBeFinishedOrCanceled
            | OrderError::MustBeArchived
            | OrderError::OrderTypeAlreadySet(_) => ErrorKind::InvalidTransition,
            OrderError::AlreadyFinished
            | OrderError::AlreadyCanceled
            | OrderError::AlreadyArchived => ErrorKind::AlreadyInTerminalState,
            OrderError::WithoutItems | OrderError::GroupNotFound(_) => {
                ErrorKind::MissingRequiredData
            }
            OrderError::PaidMoreThanTotal => ErrorKind::OverpaymentDetected,
        }
    }

    /// Maps a terminal order status to its "already ..." error.
    pub(crate) fn already(status: OrderStatus) -> Option<OrderError> {
        match status {
            OrderStatus::Finished => Some(OrderError::AlreadyFinished),
            OrderStatus::Canceled => Some(OrderError::AlreadyCanceled),
            OrderStatus::Archived => Some(OrderError::AlreadyArchived),
            OrderStatus::Staging | OrderStatus::Pending => None,
        }
    }
}

// =============================================================================
// Group Item Error
// =============================================================================

/// Group item lifecycle, item acceptance and complement failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupItemError {
    /// Kitchen work already began on the group or one of its items.
    #[error("items already finished")]
    ItemsFinished,

    #[error("group item canceled")]
    Canceled,

    #[error("group item must be {expected:?}, found {found:?}")]
    InvalidStatus {
        expected: GroupItemStatus,
        found: GroupItemStatus,
    },

    #[error("group item not staging")]
    NotStaging,

    #[error("group item category invalid")]
    CategoryInvalid,

    #[error("group item size invalid")]
    SizeInvalid,

    #[error("size must be the same")]
    SizeMustBeTheSame,

    #[error("item {0} not found in group")]
    ItemNotFound(String),
}

impl GroupItemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GroupItemError::ItemsFinished
            | GroupItemError::InvalidStatus { .. }
            | GroupItemError::NotStaging => ErrorKind::InvalidTransition,
            GroupItemError::Canceled => ErrorKind::AlreadyInTerminalState,
            GroupItemError::CategoryInvalid
            | GroupItemError::SizeInvalid
            | GroupItemError::SizeMustBeTheSame
            | GroupItemError::ItemNotFound(_) => ErrorKind::MissingRequiredData,
        }
    }
}

// =============================================================================
// Item Error
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("item cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: ItemStatus, to: ItemStatus },

    #[error("item already canceled")]
    AlreadyCanceled,
}

impl ItemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ItemError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            ItemError::AlreadyCanceled => ErrorKind::AlreadyInTerminalState,
        }
    }
}

// =============================================================================
// Shift Error
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShiftError {
    #[error("shift already closed")]
    AlreadyClosed,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
