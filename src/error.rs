//! Custom error types for OrderDesk
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Every error maps onto an [`ErrorKind`] so
//! callers can react to the category of failure without matching on messages.

use thiserror::Error;

/// Broad failure categories surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An order, line item or export file does not exist
    NotFound,
    /// Input was rejected before (or while) being applied
    Validation,
    /// An order number collided with an existing one
    Conflict,
    /// A step inside a multi-step write failed and the write was rolled back
    Transaction,
    /// The operation was cancelled by the caller
    Cancelled,
    /// Configuration, I/O or storage failure outside a write operation
    Internal,
}

/// The main error type for OrderDesk operations
#[derive(Error, Debug)]
pub enum OrderError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for orders and line items
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Unique constraint violations
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A write operation failed part-way and nothing was committed
    #[error("Failed to {operation} order: {reason}")]
    Transaction {
        operation: &'static str,
        reason: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Cancelled by the caller
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl OrderError {
    /// Create a "not found" error for orders
    pub fn order_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Order",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for line items
    pub fn line_item_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Line item",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for export files
    pub fn export_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Export file",
            identifier: identifier.into(),
        }
    }

    /// The category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Transaction { .. } => ErrorKind::Transaction,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Storage(_) | Self::Export(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Wrap low-level failures raised inside a write operation.
    ///
    /// Not-found, validation and conflict errors keep their kind so callers
    /// can still tell them apart.
    pub fn in_operation(self, operation: &'static str) -> Self {
        match self {
            Self::Io(reason) | Self::Json(reason) | Self::Storage(reason) => Self::Transaction {
                operation,
                reason,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for OrderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for OrderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<crate::models::LineItemValidationError> for OrderError {
    fn from(err: crate::models::LineItemValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<crate::models::OrderValidationError> for OrderError {
    fn from(err: crate::models::OrderValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for OrderError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(err.to_string())
    }
}

/// Result type alias for OrderDesk operations
pub type OrderResult<T> = Result<T, OrderError>;
