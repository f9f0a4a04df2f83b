//! Error types for repository operations.

use std::fmt;

use crate::models::{BookingId, BookingStatus};

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Structured context attached to repository errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g. "try_commit", "transition")
    pub operation: Option<String>,
    /// The entity type involved (e.g. "booking", "venue")
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for repository operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    /// An active booking already occupies the requested slot.
    #[error("slot conflict with booking {conflicting} {context}")]
    Conflict {
        conflicting: BookingId,
        context: ErrorContext,
    },

    /// Requested entity was not found.
    #[error("not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Compare-and-set transition failed: the booking was not in the state
    /// the caller expected, or the target state is not a legal successor.
    #[error("stale state: booking is {actual}, expected {expected} {context}")]
    StaleState {
        expected: BookingStatus,
        actual: BookingStatus,
        context: ErrorContext,
    },

    /// Data validation failed before the operation was applied.
    #[error("validation error: {message} {context}")]
    Validation {
        message: String,
        context: ErrorContext,
    },

    /// Timed out acquiring the store's serialization point. Retryable.
    #[error("timeout: {message} {context}")]
    Timeout {
        message: String,
        context: ErrorContext,
    },

    /// Internal/unexpected errors.
    #[error("internal error: {message} {context}")]
    Internal {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    pub fn conflict(conflicting: BookingId, context: ErrorContext) -> Self {
        Self::Conflict {
            conflicting,
            context,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    pub fn stale_state(expected: BookingStatus, actual: BookingStatus, context: ErrorContext) -> Self {
        Self::StaleState {
            expected,
            actual,
            context,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn validation_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Validation {
            message: message.into(),
            context,
        }
    }

    pub fn timeout(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Timeout {
            message: message.into(),
            context: context.retryable(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Whether the caller may retry the operation.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Conflict { context, .. } => context,
            Self::NotFound { context, .. } => context,
            Self::StaleState { context, .. } => context,
            Self::Validation { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Internal { context, .. } => context,
        }
    }
}
