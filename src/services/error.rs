//! Typed failures returned by the booking engine's call surface.

use crate::db::repository::RepositoryError;
use crate::models::{BookingId, BookingStatus, IntervalError};

/// Error type for all engine operations. Every mutating call either returns
/// a committed state change or one of these; there is no partial success.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// The slot's time range is degenerate or not minute-aligned.
    #[error(transparent)]
    InvalidInterval(#[from] IntervalError),

    /// The slot falls outside the venue's operating hours for that weekday.
    #[error("slot is outside the venue's operating hours")]
    OutOfHours,

    /// The slot's start is not in the future.
    #[error("slot starts in the past")]
    SlotInPast,

    /// An active booking already occupies an overlapping slot.
    #[error("slot already taken by booking {conflicting}")]
    SlotTaken { conflicting: BookingId },

    /// The requested status change is not allowed from the current state.
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// Unknown booking or venue.
    #[error("{0} not found")]
    NotFound(String),

    /// The actor is neither the requester nor the venue owner.
    #[error("actor is not allowed to act on this booking")]
    Forbidden,

    /// The slot has already started; cancellation is no longer possible.
    #[error("too late to cancel: the slot has already started")]
    TooLateToCancel,

    /// The booking already carries a rating.
    #[error("booking has already been rated")]
    AlreadyRated,

    /// The slot has not ended yet; rating is not possible.
    #[error("booking is not completed yet")]
    NotYetCompleted,

    /// Rating score outside 1..=5.
    #[error("rating score {0} is not between 1 and 5")]
    InvalidScore(u8),

    /// The store stayed unresponsive through the bounded retry budget.
    #[error("reservation store unavailable")]
    StoreUnavailable,

    /// Any other store failure, passed through with its context.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl BookingError {
    /// Map a repository lookup failure, turning NotFound into the engine's
    /// own variant.
    pub(crate) fn from_lookup(err: RepositoryError, entity: &str) -> Self {
        match err {
            RepositoryError::NotFound { .. } => Self::NotFound(entity.to_string()),
            other => Self::Repository(other),
        }
    }
}
