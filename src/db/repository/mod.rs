//! Repository traits for the reservation store.
//!
//! All mutation of bookings for a given (venue, date) key is a total order:
//! implementations must funnel `try_commit` and `transition` through a
//! serialization point scoped to that key. Reads are allowed to race with
//! writers; the authoritative overlap check lives inside `try_commit`.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{Booking, BookingId, BookingStatus, RatingEvent, UserId, Venue, VenueId};

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Storage of bookings keyed by (venue, date).
///
/// # Thread safety
/// Implementations must be `Send + Sync`.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// All bookings with status in {Requested, Confirmed} for the key.
    ///
    /// Read-only and lock-free with respect to the caller: a stale result
    /// that misses a just-committed booking is acceptable.
    async fn list_active(&self, venue: VenueId, date: NaiveDate) -> RepositoryResult<Vec<Booking>>;

    /// Insert `booking` only if no existing active booking overlaps its
    /// slot, as one atomic operation against the (venue, date) key.
    ///
    /// The booking must arrive in `Requested` state; on success it is stored
    /// and returned as `Confirmed`. On overlap the error carries the id of
    /// the conflicting booking and nothing is written.
    async fn try_commit(&self, booking: Booking) -> RepositoryResult<Booking>;

    /// Atomic compare-and-set status transition.
    ///
    /// Fails with [`RepositoryError::StaleState`] if the booking is not
    /// currently in `from`, or if `to` is not a legal successor. `at` stamps
    /// `cancelled_at` when transitioning to `Cancelled`.
    async fn transition(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        at: NaiveDateTime,
    ) -> RepositoryResult<Booking>;

    /// Fetch a booking by id.
    async fn find(&self, id: BookingId) -> RepositoryResult<Booking>;

    /// All bookings made by `requester`, oldest first.
    async fn find_by_requester(&self, requester: UserId) -> RepositoryResult<Vec<Booking>>;

    /// Attach a rating to a booking, atomically enforcing at most one
    /// rating per booking. A second attempt fails with
    /// [`RepositoryError::Conflict`].
    async fn attach_rating(&self, id: BookingId, rating: RatingEvent) -> RepositoryResult<Booking>;
}

/// Read access to rating events for trend aggregation.
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Rating events for `venue` with date in `from..=to`.
    async fn ratings_in_range(
        &self,
        venue: VenueId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<RatingEvent>>;

    /// Every rating event recorded for `venue`.
    async fn ratings_for_venue(&self, venue: VenueId) -> RepositoryResult<Vec<RatingEvent>>;
}

/// The venue lookup the engine consumes from its environment.
#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn insert_venue(&self, venue: Venue) -> RepositoryResult<Venue>;
    async fn get_venue(&self, id: VenueId) -> RepositoryResult<Venue>;
    async fn list_venues(&self) -> RepositoryResult<Vec<Venue>>;
}

/// Combined repository interface used by the service layer.
#[async_trait]
pub trait FullRepository: BookingRepository + RatingRepository + VenueRepository {
    /// Check the store is reachable and responsive.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
