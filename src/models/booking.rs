//! Bookings, their lifecycle, and rating events.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slot::TimeSlot;
use super::venue::{UserId, VenueId};

/// Opaque booking identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for BookingId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Booking lifecycle states.
///
/// `Requested -> Confirmed` happens atomically inside the store commit;
/// there is no separate approval step. `Completed` is derived from the
/// wall clock on read, never written by a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Requested,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Legal successors per the lifecycle state machine.
    pub fn can_transition_to(self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (Requested, Confirmed) | (Requested, Cancelled) | (Confirmed, Cancelled) | (Confirmed, Completed)
        )
    }

    /// Active bookings occupy their slot for overlap purposes.
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Requested | BookingStatus::Confirmed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingStatus::Requested => "requested",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A rating submitted for a completed booking. At most one per booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingEvent {
    pub venue_id: VenueId,
    /// The day the slot was played, used for daily bucketing.
    pub date: NaiveDate,
    /// Score in 1..=5.
    pub score: u8,
    pub comment: Option<String>,
    pub submitted_at: NaiveDateTime,
}

/// A reservation of a venue slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    id: BookingId,
    venue_id: VenueId,
    requester: UserId,
    slot: TimeSlot,
    status: BookingStatus,
    /// Hourly rate times slot duration, priced at admission time.
    total_amount: f64,
    created_at: NaiveDateTime,
    cancelled_at: Option<NaiveDateTime>,
    rating: Option<RatingEvent>,
}

impl Booking {
    /// Build a fresh booking request. The store commit flips it to
    /// `Confirmed` atomically on success.
    pub fn request(
        venue_id: VenueId,
        requester: UserId,
        slot: TimeSlot,
        total_amount: f64,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: BookingId::new(),
            venue_id,
            requester,
            slot,
            status: BookingStatus::Requested,
            total_amount,
            created_at,
            cancelled_at: None,
            rating: None,
        }
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn venue_id(&self) -> VenueId {
        self.venue_id
    }

    pub fn requester(&self) -> UserId {
        self.requester
    }

    pub fn slot(&self) -> &TimeSlot {
        &self.slot
    }

    /// Stored status. Prefer [`Booking::derived_status`] for reads.
    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn total_amount(&self) -> f64 {
        self.total_amount
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn cancelled_at(&self) -> Option<NaiveDateTime> {
        self.cancelled_at
    }

    pub fn rating(&self) -> Option<&RatingEvent> {
        self.rating.as_ref()
    }

    /// Status as observed at `now`: a confirmed booking whose slot has ended
    /// reads as `Completed`.
    pub fn derived_status(&self, now: NaiveDateTime) -> BookingStatus {
        if self.status == BookingStatus::Confirmed && self.slot.has_ended(now) {
            BookingStatus::Completed
        } else {
            self.status
        }
    }

    /// Copy of this booking with the derived status applied, for callers
    /// rendering booking state.
    pub fn resolved_at(&self, now: NaiveDateTime) -> Booking {
        let mut b = self.clone();
        b.status = self.derived_status(now);
        b
    }

    // Mutators below are crate-internal: only the repository applies them,
    // under its per-key serialization.

    pub(crate) fn set_status(&mut self, status: BookingStatus) {
        self.status = status;
    }

    pub(crate) fn set_cancelled_at(&mut self, at: NaiveDateTime) {
        self.cancelled_at = Some(at);
    }

    pub(crate) fn set_rating(&mut self, rating: RatingEvent) {
        self.rating = Some(rating);
    }
}

/// One day of the rolling rating trend. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRatingPoint {
    pub date: NaiveDate,
    /// Human-readable weekday label, e.g. "Friday".
    pub day_name: String,
    /// Average score for the day, 0.0 when there were no ratings.
    pub avg_rating: f64,
    pub count: usize,
}
