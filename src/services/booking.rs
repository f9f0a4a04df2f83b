//! Booking orchestrator: admission control and lifecycle transitions.
//!
//! The orchestrator validates requests, runs the advisory availability
//! pre-check, and drives the store's atomic operations. Every store call
//! goes through a small bounded retry; a store that stays unresponsive
//! surfaces as [`BookingError::StoreUnavailable`] instead of hanging.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use tracing::{info, warn};

use crate::db::repository::{
    BookingRepository, FullRepository, RepositoryError, RepositoryResult, VenueRepository,
};
use crate::models::{
    Booking, BookingId, BookingStatus, DailyRatingPoint, Interval, RatingEvent, TimeSlot, UserId,
    Venue, VenueId,
};

use super::availability;
use super::clock::Clock;
use super::error::BookingError;
use super::events::{EventSink, LifecycleEvent};
use super::ratings;

/// Attempts per store operation before giving up.
const STORE_ATTEMPTS: usize = 3;
/// Base backoff between attempts; grows linearly with the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// The engine's synchronous call surface for the surrounding service layer.
pub struct BookingService {
    repo: Arc<dyn FullRepository>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
}

impl BookingService {
    pub fn new(
        repo: Arc<dyn FullRepository>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            repo,
            clock,
            events,
        }
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repo
    }

    /// Current venue-local time as seen by the engine's clock.
    pub fn now(&self) -> chrono::NaiveDateTime {
        self.clock.now()
    }

    /// Admit a new booking for `slot` at `venue_id`.
    ///
    /// On success the returned booking is already `Confirmed`: the
    /// Requested -> Confirmed step happens inside the store's atomic commit
    /// and there is no separate approval stage.
    pub async fn request_booking(
        &self,
        venue_id: VenueId,
        requester: UserId,
        slot: TimeSlot,
    ) -> Result<Booking, BookingError> {
        let now = self.clock.now();
        let venue = self.venue(venue_id).await?;

        let window = venue
            .hours
            .window_for(slot.date().weekday())
            .ok_or(BookingError::OutOfHours)?;
        if !window.contains(slot.interval()) {
            return Err(BookingError::OutOfHours);
        }
        if !slot.starts_after(now) {
            return Err(BookingError::SlotInPast);
        }

        // Advisory pre-check: cheap rejection with the conflicting id. The
        // authoritative check happens inside try_commit, so a stale answer
        // here is harmless.
        let active = self.repo.list_active(venue_id, slot.date()).await?;
        if let Some(existing) = active
            .iter()
            .find(|b| b.slot().interval().overlaps(slot.interval()))
        {
            return Err(BookingError::SlotTaken {
                conflicting: existing.id(),
            });
        }

        let total_amount = venue.hourly_rate * slot.interval().duration_minutes() as f64 / 60.0;
        let booking = Booking::request(venue_id, requester, slot, total_amount, now);

        let repo = Arc::clone(&self.repo);
        let committed = match self
            .retry("try_commit", || {
                let repo = Arc::clone(&repo);
                let booking = booking.clone();
                async move { repo.try_commit(booking).await }
            })
            .await
        {
            Ok(b) => b,
            Err(BookingError::Repository(RepositoryError::Conflict { conflicting, .. })) => {
                warn!(%venue_id, slot = %slot, %conflicting, "slot taken");
                return Err(BookingError::SlotTaken { conflicting });
            }
            Err(e) => return Err(e),
        };

        info!(
            booking_id = %committed.id(),
            %venue_id,
            %requester,
            slot = %slot,
            amount = committed.total_amount(),
            "booking confirmed"
        );
        self.events.publish(LifecycleEvent::confirmed(&committed));
        Ok(committed)
    }

    /// Cancel a booking before its slot starts.
    ///
    /// `actor` must be the requester or the venue owner; identity is always
    /// passed in explicitly.
    pub async fn cancel_booking(
        &self,
        id: BookingId,
        actor: UserId,
    ) -> Result<Booking, BookingError> {
        let now = self.clock.now();
        let booking = self
            .repo
            .find(id)
            .await
            .map_err(|e| BookingError::from_lookup(e, "booking"))?;
        let venue = self.venue(booking.venue_id()).await?;

        if actor != booking.requester() && actor != venue.owner {
            return Err(BookingError::Forbidden);
        }
        if booking.status() == BookingStatus::Cancelled {
            return Err(BookingError::IllegalTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Cancelled,
            });
        }
        if !booking.slot().starts_after(now) {
            return Err(BookingError::TooLateToCancel);
        }

        let from = booking.status();
        let repo = Arc::clone(&self.repo);
        let cancelled = match self
            .retry("transition", || {
                let repo = Arc::clone(&repo);
                async move {
                    repo.transition(id, from, BookingStatus::Cancelled, now)
                        .await
                }
            })
            .await
        {
            Ok(b) => b,
            Err(BookingError::Repository(RepositoryError::StaleState { actual, .. })) => {
                return Err(BookingError::IllegalTransition {
                    from: actual,
                    to: BookingStatus::Cancelled,
                });
            }
            Err(e) => return Err(e),
        };

        info!(booking_id = %id, %actor, "booking cancelled");
        self.events.publish(LifecycleEvent::cancelled(&cancelled));
        Ok(cancelled)
    }

    /// Submit the one allowed rating for a completed booking.
    pub async fn submit_rating(
        &self,
        id: BookingId,
        score: u8,
        comment: Option<String>,
    ) -> Result<Booking, BookingError> {
        if !(1..=5).contains(&score) {
            return Err(BookingError::InvalidScore(score));
        }

        let now = self.clock.now();
        let booking = self
            .repo
            .find(id)
            .await
            .map_err(|e| BookingError::from_lookup(e, "booking"))?;

        if booking.rating().is_some() {
            return Err(BookingError::AlreadyRated);
        }
        match booking.derived_status(now) {
            BookingStatus::Completed => {}
            BookingStatus::Cancelled => {
                return Err(BookingError::IllegalTransition {
                    from: BookingStatus::Cancelled,
                    to: BookingStatus::Completed,
                });
            }
            _ => return Err(BookingError::NotYetCompleted),
        }

        let rating = RatingEvent {
            venue_id: booking.venue_id(),
            date: booking.slot().date(),
            score,
            comment,
            submitted_at: now,
        };

        let repo = Arc::clone(&self.repo);
        let rated = match self
            .retry("attach_rating", || {
                let repo = Arc::clone(&repo);
                let rating = rating.clone();
                async move { repo.attach_rating(id, rating).await }
            })
            .await
        {
            Ok(b) => b,
            // Lost a race with another submission for the same booking.
            Err(BookingError::Repository(RepositoryError::Conflict { .. })) => {
                return Err(BookingError::AlreadyRated);
            }
            Err(e) => return Err(e),
        };

        info!(booking_id = %id, score, "rating recorded");
        Ok(rated.resolved_at(now))
    }

    /// Fetch a booking with the derived status applied.
    pub async fn get_booking(&self, id: BookingId) -> Result<Booking, BookingError> {
        let now = self.clock.now();
        let booking = self
            .repo
            .find(id)
            .await
            .map_err(|e| BookingError::from_lookup(e, "booking"))?;
        Ok(booking.resolved_at(now))
    }

    /// All bookings for `requester`, oldest first, derived status applied.
    pub async fn bookings_for_requester(
        &self,
        requester: UserId,
    ) -> Result<Vec<Booking>, BookingError> {
        let now = self.clock.now();
        let bookings = self.repo.find_by_requester(requester).await?;
        Ok(bookings.iter().map(|b| b.resolved_at(now)).collect())
    }

    /// Free sub-intervals of the venue's operating window on `date`.
    pub async fn free_intervals(
        &self,
        venue_id: VenueId,
        date: chrono::NaiveDate,
    ) -> Result<Vec<Interval>, BookingError> {
        availability::free_intervals(self.repo.as_ref(), venue_id, date).await
    }

    /// Rolling 7-day rating trend ending at `today`.
    pub async fn last_7_days(
        &self,
        venue_id: VenueId,
        today: chrono::NaiveDate,
    ) -> Result<Vec<DailyRatingPoint>, BookingError> {
        ratings::last_7_days(self.repo.as_ref(), venue_id, today).await
    }

    async fn venue(&self, id: VenueId) -> Result<Venue, BookingError> {
        self.repo
            .get_venue(id)
            .await
            .map_err(|e| BookingError::from_lookup(e, "venue"))
    }

    /// Run a store operation with the bounded retry budget. Only failures
    /// the store marks retryable are retried; everything else passes
    /// through untouched.
    async fn retry<T, Fut>(
        &self,
        operation: &str,
        mut attempt_fn: impl FnMut() -> Fut,
    ) -> Result<T, BookingError>
    where
        Fut: Future<Output = RepositoryResult<T>>,
    {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < STORE_ATTEMPTS => {
                    warn!(operation, attempt, error = %e, "store operation failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt as u32).await;
                }
                Err(e) if e.is_retryable() => {
                    warn!(operation, attempt, error = %e, "store unavailable");
                    return Err(BookingError::StoreUnavailable);
                }
                Err(e) => return Err(BookingError::Repository(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{
        BookingRepository, ErrorContext, RatingRepository, VenueRepository,
    };
    use crate::db::LocalRepository;
    use crate::services::clock::FixedClock;
    use crate::services::events::MemoryEventSink;
    use crate::models::WeeklyHours;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()
    }

    async fn service() -> (BookingService, Arc<FixedClock>, Arc<MemoryEventSink>) {
        let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
        let clock = Arc::new(FixedClock::new(date().and_hms_opt(6, 0, 0).unwrap()));
        let events = Arc::new(MemoryEventSink::new());
        let service = BookingService::new(
            Arc::clone(&repo),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&events) as Arc<dyn EventSink>,
        );
        let venue = Venue::new(
            VenueId::new(1),
            "Center Court",
            UserId::new(100),
            20.0,
            WeeklyHours::every_day(t(6, 0), t(22, 0)).unwrap(),
        );
        repo.insert_venue(venue).await.unwrap();
        (service, clock, events)
    }

    #[tokio::test]
    async fn test_pricing_uses_hourly_rate_and_duration() {
        let (service, _clock, _events) = service().await;
        let slot = TimeSlot::new(date(), t(17, 0), t(18, 30)).unwrap();
        let booking = service
            .request_booking(VenueId::new(1), UserId::new(7), slot)
            .await
            .unwrap();
        assert_eq!(booking.total_amount(), 30.0);
    }

    #[tokio::test]
    async fn test_unknown_venue_is_not_found() {
        let (service, _clock, _events) = service().await;
        let slot = TimeSlot::new(date(), t(17, 0), t(18, 0)).unwrap();
        let err = service
            .request_booking(VenueId::new(99), UserId::new(7), slot)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_slot_in_past_rejected() {
        let (service, clock, _events) = service().await;
        clock.set(date().and_hms_opt(17, 0, 0).unwrap());
        let slot = TimeSlot::new(date(), t(17, 0), t(18, 0)).unwrap();
        let err = service
            .request_booking(VenueId::new(1), UserId::new(7), slot)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::SlotInPast));
    }

    #[tokio::test]
    async fn test_invalid_score_rejected_before_lookup() {
        let (service, _clock, _events) = service().await;
        let err = service
            .submit_rating(BookingId::new(), 6, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidScore(6)));
    }

    /// Store whose `try_commit` times out a configured number of times
    /// before delegating to a real in-memory backend.
    struct FlakyRepository {
        inner: LocalRepository,
        failures_left: AtomicUsize,
        commit_attempts: AtomicUsize,
    }

    impl FlakyRepository {
        fn new(failures: usize) -> Self {
            Self {
                inner: LocalRepository::new(),
                failures_left: AtomicUsize::new(failures),
                commit_attempts: AtomicUsize::new(0),
            }
        }

        fn commit_attempts(&self) -> usize {
            self.commit_attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BookingRepository for FlakyRepository {
        async fn list_active(
            &self,
            venue: VenueId,
            date: NaiveDate,
        ) -> RepositoryResult<Vec<Booking>> {
            self.inner.list_active(venue, date).await
        }

        async fn try_commit(&self, booking: Booking) -> RepositoryResult<Booking> {
            self.commit_attempts.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(RepositoryError::timeout(
                    "timed out waiting for day-book lock",
                    ErrorContext::new("try_commit").with_entity("booking"),
                ));
            }
            self.inner.try_commit(booking).await
        }

        async fn transition(
            &self,
            id: BookingId,
            from: BookingStatus,
            to: BookingStatus,
            at: NaiveDateTime,
        ) -> RepositoryResult<Booking> {
            self.inner.transition(id, from, to, at).await
        }

        async fn find(&self, id: BookingId) -> RepositoryResult<Booking> {
            self.inner.find(id).await
        }

        async fn find_by_requester(&self, requester: UserId) -> RepositoryResult<Vec<Booking>> {
            self.inner.find_by_requester(requester).await
        }

        async fn attach_rating(
            &self,
            id: BookingId,
            rating: RatingEvent,
        ) -> RepositoryResult<Booking> {
            self.inner.attach_rating(id, rating).await
        }
    }

    #[async_trait]
    impl RatingRepository for FlakyRepository {
        async fn ratings_in_range(
            &self,
            venue: VenueId,
            from: NaiveDate,
            to: NaiveDate,
        ) -> RepositoryResult<Vec<RatingEvent>> {
            self.inner.ratings_in_range(venue, from, to).await
        }

        async fn ratings_for_venue(&self, venue: VenueId) -> RepositoryResult<Vec<RatingEvent>> {
            self.inner.ratings_for_venue(venue).await
        }
    }

    #[async_trait]
    impl VenueRepository for FlakyRepository {
        async fn insert_venue(&self, venue: Venue) -> RepositoryResult<Venue> {
            self.inner.insert_venue(venue).await
        }

        async fn get_venue(&self, id: VenueId) -> RepositoryResult<Venue> {
            self.inner.get_venue(id).await
        }

        async fn list_venues(&self) -> RepositoryResult<Vec<Venue>> {
            self.inner.list_venues().await
        }
    }

    #[async_trait]
    impl FullRepository for FlakyRepository {
        async fn health_check(&self) -> RepositoryResult<bool> {
            self.inner.health_check().await
        }
    }

    async fn flaky_service(failures: usize) -> (BookingService, Arc<FlakyRepository>) {
        let repo = Arc::new(FlakyRepository::new(failures));
        repo.insert_venue(Venue::new(
            VenueId::new(1),
            "Center Court",
            UserId::new(100),
            20.0,
            WeeklyHours::every_day(t(6, 0), t(22, 0)).unwrap(),
        ))
        .await
        .unwrap();

        let service = BookingService::new(
            Arc::clone(&repo) as Arc<dyn FullRepository>,
            Arc::new(FixedClock::new(date().and_hms_opt(6, 0, 0).unwrap())),
            Arc::new(crate::services::events::NullEventSink),
        );
        (service, repo)
    }

    #[tokio::test]
    async fn test_retryable_commit_failures_are_retried_until_success() {
        let (service, repo) = flaky_service(STORE_ATTEMPTS - 1).await;

        let slot = TimeSlot::new(date(), t(17, 0), t(18, 0)).unwrap();
        let booking = service
            .request_booking(VenueId::new(1), UserId::new(7), slot)
            .await
            .unwrap();

        assert_eq!(booking.status(), BookingStatus::Confirmed);
        assert_eq!(repo.commit_attempts(), STORE_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_store_unavailable() {
        let (service, repo) = flaky_service(STORE_ATTEMPTS).await;

        let slot = TimeSlot::new(date(), t(17, 0), t(18, 0)).unwrap();
        let err = service
            .request_booking(VenueId::new(1), UserId::new(7), slot)
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::StoreUnavailable));
        // The retry budget is spent, never exceeded.
        assert_eq!(repo.commit_attempts(), STORE_ATTEMPTS);
    }
}
