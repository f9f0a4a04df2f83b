//! In-memory reservation store.
//!
//! `LocalRepository` is the authoritative store for this engine. Bookings
//! live in per-(venue, date) day books, each guarded by its own mutex; that
//! mutex is the serialization point spec'd for all mutation of a key, so two
//! concurrent commits for overlapping slots can never both observe "no
//! conflict". Lock acquisition is bounded: waiting longer than the
//! configured timeout surfaces a retryable timeout error instead of
//! hanging.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::db::repository::{
    BookingRepository, ErrorContext, FullRepository, RatingRepository, RepositoryError,
    RepositoryResult, VenueRepository,
};
use crate::models::{Booking, BookingId, BookingStatus, RatingEvent, UserId, Venue, VenueId};

/// Default bound on waiting for a day-book lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

type DayKey = (VenueId, NaiveDate);
type DayBook = Arc<Mutex<Vec<Booking>>>;

/// In-memory implementation of the full repository.
pub struct LocalRepository {
    venues: RwLock<HashMap<VenueId, Venue>>,
    days: RwLock<HashMap<DayKey, DayBook>>,
    /// Booking id -> owning day book, so transitions can find their key.
    index: RwLock<HashMap<BookingId, DayKey>>,
    lock_timeout: Duration,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            venues: RwLock::new(HashMap::new()),
            days: RwLock::new(HashMap::new()),
            index: RwLock::new(HashMap::new()),
            lock_timeout,
        }
    }

    /// Get or create the day book for a key.
    fn day_book(&self, key: DayKey) -> DayBook {
        if let Some(book) = self.days.read().get(&key) {
            return Arc::clone(book);
        }
        let mut days = self.days.write();
        Arc::clone(days.entry(key).or_default())
    }

    /// Day book for a key if it exists; absent keys have no bookings.
    fn existing_day_book(&self, key: &DayKey) -> Option<DayBook> {
        self.days.read().get(key).map(Arc::clone)
    }

    /// Acquire a day-book lock within the configured bound.
    fn lock_day<'a>(
        &self,
        book: &'a DayBook,
        operation: &str,
    ) -> RepositoryResult<MutexGuard<'a, Vec<Booking>>> {
        book.try_lock_for(self.lock_timeout).ok_or_else(|| {
            RepositoryError::timeout(
                "timed out waiting for day-book lock",
                ErrorContext::new(operation).with_entity("booking"),
            )
        })
    }

    fn key_for(&self, id: BookingId, operation: &str) -> RepositoryResult<DayKey> {
        self.index.read().get(&id).copied().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("booking {id} not found"),
                ErrorContext::new(operation)
                    .with_entity("booking")
                    .with_entity_id(id),
            )
        })
    }

    /// Run `f` on the booking `id` while holding its day-book lock.
    fn with_booking<T>(
        &self,
        id: BookingId,
        operation: &str,
        f: impl FnOnce(&mut Booking) -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        let key = self.key_for(id, operation)?;
        let book = self.existing_day_book(&key).ok_or_else(|| {
            RepositoryError::internal(format!("day book missing for indexed booking {id}"))
        })?;
        let mut guard = self.lock_day(&book, operation)?;
        let booking = guard.iter_mut().find(|b| b.id() == id).ok_or_else(|| {
            RepositoryError::internal(format!("booking {id} missing from its day book"))
        })?;
        f(booking)
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for LocalRepository {
    async fn list_active(&self, venue: VenueId, date: NaiveDate) -> RepositoryResult<Vec<Booking>> {
        let Some(book) = self.existing_day_book(&(venue, date)) else {
            return Ok(Vec::new());
        };
        let guard = self.lock_day(&book, "list_active")?;
        Ok(guard
            .iter()
            .filter(|b| b.status().is_active())
            .cloned()
            .collect())
    }

    async fn try_commit(&self, booking: Booking) -> RepositoryResult<Booking> {
        if booking.status() != BookingStatus::Requested {
            return Err(RepositoryError::validation_with_context(
                format!("cannot commit a booking in state {}", booking.status()),
                ErrorContext::new("try_commit")
                    .with_entity("booking")
                    .with_entity_id(booking.id()),
            ));
        }

        let key = (booking.venue_id(), booking.slot().date());
        let book = self.day_book(key);
        let mut guard = self.lock_day(&book, "try_commit")?;

        // Authoritative overlap check, inside the per-key lock.
        if let Some(existing) = guard.iter().find(|b| {
            b.status().is_active() && b.slot().interval().overlaps(booking.slot().interval())
        }) {
            return Err(RepositoryError::conflict(
                existing.id(),
                ErrorContext::new("try_commit")
                    .with_entity("booking")
                    .with_entity_id(booking.id())
                    .with_details(format!("slot {}", booking.slot())),
            ));
        }

        let mut committed = booking;
        committed.set_status(BookingStatus::Confirmed);
        guard.push(committed.clone());
        drop(guard);

        self.index.write().insert(committed.id(), key);
        Ok(committed)
    }

    async fn transition(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        at: NaiveDateTime,
    ) -> RepositoryResult<Booking> {
        self.with_booking(id, "transition", |booking| {
            if booking.status() != from {
                return Err(RepositoryError::stale_state(
                    from,
                    booking.status(),
                    ErrorContext::new("transition")
                        .with_entity("booking")
                        .with_entity_id(id),
                ));
            }
            if !from.can_transition_to(to) {
                return Err(RepositoryError::validation_with_context(
                    format!("{from} -> {to} is not a legal transition"),
                    ErrorContext::new("transition")
                        .with_entity("booking")
                        .with_entity_id(id),
                ));
            }
            booking.set_status(to);
            if to == BookingStatus::Cancelled {
                booking.set_cancelled_at(at);
            }
            Ok(booking.clone())
        })
    }

    async fn find(&self, id: BookingId) -> RepositoryResult<Booking> {
        self.with_booking(id, "find", |booking| Ok(booking.clone()))
    }

    async fn find_by_requester(&self, requester: UserId) -> RepositoryResult<Vec<Booking>> {
        let books: Vec<DayBook> = self.days.read().values().map(Arc::clone).collect();
        let mut found = Vec::new();
        for book in books {
            let guard = self.lock_day(&book, "find_by_requester")?;
            found.extend(guard.iter().filter(|b| b.requester() == requester).cloned());
        }
        found.sort_by_key(|b| b.created_at());
        Ok(found)
    }

    async fn attach_rating(&self, id: BookingId, rating: RatingEvent) -> RepositoryResult<Booking> {
        self.with_booking(id, "attach_rating", |booking| {
            if booking.rating().is_some() {
                return Err(RepositoryError::conflict(
                    id,
                    ErrorContext::new("attach_rating")
                        .with_entity("booking")
                        .with_entity_id(id)
                        .with_details("rating already recorded"),
                ));
            }
            booking.set_rating(rating);
            Ok(booking.clone())
        })
    }
}

#[async_trait]
impl RatingRepository for LocalRepository {
    async fn ratings_in_range(
        &self,
        venue: VenueId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<RatingEvent>> {
        let books: Vec<DayBook> = self
            .days
            .read()
            .iter()
            .filter(|((v, date), _)| *v == venue && (from..=to).contains(date))
            .map(|(_, book)| Arc::clone(book))
            .collect();

        let mut ratings = Vec::new();
        for book in books {
            let guard = self.lock_day(&book, "ratings_in_range")?;
            ratings.extend(guard.iter().filter_map(|b| b.rating().cloned()));
        }
        ratings.sort_by_key(|r| (r.date, r.submitted_at));
        Ok(ratings)
    }

    async fn ratings_for_venue(&self, venue: VenueId) -> RepositoryResult<Vec<RatingEvent>> {
        self.ratings_in_range(venue, NaiveDate::MIN, NaiveDate::MAX)
            .await
    }
}

#[async_trait]
impl VenueRepository for LocalRepository {
    async fn insert_venue(&self, venue: Venue) -> RepositoryResult<Venue> {
        let mut venues = self.venues.write();
        if venues.contains_key(&venue.id) {
            return Err(RepositoryError::validation_with_context(
                format!("venue {} already exists", venue.id),
                ErrorContext::new("insert_venue")
                    .with_entity("venue")
                    .with_entity_id(venue.id),
            ));
        }
        venues.insert(venue.id, venue.clone());
        Ok(venue)
    }

    async fn get_venue(&self, id: VenueId) -> RepositoryResult<Venue> {
        self.venues.read().get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("venue {id} not found"),
                ErrorContext::new("get_venue")
                    .with_entity("venue")
                    .with_entity_id(id),
            )
        })
    }

    async fn list_venues(&self) -> RepositoryResult<Vec<Venue>> {
        let mut venues: Vec<Venue> = self.venues.read().values().cloned().collect();
        venues.sort_by_key(|v| v.id);
        Ok(venues)
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeSlot;
    use chrono::{NaiveDate, NaiveTime};

    fn requested() -> Booking {
        let date = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
        let slot = TimeSlot::new(
            date,
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        )
        .unwrap();
        Booking::request(
            VenueId::new(1),
            UserId::new(7),
            slot,
            20.0,
            date.and_hms_opt(6, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_contended_day_book_times_out_as_retryable() {
        let repo = LocalRepository::with_lock_timeout(Duration::ZERO);
        let committed = repo.try_commit(requested()).await.unwrap();
        let key = (committed.venue_id(), committed.slot().date());

        // Hold the day-book lock so every bounded acquisition fails.
        let book = repo.existing_day_book(&key).unwrap();
        let _guard = book.lock();

        let err = repo.list_active(key.0, key.1).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Timeout { .. }));
        assert!(err.is_retryable());

        let err = repo.try_commit(requested()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_timeout_clears_once_lock_is_released() {
        let repo = LocalRepository::with_lock_timeout(Duration::ZERO);
        let committed = repo.try_commit(requested()).await.unwrap();
        let key = (committed.venue_id(), committed.slot().date());

        {
            let book = repo.existing_day_book(&key).unwrap();
            let _guard = book.lock();
            assert!(repo.list_active(key.0, key.1).await.is_err());
        }

        let active = repo.list_active(key.0, key.1).await.unwrap();
        assert_eq!(active.len(), 1);
    }
}
