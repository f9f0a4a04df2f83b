#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use courtside::db::repository::{FullRepository, VenueRepository};
use courtside::db::LocalRepository;
use courtside::models::{Booking, TimeSlot, UserId, Venue, VenueId, WeeklyHours};
use courtside::services::{
    BookingError, BookingService, Clock, EventSink, FixedClock, MemoryEventSink,
};

pub const VENUE_ID: i64 = 1;
pub const OWNER_ID: i64 = 100;
pub const REQUESTER_ID: i64 = 7;
pub const HOURLY_RATE: f64 = 20.0;

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// The fixture's booking date, a Friday.
pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()
}

pub fn at(h: u32, m: u32) -> NaiveDateTime {
    day().and_hms_opt(h, m, 0).unwrap()
}

pub fn slot(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> TimeSlot {
    TimeSlot::new(day(), t(start_h, start_m), t(end_h, end_m)).unwrap()
}

/// A fully wired engine over an in-memory store with a pinned clock.
pub struct Harness {
    pub service: Arc<BookingService>,
    pub repo: Arc<dyn FullRepository>,
    pub clock: Arc<FixedClock>,
    pub events: Arc<MemoryEventSink>,
}

/// Engine with one venue: "Center Court", open 06:00-22:00 every day except
/// Sunday, 20.0 per hour. The clock starts at 06:00 on the fixture date.
pub async fn harness() -> Harness {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let clock = Arc::new(FixedClock::new(at(6, 0)));
    let events = Arc::new(MemoryEventSink::new());
    let service = Arc::new(BookingService::new(
        Arc::clone(&repo),
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::clone(&events) as Arc<dyn EventSink>,
    ));

    let hours = WeeklyHours::every_day(t(6, 0), t(22, 0))
        .unwrap()
        .set(Weekday::Sun, None);
    repo.insert_venue(Venue::new(
        VenueId::new(VENUE_ID),
        "Center Court",
        UserId::new(OWNER_ID),
        HOURLY_RATE,
        hours,
    ))
    .await
    .unwrap();

    Harness {
        service,
        repo,
        clock,
        events,
    }
}

/// Book an hour-granular slot for the default requester on the fixture date.
pub async fn book(
    h: &Harness,
    requester: i64,
    start_h: u32,
    start_m: u32,
    end_h: u32,
    end_m: u32,
) -> Result<Booking, BookingError> {
    h.service
        .request_booking(
            VenueId::new(VENUE_ID),
            UserId::new(requester),
            slot(start_h, start_m, end_h, end_m),
        )
        .await
}

static ENV_LOCK: StdMutex<()> = StdMutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Panic-safe (restores variables on unwind) and serializes access to
/// process-global env vars to avoid flaky tests under parallel execution.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}
