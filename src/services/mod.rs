//! Business logic: admission control, availability, ratings, lifecycle.
//!
//! The [`booking::BookingService`] is the entry point the surrounding
//! API layer calls into; [`availability`] and [`ratings`] expose the two
//! derived read paths.

pub mod availability;
pub mod booking;
pub mod clock;
pub mod error;
pub mod events;
pub mod ratings;

pub use availability::{free_intervals, is_free};
pub use booking::BookingService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::BookingError;
pub use events::{EventSink, LifecycleEvent, LogEventSink, MemoryEventSink, NullEventSink};
pub use ratings::{last_7_days, venue_average, RATING_WINDOW_DAYS};
