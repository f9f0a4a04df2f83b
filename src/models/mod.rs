//! Core value types for the booking engine.
//!
//! Everything in this module is a plain value: intervals and slots are
//! immutable once constructed, and booking state only changes through the
//! repository's atomic operations.

pub mod booking;
pub mod interval;
pub mod slot;
pub mod venue;

pub use booking::{Booking, BookingId, BookingStatus, DailyRatingPoint, RatingEvent};
pub use interval::{Interval, IntervalError};
pub use slot::TimeSlot;
pub use venue::{HoursWindow, UserId, Venue, VenueId, WeeklyHours};
