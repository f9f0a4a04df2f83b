//! A time slot: an interval bound to a calendar date.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::interval::{Interval, IntervalError};

/// A half-open `[start, end)` slot on a specific calendar date, expressed in
/// the venue's local time at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    date: NaiveDate,
    interval: Interval,
}

impl TimeSlot {
    /// Create a slot for `date` from `start` to `end`.
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, IntervalError> {
        Ok(Self {
            date,
            interval: Interval::new(start, end)?,
        })
    }

    pub fn from_interval(date: NaiveDate, interval: Interval) -> Self {
        Self { date, interval }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Absolute start of the slot on the venue's local clock.
    pub fn start_at(&self) -> NaiveDateTime {
        self.date.and_time(self.interval.start())
    }

    /// Absolute end of the slot on the venue's local clock.
    pub fn end_at(&self) -> NaiveDateTime {
        self.date.and_time(self.interval.end())
    }

    /// True iff the slot has not started yet at `now`.
    pub fn starts_after(&self, now: NaiveDateTime) -> bool {
        self.start_at() > now
    }

    /// True iff the slot's end has passed at `now`.
    pub fn has_ended(&self, now: NaiveDateTime) -> bool {
        now >= self.end_at()
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date, self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> TimeSlot {
        TimeSlot::new(
            NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_degenerate() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
        let t = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        assert!(TimeSlot::new(date, t, t).is_err());
    }

    #[test]
    fn test_starts_after() {
        let s = slot();
        let before = s.date().and_hms_opt(16, 0, 0).unwrap();
        let at_start = s.date().and_hms_opt(17, 0, 0).unwrap();
        assert!(s.starts_after(before));
        assert!(!s.starts_after(at_start));
    }

    #[test]
    fn test_has_ended() {
        let s = slot();
        let during = s.date().and_hms_opt(17, 30, 0).unwrap();
        let at_end = s.date().and_hms_opt(18, 0, 0).unwrap();
        assert!(!s.has_ended(during));
        assert!(s.has_ended(at_end));
    }

    #[test]
    fn test_display() {
        assert_eq!(slot().to_string(), "2025-08-15 17:00-18:00");
    }
}
