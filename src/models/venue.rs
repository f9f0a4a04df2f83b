//! Venues and their weekly operating hours.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::interval::{Interval, IntervalError};

/// Identifier of a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VenueId(i64);

impl VenueId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for VenueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user (requester or venue owner). Always passed in
/// explicitly; the engine holds no ambient notion of "the current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single day's open/close window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursWindow(Interval);

impl HoursWindow {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Result<Self, IntervalError> {
        Ok(Self(Interval::new(open, close)?))
    }

    pub fn as_interval(&self) -> Interval {
        self.0
    }
}

/// Operating hours per weekday. `None` marks a closed day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyHours {
    // Indexed by Weekday::num_days_from_monday()
    days: [Option<HoursWindow>; 7],
}

impl WeeklyHours {
    /// Same window every day of the week.
    pub fn every_day(open: NaiveTime, close: NaiveTime) -> Result<Self, IntervalError> {
        let window = HoursWindow::new(open, close)?;
        Ok(Self {
            days: [Some(window); 7],
        })
    }

    /// All days closed; open individual days with [`WeeklyHours::set`].
    pub fn closed() -> Self {
        Self { days: [None; 7] }
    }

    pub fn set(mut self, day: Weekday, window: Option<HoursWindow>) -> Self {
        self.days[day.num_days_from_monday() as usize] = window;
        self
    }

    /// The operating window for `day`, or `None` if the venue is closed.
    pub fn window_for(&self, day: Weekday) -> Option<Interval> {
        self.days[day.num_days_from_monday() as usize].map(|w| w.as_interval())
    }
}

/// A bookable venue. Immutable as far as the engine is concerned; the hourly
/// rate is read at admission time and never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub owner: UserId,
    /// Price per hour, in the deployment's currency unit.
    pub hourly_rate: f64,
    pub hours: WeeklyHours,
}

impl Venue {
    pub fn new(
        id: VenueId,
        name: impl Into<String>,
        owner: UserId,
        hourly_rate: f64,
        hours: WeeklyHours,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            hourly_rate,
            hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_every_day_window() {
        let hours = WeeklyHours::every_day(t(6), t(22)).unwrap();
        for day in [Weekday::Mon, Weekday::Sat, Weekday::Sun] {
            let w = hours.window_for(day).unwrap();
            assert_eq!(w.start(), t(6));
            assert_eq!(w.end(), t(22));
        }
    }

    #[test]
    fn test_closed_day() {
        let hours = WeeklyHours::every_day(t(6), t(22))
            .unwrap()
            .set(Weekday::Sun, None);
        assert!(hours.window_for(Weekday::Sun).is_none());
        assert!(hours.window_for(Weekday::Mon).is_some());
    }

    #[test]
    fn test_invalid_window_rejected() {
        assert!(WeeklyHours::every_day(t(22), t(6)).is_err());
    }
}
