//! Data Transfer Objects for the HTTP API.
//!
//! Dates and times travel as strings: dates as `YYYY-MM-DD`, times of day
//! as `HH:MM` (seconds tolerated on input, never emitted). Parsing happens
//! here so handlers deal only in domain types.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::models::{Booking, DailyRatingPoint, Interval, Venue};

const TIME_FMT: &str = "%H:%M";
const TIME_FMT_SECONDS: &str = "%H:%M:%S";

pub(super) fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| AppError::BadRequest(format!("invalid date '{}': {}", s, e)))
}

pub(super) fn parse_time(s: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .or_else(|_| NaiveTime::parse_from_str(s, TIME_FMT_SECONDS))
        .map_err(|e| AppError::BadRequest(format!("invalid time '{}': {}", s, e)))
}

pub(super) fn parse_weekday(s: &str) -> Result<Weekday, AppError> {
    s.parse::<Weekday>()
        .map_err(|_| AppError::BadRequest(format!("invalid weekday '{}'", s)))
}

fn fmt_time(t: NaiveTime) -> String {
    t.format(TIME_FMT).to_string()
}

fn fmt_datetime(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
}

/// Request body for registering a venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVenueRequest {
    pub id: i64,
    pub name: String,
    /// User id of the venue owner
    pub owner: i64,
    /// Price per hour
    pub hourly_rate: f64,
    /// Daily opening time, `HH:MM`
    pub open: String,
    /// Daily closing time, `HH:MM`
    pub close: String,
    /// Weekday names the venue stays closed, e.g. `["sunday"]`
    #[serde(default)]
    pub closed_days: Vec<String>,
}

/// A venue as rendered to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueDto {
    pub id: i64,
    pub name: String,
    pub owner: i64,
    pub hourly_rate: f64,
    /// One entry per open weekday
    pub hours: Vec<DayHoursDto>,
}

/// Operating window for a single weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayHoursDto {
    pub day: String,
    pub open: String,
    pub close: String,
}

impl From<Venue> for VenueDto {
    fn from(venue: Venue) -> Self {
        let hours = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter_map(|day| {
            venue.hours.window_for(day).map(|w| DayHoursDto {
                day: format!("{:?}", day).to_lowercase(),
                open: fmt_time(w.start()),
                close: fmt_time(w.end()),
            })
        })
        .collect();

        Self {
            id: venue.id.value(),
            name: venue.name,
            owner: venue.owner.value(),
            hourly_rate: venue.hourly_rate,
            hours,
        }
    }
}

/// Response for venue listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueListResponse {
    pub venues: Vec<VenueDto>,
    pub total: usize,
}

/// Query parameters for the availability endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    /// Date to inspect, `YYYY-MM-DD`
    pub date: String,
}

/// A free time range within the operating window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalDto {
    pub start: String,
    pub end: String,
}

impl From<Interval> for IntervalDto {
    fn from(interval: Interval) -> Self {
        Self {
            start: fmt_time(interval.start()),
            end: fmt_time(interval.end()),
        }
    }
}

/// Response for the availability endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub venue_id: i64,
    pub date: String,
    pub free: Vec<IntervalDto>,
}

/// Request body for admitting a new booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub venue_id: i64,
    /// User id of the requester
    pub requester: i64,
    /// Slot date, `YYYY-MM-DD`
    pub date: String,
    /// Slot start, `HH:MM`
    pub start: String,
    /// Slot end (exclusive), `HH:MM`
    pub end: String,
}

/// A booking as rendered to clients. `status` reflects the derived status
/// at response time, so a finished confirmed slot reads as `completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDto {
    pub id: String,
    pub venue_id: i64,
    pub requester: i64,
    pub date: String,
    pub start: String,
    pub end: String,
    pub status: String,
    pub total_amount: f64,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<RatingDto>,
}

/// A recorded rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingDto {
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub submitted_at: String,
}

impl From<Booking> for BookingDto {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id().to_string(),
            venue_id: booking.venue_id().value(),
            requester: booking.requester().value(),
            date: booking.slot().date().format("%Y-%m-%d").to_string(),
            start: fmt_time(booking.slot().interval().start()),
            end: fmt_time(booking.slot().interval().end()),
            status: booking.status().to_string(),
            total_amount: booking.total_amount(),
            created_at: fmt_datetime(booking.created_at()),
            cancelled_at: booking.cancelled_at().map(fmt_datetime),
            rating: booking.rating().map(|r| RatingDto {
                score: r.score,
                comment: r.comment.clone(),
                submitted_at: fmt_datetime(r.submitted_at),
            }),
        }
    }
}

/// Response for booking listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingDto>,
    pub total: usize,
}

/// Query parameters for booking listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingsQuery {
    /// Filter by requester user id
    pub requester: i64,
}

/// Request body for cancelling a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    /// User id of whoever is cancelling (requester or venue owner)
    pub actor: i64,
}

/// Request body for rating a completed booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateBookingRequest {
    /// Score in 1..=5
    pub score: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Query parameters for the rating trend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RatingTrendQuery {
    /// End of the 7-day window, `YYYY-MM-DD`. Defaults to today.
    #[serde(default)]
    pub date: Option<String>,
}

/// Response for the 7-day rating trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingTrendResponse {
    pub venue_id: i64,
    pub series: Vec<DailyRatingPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_accepts_minutes_and_seconds() {
        assert_eq!(
            parse_time("17:30").unwrap(),
            NaiveTime::from_hms_opt(17, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time("17:30:00").unwrap(),
            NaiveTime::from_hms_opt(17, 30, 0).unwrap()
        );
        assert!(parse_time("5pm").is_err());
    }

    #[test]
    fn test_parse_weekday_accepts_names() {
        assert_eq!(parse_weekday("sunday").unwrap(), Weekday::Sun);
        assert_eq!(parse_weekday("Mon").unwrap(), Weekday::Mon);
        assert!(parse_weekday("noday").is_err());
    }

    #[test]
    fn test_interval_dto_formats_without_seconds() {
        let interval = Interval::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        )
        .unwrap();
        let dto = IntervalDto::from(interval);
        assert_eq!(dto.start, "09:00");
        assert_eq!(dto.end, "10:30");
    }
}
