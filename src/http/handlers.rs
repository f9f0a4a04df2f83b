//! HTTP handlers for the REST API.
//!
//! Each handler parses its wire payload into domain types and delegates to
//! the service layer; no business rules live here.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::dto::{
    parse_date, parse_time, parse_weekday, AvailabilityQuery, AvailabilityResponse,
    BookingDto, BookingListResponse, BookingsQuery, CancelBookingRequest, CreateBookingRequest,
    CreateVenueRequest, HealthResponse, RateBookingRequest, RatingTrendQuery, RatingTrendResponse,
    VenueDto, VenueListResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::repository::{FullRepository, VenueRepository};
use crate::models::{BookingId, TimeSlot, UserId, Venue, VenueId, WeeklyHours};
use crate::services::BookingError;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verify the service is up and the reservation store responds.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let store = match state.service.repository().health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        store,
    }))
}

// =============================================================================
// Venues
// =============================================================================

/// POST /v1/venues
///
/// Register a venue with its weekly operating hours.
pub async fn create_venue(
    State(state): State<AppState>,
    Json(request): Json<CreateVenueRequest>,
) -> Result<(StatusCode, Json<VenueDto>), AppError> {
    let open = parse_time(&request.open)?;
    let close = parse_time(&request.close)?;
    let mut hours = WeeklyHours::every_day(open, close).map_err(BookingError::from)?;
    for day in &request.closed_days {
        hours = hours.set(parse_weekday(day)?, None);
    }

    let venue = Venue::new(
        VenueId::new(request.id),
        request.name,
        UserId::new(request.owner),
        request.hourly_rate,
        hours,
    );
    let stored = state
        .service
        .repository()
        .insert_venue(venue)
        .await
        .map_err(BookingError::from)?;

    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// GET /v1/venues
pub async fn list_venues(State(state): State<AppState>) -> HandlerResult<VenueListResponse> {
    let venues = state
        .service
        .repository()
        .list_venues()
        .await
        .map_err(BookingError::from)?;

    let venues: Vec<VenueDto> = venues.into_iter().map(Into::into).collect();
    let total = venues.len();
    Ok(Json(VenueListResponse { venues, total }))
}

/// GET /v1/venues/{venue_id}
pub async fn get_venue(
    State(state): State<AppState>,
    Path(venue_id): Path<i64>,
) -> HandlerResult<VenueDto> {
    let venue = state
        .service
        .repository()
        .get_venue(VenueId::new(venue_id))
        .await
        .map_err(|e| BookingError::from_lookup(e, "venue"))?;
    Ok(Json(venue.into()))
}

/// GET /v1/venues/{venue_id}/availability?date=YYYY-MM-DD
///
/// Free sub-intervals of the venue's operating window on the given date.
/// A closed day yields an empty list.
pub async fn get_availability(
    State(state): State<AppState>,
    Path(venue_id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> HandlerResult<AvailabilityResponse> {
    let date = parse_date(&query.date)?;
    let free = state
        .service
        .free_intervals(VenueId::new(venue_id), date)
        .await?;

    Ok(Json(AvailabilityResponse {
        venue_id,
        date: query.date,
        free: free.into_iter().map(Into::into).collect(),
    }))
}

/// GET /v1/venues/{venue_id}/ratings/last7
///
/// Rolling 7-day rating trend, oldest day first. `?date=` overrides the
/// window end, mainly for testing and backfills.
pub async fn get_rating_trend(
    State(state): State<AppState>,
    Path(venue_id): Path<i64>,
    Query(query): Query<RatingTrendQuery>,
) -> HandlerResult<RatingTrendResponse> {
    let today = match query.date {
        Some(ref s) => parse_date(s)?,
        None => state.service.now().date(),
    };
    let series = state.service.last_7_days(VenueId::new(venue_id), today).await?;

    Ok(Json(RatingTrendResponse { venue_id, series }))
}

// =============================================================================
// Bookings
// =============================================================================

/// POST /v1/bookings
///
/// Admit a new booking. On success the booking comes back `confirmed`;
/// an overlap with an active booking yields 409 with the conflicting id.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingDto>), AppError> {
    let date = parse_date(&request.date)?;
    let start = parse_time(&request.start)?;
    let end = parse_time(&request.end)?;
    let slot = TimeSlot::new(date, start, end).map_err(BookingError::from)?;

    let booking = state
        .service
        .request_booking(
            VenueId::new(request.venue_id),
            UserId::new(request.requester),
            slot,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// GET /v1/bookings?requester=ID
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingsQuery>,
) -> HandlerResult<BookingListResponse> {
    let bookings = state
        .service
        .bookings_for_requester(UserId::new(query.requester))
        .await?;

    let bookings: Vec<BookingDto> = bookings.into_iter().map(Into::into).collect();
    let total = bookings.len();
    Ok(Json(BookingListResponse { bookings, total }))
}

/// GET /v1/bookings/{booking_id}
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> HandlerResult<BookingDto> {
    let booking = state.service.get_booking(BookingId::from(booking_id)).await?;
    Ok(Json(booking.into()))
}

/// POST /v1/bookings/{booking_id}/cancel
///
/// Cancel before the slot starts. The acting user must be the requester or
/// the venue owner.
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CancelBookingRequest>,
) -> HandlerResult<BookingDto> {
    let booking = state
        .service
        .cancel_booking(BookingId::from(booking_id), UserId::new(request.actor))
        .await?;
    Ok(Json(booking.into()))
}

/// POST /v1/bookings/{booking_id}/rating
///
/// Record the one allowed rating for a completed booking.
pub async fn rate_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<RateBookingRequest>,
) -> HandlerResult<BookingDto> {
    let booking = state
        .service
        .submit_rating(BookingId::from(booking_id), request.score, request.comment)
        .await?;
    Ok(Json(booking.into()))
}
