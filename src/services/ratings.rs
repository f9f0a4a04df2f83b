//! Rating aggregation over a trailing daily window.

use chrono::{Duration, NaiveDate};

use crate::db::repository::{FullRepository, RatingRepository, VenueRepository};
use crate::models::{DailyRatingPoint, VenueId};

use super::error::BookingError;

/// Length of the rolling trend window, in days.
pub const RATING_WINDOW_DAYS: i64 = 7;

/// Daily average ratings for `today-6 ..= today`, in chronological order.
///
/// Each day gets a bucket even when empty (average 0.0, count 0), so the
/// caller can render a fixed-width trend. Pure fold over the stored rating
/// events; nothing is cached or persisted.
pub async fn last_7_days(
    repo: &dyn FullRepository,
    venue_id: VenueId,
    today: NaiveDate,
) -> Result<Vec<DailyRatingPoint>, BookingError> {
    // Venue must exist; an unknown venue is an error, not an empty series.
    repo.get_venue(venue_id)
        .await
        .map_err(|e| BookingError::from_lookup(e, "venue"))?;

    let from = today - Duration::days(RATING_WINDOW_DAYS - 1);
    let ratings = repo.ratings_in_range(venue_id, from, today).await?;

    let mut sums = [0u32; RATING_WINDOW_DAYS as usize];
    let mut counts = [0usize; RATING_WINDOW_DAYS as usize];
    for r in &ratings {
        let offset = (r.date - from).num_days();
        if (0..RATING_WINDOW_DAYS).contains(&offset) {
            sums[offset as usize] += u32::from(r.score);
            counts[offset as usize] += 1;
        }
    }

    Ok((0..RATING_WINDOW_DAYS)
        .map(|i| {
            let date = from + Duration::days(i);
            let count = counts[i as usize];
            let avg_rating = if count == 0 {
                0.0
            } else {
                f64::from(sums[i as usize]) / count as f64
            };
            DailyRatingPoint {
                date,
                day_name: date.format("%A").to_string(),
                avg_rating,
                count,
            }
        })
        .collect())
}

/// Venue-wide mean rating across all recorded events, rounded to one
/// decimal. `None` when the venue has never been rated.
pub async fn venue_average(
    repo: &dyn FullRepository,
    venue_id: VenueId,
) -> Result<Option<f64>, BookingError> {
    repo.get_venue(venue_id)
        .await
        .map_err(|e| BookingError::from_lookup(e, "venue"))?;

    let ratings = repo.ratings_for_venue(venue_id).await?;
    if ratings.is_empty() {
        return Ok(None);
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(r.score)).sum();
    let mean = f64::from(sum) / ratings.len() as f64;
    Ok(Some((mean * 10.0).round() / 10.0))
}
