//! Free-interval computation for a venue and date.
//!
//! Advisory by design: results may be stale the moment they are returned.
//! The authoritative overlap check lives inside the store's `try_commit`.

use chrono::{Datelike, NaiveDate};

use crate::db::repository::{BookingRepository, FullRepository, VenueRepository};
use crate::models::{Interval, TimeSlot, VenueId};

use super::error::BookingError;

/// Free sub-intervals of the venue's operating window on `date`, sorted and
/// non-overlapping. A closed day yields an empty list.
pub async fn free_intervals(
    repo: &dyn FullRepository,
    venue_id: VenueId,
    date: NaiveDate,
) -> Result<Vec<Interval>, BookingError> {
    let venue = repo
        .get_venue(venue_id)
        .await
        .map_err(|e| BookingError::from_lookup(e, "venue"))?;

    let Some(window) = venue.hours.window_for(date.weekday()) else {
        return Ok(Vec::new());
    };

    let active = repo.list_active(venue_id, date).await?;
    let busy: Vec<Interval> = active.iter().map(|b| *b.slot().interval()).collect();
    Ok(Interval::subtract(window, &busy))
}

/// Whether `slot` currently fits inside one free interval.
pub async fn is_free(
    repo: &dyn FullRepository,
    venue_id: VenueId,
    slot: &TimeSlot,
) -> Result<bool, BookingError> {
    let free = free_intervals(repo, venue_id, slot.date()).await?;
    Ok(free.iter().any(|iv| iv.contains(slot.interval())))
}
