//! Half-open time intervals at minute resolution.
//!
//! An [`Interval`] is `[start, end)` on a venue's local clock. Two bookings
//! that merely touch (one ends exactly when the other starts) do not overlap.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Error returned when an interval cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    /// `start >= end`; intervals are never silently clamped.
    #[error("invalid interval: start {start} is not before end {end}")]
    Degenerate { start: NaiveTime, end: NaiveTime },
    /// Timestamps must be aligned to whole minutes.
    #[error("invalid interval: {0} is not aligned to a whole minute")]
    SubMinute(NaiveTime),
}

/// Half-open interval `[start, end)` with minute granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    start: NaiveTime,
    end: NaiveTime,
}

impl Interval {
    /// Create a new interval. Rejects `start >= end` and sub-minute times.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, IntervalError> {
        for t in [start, end] {
            if t.second() != 0 || t.nanosecond() != 0 {
                return Err(IntervalError::SubMinute(t));
            }
        }
        if start >= end {
            return Err(IntervalError::Degenerate { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Length of the interval in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// True iff the two intervals share at least one instant.
    ///
    /// Half-open comparison: `a.start < b.end && b.start < a.end`.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True iff `inner` lies entirely within `self`.
    pub fn contains(&self, inner: &Interval) -> bool {
        self.start <= inner.start && inner.end <= self.end
    }

    /// Remove all `busy` intervals from `window`, returning the free
    /// remainder as a sorted, non-overlapping list.
    pub fn subtract(window: Interval, busy: &[Interval]) -> Vec<Interval> {
        let mut occupied: Vec<Interval> = busy
            .iter()
            .filter(|b| b.overlaps(&window))
            .copied()
            .collect();
        occupied.sort_by_key(|i| i.start);

        let mut free = Vec::new();
        let mut cursor = window.start;
        for b in occupied {
            if b.start > cursor {
                // cursor < b.start <= window.end, so the literal is valid
                free.push(Interval {
                    start: cursor,
                    end: b.start.min(window.end),
                });
            }
            cursor = cursor.max(b.end);
            if cursor >= window.end {
                return free;
            }
        }
        if cursor < window.end {
            free.push(Interval {
                start: cursor,
                end: window.end,
            });
        }
        free
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}
