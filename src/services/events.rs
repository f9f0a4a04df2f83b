//! Lifecycle events emitted by the orchestrator.
//!
//! Delivery is fire-and-forget: the notification transport is an external
//! collaborator, and a sink failure must never fail the booking call.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::models::{Booking, BookingId, TimeSlot, UserId, VenueId};

/// Event raised when a booking changes state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    BookingConfirmed {
        venue_id: VenueId,
        booking_id: BookingId,
        requester: UserId,
        slot: TimeSlot,
    },
    BookingCancelled {
        venue_id: VenueId,
        booking_id: BookingId,
        requester: UserId,
        slot: TimeSlot,
    },
}

impl LifecycleEvent {
    pub fn confirmed(booking: &Booking) -> Self {
        Self::BookingConfirmed {
            venue_id: booking.venue_id(),
            booking_id: booking.id(),
            requester: booking.requester(),
            slot: *booking.slot(),
        }
    }

    pub fn cancelled(booking: &Booking) -> Self {
        Self::BookingCancelled {
            venue_id: booking.venue_id(),
            booking_id: booking.id(),
            requester: booking.requester(),
            slot: *booking.slot(),
        }
    }
}

/// Consumer of lifecycle events. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: LifecycleEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: LifecycleEvent) {}
}

/// Logs events through tracing; the server binary's default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn publish(&self, event: LifecycleEvent) {
        match &event {
            LifecycleEvent::BookingConfirmed {
                venue_id,
                booking_id,
                ..
            } => info!(%venue_id, %booking_id, "booking confirmed"),
            LifecycleEvent::BookingCancelled {
                venue_id,
                booking_id,
                ..
            } => info!(%venue_id, %booking_id, "booking cancelled"),
        }
    }
}

/// Buffers events in memory; used by tests to assert emission.
#[derive(Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }

    pub fn drain(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events.lock())
    }
}

impl EventSink for MemoryEventSink {
    fn publish(&self, event: LifecycleEvent) {
        self.events.lock().push(event);
    }
}
