//! # Courtside
//!
//! Booking and availability engine for sports venues.
//!
//! The engine owns the parts of a venue-booking product with real
//! correctness obligations: computing which time ranges are still free,
//! atomically admitting or rejecting reservation requests under
//! concurrency, driving each booking through its lifecycle, and folding
//! ratings into a rolling daily trend. Page rendering, authentication,
//! payments, and notification delivery are external collaborators that
//! call into this crate and render its results.
//!
//! ## Architecture
//!
//! - [`models`]: interval arithmetic, slots, venues, bookings, ratings
//! - [`db`]: the reservation store (repository traits + in-memory backend)
//! - [`services`]: admission control, availability, rating aggregation
//! - [`http`]: Axum REST layer over the service calls
//!
//! The one invariant everything here defends: for a fixed venue, no two
//! bookings with an active status may overlap on the same date. The
//! advisory availability pre-check can go stale; the store's atomic
//! `try_commit` cannot.

pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
