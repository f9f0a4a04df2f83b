//! Reservation store: repository traits, error types, and backends.
//!
//! The store owns all bookings. Its contract, not the service layer's
//! pre-checks, is what guarantees the engine's core invariant: for a fixed
//! venue, no two active bookings may overlap on the same date. See the
//! trait docs in [`repository`] for the atomicity requirements.
//!
//! # Layout
//! - [`repository`]: trait definitions and error types
//! - [`repositories::local`]: in-memory implementation (the authoritative
//!   backend for this engine, also used by every test)
//! - [`factory`]: backend selection and construction

pub mod factory;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
pub use repository::{
    BookingRepository, ErrorContext, FullRepository, RatingRepository, RepositoryError,
    RepositoryResult, VenueRepository,
};
