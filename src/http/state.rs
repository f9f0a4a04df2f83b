//! Application state for the HTTP server.

use std::sync::Arc;

use crate::services::BookingService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The booking engine's call surface
    pub service: Arc<BookingService>,
}

impl AppState {
    pub fn new(service: Arc<BookingService>) -> Self {
        Self { service }
    }
}
