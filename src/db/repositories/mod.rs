//! Repository implementations.
//!
//! Currently a single backend: `local`, the in-memory store. The factory
//! keeps the seam open for a database-backed implementation.

pub mod local;

pub use local::LocalRepository;
