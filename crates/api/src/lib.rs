//! Enrollment wizard API server library.
//!
//! Exposes config, state, error handling, the router, and routes so
//! integration tests and the binary entrypoint can both access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod sessions;
pub mod state;
