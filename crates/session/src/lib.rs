//! Session-scoped key/value store carrying wizard state between stages.
//!
//! - [`SessionStore`]: the raw string-keyed store interface.
//! - [`MemorySessionStore`]: the in-process implementation.
//! - [`SessionData`]: typed, JSON-encoded accessors for each wizard key.
//! - [`keys`]: key names and the upstream student profile record.

pub mod data;
pub mod keys;
pub mod store;

pub use data::SessionData;
pub use keys::StudentProfile;
pub use store::{MemorySessionStore, SessionStore, StoreError};
