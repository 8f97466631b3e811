//! Domain types and pure policy for the student enrollment wizard.
//!
//! Everything in this crate is free of I/O: program and subject records,
//! the per-program subject limit, billing durations and their price table,
//! selection maps, the enrollment phase machine, stage routes, and payment
//! amounts. The session, catalog, and HTTP layers build on these types.

pub mod billing;
pub mod error;
pub mod payment;
pub mod phase;
pub mod program;
pub mod selection;
pub mod stage;
pub mod types;
