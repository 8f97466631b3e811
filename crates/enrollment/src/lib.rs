//! The enrollment wizard: subject selection, duration selection, payment.
//!
//! Each stage guards its entry with a [`StageEntry`]: either the upstream
//! session data it needs is present and the stage is ready, or the caller
//! is redirected to the earliest stage whose data is missing. Stages only
//! talk to each other through the session store.
//!
//! [`EnrollmentSession`] owns one active stage at a time and tracks the
//! session's [`EnrollmentPhase`](tc_core::phase::EnrollmentPhase).

pub mod config;
pub mod context;
pub mod duration;
pub mod entry;
pub mod error;
pub mod navigator;
pub mod payment;
pub mod session;
pub mod subject;

pub use config::EnrollmentConfig;
pub use context::StageContext;
pub use entry::{ConfirmOutcome, StageEntry};
pub use error::FlowError;
pub use navigator::{Navigator, RecordingNavigator};
pub use payment::SuccessOutcome;
pub use session::{EnrollmentSession, SessionDeps, StageView};
