use tc_core::error::CoreError;
use tc_core::stage::Stage;
use tc_session::StoreError;

/// Errors raised while driving the wizard.
///
/// Missing upstream data and incomplete selections are not errors; they
/// surface as [`StageEntry::Redirect`](crate::StageEntry::Redirect) and
/// [`ConfirmOutcome::Invalid`](crate::ConfirmOutcome::Invalid).
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// An operation was sent to a stage that is not the active one.
    #[error("The {} stage is not active", .expected.label())]
    StageNotActive { expected: Stage },
}
