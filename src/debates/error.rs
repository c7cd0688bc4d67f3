use crate::store::{types::Side, StoreError, UniqueKey};

/// Failures of debate operations. All are final; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum DebateError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("You already joined this debate in {0} side.")]
    AlreadyJoined(Side),
    #[error("Already voted.")]
    AlreadyVoted,
    #[error("Debate is closed.")]
    DebateClosed,
    #[error("Inappropriate word detected: \"{0}\"")]
    ContentRejected(String),
    #[error("Edit argument time has expired (5 minutes).")]
    EditWindowExpired,
    #[error("You are not authorized to edit this argument.")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for DebateError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(UniqueKey::VotePerArgument) => DebateError::AlreadyVoted,
            StoreError::Conflict(key) => {
                DebateError::Internal(anyhow::anyhow!("unexpected unique violation on {key:?}"))
            }
            StoreError::Backend(e) => DebateError::Internal(e),
        }
    }
}
