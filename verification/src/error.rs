use thiserror::Error;
use verity_types::{Ballot, ErrorClass};

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("task {0} not found")]
    UnknownTask(String),

    #[error("{0} is not an active registered verifier")]
    NotActiveVerifier(String),

    #[error("voting on task {0} is closed")]
    VotingClosed(String),

    #[error("verifier {0} has already voted")]
    AlreadyVoted(String),

    #[error("ballot {0:?} scores outside [0, 100]")]
    InvalidScore(Ballot),

    #[error("voting window open until {until}")]
    VotingWindowOpen { until: u64 },

    #[error("task {0} already has a proposed resolution")]
    AlreadyProposed(String),

    #[error("no voting weight recorded")]
    ZeroTotalWeight,

    #[error("challenge window open until {until}")]
    ChallengeWindowOpen { until: u64 },

    #[error("task {0} is under challenge")]
    ChallengeExists(String),

    #[error("task {0} is already finalized")]
    AlreadyFinalized(String),

    #[error("task {0} is not provisional")]
    NotProvisional(String),

    #[error("challenge window for task {0} has closed")]
    ChallengeWindowClosed(String),

    #[error("task {0} is not challenged")]
    NotChallenged(String),

    #[error("{0} may not report arbitration results")]
    Unauthorized(String),

    #[error("invalid claim request: {0}")]
    InvalidRequest(String),

    #[error("arithmetic overflow in tally")]
    Overflow,
}

impl VerificationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            VerificationError::UnknownTask(_)
            | VerificationError::InvalidScore(_)
            | VerificationError::InvalidRequest(_) => ErrorClass::Validation,
            VerificationError::NotActiveVerifier(_) | VerificationError::Unauthorized(_) => {
                ErrorClass::Authorization
            }
            VerificationError::ZeroTotalWeight | VerificationError::Overflow => {
                ErrorClass::Arithmetic
            }
            _ => ErrorClass::Lifecycle,
        }
    }

    /// True while a window is still open: the same call succeeds later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VerificationError::VotingWindowOpen { .. } | VerificationError::ChallengeWindowOpen { .. }
        )
    }
}
