use thiserror::Error;
use verity_randomness::RandomnessError;
use verity_types::{Ballot, CollaboratorError, ErrorClass};

#[derive(Debug, Error)]
pub enum ArbitrationError {
    #[error("task {0} already has a dispute")]
    DisputeExists(String),

    #[error("no dispute for task {0}")]
    UnknownDispute(String),

    #[error("challenge stake not covered: need {needed}, have {available}")]
    InsufficientChallengeStake { needed: u128, available: u128 },

    #[error("randomness request {0} is not pending")]
    UnknownRequest(String),

    #[error("randomness callback delivered no words")]
    EmptyRandomness,

    #[error("not enough eligible jurors: need {needed}, have {available}")]
    InsufficientJurors { needed: usize, available: usize },

    #[error("jury for task {0} has not been selected")]
    JuryNotSelected(String),

    #[error("jury for task {0} is already seated")]
    JuryAlreadySelected(String),

    #[error("{0} is not a juror on this dispute")]
    NotJuror(String),

    #[error("juror {0} has already voted")]
    AlreadyVoted(String),

    #[error("ballot {0:?} scores outside [0, 100]")]
    InvalidScore(Ballot),

    #[error("jury voting for task {0} has closed")]
    JuryVotingClosed(String),

    #[error("jury voting open until {until}")]
    JuryVotingOpen { until: u64 },

    #[error("dispute for task {0} is already resolved")]
    AlreadyResolved(String),

    #[error("dispute for task {0} is not resolved yet")]
    NotResolved(String),

    #[error("treasury cannot cover reward: need {needed}, have {available}")]
    InsufficientTreasury { needed: u128, available: u128 },

    #[error("arithmetic overflow in settlement")]
    Overflow,

    #[error("randomness error: {0}")]
    Randomness(#[from] RandomnessError),

    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),
}

impl ArbitrationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ArbitrationError::UnknownDispute(_)
            | ArbitrationError::UnknownRequest(_)
            | ArbitrationError::EmptyRandomness
            | ArbitrationError::InvalidScore(_) => ErrorClass::Validation,
            ArbitrationError::NotJuror(_) => ErrorClass::Authorization,
            ArbitrationError::InsufficientChallengeStake { .. }
            | ArbitrationError::InsufficientJurors { .. }
            | ArbitrationError::InsufficientTreasury { .. } => ErrorClass::Economic,
            ArbitrationError::Overflow => ErrorClass::Arithmetic,
            ArbitrationError::Randomness(e) => e.class(),
            ArbitrationError::Collaborator(e) => e.class(),
            _ => ErrorClass::Lifecycle,
        }
    }

    /// True while the jury window is still open.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ArbitrationError::JuryVotingOpen { .. })
    }
}
