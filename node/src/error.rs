use thiserror::Error;
use verity_arbitration::ArbitrationError;
use verity_coordinator::CoordinatorError;
use verity_governance::GovernanceError;
use verity_randomness::RandomnessError;
use verity_staking::StakingError;
use verity_types::{CollaboratorError, ErrorClass};
use verity_verification::VerificationError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("staking error: {0}")]
    Staking(#[from] StakingError),

    #[error("governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("arbitration error: {0}")]
    Arbitration(#[from] ArbitrationError),

    #[error("coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    #[error("randomness error: {0}")]
    Randomness(#[from] RandomnessError),

    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("system is paused")]
    Paused,

    #[error("no strategy instance registered as {0}")]
    UnknownStrategy(String),

    #[error("task {0} not found")]
    UnknownTask(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            NodeError::Staking(e) => e.class(),
            NodeError::Governance(e) => e.class(),
            NodeError::Verification(e) => e.class(),
            NodeError::Arbitration(e) => e.class(),
            NodeError::Coordinator(e) => e.class(),
            NodeError::Randomness(e) => e.class(),
            NodeError::Collaborator(e) => e.class(),
            NodeError::Paused => ErrorClass::Paused,
            NodeError::UnknownStrategy(_)
            | NodeError::UnknownTask(_)
            | NodeError::Config(_)
            | NodeError::Snapshot(_) => ErrorClass::Validation,
            NodeError::Io(_) => ErrorClass::Collaborator,
        }
    }

    /// Whether the same call can succeed later: a window still open, a
    /// cooldown still running, or the system paused.
    pub fn is_retryable(&self) -> bool {
        match self {
            NodeError::Staking(e) => e.is_retryable(),
            NodeError::Governance(e) => e.is_retryable(),
            NodeError::Verification(e) => e.is_retryable(),
            NodeError::Arbitration(e) => e.is_retryable(),
            NodeError::Coordinator(e) => e.is_retryable(),
            NodeError::Paused => true,
            _ => false,
        }
    }
}
