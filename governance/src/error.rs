use thiserror::Error;
use verity_types::ErrorClass;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("{caller} lacks capability {capability}")]
    Unauthorized { caller: String, capability: String },

    #[error("system is paused")]
    Paused,

    #[error("cannot remove the last administrator")]
    LastAdmin,

    #[error("identity must be non-empty")]
    InvalidIdentity,

    #[error("methodology {0} not found")]
    UnknownMethodology(String),

    #[error("methodology {0} already exists")]
    MethodologyExists(String),

    #[error("strategy {0} is not registered")]
    UnknownStrategy(String),

    #[error("strategy {0} is already registered")]
    StrategyExists(String),

    #[error("methodology {id} is {status}, expected {expected}")]
    WrongStatus {
        id: String,
        status: String,
        expected: String,
    },

    #[error("methodology {0} cannot be approved by its proposer")]
    SelfApproval(String),

    #[error("invalid value {value} for {param}: {reason}")]
    InvalidParameter {
        param: String,
        value: u128,
        reason: String,
    },
}

impl GovernanceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            GovernanceError::Unauthorized { .. } | GovernanceError::SelfApproval(_) => {
                ErrorClass::Authorization
            }
            GovernanceError::Paused => ErrorClass::Paused,
            GovernanceError::InvalidIdentity
            | GovernanceError::UnknownMethodology(_)
            | GovernanceError::UnknownStrategy(_)
            | GovernanceError::InvalidParameter { .. } => ErrorClass::Validation,
            GovernanceError::LastAdmin
            | GovernanceError::MethodologyExists(_)
            | GovernanceError::StrategyExists(_)
            | GovernanceError::WrongStatus { .. } => ErrorClass::Lifecycle,
        }
    }

    /// Only a pause lifts on its own (once an administrator unpauses).
    pub fn is_retryable(&self) -> bool {
        matches!(self, GovernanceError::Paused)
    }
}
