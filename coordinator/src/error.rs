use thiserror::Error;
use verity_governance::GovernanceError;
use verity_types::{CollaboratorError, ErrorClass};
use verity_verification::VerificationError;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("project {0} is not active")]
    ProjectNotActive(String),

    #[error("project {0} has no owner")]
    NoProjectOwner(String),

    #[error("requested amount must be positive")]
    ZeroAmount,

    #[error("claim {0} already has a task in flight")]
    ClaimInFlight(String),

    #[error("claim {0} is already fulfilled")]
    AlreadyFulfilled(String),

    #[error("methodology {0} is not routed")]
    MethodologyNotRouted(String),

    #[error("{0} is not the routed strategy for this claim")]
    Unauthorized(String),

    #[error("no claim matches {0}")]
    UnknownClaim(String),

    #[error("arithmetic overflow computing issuance")]
    Overflow,

    #[error("strategy error: {0}")]
    Strategy(#[from] VerificationError),

    #[error("governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),
}

impl CoordinatorError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CoordinatorError::ProjectNotActive(_)
            | CoordinatorError::NoProjectOwner(_)
            | CoordinatorError::ZeroAmount
            | CoordinatorError::UnknownClaim(_) => ErrorClass::Validation,
            CoordinatorError::Unauthorized(_) => ErrorClass::Authorization,
            CoordinatorError::ClaimInFlight(_)
            | CoordinatorError::AlreadyFulfilled(_)
            | CoordinatorError::MethodologyNotRouted(_) => ErrorClass::Lifecycle,
            CoordinatorError::Overflow => ErrorClass::Arithmetic,
            CoordinatorError::Strategy(e) => e.class(),
            CoordinatorError::Governance(e) => e.class(),
            CoordinatorError::Collaborator(e) => e.class(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            CoordinatorError::Strategy(e) => e.is_retryable(),
            CoordinatorError::Governance(e) => e.is_retryable(),
            _ => false,
        }
    }
}
