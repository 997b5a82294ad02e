use thiserror::Error;
use verity_types::{CollaboratorError, ErrorClass};

#[derive(Debug, Error)]
pub enum StakingError {
    #[error("identity must be non-empty")]
    InvalidIdentity,

    #[error("verifier {0} is already registered")]
    AlreadyRegistered(String),

    #[error("verifier {0} is not registered")]
    NotRegistered(String),

    #[error("verifier {0} is not active")]
    NotActive(String),

    #[error("verifier {0} has no pending unregister request")]
    NoPendingUnregister(String),

    #[error("unregister cooldown active until {until}")]
    CooldownActive { until: u64 },

    #[error("stake of {0} is locked by votes on unresolved tasks")]
    StakeLocked(String),

    #[error("insufficient stake: needed {needed}, provided {provided}")]
    InsufficientStake { needed: u128, provided: u128 },

    #[error("insufficient reputation: needed {needed}, have {have}")]
    InsufficientReputation { needed: u64, have: u64 },

    #[error("insufficient token balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("{0} is not authorized to slash")]
    Unauthorized(String),

    #[error("arithmetic overflow in stake accounting")]
    Overflow,

    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),
}

impl StakingError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StakingError::InvalidIdentity | StakingError::NotRegistered(_) => {
                ErrorClass::Validation
            }
            StakingError::Unauthorized(_) => ErrorClass::Authorization,
            StakingError::AlreadyRegistered(_)
            | StakingError::NotActive(_)
            | StakingError::NoPendingUnregister(_)
            | StakingError::CooldownActive { .. }
            | StakingError::StakeLocked(_) => ErrorClass::Lifecycle,
            StakingError::InsufficientStake { .. }
            | StakingError::InsufficientReputation { .. }
            | StakingError::InsufficientBalance { .. } => ErrorClass::Economic,
            StakingError::Overflow => ErrorClass::Arithmetic,
            StakingError::Collaborator(e) => e.class(),
        }
    }

    /// Whether the same call can succeed later without any other action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StakingError::CooldownActive { .. } | StakingError::StakeLocked(_)
        )
    }
}
