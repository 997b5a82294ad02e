use thiserror::Error;
use verity_types::ErrorClass;

#[derive(Debug, Error)]
pub enum RandomnessError {
    #[error("failed to fetch drand beacon: {0}")]
    DrandFetch(String),

    #[error("beacon failed verification: {0}")]
    BeaconVerification(String),

    #[error("invalid beacon encoding: {0}")]
    InvalidBeacon(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("number of requested words must be non-zero")]
    ZeroWords,

    #[error("provider not available: {0}")]
    Unavailable(String),
}

impl RandomnessError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RandomnessError::ZeroWords => ErrorClass::Validation,
            _ => ErrorClass::Collaborator,
        }
    }
}
