//! Failure classification shared by every engine.
//!
//! Each crate keeps its own `thiserror` enum; every variant maps onto one of
//! these classes so callers can tell "try again later" from "never valid"
//! from "already done" without matching on crate-specific variants.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Malformed or inconsistent input: inactive project, zero amounts,
    /// unknown claim.
    Validation,
    /// The caller lacks the role, registration or juror seat required.
    Authorization,
    /// The target is in the wrong state or the wrong window.
    Lifecycle,
    /// Not enough stake, reputation or balance.
    Economic,
    /// Division by zero weight or overflow.
    Arithmetic,
    /// An external collaborator refused the call.
    Collaborator,
    /// The system is paused.
    Paused,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorClass::Validation => "validation",
            ErrorClass::Authorization => "authorization",
            ErrorClass::Lifecycle => "lifecycle",
            ErrorClass::Economic => "economic",
            ErrorClass::Arithmetic => "arithmetic",
            ErrorClass::Collaborator => "collaborator",
            ErrorClass::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Failure reported by an external collaborator (token, reputation
/// registry, issuer, project catalog).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{service} rejected the call: {reason}")]
    Rejected { service: String, reason: String },

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("{0} is unavailable")]
    Unavailable(String),
}

impl CollaboratorError {
    pub fn rejected(service: &str, reason: impl Into<String>) -> Self {
        CollaboratorError::Rejected {
            service: service.to_string(),
            reason: reason.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            CollaboratorError::InsufficientBalance { .. } => ErrorClass::Economic,
            _ => ErrorClass::Collaborator,
        }
    }
}
