//! Caller contexts.
//!
//! Every privileged operation receives the caller explicitly instead of
//! consulting ambient global state. Engines decide what each variant may do.

use crate::identity::{Identity, StrategyRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who is invoking an operation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Caller {
    /// An external participant (verifier, challenger, administrator).
    Account(Identity),
    /// A registered verification-strategy instance.
    Strategy(StrategyRef),
    /// The arbitration council.
    Council,
}

impl Caller {
    pub fn account(id: impl Into<String>) -> Self {
        Caller::Account(Identity::new(id))
    }

    /// The participant behind an `Account` caller.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Caller::Account(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Account(id) => write!(f, "account:{id}"),
            Caller::Strategy(s) => write!(f, "strategy:{s}"),
            Caller::Council => f.write_str("council"),
        }
    }
}
