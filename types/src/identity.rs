//! String-backed identifiers: participants, projects, claims, methodologies
//! and strategy implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Identifiers must be non-empty to be accepted by any engine.
            pub fn is_valid(&self) -> bool {
                !self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// A participant: verifier, challenger, juror, administrator, or a
    /// custody account such as the treasury.
    Identity
);

string_id!(
    /// A project in the external project catalog. Doubles as the credit unit
    /// id handed to the issuer.
    ProjectId
);

string_id!(
    /// Caller-chosen claim identifier, unique per methodology.
    ClaimId
);

string_id!(
    /// An entry in the methodology catalog.
    MethodologyId
);

string_id!(
    /// Names a registered verification-strategy instance.
    StrategyRef
);
