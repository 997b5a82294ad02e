//! Per-verifier stake record.

use serde::{Deserialize, Serialize};
use verity_types::{Identity, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierAccount {
    pub identity: Identity,
    /// Collateral currently held in custody for this verifier.
    pub staked: u128,
    /// Whether the verifier may vote and be drawn for a jury.
    pub active: bool,
    pub registered_at: Timestamp,
    /// Set by an unregister request; funds are releasable from this time.
    pub unregister_after: Option<Timestamp>,
}

impl VerifierAccount {
    /// Whether this account still counts as registered: it holds stake or
    /// is waiting out an unregister cooldown.
    pub fn is_registered(&self) -> bool {
        self.active || self.staked > 0 || self.unregister_after.is_some()
    }

    /// Active and holding at least `min_stake`.
    pub fn is_eligible(&self, min_stake: u128) -> bool {
        self.active && self.staked >= min_stake && self.staked > 0
    }
}
