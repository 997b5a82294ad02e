//! External collaborators consumed by the ledger.

use verity_types::{CollaboratorError, Identity};

/// Fungible token in which stakes, challenge bonds and rewards are paid.
pub trait StakeToken: Send {
    fn balance_of(&self, who: &Identity) -> u128;

    /// Move `amount` from `from` to `to`. Must not partially apply.
    fn transfer(
        &mut self,
        from: &Identity,
        to: &Identity,
        amount: u128,
    ) -> Result<(), CollaboratorError>;
}

/// External reputation scores. Scores double as vote weights.
pub trait ReputationRegistry: Send {
    fn get(&self, who: &Identity) -> u64;

    fn add(&mut self, who: &Identity, amount: u64) -> Result<(), CollaboratorError>;

    /// Reduce a score, saturating at zero.
    fn subtract(&mut self, who: &Identity, amount: u64) -> Result<(), CollaboratorError>;
}
