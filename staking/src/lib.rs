//! Stake & Reputation Ledger.
//!
//! Tracks each verifier's staked collateral and eligibility. Stake is held
//! by a custody account on the external token; reputation lives in an
//! external registry and is only read (for eligibility and vote weights) or
//! reduced (on slashing).
//!
//! Invariant: `total_staked()` always equals the sum of per-account stakes.

pub mod account;
pub mod collaborators;
pub mod error;
pub mod ledger;

pub use account::VerifierAccount;
pub use collaborators::{ReputationRegistry, StakeToken};
pub use error::StakingError;
pub use ledger::{SlashReceipt, StakeLedger};
