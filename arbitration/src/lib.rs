//! Arbitration council.
//!
//! A challenge opens a dispute and asks the randomness service for words.
//! When the words arrive a jury is drawn from the eligible verifiers (never
//! the challenger or the original voters), the jurors cast weighted votes,
//! and after the jury window the verdict either upholds or overturns the
//! provisional outcome. The challenger's stake is refunded with a reward on
//! an overturn and forfeited to the treasury otherwise.

pub mod council;
pub mod dispute;
pub mod error;
pub mod jury;

pub use council::{ArbitrationCouncil, CouncilSnapshot, Resolution};
pub use dispute::{Dispute, DisputeStatus, JuryVote};
pub use error::ArbitrationError;
pub use jury::select_jury;
