//! Claim verification.
//!
//! A verification strategy owns the tasks it was handed by the coordinator
//! and drives each one through:
//!
//! ```text
//! Open ──(voting window elapses)──► Provisional ──(challenge window elapses)──► Finalized
//!                                        │
//!                                        └─(challenged in window)─► Challenged ─► Finalized | Overturned
//! ```
//!
//! The strategy is pluggable: the node talks to it only through the
//! [`VerificationStrategy`] trait. [`OptimisticVoter`] is the production
//! implementation, tallying reputation-weighted ballots in threshold or
//! quantitative mode.

pub mod error;
pub mod strategy;
pub mod tally;
pub mod task;
pub mod voter;

pub use error::VerificationError;
pub use strategy::{
    ArbitrationSettlement, ChallengeTicket, ClaimRequest, Fulfillment, Provisional,
    StrategySnapshot, VerificationStrategy, Verdict,
};
pub use tally::{TallyMode, WeightedTally};
pub use task::{Task, TaskStatus, Vote};
pub use voter::OptimisticVoter;
