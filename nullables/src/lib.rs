//! Nullable collaborators for deterministic testing.
//!
//! Every external dependency of the protocol (clock, randomness, stake
//! token, reputation registry, credit issuer, project catalog) sits behind
//! a trait. This crate provides in-memory implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically, including forced failures
//! - Never touch the filesystem or network
//!
//! Each nullable is a cheap clonable handle over shared state, so a test
//! can hand one clone to the node and keep another to drive and inspect it.

pub mod catalog;
pub mod clock;
pub mod issuer;
pub mod random;
pub mod reputation;
pub mod token;

pub use catalog::NullProjectCatalog;
pub use clock::NullClock;
pub use issuer::{IssuerCall, NullIssuer};
pub use random::{NullRandomness, RandomRequest};
pub use reputation::NullReputation;
pub use token::NullStakeToken;
