//! Claim coordinator.
//!
//! The entry point for claims. It checks the project, routes the claim to
//! the strategy registered for its methodology, and is the only component
//! that tells the credit issuer to mint or reverse. Each
//! `(claim, methodology)` pair is fulfilled at most once.

pub mod collaborators;
pub mod coordinator;
pub mod error;

pub use collaborators::{CreditIssuer, ProjectCatalog, ProjectStatus};
pub use coordinator::{ClaimCoordinator, ClaimRecord, CoordinatorSnapshot, IssuancePlan};
pub use error::CoordinatorError;
