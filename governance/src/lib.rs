//! Governance for the Verity protocol.
//!
//! - **Access control**: roles granted to identities, each role carrying a
//!   fixed set of capabilities. Every privileged call names the capability
//!   it needs and is checked against the caller explicitly.
//! - **Pause switch**: halts every mutating entry point of the node.
//! - **Methodology catalog**: two-phase propose/approve, then a separate
//!   idempotent activation that wires the methodology into claim routing.
//! - **Governable parameters**: validated setters over `ProtocolParams`.

pub mod access;
pub mod catalog;
pub mod error;
pub mod params;

pub use access::{AccessControl, Capability, Role};
pub use catalog::{Methodology, MethodologyCatalog, MethodologyStatus};
pub use error::GovernanceError;
pub use params::GovernableParam;
