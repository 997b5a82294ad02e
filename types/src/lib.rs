//! Fundamental types for the Verity protocol.
//!
//! This crate defines the vocabulary shared across every other crate in the
//! workspace: identities and ids, task hashes, timestamps and clocks, protocol
//! parameters, ballots and outcome fractions, caller contexts, audit events
//! and the error classification used by every engine.

pub mod access;
pub mod audit;
pub mod error;
pub mod hash;
pub mod identity;
pub mod outcome;
pub mod params;
pub mod time;

pub use access::Caller;
pub use audit::AuditEvent;
pub use error::{CollaboratorError, ErrorClass};
pub use hash::{RequestId, TaskId};
pub use identity::{ClaimId, Identity, MethodologyId, ProjectId, StrategyRef};
pub use outcome::{Ballot, OutcomeFraction};
pub use params::{IssuanceMode, ProtocolParams, BPS_DENOMINATOR};
pub use time::{Clock, SystemClock, Timestamp};
