//! Verity node: wires every protocol engine to its collaborators.
//!
//! The node is the single writer over:
//! - the claim coordinator and its routing table
//! - the registered verification strategies
//! - the stake & reputation ledger
//! - the arbitration council
//! - access control, the methodology catalog and protocol parameters
//!
//! It also keeps the append-only audit log and produces versioned
//! snapshots of all engine state.

pub mod audit;
pub mod config;
pub mod error;
pub mod node;
pub mod snapshot;

pub use audit::{AuditLog, AuditRecord};
pub use config::NodeConfig;
pub use error::NodeError;
pub use node::{Collaborators, DisputeOutcome, VerityNode};
pub use snapshot::{
    decode_snapshot, encode_snapshot, encode_versioned, migrate, EngineState, NodeSnapshot,
    ParamsV1, SnapshotV1, VersionedSnapshot,
};
pub use verity_utils::{init_logging, try_init_logging, LogFormat};
