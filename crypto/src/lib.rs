//! Hashing primitives for the Verity protocol.
//!
//! - **Blake2b-256** for task handles and methodology version hashes
//! - Expansion of randomness-service words into per-juror draws

pub mod hash;
pub mod seed;

pub use hash::{blake2b_256, blake2b_256_multi, derive_task_id, version_hash};
pub use seed::{draw_index, juror_word};
