//! Unpredictable randomness for jury selection.
//!
//! The protocol never produces randomness itself. It asks an external
//! service for words through [`RandomnessService::request_random`] and
//! receives them later, out of band, through the node's `on_random_words`
//! callback. Providers:
//! - [`drand::DrandRandomness`]: queues requests and fulfils them from a
//!   drand relay once a beacon round newer than the request is available.
//! - `NullRandomness` (in `verity-nullables`): deterministic, for tests.

pub mod drand;
pub mod error;

pub use drand::{DrandBeacon, DrandClient, DrandRandomness, DrandVerifier};
pub use error::RandomnessError;

use verity_types::RequestId;

/// An asynchronous source of random words.
pub trait RandomnessService: Send {
    /// Register a request for `num_words` random words.
    ///
    /// `context` is opaque to the service and only mixed into derived words;
    /// the response is delivered later via the host's callback.
    fn request_random(
        &mut self,
        context: &[u8],
        num_words: u32,
    ) -> Result<RequestId, RandomnessError>;

    /// Human-readable name of this provider.
    fn name(&self) -> &str;
}

/// A fulfilled request, ready to be handed to the node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomWords {
    pub request: RequestId,
    pub words: Vec<[u8; 32]>,
}
