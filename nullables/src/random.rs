//! Nullable randomness: records requests, delivers nothing on its own.
//!
//! Tests read the recorded request ids and feed words back through the
//! node's randomness callback, choosing exactly which jurors get drawn.

use std::sync::{Arc, Mutex};
use verity_randomness::{RandomnessError, RandomnessService};
use verity_types::RequestId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomRequest {
    pub id: RequestId,
    pub context: Vec<u8>,
    pub num_words: u32,
}

#[derive(Default)]
struct State {
    next_id: u64,
    requests: Vec<RandomRequest>,
    failing: bool,
}

#[derive(Clone, Default)]
pub struct NullRandomness {
    state: Arc<Mutex<State>>,
}

impl NullRandomness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent request fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn requests(&self) -> Vec<RandomRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> Option<RequestId> {
        self.state.lock().unwrap().requests.last().map(|r| r.id)
    }

    /// `n` deterministic words derived from `seed`.
    pub fn words(seed: u64, n: usize) -> Vec<[u8; 32]> {
        (0..n as u64)
            .map(|i| verity_crypto::blake2b_256_multi(&[&seed.to_be_bytes(), &i.to_be_bytes()]))
            .collect()
    }

    /// A word that draws index `index` from any pool larger than it.
    pub fn word_for_index(index: u64) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[8..16].copy_from_slice(&index.to_be_bytes());
        word
    }
}

impl RandomnessService for NullRandomness {
    fn request_random(
        &mut self,
        context: &[u8],
        num_words: u32,
    ) -> Result<RequestId, RandomnessError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(RandomnessError::Unavailable("null randomness set to fail".into()));
        }
        if num_words == 0 {
            return Err(RandomnessError::ZeroWords);
        }
        state.next_id += 1;
        let id = RequestId::new(state.next_id);
        state.requests.push(RandomRequest {
            id,
            context: context.to_vec(),
            num_words,
        });
        Ok(id)
    }

    fn name(&self) -> &str {
        "null-randomness"
    }
}
