//! Nullable reputation registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use verity_staking::ReputationRegistry;
use verity_types::{CollaboratorError, Identity};

#[derive(Default)]
struct State {
    scores: HashMap<Identity, u64>,
    failing: bool,
}

#[derive(Clone, Default)]
pub struct NullReputation {
    state: Arc<Mutex<State>>,
}

impl NullReputation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, who: &Identity, score: u64) {
        self.state.lock().unwrap().scores.insert(who.clone(), score);
    }

    pub fn score(&self, who: &Identity) -> u64 {
        self.state
            .lock()
            .unwrap()
            .scores
            .get(who)
            .copied()
            .unwrap_or(0)
    }

    /// Make every subsequent write fail. Reads keep working.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }
}

impl ReputationRegistry for NullReputation {
    fn get(&self, who: &Identity) -> u64 {
        self.score(who)
    }

    fn add(&mut self, who: &Identity, amount: u64) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(CollaboratorError::Unavailable("null reputation".into()));
        }
        let score = state.scores.entry(who.clone()).or_default();
        *score = score.saturating_add(amount);
        Ok(())
    }

    fn subtract(&mut self, who: &Identity, amount: u64) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(CollaboratorError::Unavailable("null reputation".into()));
        }
        let score = state.scores.entry(who.clone()).or_default();
        *score = score.saturating_sub(amount);
        Ok(())
    }
}
