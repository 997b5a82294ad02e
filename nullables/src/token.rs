//! Nullable stake token: in-memory balances.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use verity_staking::StakeToken;
use verity_types::{CollaboratorError, Identity};

#[derive(Default)]
struct State {
    balances: HashMap<Identity, u128>,
    failing: bool,
}

#[derive(Clone, Default)]
pub struct NullStakeToken {
    state: Arc<Mutex<State>>,
}

impl NullStakeToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` into `who`'s balance.
    pub fn credit(&self, who: &Identity, amount: u128) {
        *self
            .state
            .lock()
            .unwrap()
            .balances
            .entry(who.clone())
            .or_default() += amount;
    }

    pub fn balance(&self, who: &Identity) -> u128 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(who)
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all balances; constant across transfers.
    pub fn supply(&self) -> u128 {
        self.state.lock().unwrap().balances.values().sum()
    }

    /// Make every subsequent transfer fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }
}

impl StakeToken for NullStakeToken {
    fn balance_of(&self, who: &Identity) -> u128 {
        self.balance(who)
    }

    fn transfer(
        &mut self,
        from: &Identity,
        to: &Identity,
        amount: u128,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(CollaboratorError::Unavailable("null token".into()));
        }
        let available = state.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(CollaboratorError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        state.balances.insert(from.clone(), available - amount);
        *state.balances.entry(to.clone()).or_default() += amount;
        Ok(())
    }
}
