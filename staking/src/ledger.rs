//! The stake ledger: registration, unregistration with cooldown, slashing.

use crate::account::VerifierAccount;
use crate::collaborators::{ReputationRegistry, StakeToken};
use crate::error::StakingError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use verity_types::{
    AuditEvent, Caller, Identity, ProtocolParams, TaskId, Timestamp, BPS_DENOMINATOR,
};

/// Result of a slash. A zero `stake` means the account was already empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashReceipt {
    pub verifier: Identity,
    pub stake: u128,
    pub reputation: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakeLedger {
    /// Token account holding every verifier's stake.
    custody: Identity,
    /// Receives slashed stake.
    treasury: Identity,
    accounts: HashMap<Identity, VerifierAccount>,
    total_staked: u128,
    /// Callers allowed to slash (the council and registered strategies).
    slashers: HashSet<Caller>,
    #[serde(skip)]
    pending_events: Vec<AuditEvent>,
}

impl StakeLedger {
    pub fn new(custody: Identity, treasury: Identity) -> Self {
        Self {
            custody,
            treasury,
            accounts: HashMap::new(),
            total_staked: 0,
            slashers: HashSet::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn custody(&self) -> &Identity {
        &self.custody
    }

    pub fn treasury(&self) -> &Identity {
        &self.treasury
    }

    /// Allow `caller` to slash. Idempotent.
    pub fn authorize_slasher(&mut self, caller: Caller) {
        self.slashers.insert(caller);
    }

    pub fn revoke_slasher(&mut self, caller: &Caller) {
        self.slashers.remove(caller);
    }

    pub fn is_slasher(&self, caller: &Caller) -> bool {
        self.slashers.contains(caller)
    }

    /// Register `identity` as a verifier, moving `amount` into custody.
    pub fn register(
        &mut self,
        identity: &Identity,
        amount: u128,
        token: &mut dyn StakeToken,
        reputation: &dyn ReputationRegistry,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<(), StakingError> {
        if !identity.is_valid() {
            return Err(StakingError::InvalidIdentity);
        }
        if self
            .accounts
            .get(identity)
            .is_some_and(VerifierAccount::is_registered)
        {
            return Err(StakingError::AlreadyRegistered(identity.to_string()));
        }
        if amount < params.min_stake || amount == 0 {
            return Err(StakingError::InsufficientStake {
                needed: params.min_stake.max(1),
                provided: amount,
            });
        }
        let score = reputation.get(identity);
        if score < params.min_reputation {
            return Err(StakingError::InsufficientReputation {
                needed: params.min_reputation,
                have: score,
            });
        }
        let available = token.balance_of(identity);
        if available < amount {
            return Err(StakingError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let new_total = self
            .total_staked
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;

        token.transfer(identity, &self.custody, amount)?;

        self.accounts.insert(
            identity.clone(),
            VerifierAccount {
                identity: identity.clone(),
                staked: amount,
                active: true,
                registered_at: now,
                unregister_after: None,
            },
        );
        self.total_staked = new_total;
        self.pending_events.push(AuditEvent::VerifierRegistered {
            verifier: identity.clone(),
            stake: amount,
        });
        tracing::info!(verifier = %identity, stake = amount, "verifier registered");
        Ok(())
    }

    /// Deactivate immediately and start the unregister cooldown.
    ///
    /// Returns the time from which [`StakeLedger::unregister`] succeeds.
    pub fn initiate_unregister(
        &mut self,
        identity: &Identity,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<Timestamp, StakingError> {
        let account = self
            .accounts
            .get_mut(identity)
            .ok_or_else(|| StakingError::NotRegistered(identity.to_string()))?;
        if !account.active {
            return Err(StakingError::NotActive(identity.to_string()));
        }

        let release_at = now.plus_secs(params.unregister_cooldown_secs);
        account.active = false;
        account.unregister_after = Some(release_at);

        self.pending_events.push(AuditEvent::UnregisterRequested {
            verifier: identity.clone(),
            release_at,
        });
        tracing::info!(verifier = %identity, %release_at, "unregister requested");
        Ok(release_at)
    }

    /// Release the stake of a verifier whose cooldown has elapsed and drop
    /// the account. Returns the released amount.
    pub fn unregister(
        &mut self,
        identity: &Identity,
        token: &mut dyn StakeToken,
        now: Timestamp,
    ) -> Result<u128, StakingError> {
        let account = self
            .accounts
            .get(identity)
            .ok_or_else(|| StakingError::NotRegistered(identity.to_string()))?;
        let release_at = account
            .unregister_after
            .ok_or_else(|| StakingError::NoPendingUnregister(identity.to_string()))?;
        if now < release_at {
            return Err(StakingError::CooldownActive {
                until: release_at.as_secs(),
            });
        }

        let amount = account.staked;
        let new_total = self
            .total_staked
            .checked_sub(amount)
            .ok_or(StakingError::Overflow)?;
        if amount > 0 {
            token.transfer(&self.custody, identity, amount)?;
        }

        self.accounts.remove(identity);
        self.total_staked = new_total;
        self.pending_events.push(AuditEvent::VerifierUnregistered {
            verifier: identity.clone(),
            released: amount,
        });
        tracing::info!(verifier = %identity, released = amount, "verifier unregistered");
        Ok(amount)
    }

    /// Forfeit a verifier's whole stake to the treasury, deactivate the
    /// account and cut its reputation by `reputation_slash_bps`.
    ///
    /// Slashing an account whose stake is already zero is a no-op that
    /// returns a zero receipt, so overlapping overturn paths cannot fail
    /// each other.
    pub fn slash(
        &mut self,
        caller: &Caller,
        identity: &Identity,
        task: Option<TaskId>,
        token: &mut dyn StakeToken,
        reputation: &mut dyn ReputationRegistry,
        params: &ProtocolParams,
    ) -> Result<SlashReceipt, StakingError> {
        if !self.slashers.contains(caller) {
            return Err(StakingError::Unauthorized(caller.to_string()));
        }
        let account = self
            .accounts
            .get(identity)
            .ok_or_else(|| StakingError::NotRegistered(identity.to_string()))?;
        let stake = account.staked;
        if stake == 0 {
            return Ok(SlashReceipt {
                verifier: identity.clone(),
                stake: 0,
                reputation: 0,
            });
        }

        let new_total = self
            .total_staked
            .checked_sub(stake)
            .ok_or(StakingError::Overflow)?;
        let score = reputation.get(identity);
        let cut = (score as u128 * params.reputation_slash_bps.min(BPS_DENOMINATOR) as u128
            / BPS_DENOMINATOR as u128) as u64;

        reputation.subtract(identity, cut)?;
        if let Err(e) = token.transfer(&self.custody, &self.treasury, stake) {
            // Undo the reputation cut so the failed slash leaves no trace.
            if let Err(undo) = reputation.add(identity, cut) {
                tracing::error!(verifier = %identity, error = %undo, "failed to restore reputation");
            }
            return Err(e.into());
        }

        if let Some(account) = self.accounts.get_mut(identity) {
            account.staked = 0;
            account.active = false;
            account.unregister_after = None;
        }
        self.total_staked = new_total;
        self.pending_events.push(AuditEvent::SlashApplied {
            task,
            verifier: identity.clone(),
            stake,
            reputation: cut,
        });
        tracing::warn!(verifier = %identity, stake, reputation = cut, by = %caller, "verifier slashed");

        Ok(SlashReceipt {
            verifier: identity.clone(),
            stake,
            reputation: cut,
        })
    }

    pub fn account(&self, identity: &Identity) -> Option<&VerifierAccount> {
        self.accounts.get(identity)
    }

    /// Active verifiers with non-zero stake may vote.
    pub fn is_active(&self, identity: &Identity) -> bool {
        self.accounts
            .get(identity)
            .is_some_and(|a| a.active && a.staked > 0)
    }

    /// Jury-eligible verifiers, sorted so that every node derives the same
    /// pool from the same ledger.
    pub fn eligible_verifiers(&self, min_stake: u128) -> Vec<Identity> {
        let mut pool: Vec<Identity> = self
            .accounts
            .values()
            .filter(|a| a.is_eligible(min_stake))
            .map(|a| a.identity.clone())
            .collect();
        pool.sort();
        pool
    }

    pub fn total_staked(&self) -> u128 {
        self.total_staked
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the tracked total equals the sum of account stakes.
    pub fn is_conserved(&self) -> bool {
        let sum = self
            .accounts
            .values()
            .try_fold(0u128, |acc, a| acc.checked_add(a.staked));
        sum == Some(self.total_staked)
    }

    /// Drain audit events for the node to record.
    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
