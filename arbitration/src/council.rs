//! The arbitration council: dispute lifecycle and settlement.

use crate::dispute::{Dispute, DisputeStatus, JuryVote};
use crate::error::ArbitrationError;
use crate::jury::select_jury;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use verity_randomness::RandomnessService;
use verity_staking::{ReputationRegistry, StakeLedger, StakeToken};
use verity_types::{
    AuditEvent, Ballot, Identity, OutcomeFraction, ProtocolParams, RequestId, StrategyRef, TaskId,
    Timestamp, BPS_DENOMINATOR,
};
use verity_verification::{ChallengeTicket, Verdict, WeightedTally};

/// The outcome of a dispute and the money it moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub task: TaskId,
    pub strategy: StrategyRef,
    pub challenger: Identity,
    pub stake: u128,
    pub verdict: Verdict,
    /// Paid from the treasury on top of the refunded stake.
    pub reward: u128,
    /// Total returned to the challenger; zero when the outcome is upheld.
    pub payout: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilSnapshot {
    pub escrow: Identity,
    pub treasury: Identity,
    pub disputes: Vec<Dispute>,
}

pub struct ArbitrationCouncil {
    /// Token account holding challenge stakes.
    escrow: Identity,
    treasury: Identity,
    disputes: BTreeMap<TaskId, Dispute>,
    requests: BTreeMap<RequestId, TaskId>,
    pending_events: Vec<AuditEvent>,
}

impl ArbitrationCouncil {
    pub fn new(escrow: Identity, treasury: Identity) -> Self {
        Self {
            escrow,
            treasury,
            disputes: BTreeMap::new(),
            requests: BTreeMap::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn restore(snapshot: CouncilSnapshot) -> Self {
        let requests = snapshot
            .disputes
            .iter()
            .filter(|d| d.status == DisputeStatus::AwaitingJury)
            .map(|d| (d.request, d.task))
            .collect();
        Self {
            escrow: snapshot.escrow,
            treasury: snapshot.treasury,
            disputes: snapshot.disputes.into_iter().map(|d| (d.task, d)).collect(),
            requests,
            pending_events: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> CouncilSnapshot {
        CouncilSnapshot {
            escrow: self.escrow.clone(),
            treasury: self.treasury.clone(),
            disputes: self.disputes.values().cloned().collect(),
        }
    }

    pub fn escrow(&self) -> &Identity {
        &self.escrow
    }

    pub fn dispute(&self, task: &TaskId) -> Option<&Dispute> {
        self.disputes.get(task)
    }

    /// Task waiting on a randomness request, if any.
    pub fn task_for_request(&self, request: &RequestId) -> Option<TaskId> {
        self.requests.get(request).copied()
    }

    /// Open a dispute for a challenged task: request randomness for the
    /// jury and move the challenge stake into escrow.
    pub fn create_dispute(
        &mut self,
        ticket: &ChallengeTicket,
        token: &mut dyn StakeToken,
        randomness: &mut dyn RandomnessService,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<RequestId, ArbitrationError> {
        if self.disputes.contains_key(&ticket.task) {
            return Err(ArbitrationError::DisputeExists(ticket.task.to_string()));
        }
        let stake = params.challenge_stake;
        let available = token.balance_of(&ticket.challenger);
        if available < stake {
            return Err(ArbitrationError::InsufficientChallengeStake {
                needed: stake,
                available,
            });
        }

        let request = randomness.request_random(ticket.task.as_bytes(), params.jury_size)?;
        if stake > 0 {
            token.transfer(&ticket.challenger, &self.escrow, stake)?;
        }

        self.disputes.insert(
            ticket.task,
            Dispute {
                task: ticket.task,
                strategy: ticket.strategy.clone(),
                challenger: ticket.challenger.clone(),
                stake,
                provisional_outcome: ticket.provisional_outcome,
                excluded: ticket.voters.clone(),
                status: DisputeStatus::AwaitingJury,
                request,
                jury: Vec::new(),
                votes: Vec::new(),
                opened_at: now,
                voting_ends_at: None,
                verdict: None,
                slashed: Vec::new(),
            },
        );
        self.requests.insert(request, ticket.task);

        tracing::info!(
            task = %ticket.task,
            challenger = %ticket.challenger,
            stake,
            %request,
            provider = randomness.name(),
            "dispute opened"
        );
        self.pending_events.push(AuditEvent::ChallengeOpened {
            task: ticket.task,
            challenger: ticket.challenger.clone(),
            stake,
            request,
        });
        Ok(request)
    }

    /// Ask for fresh randomness for a dispute still waiting on its jury,
    /// e.g. after the pool was too small. The previous request is dropped.
    pub fn request_jury(
        &mut self,
        task: &TaskId,
        randomness: &mut dyn RandomnessService,
        params: &ProtocolParams,
    ) -> Result<RequestId, ArbitrationError> {
        let dispute = self
            .disputes
            .get(task)
            .ok_or_else(|| ArbitrationError::UnknownDispute(task.to_string()))?;
        if dispute.status != DisputeStatus::AwaitingJury {
            return Err(ArbitrationError::JuryAlreadySelected(task.to_string()));
        }
        let previous = dispute.request;

        let request = randomness.request_random(task.as_bytes(), params.jury_size)?;
        self.requests.remove(&previous);
        self.requests.insert(request, *task);
        if let Some(dispute) = self.disputes.get_mut(task) {
            dispute.request = request;
        }
        tracing::info!(task = %task, %previous, %request, "jury randomness re-requested");
        Ok(request)
    }

    /// Randomness callback: seat the jury and open jury voting.
    pub fn on_random_words(
        &mut self,
        request: RequestId,
        words: &[[u8; 32]],
        ledger: &StakeLedger,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<Vec<Identity>, ArbitrationError> {
        let task = self
            .requests
            .get(&request)
            .copied()
            .ok_or_else(|| ArbitrationError::UnknownRequest(request.to_string()))?;
        if words.is_empty() {
            return Err(ArbitrationError::EmptyRandomness);
        }
        let dispute = self
            .disputes
            .get(&task)
            .ok_or_else(|| ArbitrationError::UnknownDispute(task.to_string()))?;

        let pool: Vec<Identity> = ledger
            .eligible_verifiers(params.min_stake)
            .into_iter()
            .filter(|v| v != &dispute.challenger && !dispute.excluded.contains(v))
            .collect();
        let jury = select_jury(&pool, words, params.jury_size as usize)?;
        let voting_ends_at = now.plus_secs(params.jury_voting_window_secs);

        self.requests.remove(&request);
        if let Some(dispute) = self.disputes.get_mut(&task) {
            dispute.status = DisputeStatus::Voting;
            dispute.jury = jury.clone();
            dispute.voting_ends_at = Some(voting_ends_at);
        }
        tracing::info!(task = %task, jurors = jury.len(), pool = pool.len(), %voting_ends_at, "jury selected");
        self.pending_events.push(AuditEvent::JurySelected {
            task,
            jurors: jury.clone(),
            voting_ends_at,
        });
        Ok(jury)
    }

    pub fn vote(
        &mut self,
        task: &TaskId,
        juror: &Identity,
        ballot: Ballot,
        reputation: &dyn ReputationRegistry,
        now: Timestamp,
    ) -> Result<(), ArbitrationError> {
        let dispute = self
            .disputes
            .get(task)
            .ok_or_else(|| ArbitrationError::UnknownDispute(task.to_string()))?;
        let ends_at = match (dispute.status, dispute.voting_ends_at) {
            (DisputeStatus::AwaitingJury, _) | (_, None) => {
                return Err(ArbitrationError::JuryNotSelected(task.to_string()))
            }
            (DisputeStatus::Resolved, _) => {
                return Err(ArbitrationError::JuryVotingClosed(task.to_string()))
            }
            (DisputeStatus::Voting, Some(ends_at)) => ends_at,
        };
        if !dispute.is_juror(juror) {
            return Err(ArbitrationError::NotJuror(juror.to_string()));
        }
        let score = ballot.score().ok_or(ArbitrationError::InvalidScore(ballot))?;
        if now >= ends_at {
            return Err(ArbitrationError::JuryVotingClosed(task.to_string()));
        }
        if dispute.has_voted(juror) {
            return Err(ArbitrationError::AlreadyVoted(juror.to_string()));
        }

        let weight = reputation.get(juror);
        if let Some(dispute) = self.disputes.get_mut(task) {
            dispute.votes.push(JuryVote {
                juror: juror.clone(),
                ballot,
                score,
                weight,
                cast_at: now,
            });
        }
        tracing::debug!(task = %task, %juror, ?ballot, weight, "jury vote cast");
        self.pending_events.push(AuditEvent::JuryVoteCast {
            task: *task,
            juror: juror.clone(),
            ballot,
            weight,
        });
        Ok(())
    }

    /// Compute the verdict and settlement without moving anything.
    pub fn preview_resolution(
        &self,
        task: &TaskId,
        token: &dyn StakeToken,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<Resolution, ArbitrationError> {
        let dispute = self
            .disputes
            .get(task)
            .ok_or_else(|| ArbitrationError::UnknownDispute(task.to_string()))?;
        let ends_at = match (dispute.status, dispute.voting_ends_at) {
            (DisputeStatus::Resolved, _) => {
                return Err(ArbitrationError::AlreadyResolved(task.to_string()))
            }
            (DisputeStatus::AwaitingJury, _) | (_, None) => {
                return Err(ArbitrationError::JuryNotSelected(task.to_string()))
            }
            (DisputeStatus::Voting, Some(ends_at)) => ends_at,
        };
        if now < ends_at {
            return Err(ArbitrationError::JuryVotingOpen {
                until: ends_at.as_secs(),
            });
        }

        let outcome = jury_outcome(dispute)?;
        let upheld = outcome.distance(dispute.provisional_outcome) <= params.outcome_tolerance;
        let (reward, payout) = if upheld {
            (0, 0)
        } else {
            let reward = dispute
                .stake
                .checked_mul(params.challenger_reward_bps as u128)
                .ok_or(ArbitrationError::Overflow)?
                / BPS_DENOMINATOR as u128;
            let available = token.balance_of(&self.treasury);
            if available < reward {
                return Err(ArbitrationError::InsufficientTreasury {
                    needed: reward,
                    available,
                });
            }
            let payout = dispute
                .stake
                .checked_add(reward)
                .ok_or(ArbitrationError::Overflow)?;
            (reward, payout)
        };

        Ok(Resolution {
            task: *task,
            strategy: dispute.strategy.clone(),
            challenger: dispute.challenger.clone(),
            stake: dispute.stake,
            verdict: Verdict { outcome, upheld },
            reward,
            payout,
        })
    }

    /// Settle the challenge stake and close the dispute.
    pub fn resolve_dispute(
        &mut self,
        task: &TaskId,
        token: &mut dyn StakeToken,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<Resolution, ArbitrationError> {
        let resolution = self.preview_resolution(task, &*token, params, now)?;

        if resolution.verdict.upheld {
            if resolution.stake > 0 {
                token.transfer(&self.escrow, &self.treasury, resolution.stake)?;
            }
        } else {
            if resolution.stake > 0 {
                token.transfer(&self.escrow, &resolution.challenger, resolution.stake)?;
            }
            if resolution.reward > 0 {
                if let Err(e) =
                    token.transfer(&self.treasury, &resolution.challenger, resolution.reward)
                {
                    // Put the refund back so the dispute can be resolved again.
                    if let Err(undo) =
                        token.transfer(&resolution.challenger, &self.escrow, resolution.stake)
                    {
                        tracing::error!(task = %task, error = %undo, "failed to re-escrow stake");
                    }
                    return Err(e.into());
                }
            }
        }

        if let Some(dispute) = self.disputes.get_mut(task) {
            dispute.status = DisputeStatus::Resolved;
            dispute.verdict = Some(resolution.verdict);
        }
        tracing::info!(
            task = %task,
            verdict = %resolution.verdict.outcome,
            upheld = resolution.verdict.upheld,
            payout = resolution.payout,
            "dispute resolved"
        );
        self.pending_events.push(AuditEvent::DisputeResolved {
            task: *task,
            verdict: resolution.verdict.outcome,
            upheld: resolution.verdict.upheld,
            challenger_payout: resolution.payout,
        });
        Ok(resolution)
    }

    /// Remember that `voter` has been slashed for a resolved dispute, so a
    /// resumed settlement never slashes them again.
    pub fn record_slash(
        &mut self,
        task: &TaskId,
        voter: &Identity,
    ) -> Result<(), ArbitrationError> {
        let dispute = self
            .disputes
            .get_mut(task)
            .ok_or_else(|| ArbitrationError::UnknownDispute(task.to_string()))?;
        if dispute.status != DisputeStatus::Resolved {
            return Err(ArbitrationError::NotResolved(task.to_string()));
        }
        if !dispute.is_slashed(voter) {
            dispute.slashed.push(voter.clone());
        }
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

/// Weighted jury mean. With no jury weight the provisional outcome stands.
fn jury_outcome(dispute: &Dispute) -> Result<OutcomeFraction, ArbitrationError> {
    let mut tally = WeightedTally::new();
    for vote in &dispute.votes {
        tally
            .add(vote.score, vote.weight)
            .map_err(|_| ArbitrationError::Overflow)?;
    }
    if tally.total_weight() == 0 {
        return Ok(dispute.provisional_outcome);
    }
    tally.mean().map_err(|_| ArbitrationError::Overflow)
}
