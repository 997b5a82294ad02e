//! The strategy contract between the node and a verification mechanism.
//!
//! Every mutating call has a read-only `preview_*` twin that runs the same
//! checks and returns the same result without touching state. The node
//! previews, performs the collaborator calls the result implies, and only
//! then commits, so a rejected collaborator call leaves the task unchanged.

use crate::error::VerificationError;
use crate::tally::TallyMode;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use verity_staking::{ReputationRegistry, StakeLedger};
use verity_types::{
    AuditEvent, Ballot, Caller, ClaimId, Identity, MethodologyId, OutcomeFraction, ProjectId,
    ProtocolParams, StrategyRef, TaskId, Timestamp,
};

/// A validated claim handed over by the coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimRequest {
    pub project: ProjectId,
    pub claim_id: ClaimId,
    pub methodology: MethodologyId,
    pub evidence_ref: String,
    pub requested_amount: u128,
}

/// A provisional outcome, ready to be minted early under optimistic
/// issuance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provisional {
    pub task: TaskId,
    pub project: ProjectId,
    pub claim_id: ClaimId,
    pub methodology: MethodologyId,
    pub outcome: OutcomeFraction,
    pub challenge_ends_at: Timestamp,
    /// Whether credits should be minted now.
    pub issue_now: bool,
    pub evidence_ref: String,
}

/// The final outcome of a task, for the coordinator's fulfillment callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fulfillment {
    pub task: TaskId,
    pub strategy: StrategyRef,
    pub project: ProjectId,
    pub claim_id: ClaimId,
    pub methodology: MethodologyId,
    pub outcome: OutcomeFraction,
    /// Credits minted for the provisional outcome must be reversed first.
    pub is_reversal: bool,
    pub evidence_ref: String,
}

/// What the arbitration council needs to open a dispute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeTicket {
    pub task: TaskId,
    pub strategy: StrategyRef,
    pub challenger: Identity,
    pub provisional_outcome: OutcomeFraction,
    /// First-round voters, excluded from the jury.
    pub voters: Vec<Identity>,
}

/// The council's ruling on a challenged task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: OutcomeFraction,
    pub upheld: bool,
}

/// Effects of applying a verdict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArbitrationSettlement {
    pub fulfillment: Fulfillment,
    pub upheld: bool,
    /// Voters whose ballots were wrong by more than the tolerance.
    pub slash: Vec<Identity>,
}

/// Persisted state of a strategy instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySnapshot {
    pub strategy: StrategyRef,
    pub mode: TallyMode,
    pub next_nonce: u64,
    pub tasks: Vec<Task>,
}

/// A pluggable verification mechanism. Object safe: the node holds
/// strategies as `Box<dyn VerificationStrategy>`.
pub trait VerificationStrategy: Send {
    fn strategy_ref(&self) -> &StrategyRef;

    /// Open a task for a claim. Deadlines are fixed from `params` now.
    fn open_task(
        &mut self,
        request: ClaimRequest,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<TaskId, VerificationError>;

    fn submit_vote(
        &mut self,
        task: &TaskId,
        voter: &Identity,
        ballot: Ballot,
        ledger: &StakeLedger,
        reputation: &dyn ReputationRegistry,
        now: Timestamp,
    ) -> Result<(), VerificationError>;

    fn preview_resolution(
        &self,
        task: &TaskId,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<Provisional, VerificationError>;

    fn propose_resolution(
        &mut self,
        task: &TaskId,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<Provisional, VerificationError>;

    fn preview_finalize(
        &self,
        task: &TaskId,
        now: Timestamp,
    ) -> Result<Fulfillment, VerificationError>;

    fn finalize_verification(
        &mut self,
        task: &TaskId,
        now: Timestamp,
    ) -> Result<Fulfillment, VerificationError>;

    fn preview_challenge(
        &self,
        task: &TaskId,
        challenger: &Identity,
        now: Timestamp,
    ) -> Result<ChallengeTicket, VerificationError>;

    fn challenge_verification(
        &mut self,
        task: &TaskId,
        challenger: &Identity,
        now: Timestamp,
    ) -> Result<ChallengeTicket, VerificationError>;

    fn preview_arbitration_result(
        &self,
        caller: &Caller,
        task: &TaskId,
        verdict: Verdict,
        params: &ProtocolParams,
    ) -> Result<ArbitrationSettlement, VerificationError>;

    fn process_arbitration_result(
        &mut self,
        caller: &Caller,
        task: &TaskId,
        verdict: Verdict,
        params: &ProtocolParams,
    ) -> Result<ArbitrationSettlement, VerificationError>;

    fn task(&self, task: &TaskId) -> Option<&Task>;

    /// Whether `voter` has a ballot on a task that is not yet terminal.
    /// Their stake must stay slashable until it is.
    fn has_open_vote(&self, voter: &Identity) -> bool;

    fn snapshot(&self) -> StrategySnapshot;

    fn drain_events(&mut self) -> Vec<AuditEvent>;
}
