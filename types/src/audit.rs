//! Audit events: the externally observable trace of protocol execution.
//!
//! Engines append these at their commit points only, so a failed operation
//! never leaves an event behind. The node drains them into its append-only
//! audit log.

use crate::hash::{RequestId, TaskId};
use crate::identity::{ClaimId, Identity, MethodologyId, ProjectId, StrategyRef};
use crate::outcome::{Ballot, OutcomeFraction};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    // ── Claim lifecycle ──────────────────────────────────────────────────
    ClaimSubmitted {
        task: TaskId,
        project: ProjectId,
        claim: ClaimId,
        methodology: MethodologyId,
        requested_amount: u128,
    },
    VoteCast {
        task: TaskId,
        voter: Identity,
        ballot: Ballot,
        weight: u64,
    },
    ProvisionalOutcomeSet {
        task: TaskId,
        outcome: OutcomeFraction,
        challenge_ends_at: Timestamp,
    },
    TaskFinalized {
        task: TaskId,
        outcome: OutcomeFraction,
    },
    TaskOverturned {
        task: TaskId,
        provisional: OutcomeFraction,
        outcome: OutcomeFraction,
    },

    // ── Arbitration ──────────────────────────────────────────────────────
    ChallengeOpened {
        task: TaskId,
        challenger: Identity,
        stake: u128,
        request: RequestId,
    },
    JurySelected {
        task: TaskId,
        jurors: Vec<Identity>,
        voting_ends_at: Timestamp,
    },
    JuryVoteCast {
        task: TaskId,
        juror: Identity,
        ballot: Ballot,
        weight: u64,
    },
    DisputeResolved {
        task: TaskId,
        verdict: OutcomeFraction,
        upheld: bool,
        challenger_payout: u128,
    },

    // ── Ledger ───────────────────────────────────────────────────────────
    VerifierRegistered {
        verifier: Identity,
        stake: u128,
    },
    UnregisterRequested {
        verifier: Identity,
        release_at: Timestamp,
    },
    VerifierUnregistered {
        verifier: Identity,
        released: u128,
    },
    SlashApplied {
        task: Option<TaskId>,
        verifier: Identity,
        stake: u128,
        reputation: u64,
    },

    // ── Issuance ─────────────────────────────────────────────────────────
    CreditsIssued {
        task: Option<TaskId>,
        project: ProjectId,
        beneficiary: Identity,
        amount: u128,
    },
    CreditsReversed {
        task: Option<TaskId>,
        project: ProjectId,
        amount: u128,
    },
    AdminOverride {
        by: Identity,
        project: ProjectId,
        claim: ClaimId,
        methodology: MethodologyId,
        amount: u128,
    },

    // ── Administration ───────────────────────────────────────────────────
    MethodologyProposed {
        methodology: MethodologyId,
        strategy: StrategyRef,
    },
    MethodologyApproved {
        methodology: MethodologyId,
    },
    MethodologyDeprecated {
        methodology: MethodologyId,
    },
    MethodologyActivated {
        methodology: MethodologyId,
        strategy: StrategyRef,
    },
    StrategyRegistered {
        strategy: StrategyRef,
    },
    ParameterChanged {
        param: String,
        value: u128,
    },
    RoleGranted {
        account: Identity,
        role: String,
    },
    RoleRevoked {
        account: Identity,
        role: String,
    },
    Paused {
        by: Identity,
    },
    Unpaused {
        by: Identity,
    },
}

impl AuditEvent {
    /// The task this event belongs to, for per-task indexing.
    pub fn task(&self) -> Option<TaskId> {
        match self {
            AuditEvent::ClaimSubmitted { task, .. }
            | AuditEvent::VoteCast { task, .. }
            | AuditEvent::ProvisionalOutcomeSet { task, .. }
            | AuditEvent::TaskFinalized { task, .. }
            | AuditEvent::TaskOverturned { task, .. }
            | AuditEvent::ChallengeOpened { task, .. }
            | AuditEvent::JurySelected { task, .. }
            | AuditEvent::JuryVoteCast { task, .. }
            | AuditEvent::DisputeResolved { task, .. } => Some(*task),
            AuditEvent::SlashApplied { task, .. }
            | AuditEvent::CreditsIssued { task, .. }
            | AuditEvent::CreditsReversed { task, .. } => *task,
            _ => None,
        }
    }
}
