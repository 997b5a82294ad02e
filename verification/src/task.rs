//! Task records.

use serde::{Deserialize, Serialize};
use verity_types::{
    Ballot, ClaimId, Identity, MethodologyId, OutcomeFraction, ProjectId, StrategyRef, TaskId,
    Timestamp,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Open,
    Provisional,
    Challenged,
    Finalized,
    Overturned,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Finalized | TaskStatus::Overturned)
    }
}

/// One verifier's ballot. `weight` is the reputation read when it was cast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: Identity,
    pub ballot: Ballot,
    pub score: OutcomeFraction,
    pub weight: u64,
    pub cast_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub strategy: StrategyRef,
    pub project: ProjectId,
    pub claim_id: ClaimId,
    pub methodology: MethodologyId,
    pub evidence_ref: String,
    pub requested_amount: u128,
    pub status: TaskStatus,
    pub votes: Vec<Vote>,
    pub provisional_outcome: Option<OutcomeFraction>,
    pub final_outcome: Option<OutcomeFraction>,
    pub created_at: Timestamp,
    pub voting_ends_at: Timestamp,
    pub challenge_ends_at: Option<Timestamp>,
    pub challenger: Option<Identity>,
    /// Credits for the provisional outcome were minted when it was set.
    pub provisionally_issued: bool,
}

impl Task {
    pub fn has_voted(&self, voter: &Identity) -> bool {
        self.votes.iter().any(|v| &v.voter == voter)
    }

    pub fn voters(&self) -> Vec<Identity> {
        self.votes.iter().map(|v| v.voter.clone()).collect()
    }

    /// Voters whose score lies more than `tolerance` points from `outcome`.
    pub fn dissenters(&self, outcome: OutcomeFraction, tolerance: u8) -> Vec<Identity> {
        self.votes
            .iter()
            .filter(|v| v.score.distance(outcome) > tolerance)
            .map(|v| v.voter.clone())
            .collect()
    }
}
