//! Dispute records.

use serde::{Deserialize, Serialize};
use verity_types::{Ballot, Identity, OutcomeFraction, RequestId, StrategyRef, TaskId, Timestamp};
use verity_verification::Verdict;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeStatus {
    /// Waiting for the randomness callback.
    AwaitingJury,
    Voting,
    Resolved,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JuryVote {
    pub juror: Identity,
    pub ballot: Ballot,
    pub score: OutcomeFraction,
    pub weight: u64,
    pub cast_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub task: TaskId,
    pub strategy: StrategyRef,
    pub challenger: Identity,
    /// Challenge stake held in escrow.
    pub stake: u128,
    pub provisional_outcome: OutcomeFraction,
    /// First-round voters; never seated on the jury.
    pub excluded: Vec<Identity>,
    pub status: DisputeStatus,
    /// Outstanding randomness request while awaiting the jury.
    pub request: RequestId,
    pub jury: Vec<Identity>,
    pub votes: Vec<JuryVote>,
    pub opened_at: Timestamp,
    pub voting_ends_at: Option<Timestamp>,
    pub verdict: Option<Verdict>,
    /// Dissenting voters already slashed for this dispute's task.
    pub slashed: Vec<Identity>,
}

impl Dispute {
    pub fn is_juror(&self, who: &Identity) -> bool {
        self.jury.contains(who)
    }

    pub fn has_voted(&self, who: &Identity) -> bool {
        self.votes.iter().any(|v| &v.juror == who)
    }

    pub fn is_slashed(&self, who: &Identity) -> bool {
        self.slashed.contains(who)
    }
}
