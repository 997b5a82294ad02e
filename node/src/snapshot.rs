//! Persisted node state and its versioned envelope.
//!
//! Snapshots are encoded with `bincode` inside [`VersionedSnapshot`]; older
//! envelopes are upgraded by [`migrate`] on decode, so a node always
//! restores from the current layout.

use serde::{Deserialize, Serialize};
use verity_arbitration::CouncilSnapshot;
use verity_coordinator::CoordinatorSnapshot;
use verity_governance::{AccessControl, MethodologyCatalog};
use verity_staking::StakeLedger;
use verity_types::{IssuanceMode, ProtocolParams, BPS_DENOMINATOR};
use verity_verification::StrategySnapshot;

use crate::audit::AuditLog;
use crate::NodeError;

/// Engine state shared by every snapshot version.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineState {
    pub access: AccessControl,
    pub catalog: MethodologyCatalog,
    pub ledger: StakeLedger,
    pub coordinator: CoordinatorSnapshot,
    pub council: CouncilSnapshot,
    pub strategies: Vec<StrategySnapshot>,
    pub audit: AuditLog,
}

/// Current snapshot layout. Collaborators are not part of it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub params: ProtocolParams,
    pub state: EngineState,
}

/// Parameters as first released: full slashing, exact-match tolerance,
/// deferred issuance were fixed behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsV1 {
    pub min_stake: u128,
    pub min_reputation: u64,
    pub unregister_cooldown_secs: u64,
    pub voting_window_secs: u64,
    pub challenge_window_secs: u64,
    pub approval_threshold_bps: u32,
    pub jury_size: u32,
    pub jury_voting_window_secs: u64,
    pub challenge_stake: u128,
    pub challenger_reward_bps: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotV1 {
    pub params: ParamsV1,
    pub state: EngineState,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum VersionedSnapshot {
    V1(SnapshotV1),
    V2(NodeSnapshot),
}

impl From<ParamsV1> for ProtocolParams {
    fn from(v1: ParamsV1) -> Self {
        ProtocolParams {
            min_stake: v1.min_stake,
            min_reputation: v1.min_reputation,
            unregister_cooldown_secs: v1.unregister_cooldown_secs,
            reputation_slash_bps: BPS_DENOMINATOR,
            voting_window_secs: v1.voting_window_secs,
            challenge_window_secs: v1.challenge_window_secs,
            approval_threshold_bps: v1.approval_threshold_bps,
            outcome_tolerance: 0,
            jury_size: v1.jury_size,
            jury_voting_window_secs: v1.jury_voting_window_secs,
            challenge_stake: v1.challenge_stake,
            challenger_reward_bps: v1.challenger_reward_bps,
            issuance_mode: IssuanceMode::Deferred,
        }
    }
}

/// Upgrade any snapshot version to the current layout.
pub fn migrate(snapshot: VersionedSnapshot) -> NodeSnapshot {
    match snapshot {
        VersionedSnapshot::V1(v1) => {
            tracing::info!("migrating snapshot from v1");
            NodeSnapshot {
                params: v1.params.into(),
                state: v1.state,
            }
        }
        VersionedSnapshot::V2(current) => current,
    }
}

pub fn encode_snapshot(snapshot: &NodeSnapshot) -> Result<Vec<u8>, NodeError> {
    encode_versioned(&VersionedSnapshot::V2(snapshot.clone()))
}

pub fn encode_versioned(snapshot: &VersionedSnapshot) -> Result<Vec<u8>, NodeError> {
    bincode::serialize(snapshot).map_err(|e| NodeError::Snapshot(e.to_string()))
}

/// Decode an envelope of any version, migrating it to the current layout.
pub fn decode_snapshot(bytes: &[u8]) -> Result<NodeSnapshot, NodeError> {
    let versioned: VersionedSnapshot =
        bincode::deserialize(bytes).map_err(|e| NodeError::Snapshot(e.to_string()))?;
    Ok(migrate(versioned))
}
