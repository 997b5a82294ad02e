//! Governable protocol parameters.
//!
//! Each setter validates its value before touching `ProtocolParams`, so an
//! out-of-range value leaves the parameters unchanged. Deadlines already
//! recorded on tasks and disputes are unaffected by any change.

use crate::error::GovernanceError;
use serde::{Deserialize, Serialize};
use verity_types::{IssuanceMode, ProtocolParams, BPS_DENOMINATOR};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GovernableParam {
    // Stake & reputation
    MinStake,
    MinReputation,
    UnregisterCooldownSecs,
    ReputationSlashBps,

    // Voting
    VotingWindowSecs,
    ChallengeWindowSecs,
    ApprovalThresholdBps,
    OutcomeTolerance,

    // Arbitration
    JurySize,
    JuryVotingWindowSecs,
    ChallengeStake,
    ChallengerRewardBps,

    /// 0 = deferred, 1 = optimistic.
    IssuanceMode,
}

impl GovernableParam {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MinStake => "min_stake",
            Self::MinReputation => "min_reputation",
            Self::UnregisterCooldownSecs => "unregister_cooldown_secs",
            Self::ReputationSlashBps => "reputation_slash_bps",
            Self::VotingWindowSecs => "voting_window_secs",
            Self::ChallengeWindowSecs => "challenge_window_secs",
            Self::ApprovalThresholdBps => "approval_threshold_bps",
            Self::OutcomeTolerance => "outcome_tolerance",
            Self::JurySize => "jury_size",
            Self::JuryVotingWindowSecs => "jury_voting_window_secs",
            Self::ChallengeStake => "challenge_stake",
            Self::ChallengerRewardBps => "challenger_reward_bps",
            Self::IssuanceMode => "issuance_mode",
        }
    }

    /// Current value of this parameter.
    pub fn get(&self, params: &ProtocolParams) -> u128 {
        match self {
            Self::MinStake => params.min_stake,
            Self::MinReputation => params.min_reputation as u128,
            Self::UnregisterCooldownSecs => params.unregister_cooldown_secs as u128,
            Self::ReputationSlashBps => params.reputation_slash_bps as u128,
            Self::VotingWindowSecs => params.voting_window_secs as u128,
            Self::ChallengeWindowSecs => params.challenge_window_secs as u128,
            Self::ApprovalThresholdBps => params.approval_threshold_bps as u128,
            Self::OutcomeTolerance => params.outcome_tolerance as u128,
            Self::JurySize => params.jury_size as u128,
            Self::JuryVotingWindowSecs => params.jury_voting_window_secs as u128,
            Self::ChallengeStake => params.challenge_stake,
            Self::ChallengerRewardBps => params.challenger_reward_bps as u128,
            Self::IssuanceMode => match params.issuance_mode {
                IssuanceMode::Deferred => 0,
                IssuanceMode::Optimistic => 1,
            },
        }
    }

    /// Validate `value` and write it into `params`.
    pub fn apply(&self, params: &mut ProtocolParams, value: u128) -> Result<(), GovernanceError> {
        let invalid = |reason: &str| GovernanceError::InvalidParameter {
            param: self.name().to_string(),
            value,
            reason: reason.to_string(),
        };
        let as_u64 = || u64::try_from(value).map_err(|_| invalid("exceeds u64"));
        let window = || match as_u64()? {
            0 => Err(invalid("window must be positive")),
            secs => Ok(secs),
        };
        let bps = || {
            if value > BPS_DENOMINATOR as u128 {
                Err(invalid("basis points above 10000"))
            } else {
                Ok(value as u32)
            }
        };

        match self {
            Self::MinStake => params.min_stake = value,
            Self::MinReputation => params.min_reputation = as_u64()?,
            Self::UnregisterCooldownSecs => params.unregister_cooldown_secs = as_u64()?,
            Self::ReputationSlashBps => params.reputation_slash_bps = bps()?,
            Self::VotingWindowSecs => params.voting_window_secs = window()?,
            Self::ChallengeWindowSecs => params.challenge_window_secs = window()?,
            Self::ApprovalThresholdBps => params.approval_threshold_bps = bps()?,
            Self::OutcomeTolerance => {
                if value > 100 {
                    return Err(invalid("tolerance above 100"));
                }
                params.outcome_tolerance = value as u8;
            }
            Self::JurySize => {
                params.jury_size = match u32::try_from(value) {
                    Ok(0) => return Err(invalid("jury needs at least one seat")),
                    Ok(n) => n,
                    Err(_) => return Err(invalid("exceeds u32")),
                }
            }
            Self::JuryVotingWindowSecs => params.jury_voting_window_secs = window()?,
            Self::ChallengeStake => params.challenge_stake = value,
            Self::ChallengerRewardBps => params.challenger_reward_bps = bps()?,
            Self::IssuanceMode => {
                params.issuance_mode = match value {
                    0 => IssuanceMode::Deferred,
                    1 => IssuanceMode::Optimistic,
                    _ => return Err(invalid("expected 0 (deferred) or 1 (optimistic)")),
                }
            }
        }
        tracing::info!(param = self.name(), value, "parameter changed");
        Ok(())
    }
}
