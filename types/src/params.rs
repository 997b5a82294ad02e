//! Protocol parameters: stake and reputation floors, window lengths, jury
//! sizing and the economic knobs of challenges and slashing.
//!
//! Every field is adjustable at runtime through the governance parameter
//! setters. Deadlines already recorded on a task or dispute are never moved
//! by a later change.

use serde::{Deserialize, Serialize};

/// Denominator for every basis-point field (10 000 = 100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// When credits for a provisional outcome are minted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuanceMode {
    /// Mint only once the task is finalized or overturned.
    #[default]
    Deferred,
    /// Mint as soon as the provisional outcome is set; an overturn reverses
    /// the minted amount.
    Optimistic,
}

/// All protocol parameters held by a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    // ── Stake & reputation ───────────────────────────────────────────────
    /// Minimum stake (raw token units) to register, and to stay eligible
    /// for jury duty.
    #[serde(with = "amount")]
    pub min_stake: u128,

    /// Minimum reputation score required to register.
    pub min_reputation: u64,

    /// Delay between an unregister request and the release of funds.
    pub unregister_cooldown_secs: u64,

    /// Fraction of a slashed verifier's reputation that is removed
    /// (basis points, 10 000 = all of it).
    pub reputation_slash_bps: u32,

    // ── Voting ───────────────────────────────────────────────────────────
    /// Length of the first-round voting window, from task creation.
    pub voting_window_secs: u64,

    /// Length of the challenge window, from the provisional outcome.
    pub challenge_window_secs: u64,

    /// Weighted approval needed for a positive outcome in threshold mode
    /// (basis points).
    pub approval_threshold_bps: u32,

    /// Maximum distance (in outcome points) between a vote and the final
    /// outcome before the voter counts as wrong. Also the distance within
    /// which a jury verdict upholds the provisional outcome.
    pub outcome_tolerance: u8,

    // ── Arbitration ──────────────────────────────────────────────────────
    /// Number of jurors drawn per dispute.
    pub jury_size: u32,

    /// Length of the jury voting window, from jury selection.
    pub jury_voting_window_secs: u64,

    /// Fixed stake a challenger must post.
    #[serde(with = "amount")]
    pub challenge_stake: u128,

    /// Reward for a successful challenger, on top of the refunded stake
    /// (basis points of the stake, paid by the treasury).
    pub challenger_reward_bps: u32,

    // ── Issuance ─────────────────────────────────────────────────────────
    pub issuance_mode: IssuanceMode,
}

impl ProtocolParams {
    /// The intended configuration for a live deployment.
    pub fn verity_defaults() -> Self {
        Self {
            min_stake: 100,
            min_reputation: 50,
            unregister_cooldown_secs: 7 * 24 * 3600, // 7 days
            reputation_slash_bps: BPS_DENOMINATOR,    // full reputation

            voting_window_secs: 3 * 24 * 3600,    // 3 days
            challenge_window_secs: 2 * 24 * 3600, // 2 days
            approval_threshold_bps: 6000,         // 60%
            outcome_tolerance: 10,

            jury_size: 3,
            jury_voting_window_secs: 2 * 24 * 3600, // 2 days
            challenge_stake: 500,
            challenger_reward_bps: 5000, // 50% of the stake

            issuance_mode: IssuanceMode::Deferred,
        }
    }

    /// Short windows for local development and tests.
    pub fn dev_defaults() -> Self {
        Self {
            unregister_cooldown_secs: 600,
            voting_window_secs: 300,
            challenge_window_secs: 300,
            jury_voting_window_secs: 300,
            ..Self::verity_defaults()
        }
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self::verity_defaults()
    }
}

/// Token amounts in human-readable formats are written as 64-bit integers
/// when they fit, since TOML has no 128-bit integers. Binary formats keep
/// the full width.
mod amount {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        match u64::try_from(*value) {
            Ok(small) if serializer.is_human_readable() => serializer.serialize_u64(small),
            _ => serializer.serialize_u128(*value),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        u128::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_defaults_only_shorten_windows() {
        let live = ProtocolParams::verity_defaults();
        let dev = ProtocolParams::dev_defaults();
        assert_eq!(dev.min_stake, live.min_stake);
        assert_eq!(dev.jury_size, live.jury_size);
        assert!(dev.voting_window_secs < live.voting_window_secs);
        assert!(dev.challenge_window_secs < live.challenge_window_secs);
    }

    #[test]
    fn params_bincode_roundtrip() {
        let params = ProtocolParams {
            issuance_mode: IssuanceMode::Optimistic,
            ..ProtocolParams::default()
        };
        let bytes = bincode::serialize(&params).unwrap();
        let decoded: ProtocolParams = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn params_toml_roundtrip() {
        let params = ProtocolParams::dev_defaults();
        let text = toml::to_string(&params).unwrap();
        assert!(text.contains("min_stake = 100"));
        let decoded: ProtocolParams = toml::from_str(&text).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let decoded: ProtocolParams =
            toml::from_str("jury_size = 5\nissuance_mode = \"optimistic\"").unwrap();
        assert_eq!(decoded.jury_size, 5);
        assert_eq!(decoded.issuance_mode, IssuanceMode::Optimistic);
        assert_eq!(decoded.challenge_stake, 500);
    }
}
