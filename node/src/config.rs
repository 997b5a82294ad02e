//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use verity_types::{Identity, ProtocolParams};
use verity_utils::LogFormat;

use crate::NodeError;

/// Configuration for a Verity node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Initial protocol parameters; governance may change them later.
    #[serde(default)]
    pub params: ProtocolParams,

    /// Token account receiving slashed stake and forfeited challenge stakes,
    /// and paying challenger rewards.
    #[serde(default = "default_treasury")]
    pub treasury: Identity,

    /// Token account holding verifier stakes.
    #[serde(default = "default_stake_custody")]
    pub stake_custody: Identity,

    /// Token account holding challenge stakes while a dispute is open.
    #[serde(default = "default_challenge_escrow")]
    pub challenge_escrow: Identity,

    /// Identities seeded with the admin role.
    #[serde(default)]
    pub admins: Vec<Identity>,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter, e.g. "info" or "debug,verity_arbitration=trace".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_treasury() -> Identity {
    Identity::new("treasury")
}

fn default_stake_custody() -> Identity {
    Identity::new("stake-custody")
}

fn default_challenge_escrow() -> Identity {
    Identity::new("challenge-escrow")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Install the global tracing subscriber described by this config.
    pub fn init_logging(&self) -> Result<(), NodeError> {
        verity_utils::try_init_logging(self.log_format, &self.log_level)
            .map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject configurations no node could run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if !self.admins.iter().any(Identity::is_valid) {
            return Err(NodeError::Config("at least one admin is required".into()));
        }
        let accounts = [&self.treasury, &self.stake_custody, &self.challenge_escrow];
        if accounts.iter().any(|a| !a.is_valid()) {
            return Err(NodeError::Config("custody accounts must be named".into()));
        }
        if self.treasury == self.stake_custody
            || self.treasury == self.challenge_escrow
            || self.stake_custody == self.challenge_escrow
        {
            return Err(NodeError::Config(
                "treasury, stake custody and challenge escrow must be distinct".into(),
            ));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            params: ProtocolParams::default(),
            treasury: default_treasury(),
            stake_custody: default_stake_custody(),
            challenge_escrow: default_challenge_escrow(),
            admins: Vec::new(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
