//! Methodology catalog.
//!
//! A methodology names the verification strategy that handles its claims.
//! It moves Proposed → Approved → Deprecated. Approval never touches the
//! routing table; `activate` is the separate step that hands the route to
//! the coordinator, and repeating it is harmless.

use crate::access::{AccessControl, Capability};
use crate::error::GovernanceError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use verity_types::{AuditEvent, Caller, Identity, MethodologyId, StrategyRef, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodologyStatus {
    Proposed,
    Approved,
    Deprecated,
}

impl fmt::Display for MethodologyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Methodology {
    pub id: MethodologyId,
    pub strategy: StrategyRef,
    pub status: MethodologyStatus,
    /// Where the methodology document lives.
    pub content_ref: String,
    /// Blake2b digest of the document, pinning the approved version.
    pub version_hash: [u8; 32],
    pub proposed_by: Identity,
    pub proposed_at: Timestamp,
    pub approved_by: Option<Identity>,
    /// Whether the route is currently live in the coordinator.
    pub activated: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MethodologyCatalog {
    methodologies: BTreeMap<MethodologyId, Methodology>,
    strategies: BTreeSet<StrategyRef>,
    #[serde(skip)]
    pending_events: Vec<AuditEvent>,
}

impl MethodologyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a strategy implementation available for methodologies to name.
    pub fn register_strategy(
        &mut self,
        access: &AccessControl,
        caller: &Caller,
        strategy: StrategyRef,
    ) -> Result<(), GovernanceError> {
        access.check(caller, Capability::RegisterStrategy)?;
        if !strategy.is_valid() {
            return Err(GovernanceError::UnknownStrategy(strategy.to_string()));
        }
        if self.strategies.contains(&strategy) {
            return Err(GovernanceError::StrategyExists(strategy.to_string()));
        }
        tracing::info!(%strategy, "strategy registered");
        self.pending_events.push(AuditEvent::StrategyRegistered {
            strategy: strategy.clone(),
        });
        self.strategies.insert(strategy);
        Ok(())
    }

    pub fn has_strategy(&self, strategy: &StrategyRef) -> bool {
        self.strategies.contains(strategy)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn propose(
        &mut self,
        access: &AccessControl,
        caller: &Caller,
        id: MethodologyId,
        strategy: StrategyRef,
        content_ref: impl Into<String>,
        content: &[u8],
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        access.check(caller, Capability::ProposeMethodology)?;
        let proposer = caller
            .identity()
            .cloned()
            .ok_or(GovernanceError::InvalidIdentity)?;
        if !id.is_valid() {
            return Err(GovernanceError::UnknownMethodology(id.to_string()));
        }
        if self.methodologies.contains_key(&id) {
            return Err(GovernanceError::MethodologyExists(id.to_string()));
        }
        if !self.strategies.contains(&strategy) {
            return Err(GovernanceError::UnknownStrategy(strategy.to_string()));
        }

        tracing::info!(methodology = %id, %strategy, "methodology proposed");
        self.pending_events.push(AuditEvent::MethodologyProposed {
            methodology: id.clone(),
            strategy: strategy.clone(),
        });
        self.methodologies.insert(
            id.clone(),
            Methodology {
                id,
                strategy,
                status: MethodologyStatus::Proposed,
                content_ref: content_ref.into(),
                version_hash: verity_crypto::version_hash(content),
                proposed_by: proposer,
                proposed_at: now,
                approved_by: None,
                activated: false,
            },
        );
        Ok(())
    }

    /// Approve a proposed methodology. The proposer cannot approve their
    /// own proposal.
    pub fn approve(
        &mut self,
        access: &AccessControl,
        caller: &Caller,
        id: &MethodologyId,
    ) -> Result<(), GovernanceError> {
        access.check(caller, Capability::ApproveMethodology)?;
        let approver = caller
            .identity()
            .cloned()
            .ok_or(GovernanceError::InvalidIdentity)?;
        let methodology = self.get_mut(id)?;
        expect_status(methodology, MethodologyStatus::Proposed)?;
        if methodology.proposed_by == approver {
            return Err(GovernanceError::SelfApproval(id.to_string()));
        }

        methodology.status = MethodologyStatus::Approved;
        methodology.approved_by = Some(approver);
        tracing::info!(methodology = %id, "methodology approved");
        self.pending_events.push(AuditEvent::MethodologyApproved {
            methodology: id.clone(),
        });
        Ok(())
    }

    /// Retire a methodology. Returns whether it was routed, in which case
    /// the caller must drop the route.
    pub fn deprecate(
        &mut self,
        access: &AccessControl,
        caller: &Caller,
        id: &MethodologyId,
    ) -> Result<bool, GovernanceError> {
        access.check(caller, Capability::DeprecateMethodology)?;
        let methodology = self.get_mut(id)?;
        if methodology.status == MethodologyStatus::Deprecated {
            return Err(wrong_status(methodology, "Proposed or Approved"));
        }

        let was_routed = methodology.activated;
        methodology.status = MethodologyStatus::Deprecated;
        methodology.activated = false;
        tracing::info!(methodology = %id, was_routed, "methodology deprecated");
        self.pending_events.push(AuditEvent::MethodologyDeprecated {
            methodology: id.clone(),
        });
        Ok(was_routed)
    }

    /// Return the route for an approved methodology. Activating an already
    /// active methodology returns the same route without a new event.
    pub fn activate(
        &mut self,
        access: &AccessControl,
        caller: &Caller,
        id: &MethodologyId,
    ) -> Result<StrategyRef, GovernanceError> {
        access.check(caller, Capability::ActivateMethodology)?;
        let methodology = self.get_mut(id)?;
        expect_status(methodology, MethodologyStatus::Approved)?;
        let strategy = methodology.strategy.clone();
        if !methodology.activated {
            methodology.activated = true;
            tracing::info!(methodology = %id, %strategy, "methodology activated");
            self.pending_events.push(AuditEvent::MethodologyActivated {
                methodology: id.clone(),
                strategy: strategy.clone(),
            });
        }
        Ok(strategy)
    }

    pub fn get(&self, id: &MethodologyId) -> Option<&Methodology> {
        self.methodologies.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Methodology> {
        self.methodologies.values()
    }

    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn get_mut(&mut self, id: &MethodologyId) -> Result<&mut Methodology, GovernanceError> {
        self.methodologies
            .get_mut(id)
            .ok_or_else(|| GovernanceError::UnknownMethodology(id.to_string()))
    }
}

fn expect_status(m: &Methodology, expected: MethodologyStatus) -> Result<(), GovernanceError> {
    if m.status == expected {
        Ok(())
    } else {
        Err(wrong_status(m, &expected.to_string()))
    }
}

fn wrong_status(m: &Methodology, expected: &str) -> GovernanceError {
    GovernanceError::WrongStatus {
        id: m.id.to_string(),
        status: m.status.to_string(),
        expected: expected.to_string(),
    }
}
