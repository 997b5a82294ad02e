//! Claim intake, routing and issuance.

use crate::collaborators::{CreditIssuer, ProjectCatalog, ProjectStatus};
use crate::error::CoordinatorError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use verity_governance::{AccessControl, Capability};
use verity_types::{
    AuditEvent, Caller, ClaimId, Identity, MethodologyId, ProjectId, ProtocolParams, StrategyRef,
    TaskId, Timestamp,
};
use verity_verification::{ClaimRequest, Fulfillment, Provisional, VerificationStrategy};

type ClaimKey = (ClaimId, MethodologyId);

/// Everything the coordinator knows about one `(claim, methodology)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub project: ProjectId,
    pub claim_id: ClaimId,
    pub methodology: MethodologyId,
    pub evidence_ref: String,
    pub requested_amount: u128,
    /// `None` for claims settled by an administrative override.
    pub task: Option<TaskId>,
    pub strategy: Option<StrategyRef>,
    /// Credits currently minted for this claim.
    pub minted: u128,
    pub fulfilled: bool,
    pub submitted_at: Timestamp,
}

impl ClaimRecord {
    fn key(&self) -> ClaimKey {
        (self.claim_id.clone(), self.methodology.clone())
    }
}

/// Issuer instructions for one fulfillment, computed before any call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuancePlan {
    pub project: ProjectId,
    /// Project owner; resolved only when something is issued.
    pub beneficiary: Option<Identity>,
    /// Amount to reverse before issuing.
    pub reverse: u128,
    pub issue: u128,
    /// Minted total once the plan is carried out.
    pub minted_after: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorSnapshot {
    pub routes: Vec<(MethodologyId, StrategyRef)>,
    pub claims: Vec<ClaimRecord>,
}

#[derive(Default)]
pub struct ClaimCoordinator {
    routes: BTreeMap<MethodologyId, StrategyRef>,
    claims: BTreeMap<ClaimKey, ClaimRecord>,
    tasks: BTreeMap<TaskId, ClaimKey>,
    pending_events: Vec<AuditEvent>,
}

impl ClaimCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(snapshot: CoordinatorSnapshot) -> Self {
        let tasks = snapshot
            .claims
            .iter()
            .filter_map(|c| c.task.map(|t| (t, c.key())))
            .collect();
        Self {
            routes: snapshot.routes.into_iter().collect(),
            claims: snapshot.claims.into_iter().map(|c| (c.key(), c)).collect(),
            tasks,
            pending_events: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            routes: self
                .routes
                .iter()
                .map(|(m, s)| (m.clone(), s.clone()))
                .collect(),
            claims: self.claims.values().cloned().collect(),
        }
    }

    // ── Routing ──────────────────────────────────────────────────────────

    /// Route a methodology to a strategy. Returns whether anything changed.
    pub fn set_route(&mut self, methodology: MethodologyId, strategy: StrategyRef) -> bool {
        if self.routes.get(&methodology) == Some(&strategy) {
            return false;
        }
        tracing::info!(%methodology, %strategy, "route set");
        self.routes.insert(methodology, strategy);
        true
    }

    pub fn remove_route(&mut self, methodology: &MethodologyId) -> Option<StrategyRef> {
        let removed = self.routes.remove(methodology);
        if removed.is_some() {
            tracing::info!(%methodology, "route removed");
        }
        removed
    }

    pub fn route(&self, methodology: &MethodologyId) -> Option<&StrategyRef> {
        self.routes.get(methodology)
    }

    pub fn strategy_for_task(&self, task: &TaskId) -> Option<&StrategyRef> {
        self.record_for_task(task)
            .and_then(|record| record.strategy.as_ref())
    }

    pub fn record(&self, claim_id: &ClaimId, methodology: &MethodologyId) -> Option<&ClaimRecord> {
        self.claims.get(&(claim_id.clone(), methodology.clone()))
    }

    pub fn record_for_task(&self, task: &TaskId) -> Option<&ClaimRecord> {
        self.tasks.get(task).and_then(|key| self.claims.get(key))
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Run every submission check and return the strategy to route to.
    pub fn check_submission(
        &self,
        request: &ClaimRequest,
        catalog: &dyn ProjectCatalog,
    ) -> Result<StrategyRef, CoordinatorError> {
        if catalog.status(&request.project) != Some(ProjectStatus::Active) {
            return Err(CoordinatorError::ProjectNotActive(request.project.to_string()));
        }
        if request.requested_amount == 0 {
            return Err(CoordinatorError::ZeroAmount);
        }
        if let Some(existing) = self.record(&request.claim_id, &request.methodology) {
            return Err(if existing.fulfilled {
                CoordinatorError::AlreadyFulfilled(request.claim_id.to_string())
            } else {
                CoordinatorError::ClaimInFlight(request.claim_id.to_string())
            });
        }
        self.routes
            .get(&request.methodology)
            .cloned()
            .ok_or_else(|| CoordinatorError::MethodologyNotRouted(request.methodology.to_string()))
    }

    /// Accept a claim and open a task for it on `strategy`, which must be
    /// the strategy routed for the claim's methodology.
    pub fn submit_claim(
        &mut self,
        request: ClaimRequest,
        strategy: &mut dyn VerificationStrategy,
        catalog: &dyn ProjectCatalog,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<TaskId, CoordinatorError> {
        let route = self.check_submission(&request, catalog)?;
        if strategy.strategy_ref() != &route {
            return Err(CoordinatorError::Unauthorized(
                strategy.strategy_ref().to_string(),
            ));
        }

        let task = strategy.open_task(request.clone(), params, now)?;
        let record = ClaimRecord {
            project: request.project,
            claim_id: request.claim_id,
            methodology: request.methodology,
            evidence_ref: request.evidence_ref,
            requested_amount: request.requested_amount,
            task: Some(task),
            strategy: Some(route),
            minted: 0,
            fulfilled: false,
            submitted_at: now,
        };
        tracing::info!(
            task = %task,
            project = %record.project,
            claim = %record.claim_id,
            methodology = %record.methodology,
            amount = record.requested_amount,
            "claim submitted"
        );
        self.pending_events.push(AuditEvent::ClaimSubmitted {
            task,
            project: record.project.clone(),
            claim: record.claim_id.clone(),
            methodology: record.methodology.clone(),
            requested_amount: record.requested_amount,
        });
        self.tasks.insert(task, record.key());
        self.claims.insert(record.key(), record);
        Ok(task)
    }

    // ── Strategy callbacks ───────────────────────────────────────────────

    fn authorize(&self, caller: &Caller, record: &ClaimRecord) -> Result<(), CoordinatorError> {
        match (caller, &record.strategy) {
            (Caller::Strategy(s), Some(routed)) if s == routed => Ok(()),
            _ => {
                tracing::warn!(%caller, claim = %record.claim_id, "rejected strategy callback");
                Err(CoordinatorError::Unauthorized(caller.to_string()))
            }
        }
    }

    fn beneficiary(
        catalog: &dyn ProjectCatalog,
        project: &ProjectId,
    ) -> Result<Identity, CoordinatorError> {
        catalog
            .owner(project)
            .ok_or_else(|| CoordinatorError::NoProjectOwner(project.to_string()))
    }

    /// Mint for a provisional outcome under optimistic issuance. Returns
    /// the amount minted, zero when nothing is due yet.
    pub fn on_provisional(
        &mut self,
        caller: &Caller,
        provisional: &Provisional,
        issuer: &mut dyn CreditIssuer,
        catalog: &dyn ProjectCatalog,
    ) -> Result<u128, CoordinatorError> {
        let record = self
            .record_for_task(&provisional.task)
            .ok_or_else(|| CoordinatorError::UnknownClaim(provisional.task.to_string()))?;
        self.authorize(caller, record)?;
        if record.fulfilled {
            return Err(CoordinatorError::AlreadyFulfilled(record.claim_id.to_string()));
        }
        if !provisional.issue_now {
            return Ok(0);
        }

        let amount = provisional
            .outcome
            .apply(record.requested_amount)
            .ok_or(CoordinatorError::Overflow)?;
        if amount == 0 {
            return Ok(0);
        }
        let minted = record
            .minted
            .checked_add(amount)
            .ok_or(CoordinatorError::Overflow)?;
        let beneficiary = Self::beneficiary(catalog, &record.project)?;
        let project = record.project.clone();
        let key = record.key();

        issuer.issue(&beneficiary, &project, amount, &provisional.evidence_ref)?;

        if let Some(record) = self.claims.get_mut(&key) {
            record.minted = minted;
        }
        tracing::info!(task = %provisional.task, %project, amount, "provisional credits issued");
        self.pending_events.push(AuditEvent::CreditsIssued {
            task: Some(provisional.task),
            project,
            beneficiary,
            amount,
        });
        Ok(amount)
    }

    /// Check a fulfillment and work out the issuer calls it implies.
    pub fn plan_fulfillment(
        &self,
        caller: &Caller,
        fulfillment: &Fulfillment,
        catalog: &dyn ProjectCatalog,
    ) -> Result<IssuancePlan, CoordinatorError> {
        let record = self
            .record(&fulfillment.claim_id, &fulfillment.methodology)
            .filter(|r| r.project == fulfillment.project && r.task == Some(fulfillment.task))
            .ok_or_else(|| CoordinatorError::UnknownClaim(fulfillment.claim_id.to_string()))?;
        self.authorize(caller, record)?;
        if record.fulfilled {
            return Err(CoordinatorError::AlreadyFulfilled(record.claim_id.to_string()));
        }

        let target = fulfillment
            .outcome
            .apply(record.requested_amount)
            .ok_or(CoordinatorError::Overflow)?;
        let (reverse, issue) = if fulfillment.is_reversal {
            (record.minted, target)
        } else {
            (0, target.saturating_sub(record.minted))
        };
        let minted_after = if fulfillment.is_reversal {
            target
        } else {
            record.minted.max(target)
        };
        let beneficiary = if issue > 0 {
            Some(Self::beneficiary(catalog, &record.project)?)
        } else {
            None
        };

        Ok(IssuancePlan {
            project: record.project.clone(),
            beneficiary,
            reverse,
            issue,
            minted_after,
        })
    }

    /// Strategy callback for a final outcome. Fulfills the claim exactly
    /// once and tells the issuer what to mint or reverse.
    pub fn on_fulfilled(
        &mut self,
        caller: &Caller,
        fulfillment: &Fulfillment,
        issuer: &mut dyn CreditIssuer,
        catalog: &dyn ProjectCatalog,
    ) -> Result<IssuancePlan, CoordinatorError> {
        let plan = self.plan_fulfillment(caller, fulfillment, catalog)?;

        if plan.reverse > 0 {
            issuer.reverse(&plan.project, plan.reverse)?;
        }
        if let (Some(beneficiary), true) = (&plan.beneficiary, plan.issue > 0) {
            if let Err(e) =
                issuer.issue(beneficiary, &plan.project, plan.issue, &fulfillment.evidence_ref)
            {
                if plan.reverse > 0 {
                    // Re-mint what was just reversed so the issuer matches our record.
                    if let Err(undo) = issuer.issue(
                        beneficiary,
                        &plan.project,
                        plan.reverse,
                        &fulfillment.evidence_ref,
                    ) {
                        tracing::error!(project = %plan.project, error = %undo, "failed to restore reversed credits");
                    }
                }
                return Err(e.into());
            }
        }

        let key = (fulfillment.claim_id.clone(), fulfillment.methodology.clone());
        if let Some(record) = self.claims.get_mut(&key) {
            record.fulfilled = true;
            record.minted = plan.minted_after;
        }
        tracing::info!(
            task = %fulfillment.task,
            outcome = %fulfillment.outcome,
            reversed = plan.reverse,
            issued = plan.issue,
            "claim fulfilled"
        );
        if plan.reverse > 0 {
            self.pending_events.push(AuditEvent::CreditsReversed {
                task: Some(fulfillment.task),
                project: plan.project.clone(),
                amount: plan.reverse,
            });
        }
        if let (Some(beneficiary), true) = (&plan.beneficiary, plan.issue > 0) {
            self.pending_events.push(AuditEvent::CreditsIssued {
                task: Some(fulfillment.task),
                project: plan.project.clone(),
                beneficiary: beneficiary.clone(),
                amount: plan.issue,
            });
        }
        Ok(plan)
    }

    // ── Administration ───────────────────────────────────────────────────

    /// Mint `request.requested_amount` for a claim without verification
    /// and mark it fulfilled. A task already in flight for the claim can no
    /// longer be fulfilled afterwards.
    pub fn admin_override(
        &mut self,
        access: &AccessControl,
        caller: &Caller,
        request: ClaimRequest,
        issuer: &mut dyn CreditIssuer,
        catalog: &dyn ProjectCatalog,
        now: Timestamp,
    ) -> Result<(), CoordinatorError> {
        access.check(caller, Capability::AdminOverride)?;
        if catalog.status(&request.project) != Some(ProjectStatus::Active) {
            return Err(CoordinatorError::ProjectNotActive(request.project.to_string()));
        }
        if request.requested_amount == 0 {
            return Err(CoordinatorError::ZeroAmount);
        }
        let existing = self.record(&request.claim_id, &request.methodology);
        if existing.is_some_and(|r| r.fulfilled) {
            return Err(CoordinatorError::AlreadyFulfilled(request.claim_id.to_string()));
        }
        if existing.is_some_and(|r| r.project != request.project) {
            return Err(CoordinatorError::UnknownClaim(request.claim_id.to_string()));
        }
        let amount = request.requested_amount;
        let minted = existing
            .map_or(0, |r| r.minted)
            .checked_add(amount)
            .ok_or(CoordinatorError::Overflow)?;
        let beneficiary = Self::beneficiary(catalog, &request.project)?;
        let by = caller
            .identity()
            .cloned()
            .ok_or_else(|| CoordinatorError::Unauthorized(caller.to_string()))?;

        issuer.issue(&beneficiary, &request.project, amount, &request.evidence_ref)?;

        let task = existing.and_then(|r| r.task);
        let key = (request.claim_id.clone(), request.methodology.clone());
        let record = self.claims.entry(key).or_insert_with(|| ClaimRecord {
            project: request.project.clone(),
            claim_id: request.claim_id.clone(),
            methodology: request.methodology.clone(),
            evidence_ref: request.evidence_ref.clone(),
            requested_amount: amount,
            task: None,
            strategy: None,
            minted: 0,
            fulfilled: false,
            submitted_at: now,
        });
        record.fulfilled = true;
        record.minted = minted;

        tracing::warn!(%by, project = %request.project, claim = %request.claim_id, amount, "administrative override");
        self.pending_events.push(AuditEvent::AdminOverride {
            by,
            project: request.project.clone(),
            claim: request.claim_id,
            methodology: request.methodology,
            amount,
        });
        self.pending_events.push(AuditEvent::CreditsIssued {
            task,
            project: request.project,
            beneficiary,
            amount,
        });
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
