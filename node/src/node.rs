//! The Verity node: owns every engine and every collaborator, and
//! sequences the operations that span more than one engine.
//!
//! Each mutating entry point takes `&mut self`, so one call completes
//! before the next begins. Cross-engine operations follow the same shape:
//! preview every engine involved, perform the collaborator calls, then
//! commit. Engine events are drained into the audit log after each step.

use std::collections::BTreeMap;

use verity_arbitration::{ArbitrationCouncil, ArbitrationError, DisputeStatus, Resolution};
use verity_coordinator::{ClaimCoordinator, CreditIssuer, IssuancePlan, ProjectCatalog};
use verity_governance::{
    AccessControl, Capability, GovernableParam, MethodologyCatalog, Role,
};
use verity_randomness::RandomnessService;
use verity_staking::{ReputationRegistry, SlashReceipt, StakeLedger, StakeToken, StakingError};
use verity_types::{
    AuditEvent, Ballot, Caller, Clock, Identity, MethodologyId, ProtocolParams, RequestId,
    StrategyRef, TaskId, Timestamp,
};
use verity_verification::{
    ClaimRequest, Fulfillment, OptimisticVoter, Provisional, Task, TaskStatus,
    VerificationStrategy, Verdict,
};

use crate::audit::AuditLog;
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::snapshot::{EngineState, NodeSnapshot};

type Strategies = BTreeMap<StrategyRef, Box<dyn VerificationStrategy>>;

/// The external systems a node talks to.
pub struct Collaborators {
    pub clock: Box<dyn Clock>,
    pub token: Box<dyn StakeToken>,
    pub reputation: Box<dyn ReputationRegistry>,
    pub randomness: Box<dyn RandomnessService>,
    pub issuer: Box<dyn CreditIssuer>,
    pub projects: Box<dyn ProjectCatalog>,
}

/// Everything a dispute resolution did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisputeOutcome {
    pub task: TaskId,
    pub verdict: Verdict,
    /// Challenge-stake settlement; `None` when an earlier call already
    /// settled it and this call only finished the remaining steps.
    pub resolution: Option<Resolution>,
    /// Voters who lost stake.
    pub slashed: Vec<SlashReceipt>,
    /// `None` when the claim had already been fulfilled by an override.
    pub issuance: Option<IssuancePlan>,
}

pub struct VerityNode {
    config: NodeConfig,
    params: ProtocolParams,
    access: AccessControl,
    catalog: MethodologyCatalog,
    ledger: StakeLedger,
    coordinator: ClaimCoordinator,
    council: ArbitrationCouncil,
    strategies: Strategies,
    collaborators: Collaborators,
    audit: AuditLog,
}

fn instance<'a>(
    strategies: &'a mut Strategies,
    strategy: &StrategyRef,
) -> Result<&'a mut Box<dyn VerificationStrategy>, NodeError> {
    strategies
        .get_mut(strategy)
        .ok_or_else(|| NodeError::UnknownStrategy(strategy.to_string()))
}

impl VerityNode {
    pub fn new(config: NodeConfig, collaborators: Collaborators) -> Result<Self, NodeError> {
        config.validate()?;
        let mut ledger = StakeLedger::new(config.stake_custody.clone(), config.treasury.clone());
        ledger.authorize_slasher(Caller::Council);
        tracing::info!(
            admins = config.admins.len(),
            treasury = %config.treasury,
            issuance = ?config.params.issuance_mode,
            "node initialised"
        );
        Ok(Self {
            params: config.params.clone(),
            access: AccessControl::new(config.admins.iter().cloned()),
            catalog: MethodologyCatalog::new(),
            ledger,
            coordinator: ClaimCoordinator::new(),
            council: ArbitrationCouncil::new(
                config.challenge_escrow.clone(),
                config.treasury.clone(),
            ),
            strategies: BTreeMap::new(),
            collaborators,
            audit: AuditLog::new(),
            config,
        })
    }

    /// Rebuild a node from a snapshot. Strategy state is restored into
    /// [`OptimisticVoter`] instances.
    pub fn restore(
        config: NodeConfig,
        snapshot: NodeSnapshot,
        collaborators: Collaborators,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let NodeSnapshot { params, state } = snapshot;
        let strategies: Strategies = state
            .strategies
            .into_iter()
            .map(|s| {
                let voter = OptimisticVoter::restore(s);
                let key = voter.strategy_ref().clone();
                (key, Box::new(voter) as Box<dyn VerificationStrategy>)
            })
            .collect();
        let mut ledger = state.ledger;
        ledger.authorize_slasher(Caller::Council);
        tracing::info!(
            strategies = strategies.len(),
            verifiers = ledger.account_count(),
            audit_records = state.audit.len(),
            "node restored from snapshot"
        );
        Ok(Self {
            config,
            params,
            access: state.access,
            catalog: state.catalog,
            ledger,
            coordinator: ClaimCoordinator::restore(state.coordinator),
            council: ArbitrationCouncil::restore(state.council),
            strategies,
            collaborators,
            audit: state.audit,
        })
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            params: self.params.clone(),
            state: EngineState {
                access: self.access.clone(),
                catalog: self.catalog.clone(),
                ledger: self.ledger.clone(),
                coordinator: self.coordinator.snapshot(),
                council: self.council.snapshot(),
                strategies: self.strategies.values().map(|s| s.snapshot()).collect(),
                audit: self.audit.clone(),
            },
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    pub fn now(&self) -> Timestamp {
        self.collaborators.clock.now()
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn catalog(&self) -> &MethodologyCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &StakeLedger {
        &self.ledger
    }

    pub fn coordinator(&self) -> &ClaimCoordinator {
        &self.coordinator
    }

    pub fn council(&self) -> &ArbitrationCouncil {
        &self.council
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn strategy(&self, strategy: &StrategyRef) -> Option<&dyn VerificationStrategy> {
        self.strategies.get(strategy).map(|s| s.as_ref())
    }

    pub fn task(&self, task: &TaskId) -> Option<&Task> {
        let strategy = self.coordinator.strategy_for_task(task)?;
        self.strategies.get(strategy)?.task(task)
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    // ── Plumbing ─────────────────────────────────────────────────────────

    fn ensure_running(&self) -> Result<(), NodeError> {
        if self.access.is_paused() {
            tracing::warn!("call rejected while paused");
            return Err(NodeError::Paused);
        }
        Ok(())
    }

    /// Run a mutating operation: refuse while paused, then record whatever
    /// the engines committed, whether or not the operation succeeded.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut Self, Timestamp) -> Result<T, NodeError>,
    ) -> Result<T, NodeError> {
        self.ensure_running()?;
        self.administer(op)
    }

    /// Like [`Self::mutate`], but also available while paused.
    fn administer<T>(
        &mut self,
        op: impl FnOnce(&mut Self, Timestamp) -> Result<T, NodeError>,
    ) -> Result<T, NodeError> {
        let now = self.collaborators.clock.now();
        let result = op(self, now);
        self.record(now);
        result
    }

    fn record(&mut self, now: Timestamp) {
        let mut events = self.access.drain_events();
        events.extend(self.catalog.drain_events());
        events.extend(self.ledger.drain_events());
        events.extend(self.council.drain_events());
        for strategy in self.strategies.values_mut() {
            events.extend(strategy.drain_events());
        }
        events.extend(self.coordinator.drain_events());
        self.audit.extend(now, events);
    }

    fn routed_strategy(&self, task: &TaskId) -> Result<StrategyRef, NodeError> {
        self.coordinator
            .strategy_for_task(task)
            .cloned()
            .ok_or_else(|| NodeError::UnknownTask(task.to_string()))
    }

    fn claim_fulfilled(&self, fulfillment: &Fulfillment) -> bool {
        self.coordinator
            .record(&fulfillment.claim_id, &fulfillment.methodology)
            .is_some_and(|r| r.fulfilled)
    }

    // ── Claim lifecycle ──────────────────────────────────────────────────

    /// Submit a claim and open a task on the strategy routed for its
    /// methodology.
    pub fn submit_claim(&mut self, request: ClaimRequest) -> Result<TaskId, NodeError> {
        self.mutate(|node, now| {
            let projects = node.collaborators.projects.as_ref();
            let route = node.coordinator.check_submission(&request, projects)?;
            let strategy = instance(&mut node.strategies, &route)?;
            let task = node.coordinator.submit_claim(
                request,
                strategy.as_mut(),
                projects,
                &node.params,
                now,
            )?;
            Ok(task)
        })
    }

    pub fn submit_vote(
        &mut self,
        task: &TaskId,
        voter: &Identity,
        ballot: Ballot,
    ) -> Result<(), NodeError> {
        self.mutate(|node, now| {
            let route = node.routed_strategy(task)?;
            instance(&mut node.strategies, &route)?.submit_vote(
                task,
                voter,
                ballot,
                &node.ledger,
                node.collaborators.reputation.as_ref(),
                now,
            )?;
            Ok(())
        })
    }

    /// Tally the votes once the voting window has elapsed. Under optimistic
    /// issuance the provisional amount is minted before the task commits.
    pub fn propose_resolution(&mut self, task: &TaskId) -> Result<Provisional, NodeError> {
        self.mutate(|node, now| {
            let route = node.routed_strategy(task)?;
            let caller = Caller::Strategy(route.clone());
            let provisional =
                instance(&mut node.strategies, &route)?.preview_resolution(task, &node.params, now)?;
            node.coordinator.on_provisional(
                &caller,
                &provisional,
                node.collaborators.issuer.as_mut(),
                node.collaborators.projects.as_ref(),
            )?;
            let provisional =
                instance(&mut node.strategies, &route)?.propose_resolution(task, &node.params, now)?;
            Ok(provisional)
        })
    }

    /// Finalize an unchallenged task once its challenge window has elapsed
    /// and fulfil its claim.
    pub fn finalize(&mut self, task: &TaskId) -> Result<Fulfillment, NodeError> {
        self.mutate(|node, now| {
            let route = node.routed_strategy(task)?;
            let caller = Caller::Strategy(route.clone());
            let fulfillment = instance(&mut node.strategies, &route)?.preview_finalize(task, now)?;
            if node.claim_fulfilled(&fulfillment) {
                tracing::warn!(task = %task, claim = %fulfillment.claim_id, "claim already fulfilled by override, finalizing without issuance");
            } else {
                node.coordinator.on_fulfilled(
                    &caller,
                    &fulfillment,
                    node.collaborators.issuer.as_mut(),
                    node.collaborators.projects.as_ref(),
                )?;
            }
            let fulfillment =
                instance(&mut node.strategies, &route)?.finalize_verification(task, now)?;
            Ok(fulfillment)
        })
    }

    /// Challenge a provisional outcome inside its challenge window. Posts
    /// the challenge stake to escrow and requests jury randomness.
    pub fn challenge(&mut self, task: &TaskId, challenger: &Identity) -> Result<RequestId, NodeError> {
        self.mutate(|node, now| {
            let route = node.routed_strategy(task)?;
            let ticket =
                instance(&mut node.strategies, &route)?.preview_challenge(task, challenger, now)?;
            let request = node.council.create_dispute(
                &ticket,
                node.collaborators.token.as_mut(),
                node.collaborators.randomness.as_mut(),
                &node.params,
                now,
            )?;
            instance(&mut node.strategies, &route)?.challenge_verification(task, challenger, now)?;
            Ok(request)
        })
    }

    // ── Arbitration ──────────────────────────────────────────────────────

    /// Randomness callback: seat the jury for the dispute behind `request`.
    pub fn on_random_words(
        &mut self,
        request: RequestId,
        words: &[[u8; 32]],
    ) -> Result<Vec<Identity>, NodeError> {
        self.mutate(|node, now| {
            let jury = node
                .council
                .on_random_words(request, words, &node.ledger, &node.params, now)
                .inspect_err(|e| tracing::warn!(%request, error = %e, "randomness callback rejected"))?;
            Ok(jury)
        })
    }

    /// Re-request jury randomness for a dispute still awaiting its jury.
    pub fn request_jury(&mut self, task: &TaskId) -> Result<RequestId, NodeError> {
        self.mutate(|node, _| {
            let request = node.council.request_jury(
                task,
                node.collaborators.randomness.as_mut(),
                &node.params,
            )?;
            Ok(request)
        })
    }

    pub fn jury_vote(
        &mut self,
        task: &TaskId,
        juror: &Identity,
        ballot: Ballot,
    ) -> Result<(), NodeError> {
        self.mutate(|node, now| {
            node.council.vote(
                task,
                juror,
                ballot,
                node.collaborators.reputation.as_ref(),
                now,
            )?;
            Ok(())
        })
    }

    /// Resolve a dispute once its jury window has elapsed: settle the
    /// challenge stake, slash dissenting voters, fulfil the claim and
    /// report the verdict to the strategy.
    ///
    /// If a collaborator fails after the stake was settled, calling again
    /// resumes from the step that failed.
    pub fn resolve_dispute(&mut self, task: &TaskId) -> Result<DisputeOutcome, NodeError> {
        self.mutate(|node, now| {
            let dispute = node
                .council
                .dispute(task)
                .ok_or_else(|| ArbitrationError::UnknownDispute(task.to_string()))?;
            let route = dispute.strategy.clone();
            let caller = Caller::Strategy(route.clone());

            let (verdict, resolution) = match (dispute.status, dispute.verdict) {
                (DisputeStatus::Resolved, Some(verdict)) => {
                    let status = instance(&mut node.strategies, &route)?
                        .task(task)
                        .map(|t| t.status);
                    if status != Some(TaskStatus::Challenged) {
                        return Err(ArbitrationError::AlreadyResolved(task.to_string()).into());
                    }
                    tracing::info!(task = %task, "resuming settlement of resolved dispute");
                    (verdict, None)
                }
                _ => {
                    let preview = node.council.preview_resolution(
                        task,
                        node.collaborators.token.as_ref(),
                        &node.params,
                        now,
                    )?;
                    let settlement = instance(&mut node.strategies, &route)?
                        .preview_arbitration_result(
                            &Caller::Council,
                            task,
                            preview.verdict,
                            &node.params,
                        )?;
                    if !node.claim_fulfilled(&settlement.fulfillment) {
                        node.coordinator.plan_fulfillment(
                            &caller,
                            &settlement.fulfillment,
                            node.collaborators.projects.as_ref(),
                        )?;
                    }
                    let resolution = node.council.resolve_dispute(
                        task,
                        node.collaborators.token.as_mut(),
                        &node.params,
                        now,
                    )?;
                    node.record(now);
                    (resolution.verdict, Some(resolution))
                }
            };

            let settlement = instance(&mut node.strategies, &route)?.preview_arbitration_result(
                &Caller::Council,
                task,
                verdict,
                &node.params,
            )?;

            let mut slashed = Vec::new();
            for voter in &settlement.slash {
                if node.council.dispute(task).is_some_and(|d| d.is_slashed(voter)) {
                    continue;
                }
                if node.ledger.account(voter).is_none() {
                    tracing::warn!(task = %task, %voter, "dissenting voter already unregistered");
                    node.council.record_slash(task, voter)?;
                    continue;
                }
                let receipt = node.ledger.slash(
                    &Caller::Council,
                    voter,
                    Some(*task),
                    node.collaborators.token.as_mut(),
                    node.collaborators.reputation.as_mut(),
                    &node.params,
                )?;
                node.council.record_slash(task, voter)?;
                if receipt.stake > 0 {
                    slashed.push(receipt);
                }
            }
            node.record(now);

            let issuance = if node.claim_fulfilled(&settlement.fulfillment) {
                tracing::warn!(task = %task, "claim already fulfilled by override, no issuance");
                None
            } else {
                Some(node.coordinator.on_fulfilled(
                    &caller,
                    &settlement.fulfillment,
                    node.collaborators.issuer.as_mut(),
                    node.collaborators.projects.as_ref(),
                )?)
            };
            node.record(now);

            instance(&mut node.strategies, &route)?.process_arbitration_result(
                &Caller::Council,
                task,
                verdict,
                &node.params,
            )?;

            Ok(DisputeOutcome {
                task: *task,
                verdict,
                resolution,
                slashed,
                issuance,
            })
        })
    }

    // ── Verifier stake ───────────────────────────────────────────────────

    pub fn register_verifier(&mut self, verifier: &Identity, stake: u128) -> Result<(), NodeError> {
        self.mutate(|node, now| {
            node.ledger.register(
                verifier,
                stake,
                node.collaborators.token.as_mut(),
                node.collaborators.reputation.as_ref(),
                &node.params,
                now,
            )?;
            Ok(())
        })
    }

    /// Returns the time from which [`Self::unregister_verifier`] succeeds.
    pub fn initiate_unregister(&mut self, verifier: &Identity) -> Result<Timestamp, NodeError> {
        self.mutate(|node, now| Ok(node.ledger.initiate_unregister(verifier, &node.params, now)?))
    }

    /// Release a verifier's stake after the cooldown. Refused while any of
    /// their votes sits on a task that can still be overturned.
    pub fn unregister_verifier(&mut self, verifier: &Identity) -> Result<u128, NodeError> {
        self.mutate(|node, now| {
            if node.strategies.values().any(|s| s.has_open_vote(verifier)) {
                tracing::warn!(%verifier, "unregister refused, votes still open");
                return Err(StakingError::StakeLocked(verifier.to_string()).into());
            }
            Ok(node
                .ledger
                .unregister(verifier, node.collaborators.token.as_mut(), now)?)
        })
    }

    // ── Administration ───────────────────────────────────────────────────

    pub fn pause(&mut self, caller: &Caller) -> Result<(), NodeError> {
        self.administer(|node, _| Ok(node.access.pause(caller)?))
    }

    pub fn unpause(&mut self, caller: &Caller) -> Result<(), NodeError> {
        self.administer(|node, _| Ok(node.access.unpause(caller)?))
    }

    pub fn grant_role(
        &mut self,
        caller: &Caller,
        account: &Identity,
        role: Role,
    ) -> Result<(), NodeError> {
        self.administer(|node, _| Ok(node.access.grant_role(caller, account, role)?))
    }

    pub fn revoke_role(
        &mut self,
        caller: &Caller,
        account: &Identity,
        role: Role,
    ) -> Result<(), NodeError> {
        self.administer(|node, _| Ok(node.access.revoke_role(caller, account, role)?))
    }

    /// Install a strategy instance under its own reference so methodologies
    /// can be routed to it.
    pub fn register_strategy(
        &mut self,
        caller: &Caller,
        strategy: Box<dyn VerificationStrategy>,
    ) -> Result<(), NodeError> {
        self.mutate(|node, _| {
            let key = strategy.strategy_ref().clone();
            node.catalog
                .register_strategy(&node.access, caller, key.clone())?;
            node.strategies.insert(key, strategy);
            Ok(())
        })
    }

    pub fn propose_methodology(
        &mut self,
        caller: &Caller,
        id: MethodologyId,
        strategy: StrategyRef,
        content_ref: &str,
        content: &[u8],
    ) -> Result<(), NodeError> {
        self.mutate(|node, now| {
            node.catalog
                .propose(&node.access, caller, id, strategy, content_ref, content, now)?;
            Ok(())
        })
    }

    pub fn approve_methodology(
        &mut self,
        caller: &Caller,
        id: &MethodologyId,
    ) -> Result<(), NodeError> {
        self.mutate(|node, _| Ok(node.catalog.approve(&node.access, caller, id)?))
    }

    /// Route claims for an approved methodology to its strategy. Idempotent.
    pub fn activate_methodology(
        &mut self,
        caller: &Caller,
        id: &MethodologyId,
    ) -> Result<StrategyRef, NodeError> {
        self.mutate(|node, _| {
            let strategy = node.catalog.activate(&node.access, caller, id)?;
            node.coordinator.set_route(id.clone(), strategy.clone());
            Ok(strategy)
        })
    }

    /// Retire a methodology and drop its route. Tasks already open finish
    /// normally.
    pub fn deprecate_methodology(
        &mut self,
        caller: &Caller,
        id: &MethodologyId,
    ) -> Result<(), NodeError> {
        self.mutate(|node, _| {
            if node.catalog.deprecate(&node.access, caller, id)? {
                node.coordinator.remove_route(id);
            }
            Ok(())
        })
    }

    pub fn set_parameter(
        &mut self,
        caller: &Caller,
        param: GovernableParam,
        value: u128,
    ) -> Result<(), NodeError> {
        self.mutate(|node, now| {
            node.access.check(caller, Capability::SetParameter)?;
            param.apply(&mut node.params, value)?;
            node.audit.append(
                now,
                AuditEvent::ParameterChanged {
                    param: param.name().to_string(),
                    value,
                },
            );
            Ok(())
        })
    }

    /// Mint for a claim without verification and mark it fulfilled.
    pub fn admin_override(
        &mut self,
        caller: &Caller,
        request: ClaimRequest,
    ) -> Result<(), NodeError> {
        self.mutate(|node, now| {
            node.coordinator.admin_override(
                &node.access,
                caller,
                request,
                node.collaborators.issuer.as_mut(),
                node.collaborators.projects.as_ref(),
                now,
            )?;
            Ok(())
        })
    }
}
