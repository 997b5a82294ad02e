//! Coordinator behaviour against nullable collaborators.

use verity_coordinator::{ClaimCoordinator, CoordinatorError, ProjectStatus};
use verity_governance::{AccessControl, Role};
use verity_nullables::{IssuerCall, NullIssuer, NullProjectCatalog};
use verity_types::{
    Caller, ClaimId, Identity, IssuanceMode, MethodologyId, OutcomeFraction, ProjectId,
    ProtocolParams, StrategyRef, TaskId, Timestamp,
};
use verity_verification::{
    ClaimRequest, Fulfillment, OptimisticVoter, Provisional, TallyMode,
};

struct Fixture {
    coordinator: ClaimCoordinator,
    strategy: OptimisticVoter,
    catalog: NullProjectCatalog,
    issuer: NullIssuer,
    params: ProtocolParams,
}

fn project() -> ProjectId {
    ProjectId::new("forest")
}

fn owner() -> Identity {
    Identity::new("owner")
}

fn strategy_caller() -> Caller {
    Caller::Strategy(StrategyRef::new("optimistic"))
}

fn request(claim: &str, amount: u128) -> ClaimRequest {
    ClaimRequest {
        project: project(),
        claim_id: ClaimId::new(claim),
        methodology: MethodologyId::new("m1"),
        evidence_ref: "ipfs://evidence".into(),
        requested_amount: amount,
    }
}

fn fixture() -> Fixture {
    let catalog = NullProjectCatalog::new();
    catalog.add(&project(), &owner(), ProjectStatus::Active);
    let mut coordinator = ClaimCoordinator::new();
    coordinator.set_route(MethodologyId::new("m1"), StrategyRef::new("optimistic"));
    Fixture {
        coordinator,
        strategy: OptimisticVoter::new(StrategyRef::new("optimistic"), TallyMode::Threshold),
        catalog,
        issuer: NullIssuer::new(),
        params: ProtocolParams::default(),
    }
}

impl Fixture {
    fn submit(&mut self, req: ClaimRequest) -> Result<TaskId, CoordinatorError> {
        self.coordinator.submit_claim(
            req,
            &mut self.strategy,
            &self.catalog,
            &self.params,
            Timestamp::new(0),
        )
    }

    fn fulfillment(&self, task: TaskId, claim: &str, pct: u8, is_reversal: bool) -> Fulfillment {
        Fulfillment {
            task,
            strategy: StrategyRef::new("optimistic"),
            project: project(),
            claim_id: ClaimId::new(claim),
            methodology: MethodologyId::new("m1"),
            outcome: OutcomeFraction::new(pct).unwrap(),
            is_reversal,
            evidence_ref: "ipfs://evidence".into(),
        }
    }

    fn fulfill(&mut self, f: &Fulfillment) -> Result<(), CoordinatorError> {
        self.coordinator
            .on_fulfilled(&strategy_caller(), f, &mut self.issuer, &self.catalog)
            .map(|_| ())
    }
}

#[test]
fn submit_requires_active_project() {
    let mut f = fixture();
    f.catalog.set_status(&project(), ProjectStatus::Paused);
    let err = f.submit(request("c1", 1000)).unwrap_err();
    assert!(matches!(err, CoordinatorError::ProjectNotActive(_)));

    let mut req = request("c1", 1000);
    req.project = ProjectId::new("unknown");
    assert!(matches!(
        f.submit(req).unwrap_err(),
        CoordinatorError::ProjectNotActive(_)
    ));
    assert_eq!(f.strategy.task_count(), 0);
}

#[test]
fn submit_rejects_zero_and_unrouted() {
    let mut f = fixture();
    assert!(matches!(
        f.submit(request("c1", 0)).unwrap_err(),
        CoordinatorError::ZeroAmount
    ));
    let mut req = request("c1", 10);
    req.methodology = MethodologyId::new("m2");
    assert!(matches!(
        f.submit(req).unwrap_err(),
        CoordinatorError::MethodologyNotRouted(_)
    ));
}

#[test]
fn in_flight_claim_blocks_resubmission() {
    let mut f = fixture();
    let task = f.submit(request("c1", 1000)).unwrap();
    assert!(matches!(
        f.submit(request("c1", 1000)).unwrap_err(),
        CoordinatorError::ClaimInFlight(_)
    ));

    // Same claim id under another methodology is a different claim.
    f.coordinator
        .set_route(MethodologyId::new("m2"), StrategyRef::new("optimistic"));
    let mut other = request("c1", 1000);
    other.methodology = MethodologyId::new("m2");
    let second = f.submit(other).unwrap();
    assert_ne!(task, second);
}

#[test]
fn fulfillment_mints_once() {
    let mut f = fixture();
    let task = f.submit(request("c1", 1000)).unwrap();
    let full = f.fulfillment(task, "c1", 100, false);
    f.fulfill(&full).unwrap();
    assert_eq!(
        f.issuer.calls(),
        vec![IssuerCall::Issue {
            beneficiary: owner(),
            unit: project(),
            amount: 1000,
            evidence_ref: "ipfs://evidence".into(),
        }]
    );

    assert!(matches!(
        f.fulfill(&full).unwrap_err(),
        CoordinatorError::AlreadyFulfilled(_)
    ));
    assert!(matches!(
        f.submit(request("c1", 1000)).unwrap_err(),
        CoordinatorError::AlreadyFulfilled(_)
    ));
    assert_eq!(f.issuer.calls().len(), 1);
}

#[test]
fn only_routed_strategy_may_fulfill() {
    let mut f = fixture();
    let task = f.submit(request("c1", 1000)).unwrap();
    let full = f.fulfillment(task, "c1", 100, false);
    for caller in [
        Caller::Council,
        Caller::account("owner"),
        Caller::Strategy(StrategyRef::new("other")),
    ] {
        let err = f
            .coordinator
            .on_fulfilled(&caller, &full, &mut f.issuer, &f.catalog)
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Unauthorized(_)));
    }
    assert!(f.issuer.calls().is_empty());
}

#[test]
fn unknown_claim_rejected() {
    let mut f = fixture();
    let task = f.submit(request("c1", 1000)).unwrap();
    let stray = f.fulfillment(task, "c9", 100, false);
    assert!(matches!(
        f.fulfill(&stray).unwrap_err(),
        CoordinatorError::UnknownClaim(_)
    ));
    let wrong_task = f.fulfillment(TaskId::ZERO, "c1", 100, false);
    assert!(matches!(
        f.fulfill(&wrong_task).unwrap_err(),
        CoordinatorError::UnknownClaim(_)
    ));
}

#[test]
fn zero_outcome_mints_nothing() {
    let mut f = fixture();
    let task = f.submit(request("c1", 1000)).unwrap();
    f.fulfill(&f.fulfillment(task, "c1", 0, false)).unwrap();
    assert!(f.issuer.calls().is_empty());
    assert!(f
        .coordinator
        .record(&ClaimId::new("c1"), &MethodologyId::new("m1"))
        .unwrap()
        .fulfilled);
}

#[test]
fn optimistic_mint_then_reversal() {
    let mut f = fixture();
    f.params.issuance_mode = IssuanceMode::Optimistic;
    let task = f.submit(request("c1", 1000)).unwrap();
    let provisional = Provisional {
        task,
        project: project(),
        claim_id: ClaimId::new("c1"),
        methodology: MethodologyId::new("m1"),
        outcome: OutcomeFraction::FULL,
        challenge_ends_at: Timestamp::new(10),
        issue_now: true,
        evidence_ref: "ipfs://evidence".into(),
    };
    let minted = f
        .coordinator
        .on_provisional(&strategy_caller(), &provisional, &mut f.issuer, &f.catalog)
        .unwrap();
    assert_eq!(minted, 1000);

    f.fulfill(&f.fulfillment(task, "c1", 30, true)).unwrap();
    let calls = f.issuer.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[1],
        IssuerCall::Reverse {
            unit: project(),
            amount: 1000
        }
    );
    assert_eq!(f.issuer.outstanding(&project()), 300);
}

#[test]
fn upheld_after_optimistic_mint_issues_nothing_more() {
    let mut f = fixture();
    let task = f.submit(request("c1", 1000)).unwrap();
    let provisional = Provisional {
        task,
        project: project(),
        claim_id: ClaimId::new("c1"),
        methodology: MethodologyId::new("m1"),
        outcome: OutcomeFraction::FULL,
        challenge_ends_at: Timestamp::new(10),
        issue_now: true,
        evidence_ref: String::new(),
    };
    f.coordinator
        .on_provisional(&strategy_caller(), &provisional, &mut f.issuer, &f.catalog)
        .unwrap();
    f.fulfill(&f.fulfillment(task, "c1", 100, false)).unwrap();
    assert_eq!(f.issuer.calls().len(), 1);
}

#[test]
fn failed_issue_after_reverse_restores_credits() {
    let mut f = fixture();
    let task = f.submit(request("c1", 1000)).unwrap();
    let provisional = Provisional {
        task,
        project: project(),
        claim_id: ClaimId::new("c1"),
        methodology: MethodologyId::new("m1"),
        outcome: OutcomeFraction::FULL,
        challenge_ends_at: Timestamp::new(10),
        issue_now: true,
        evidence_ref: String::new(),
    };
    f.coordinator
        .on_provisional(&strategy_caller(), &provisional, &mut f.issuer, &f.catalog)
        .unwrap();

    f.issuer.set_issue_failing(true);
    let err = f.fulfill(&f.fulfillment(task, "c1", 50, true)).unwrap_err();
    assert!(matches!(err, CoordinatorError::Collaborator(_)));
    let record = f
        .coordinator
        .record(&ClaimId::new("c1"), &MethodologyId::new("m1"))
        .unwrap();
    assert!(!record.fulfilled);
    assert_eq!(record.minted, 1000);
}

#[test]
fn admin_override_marks_fulfilled() {
    let mut f = fixture();
    let mut acl = AccessControl::new([Identity::new("root")]);
    let task = f.submit(request("c1", 1000)).unwrap();

    let err = f
        .coordinator
        .admin_override(
            &acl,
            &Caller::account("mallory"),
            request("c1", 500),
            &mut f.issuer,
            &f.catalog,
            Timestamp::new(1),
        )
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::Governance(_)));

    acl.grant_role(&Caller::account("root"), &Identity::new("ops"), Role::Admin)
        .unwrap();
    f.coordinator
        .admin_override(
            &acl,
            &Caller::account("ops"),
            request("c1", 500),
            &mut f.issuer,
            &f.catalog,
            Timestamp::new(1),
        )
        .unwrap();
    assert_eq!(f.issuer.outstanding(&project()), 500);

    let err = f.fulfill(&f.fulfillment(task, "c1", 100, false)).unwrap_err();
    assert!(matches!(err, CoordinatorError::AlreadyFulfilled(_)));

    let err = f
        .coordinator
        .admin_override(
            &acl,
            &Caller::account("ops"),
            request("c1", 500),
            &mut f.issuer,
            &f.catalog,
            Timestamp::new(2),
        )
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::AlreadyFulfilled(_)));
}

#[test]
fn admin_override_respects_project_status() {
    let mut f = fixture();
    let acl = AccessControl::new([Identity::new("root")]);
    f.catalog.set_status(&project(), ProjectStatus::Archived);
    let err = f
        .coordinator
        .admin_override(
            &acl,
            &Caller::account("root"),
            request("c7", 10),
            &mut f.issuer,
            &f.catalog,
            Timestamp::new(0),
        )
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::ProjectNotActive(_)));
}

#[test]
fn routes_are_idempotent() {
    let mut f = fixture();
    assert!(!f
        .coordinator
        .set_route(MethodologyId::new("m1"), StrategyRef::new("optimistic")));
    assert!(f.coordinator.remove_route(&MethodologyId::new("m1")).is_some());
    assert!(f.coordinator.remove_route(&MethodologyId::new("m1")).is_none());
    assert!(matches!(
        f.submit(request("c1", 1)).unwrap_err(),
        CoordinatorError::MethodologyNotRouted(_)
    ));
}

#[test]
fn snapshot_restores_records_and_routes() {
    let mut f = fixture();
    let task = f.submit(request("c1", 1000)).unwrap();
    let restored = ClaimCoordinator::restore(f.coordinator.snapshot());
    assert_eq!(
        restored.strategy_for_task(&task),
        Some(&StrategyRef::new("optimistic"))
    );
    assert!(restored.route(&MethodologyId::new("m1")).is_some());
    assert_eq!(restored.snapshot(), f.coordinator.snapshot());
}
