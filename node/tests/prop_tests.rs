//! Property tests: whatever order finalization, resubmission and overrides
//! arrive in, a claim is issued for at most once.

use proptest::prelude::*;
use verity_coordinator::ProjectStatus;
use verity_governance::Role;
use verity_node::{Collaborators, NodeConfig, VerityNode};
use verity_nullables::{
    IssuerCall, NullClock, NullIssuer, NullProjectCatalog, NullRandomness, NullReputation,
    NullStakeToken,
};
use verity_types::{
    Ballot, Caller, ClaimId, Identity, MethodologyId, ProjectId, ProtocolParams, StrategyRef,
    TaskId,
};
use verity_verification::{ClaimRequest, OptimisticVoter, TallyMode};

#[derive(Clone, Debug)]
enum Op {
    Advance(u64),
    Propose,
    Finalize,
    Resubmit,
    Override(u128),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u64..80).prop_map(Op::Advance),
        Just(Op::Propose),
        Just(Op::Finalize),
        Just(Op::Resubmit),
        (1u128..2_000).prop_map(Op::Override),
    ]
}

fn request(amount: u128) -> ClaimRequest {
    ClaimRequest {
        project: ProjectId::new("forest"),
        claim_id: ClaimId::new("c1"),
        methodology: MethodologyId::new("m1"),
        evidence_ref: "ipfs://c1".into(),
        requested_amount: amount,
    }
}

fn setup() -> (VerityNode, NullClock, NullIssuer, TaskId) {
    let clock = NullClock::new(1_000);
    let token = NullStakeToken::new();
    let reputation = NullReputation::new();
    let issuer = NullIssuer::new();
    let projects = NullProjectCatalog::new();
    projects.add(
        &ProjectId::new("forest"),
        &Identity::new("owner"),
        ProjectStatus::Active,
    );

    let config = NodeConfig {
        params: ProtocolParams {
            voting_window_secs: 100,
            challenge_window_secs: 50,
            ..ProtocolParams::default()
        },
        admins: vec![Identity::new("root")],
        ..NodeConfig::default()
    };
    let collaborators = Collaborators {
        clock: Box::new(clock.clone()),
        token: Box::new(token.clone()),
        reputation: Box::new(reputation.clone()),
        randomness: Box::new(NullRandomness::new()),
        issuer: Box::new(issuer.clone()),
        projects: Box::new(projects),
    };
    let mut node = VerityNode::new(config, collaborators).unwrap();
    let root = Caller::account("root");
    let strategy = StrategyRef::new("optimistic");
    node.register_strategy(
        &root,
        Box::new(OptimisticVoter::new(strategy.clone(), TallyMode::Threshold)),
    )
    .unwrap();
    node.propose_methodology(&root, MethodologyId::new("m1"), strategy, "ipfs://m1", b"m1")
        .unwrap();
    node.grant_role(&root, &Identity::new("approver"), Role::MethodologyApprover)
        .unwrap();
    node.approve_methodology(&Caller::account("approver"), &MethodologyId::new("m1"))
        .unwrap();
    node.activate_methodology(&root, &MethodologyId::new("m1"))
        .unwrap();

    let voter = Identity::new("alice");
    token.credit(&voter, 1_000);
    reputation.set(&voter, 100);
    node.register_verifier(&voter, 100).unwrap();

    let task = node.submit_claim(request(1_000)).unwrap();
    node.submit_vote(&task, &voter, Ballot::Approve).unwrap();
    (node, clock, issuer, task)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn claim_is_issued_for_at_most_once(ops in prop::collection::vec(op(), 1..24)) {
        let (mut node, clock, issuer, task) = setup();
        let root = Caller::account("root");

        for op in ops {
            let _ = match op {
                Op::Advance(secs) => {
                    clock.advance(secs);
                    Ok(())
                }
                Op::Propose => node.propose_resolution(&task).map(|_| ()),
                Op::Finalize => node.finalize(&task).map(|_| ()),
                Op::Resubmit => node.submit_claim(request(1_000)).map(|_| ()),
                Op::Override(amount) => node.admin_override(&root, request(amount)),
            };
        }

        let issues = issuer
            .calls()
            .iter()
            .filter(|c| matches!(c, IssuerCall::Issue { .. }))
            .count();
        prop_assert!(issues <= 1);

        let fulfilled = node
            .coordinator()
            .record(&ClaimId::new("c1"), &MethodologyId::new("m1"))
            .is_some_and(|r| r.fulfilled);
        prop_assert_eq!(fulfilled, issues == 1);

        let seqs: Vec<u64> = node.audit().records().iter().map(|r| r.seq).collect();
        prop_assert!(seqs.iter().enumerate().all(|(i, s)| *s == i as u64));
    }
}
