//! Council lifecycle against nullable collaborators.

use verity_arbitration::{ArbitrationCouncil, ArbitrationError, DisputeStatus};
use verity_nullables::{NullRandomness, NullReputation, NullStakeToken};
use verity_staking::{StakeLedger, StakeToken};
use verity_types::{
    Ballot, Identity, OutcomeFraction, ProtocolParams, StrategyRef, TaskId, Timestamp,
};
use verity_verification::ChallengeTicket;

struct Fixture {
    council: ArbitrationCouncil,
    ledger: StakeLedger,
    token: NullStakeToken,
    reputation: NullReputation,
    randomness: NullRandomness,
    params: ProtocolParams,
}

fn id(s: &str) -> Identity {
    Identity::new(s)
}

fn task() -> TaskId {
    TaskId::new([7u8; 32])
}

fn fixture() -> Fixture {
    let params = ProtocolParams {
        jury_size: 2,
        jury_voting_window_secs: 100,
        challenge_stake: 500,
        challenger_reward_bps: 5000,
        outcome_tolerance: 10,
        ..ProtocolParams::default()
    };
    let mut token = NullStakeToken::new();
    let reputation = NullReputation::new();
    let mut ledger = StakeLedger::new(id("custody"), id("treasury"));
    for (name, rep) in [
        ("alice", 100),
        ("bob", 75),
        ("juror1", 200),
        ("juror2", 50),
        ("juror3", 80),
    ] {
        token.credit(&id(name), 1_000);
        reputation.set(&id(name), rep);
        ledger
            .register(&id(name), 100, &mut token, &reputation, &params, Timestamp::EPOCH)
            .unwrap();
    }
    token.credit(&id("dave"), 600);
    token.credit(&id("treasury"), 10_000);
    Fixture {
        council: ArbitrationCouncil::new(id("escrow"), id("treasury")),
        ledger,
        token,
        reputation,
        randomness: NullRandomness::new(),
        params,
    }
}

fn ticket() -> ChallengeTicket {
    ChallengeTicket {
        task: task(),
        strategy: StrategyRef::new("optimistic"),
        challenger: id("dave"),
        provisional_outcome: OutcomeFraction::FULL,
        voters: vec![id("alice"), id("bob")],
    }
}

impl Fixture {
    fn open(&mut self) {
        self.council
            .create_dispute(
                &ticket(),
                &mut self.token,
                &mut self.randomness,
                &self.params,
                Timestamp::new(10),
            )
            .unwrap();
    }

    fn seat(&mut self, words: &[[u8; 32]]) -> Vec<Identity> {
        let request = self.randomness.last_request().unwrap();
        self.council
            .on_random_words(request, words, &self.ledger, &self.params, Timestamp::new(20))
            .unwrap()
    }

    fn vote(&mut self, who: &str, ballot: Ballot, at: u64) -> Result<(), ArbitrationError> {
        self.council
            .vote(&task(), &id(who), ballot, &self.reputation, Timestamp::new(at))
    }
}

#[test]
fn dispute_escrows_stake_and_requests_words() {
    let mut f = fixture();
    f.open();
    assert_eq!(f.token.balance(&id("dave")), 100);
    assert_eq!(f.token.balance(&id("escrow")), 500);
    let requests = f.randomness.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].num_words, 2);
    assert_eq!(
        f.council.dispute(&task()).unwrap().status,
        DisputeStatus::AwaitingJury
    );

    let err = f
        .council
        .create_dispute(
            &ticket(),
            &mut f.token,
            &mut f.randomness,
            &f.params,
            Timestamp::new(11),
        )
        .unwrap_err();
    assert!(matches!(err, ArbitrationError::DisputeExists(_)));
}

#[test]
fn underfunded_challenger_rejected_before_request() {
    let mut f = fixture();
    let mut poor = ticket();
    poor.challenger = id("pauper");
    let err = f
        .council
        .create_dispute(&poor, &mut f.token, &mut f.randomness, &f.params, Timestamp::new(0))
        .unwrap_err();
    assert!(matches!(
        err,
        ArbitrationError::InsufficientChallengeStake { needed: 500, available: 0 }
    ));
    assert!(f.randomness.requests().is_empty());
    assert!(f.council.dispute(&task()).is_none());
}

#[test]
fn failed_randomness_request_leaves_no_dispute() {
    let mut f = fixture();
    f.randomness.set_failing(true);
    let err = f
        .council
        .create_dispute(&ticket(), &mut f.token, &mut f.randomness, &f.params, Timestamp::new(0))
        .unwrap_err();
    assert!(matches!(err, ArbitrationError::Randomness(_)));
    assert_eq!(f.token.balance(&id("dave")), 600);
    assert!(f.council.dispute(&task()).is_none());
}

#[test]
fn jury_excludes_challenger_and_voters() {
    let mut f = fixture();
    f.open();
    let jury = f.seat(&NullRandomness::words(42, 2));
    assert_eq!(jury.len(), 2);
    for juror in &jury {
        assert!(!["alice", "bob", "dave"].contains(&juror.as_str()));
        assert!(f.ledger.is_active(juror));
    }
    assert_ne!(jury[0], jury[1]);
    let dispute = f.council.dispute(&task()).unwrap();
    assert_eq!(dispute.status, DisputeStatus::Voting);
    assert_eq!(dispute.voting_ends_at, Some(Timestamp::new(120)));
}

#[test]
fn callback_preconditions() {
    let mut f = fixture();
    f.open();
    let request = f.randomness.last_request().unwrap();

    let err = f
        .council
        .on_random_words(
            verity_types::RequestId::new(999),
            &[[1u8; 32]],
            &f.ledger,
            &f.params,
            Timestamp::new(20),
        )
        .unwrap_err();
    assert!(matches!(err, ArbitrationError::UnknownRequest(_)));

    let err = f
        .council
        .on_random_words(request, &[], &f.ledger, &f.params, Timestamp::new(20))
        .unwrap_err();
    assert!(matches!(err, ArbitrationError::EmptyRandomness));

    f.seat(&[[1u8; 32]]);
    let err = f
        .council
        .on_random_words(request, &[[1u8; 32]], &f.ledger, &f.params, Timestamp::new(21))
        .unwrap_err();
    assert!(matches!(err, ArbitrationError::UnknownRequest(_)));
}

#[test]
fn small_pool_can_retry_with_new_request() {
    let mut f = fixture();
    f.params.jury_size = 4;
    f.open();
    let first = f.randomness.last_request().unwrap();
    let err = f
        .council
        .on_random_words(first, &[[1u8; 32]], &f.ledger, &f.params, Timestamp::new(20))
        .unwrap_err();
    assert!(matches!(
        err,
        ArbitrationError::InsufficientJurors { needed: 4, available: 3 }
    ));

    f.params.jury_size = 3;
    let second = f
        .council
        .request_jury(&task(), &mut f.randomness, &f.params)
        .unwrap();
    assert_ne!(first, second);
    assert!(f.council.task_for_request(&first).is_none());
    let jury = f.seat(&[[5u8; 32]]);
    assert_eq!(jury.len(), 3);

    let err = f
        .council
        .request_jury(&task(), &mut f.randomness, &f.params)
        .unwrap_err();
    assert!(matches!(err, ArbitrationError::JuryAlreadySelected(_)));
}

#[test]
fn jury_vote_preconditions() {
    let mut f = fixture();
    f.open();
    assert!(matches!(
        f.vote("juror1", Ballot::Reject, 15).unwrap_err(),
        ArbitrationError::JuryNotSelected(_)
    ));
    let jury = f.seat(&[NullRandomness::word_for_index(0), NullRandomness::word_for_index(1)]);
    assert_eq!(jury, vec![id("juror1"), id("juror2")]);

    assert!(matches!(
        f.vote("juror3", Ballot::Reject, 30).unwrap_err(),
        ArbitrationError::NotJuror(_)
    ));
    assert!(matches!(
        f.vote("juror1", Ballot::Score(150), 30).unwrap_err(),
        ArbitrationError::InvalidScore(_)
    ));
    f.vote("juror1", Ballot::Reject, 30).unwrap();
    assert!(matches!(
        f.vote("juror1", Ballot::Reject, 31).unwrap_err(),
        ArbitrationError::AlreadyVoted(_)
    ));
    assert!(matches!(
        f.vote("juror2", Ballot::Reject, 120).unwrap_err(),
        ArbitrationError::JuryVotingClosed(_)
    ));
}

#[test]
fn overturn_refunds_and_rewards_challenger() {
    let mut f = fixture();
    f.open();
    f.seat(&[NullRandomness::word_for_index(0), NullRandomness::word_for_index(1)]);
    f.vote("juror1", Ballot::Reject, 30).unwrap();

    let err = f
        .council
        .resolve_dispute(&task(), &mut f.token, &f.params, Timestamp::new(119))
        .unwrap_err();
    assert!(err.is_retryable());

    let resolution = f
        .council
        .resolve_dispute(&task(), &mut f.token, &f.params, Timestamp::new(120))
        .unwrap();
    assert!(!resolution.verdict.upheld);
    assert_eq!(resolution.verdict.outcome, OutcomeFraction::ZERO);
    assert_eq!(resolution.reward, 250);
    assert_eq!(resolution.payout, 750);
    assert_eq!(f.token.balance(&id("dave")), 850);
    assert_eq!(f.token.balance(&id("escrow")), 0);
    assert_eq!(f.token.balance(&id("treasury")), 9_750);

    let err = f
        .council
        .resolve_dispute(&task(), &mut f.token, &f.params, Timestamp::new(200))
        .unwrap_err();
    assert!(matches!(err, ArbitrationError::AlreadyResolved(_)));
}

#[test]
fn slashes_are_remembered_once_resolved() {
    let mut f = fixture();
    f.open();
    f.seat(&[NullRandomness::word_for_index(0), NullRandomness::word_for_index(1)]);
    f.vote("juror1", Ballot::Reject, 30).unwrap();

    let err = f.council.record_slash(&task(), &id("alice")).unwrap_err();
    assert!(matches!(err, ArbitrationError::NotResolved(_)));

    f.council
        .resolve_dispute(&task(), &mut f.token, &f.params, Timestamp::new(120))
        .unwrap();
    f.council.record_slash(&task(), &id("alice")).unwrap();
    f.council.record_slash(&task(), &id("alice")).unwrap();

    let dispute = f.council.dispute(&task()).unwrap();
    assert_eq!(dispute.slashed, vec![id("alice")]);
    assert!(dispute.is_slashed(&id("alice")));
    assert!(!dispute.is_slashed(&id("bob")));
}

#[test]
fn upheld_forfeits_stake() {
    let mut f = fixture();
    f.open();
    f.seat(&[NullRandomness::word_for_index(0), NullRandomness::word_for_index(1)]);
    // 95 is within tolerance of the provisional 100.
    f.vote("juror1", Ballot::Score(95), 30).unwrap();
    f.vote("juror2", Ballot::Approve, 30).unwrap();

    let resolution = f
        .council
        .resolve_dispute(&task(), &mut f.token, &f.params, Timestamp::new(120))
        .unwrap();
    assert!(resolution.verdict.upheld);
    assert_eq!(resolution.payout, 0);
    assert_eq!(f.token.balance(&id("dave")), 100);
    assert_eq!(f.token.balance(&id("treasury")), 10_500);
}

#[test]
fn silent_jury_upholds_provisional() {
    let mut f = fixture();
    f.open();
    f.seat(&[[3u8; 32]]);
    let resolution = f
        .council
        .resolve_dispute(&task(), &mut f.token, &f.params, Timestamp::new(500))
        .unwrap();
    assert!(resolution.verdict.upheld);
    assert_eq!(resolution.verdict.outcome, OutcomeFraction::FULL);
}

#[test]
fn empty_treasury_blocks_overturn_settlement() {
    let mut f = fixture();
    f.open();
    f.seat(&[NullRandomness::word_for_index(0), NullRandomness::word_for_index(1)]);
    f.vote("juror1", Ballot::Reject, 30).unwrap();
    StakeToken::transfer(&mut f.token, &id("treasury"), &id("sink"), 10_000).unwrap();

    let err = f
        .council
        .resolve_dispute(&task(), &mut f.token, &f.params, Timestamp::new(120))
        .unwrap_err();
    assert!(matches!(err, ArbitrationError::InsufficientTreasury { .. }));
    assert_eq!(f.token.balance(&id("escrow")), 500);
    assert_eq!(
        f.council.dispute(&task()).unwrap().status,
        DisputeStatus::Voting
    );
}

#[test]
fn snapshot_keeps_pending_requests() {
    let mut f = fixture();
    f.open();
    let request = f.randomness.last_request().unwrap();
    let restored = ArbitrationCouncil::restore(f.council.snapshot());
    assert_eq!(restored.task_for_request(&request), Some(task()));
    assert_eq!(restored.snapshot(), f.council.snapshot());
}
