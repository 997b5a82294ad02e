//! Reputation-weighted optimistic voting.
//!
//! Registered verifiers vote while the voting window is open, each ballot
//! weighted by the voter's reputation at that moment. Once the window has
//! elapsed anyone may propose the tallied outcome, which then stands unless
//! it is challenged before the challenge window closes.

use crate::error::VerificationError;
use crate::strategy::{
    ArbitrationSettlement, ChallengeTicket, ClaimRequest, Fulfillment, Provisional,
    StrategySnapshot, VerificationStrategy, Verdict,
};
use crate::tally::{TallyMode, WeightedTally};
use crate::task::{Task, TaskStatus, Vote};
use std::collections::BTreeMap;
use verity_staking::{ReputationRegistry, StakeLedger};
use verity_types::{
    AuditEvent, Ballot, Caller, Identity, IssuanceMode, OutcomeFraction, ProtocolParams,
    StrategyRef, TaskId, Timestamp,
};

pub struct OptimisticVoter {
    strategy: StrategyRef,
    mode: TallyMode,
    /// Mixed into task ids so a resubmitted claim gets a fresh handle.
    next_nonce: u64,
    tasks: BTreeMap<TaskId, Task>,
    pending_events: Vec<AuditEvent>,
}

impl OptimisticVoter {
    pub fn new(strategy: StrategyRef, mode: TallyMode) -> Self {
        Self {
            strategy,
            mode,
            next_nonce: 0,
            tasks: BTreeMap::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn restore(snapshot: StrategySnapshot) -> Self {
        Self {
            strategy: snapshot.strategy,
            mode: snapshot.mode,
            next_nonce: snapshot.next_nonce,
            tasks: snapshot.tasks.into_iter().map(|t| (t.id, t)).collect(),
            pending_events: Vec::new(),
        }
    }

    pub fn mode(&self) -> TallyMode {
        self.mode
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    fn get(&self, task: &TaskId) -> Result<&Task, VerificationError> {
        self.tasks
            .get(task)
            .ok_or_else(|| VerificationError::UnknownTask(task.to_string()))
    }

    fn get_mut(&mut self, task: &TaskId) -> Result<&mut Task, VerificationError> {
        self.tasks
            .get_mut(task)
            .ok_or_else(|| VerificationError::UnknownTask(task.to_string()))
    }

    fn fulfillment(task: &Task, outcome: OutcomeFraction, is_reversal: bool) -> Fulfillment {
        Fulfillment {
            task: task.id,
            strategy: task.strategy.clone(),
            project: task.project.clone(),
            claim_id: task.claim_id.clone(),
            methodology: task.methodology.clone(),
            outcome,
            is_reversal,
            evidence_ref: task.evidence_ref.clone(),
        }
    }
}

impl VerificationStrategy for OptimisticVoter {
    fn strategy_ref(&self) -> &StrategyRef {
        &self.strategy
    }

    fn open_task(
        &mut self,
        request: ClaimRequest,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<TaskId, VerificationError> {
        if !request.project.is_valid() || !request.claim_id.is_valid() {
            return Err(VerificationError::InvalidRequest(
                "project and claim id must be non-empty".into(),
            ));
        }
        if request.requested_amount == 0 {
            return Err(VerificationError::InvalidRequest(
                "requested amount must be positive".into(),
            ));
        }

        let id = verity_crypto::derive_task_id(
            &self.strategy,
            &request.project,
            &request.claim_id,
            &request.methodology,
            self.next_nonce,
        );
        self.next_nonce += 1;

        let voting_ends_at = now.plus_secs(params.voting_window_secs);
        tracing::info!(task = %id, claim = %request.claim_id, %voting_ends_at, "task opened");
        self.tasks.insert(
            id,
            Task {
                id,
                strategy: self.strategy.clone(),
                project: request.project,
                claim_id: request.claim_id,
                methodology: request.methodology,
                evidence_ref: request.evidence_ref,
                requested_amount: request.requested_amount,
                status: TaskStatus::Open,
                votes: Vec::new(),
                provisional_outcome: None,
                final_outcome: None,
                created_at: now,
                voting_ends_at,
                challenge_ends_at: None,
                challenger: None,
                provisionally_issued: false,
            },
        );
        Ok(id)
    }

    fn submit_vote(
        &mut self,
        task: &TaskId,
        voter: &Identity,
        ballot: Ballot,
        ledger: &StakeLedger,
        reputation: &dyn ReputationRegistry,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        let record = self.get(task)?;
        let score = ballot
            .score()
            .ok_or(VerificationError::InvalidScore(ballot))?;
        if !ledger.is_active(voter) {
            return Err(VerificationError::NotActiveVerifier(voter.to_string()));
        }
        if record.status != TaskStatus::Open || now >= record.voting_ends_at {
            return Err(VerificationError::VotingClosed(task.to_string()));
        }
        if record.has_voted(voter) {
            return Err(VerificationError::AlreadyVoted(voter.to_string()));
        }

        let weight = reputation.get(voter);
        let record = self.get_mut(task)?;
        record.votes.push(Vote {
            voter: voter.clone(),
            ballot,
            score,
            weight,
            cast_at: now,
        });
        tracing::debug!(task = %task, %voter, ?ballot, weight, "vote cast");
        self.pending_events.push(AuditEvent::VoteCast {
            task: *task,
            voter: voter.clone(),
            ballot,
            weight,
        });
        Ok(())
    }

    fn preview_resolution(
        &self,
        task: &TaskId,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<Provisional, VerificationError> {
        let record = self.get(task)?;
        if record.status != TaskStatus::Open {
            return Err(VerificationError::AlreadyProposed(task.to_string()));
        }
        if now < record.voting_ends_at {
            return Err(VerificationError::VotingWindowOpen {
                until: record.voting_ends_at.as_secs(),
            });
        }

        let tally = WeightedTally::from_scores(record.votes.iter().map(|v| (v.score, v.weight)))?;
        let outcome = tally.outcome(self.mode, params.approval_threshold_bps)?;
        Ok(Provisional {
            task: *task,
            project: record.project.clone(),
            claim_id: record.claim_id.clone(),
            methodology: record.methodology.clone(),
            outcome,
            challenge_ends_at: now.plus_secs(params.challenge_window_secs),
            issue_now: params.issuance_mode == IssuanceMode::Optimistic && !outcome.is_zero(),
            evidence_ref: record.evidence_ref.clone(),
        })
    }

    fn propose_resolution(
        &mut self,
        task: &TaskId,
        params: &ProtocolParams,
        now: Timestamp,
    ) -> Result<Provisional, VerificationError> {
        let provisional = self.preview_resolution(task, params, now)?;
        let record = self.get_mut(task)?;
        record.status = TaskStatus::Provisional;
        record.provisional_outcome = Some(provisional.outcome);
        record.challenge_ends_at = Some(provisional.challenge_ends_at);
        record.provisionally_issued = provisional.issue_now;

        tracing::info!(
            task = %task,
            outcome = %provisional.outcome,
            challenge_ends_at = %provisional.challenge_ends_at,
            "provisional outcome set"
        );
        self.pending_events.push(AuditEvent::ProvisionalOutcomeSet {
            task: *task,
            outcome: provisional.outcome,
            challenge_ends_at: provisional.challenge_ends_at,
        });
        Ok(provisional)
    }

    fn preview_finalize(
        &self,
        task: &TaskId,
        now: Timestamp,
    ) -> Result<Fulfillment, VerificationError> {
        let record = self.get(task)?;
        match record.status {
            TaskStatus::Open => return Err(VerificationError::NotProvisional(task.to_string())),
            TaskStatus::Challenged => {
                return Err(VerificationError::ChallengeExists(task.to_string()))
            }
            TaskStatus::Finalized | TaskStatus::Overturned => {
                return Err(VerificationError::AlreadyFinalized(task.to_string()))
            }
            TaskStatus::Provisional => {}
        }
        let (Some(outcome), Some(ends_at)) = (record.provisional_outcome, record.challenge_ends_at)
        else {
            return Err(VerificationError::NotProvisional(task.to_string()));
        };
        if now < ends_at {
            return Err(VerificationError::ChallengeWindowOpen {
                until: ends_at.as_secs(),
            });
        }
        Ok(Self::fulfillment(record, outcome, false))
    }

    fn finalize_verification(
        &mut self,
        task: &TaskId,
        now: Timestamp,
    ) -> Result<Fulfillment, VerificationError> {
        let fulfillment = self.preview_finalize(task, now)?;
        let record = self.get_mut(task)?;
        record.status = TaskStatus::Finalized;
        record.final_outcome = Some(fulfillment.outcome);

        tracing::info!(task = %task, outcome = %fulfillment.outcome, "task finalized");
        self.pending_events.push(AuditEvent::TaskFinalized {
            task: *task,
            outcome: fulfillment.outcome,
        });
        Ok(fulfillment)
    }

    fn preview_challenge(
        &self,
        task: &TaskId,
        challenger: &Identity,
        now: Timestamp,
    ) -> Result<ChallengeTicket, VerificationError> {
        let record = self.get(task)?;
        if !challenger.is_valid() {
            return Err(VerificationError::InvalidRequest(
                "challenger must be non-empty".into(),
            ));
        }
        if record.status != TaskStatus::Provisional {
            return Err(VerificationError::NotProvisional(task.to_string()));
        }
        let (Some(outcome), Some(ends_at)) = (record.provisional_outcome, record.challenge_ends_at)
        else {
            return Err(VerificationError::NotProvisional(task.to_string()));
        };
        if now >= ends_at {
            return Err(VerificationError::ChallengeWindowClosed(task.to_string()));
        }
        Ok(ChallengeTicket {
            task: *task,
            strategy: self.strategy.clone(),
            challenger: challenger.clone(),
            provisional_outcome: outcome,
            voters: record.voters(),
        })
    }

    fn challenge_verification(
        &mut self,
        task: &TaskId,
        challenger: &Identity,
        now: Timestamp,
    ) -> Result<ChallengeTicket, VerificationError> {
        let ticket = self.preview_challenge(task, challenger, now)?;
        let record = self.get_mut(task)?;
        record.status = TaskStatus::Challenged;
        record.challenger = Some(challenger.clone());
        tracing::info!(task = %task, %challenger, "task challenged");
        Ok(ticket)
    }

    fn preview_arbitration_result(
        &self,
        caller: &Caller,
        task: &TaskId,
        verdict: Verdict,
        params: &ProtocolParams,
    ) -> Result<ArbitrationSettlement, VerificationError> {
        if *caller != Caller::Council {
            return Err(VerificationError::Unauthorized(caller.to_string()));
        }
        let record = self.get(task)?;
        if record.status != TaskStatus::Challenged {
            return Err(VerificationError::NotChallenged(task.to_string()));
        }
        let provisional = record
            .provisional_outcome
            .ok_or_else(|| VerificationError::NotChallenged(task.to_string()))?;

        if verdict.upheld {
            return Ok(ArbitrationSettlement {
                fulfillment: Self::fulfillment(record, provisional, false),
                upheld: true,
                slash: Vec::new(),
            });
        }
        Ok(ArbitrationSettlement {
            fulfillment: Self::fulfillment(record, verdict.outcome, record.provisionally_issued),
            upheld: false,
            slash: record.dissenters(verdict.outcome, params.outcome_tolerance),
        })
    }

    fn process_arbitration_result(
        &mut self,
        caller: &Caller,
        task: &TaskId,
        verdict: Verdict,
        params: &ProtocolParams,
    ) -> Result<ArbitrationSettlement, VerificationError> {
        let settlement = self.preview_arbitration_result(caller, task, verdict, params)?;
        let record = self.get_mut(task)?;
        let outcome = settlement.fulfillment.outcome;
        record.final_outcome = Some(outcome);

        if settlement.upheld {
            record.status = TaskStatus::Finalized;
            tracing::info!(task = %task, %outcome, "challenge rejected, task finalized");
            self.pending_events.push(AuditEvent::TaskFinalized {
                task: *task,
                outcome,
            });
        } else {
            let provisional = record.provisional_outcome.unwrap_or(OutcomeFraction::ZERO);
            record.status = TaskStatus::Overturned;
            tracing::info!(
                task = %task,
                %provisional,
                %outcome,
                slashed = settlement.slash.len(),
                "task overturned"
            );
            self.pending_events.push(AuditEvent::TaskOverturned {
                task: *task,
                provisional,
                outcome,
            });
        }
        Ok(settlement)
    }

    fn task(&self, task: &TaskId) -> Option<&Task> {
        self.tasks.get(task)
    }

    fn has_open_vote(&self, voter: &Identity) -> bool {
        self.tasks
            .values()
            .any(|t| !t.status.is_terminal() && t.has_voted(voter))
    }

    fn snapshot(&self) -> StrategySnapshot {
        StrategySnapshot {
            strategy: self.strategy.clone(),
            mode: self.mode,
            next_nonce: self.next_nonce,
            tasks: self.tasks.values().cloned().collect(),
        }
    }

    fn drain_events(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use verity_staking::StakeToken;
    use verity_types::{ClaimId, CollaboratorError, MethodologyId, ProjectId};

    struct Token(HashMap<Identity, u128>);

    impl StakeToken for Token {
        fn balance_of(&self, who: &Identity) -> u128 {
            self.0.get(who).copied().unwrap_or(0)
        }

        fn transfer(
            &mut self,
            from: &Identity,
            to: &Identity,
            amount: u128,
        ) -> Result<(), CollaboratorError> {
            *self.0.entry(from.clone()).or_default() -= amount;
            *self.0.entry(to.clone()).or_default() += amount;
            Ok(())
        }
    }

    struct Reputation(HashMap<Identity, u64>);

    impl ReputationRegistry for Reputation {
        fn get(&self, who: &Identity) -> u64 {
            self.0.get(who).copied().unwrap_or(0)
        }

        fn add(&mut self, who: &Identity, amount: u64) -> Result<(), CollaboratorError> {
            *self.0.entry(who.clone()).or_default() += amount;
            Ok(())
        }

        fn subtract(&mut self, who: &Identity, amount: u64) -> Result<(), CollaboratorError> {
            let score = self.0.entry(who.clone()).or_default();
            *score = score.saturating_sub(amount);
            Ok(())
        }
    }

    struct Fixture {
        voter: OptimisticVoter,
        ledger: StakeLedger,
        reputation: Reputation,
        params: ProtocolParams,
    }

    fn id(s: &str) -> Identity {
        Identity::new(s)
    }

    fn fixture(mode: TallyMode) -> Fixture {
        let params = ProtocolParams {
            voting_window_secs: 100,
            challenge_window_secs: 50,
            outcome_tolerance: 10,
            ..ProtocolParams::default()
        };
        let mut ledger = StakeLedger::new(id("custody"), id("treasury"));
        let mut token = Token(HashMap::new());
        let mut reputation = Reputation(HashMap::new());
        for (name, rep) in [("alice", 100), ("bob", 75), ("carol", 60)] {
            token.0.insert(id(name), 1_000);
            reputation.0.insert(id(name), rep);
            ledger
                .register(&id(name), 100, &mut token, &reputation, &params, Timestamp::EPOCH)
                .unwrap();
        }
        Fixture {
            voter: OptimisticVoter::new(StrategyRef::new("optimistic"), mode),
            ledger,
            reputation,
            params,
        }
    }

    fn request() -> ClaimRequest {
        ClaimRequest {
            project: ProjectId::new("forest"),
            claim_id: ClaimId::new("c1"),
            methodology: MethodologyId::new("m1"),
            evidence_ref: "ipfs://evidence".into(),
            requested_amount: 1_000,
        }
    }

    impl Fixture {
        fn open(&mut self) -> TaskId {
            self.voter
                .open_task(request(), &self.params, Timestamp::new(0))
                .unwrap()
        }

        fn vote(&mut self, task: &TaskId, who: &str, ballot: Ballot, at: u64) -> Result<(), VerificationError> {
            self.voter.submit_vote(
                task,
                &id(who),
                ballot,
                &self.ledger,
                &self.reputation,
                Timestamp::new(at),
            )
        }
    }

    #[test]
    fn unanimous_approval_finalizes_at_full_outcome() {
        let mut f = fixture(TallyMode::Threshold);
        let task = f.open();
        f.vote(&task, "alice", Ballot::Approve, 10).unwrap();
        f.vote(&task, "bob", Ballot::Approve, 20).unwrap();

        let provisional = f
            .voter
            .propose_resolution(&task, &f.params, Timestamp::new(100))
            .unwrap();
        assert_eq!(provisional.outcome, OutcomeFraction::FULL);
        assert_eq!(provisional.challenge_ends_at, Timestamp::new(150));
        assert!(!provisional.issue_now);

        let err = f
            .voter
            .finalize_verification(&task, Timestamp::new(149))
            .unwrap_err();
        assert!(err.is_retryable());

        let fulfillment = f
            .voter
            .finalize_verification(&task, Timestamp::new(150))
            .unwrap();
        assert_eq!(fulfillment.outcome, OutcomeFraction::FULL);
        assert!(!fulfillment.is_reversal);
        assert_eq!(f.voter.task(&task).unwrap().status, TaskStatus::Finalized);

        let err = f
            .voter
            .finalize_verification(&task, Timestamp::new(151))
            .unwrap_err();
        assert!(matches!(err, VerificationError::AlreadyFinalized(_)));
    }

    #[test]
    fn vote_preconditions() {
        let mut f = fixture(TallyMode::Quantitative);
        let task = f.open();

        let err = f.vote(&task, "mallory", Ballot::Approve, 1).unwrap_err();
        assert!(matches!(err, VerificationError::NotActiveVerifier(_)));

        let err = f.vote(&task, "alice", Ballot::Score(101), 1).unwrap_err();
        assert!(matches!(err, VerificationError::InvalidScore(_)));

        f.vote(&task, "alice", Ballot::Score(70), 1).unwrap();
        let err = f.vote(&task, "alice", Ballot::Score(20), 2).unwrap_err();
        assert!(matches!(err, VerificationError::AlreadyVoted(_)));

        let err = f.vote(&task, "bob", Ballot::Reject, 100).unwrap_err();
        assert!(matches!(err, VerificationError::VotingClosed(_)));
        assert_eq!(f.voter.task(&task).unwrap().votes.len(), 1);
    }

    #[test]
    fn vote_weight_is_reputation_snapshot() {
        let mut f = fixture(TallyMode::Quantitative);
        let task = f.open();
        f.vote(&task, "alice", Ballot::Score(80), 1).unwrap();
        f.reputation.0.insert(id("alice"), 5);
        assert_eq!(f.voter.task(&task).unwrap().votes[0].weight, 100);
    }

    #[test]
    fn propose_preconditions() {
        let mut f = fixture(TallyMode::Threshold);
        let task = f.open();

        let err = f
            .voter
            .propose_resolution(&task, &f.params, Timestamp::new(99))
            .unwrap_err();
        assert!(matches!(err, VerificationError::VotingWindowOpen { until: 100 }));

        let err = f
            .voter
            .propose_resolution(&task, &f.params, Timestamp::new(100))
            .unwrap_err();
        assert!(matches!(err, VerificationError::ZeroTotalWeight));
        assert_eq!(f.voter.task(&task).unwrap().status, TaskStatus::Open);
    }

    #[test]
    fn second_proposal_fails() {
        let mut f = fixture(TallyMode::Threshold);
        let task = f.open();
        f.vote(&task, "alice", Ballot::Reject, 1).unwrap();
        let provisional = f
            .voter
            .propose_resolution(&task, &f.params, Timestamp::new(100))
            .unwrap();
        assert_eq!(provisional.outcome, OutcomeFraction::ZERO);
        let err = f
            .voter
            .propose_resolution(&task, &f.params, Timestamp::new(101))
            .unwrap_err();
        assert!(matches!(err, VerificationError::AlreadyProposed(_)));
    }

    #[test]
    fn quantitative_mode_uses_weighted_mean() {
        let mut f = fixture(TallyMode::Quantitative);
        let task = f.open();
        f.vote(&task, "alice", Ballot::Score(90), 1).unwrap(); // 100
        f.vote(&task, "bob", Ballot::Score(40), 1).unwrap(); // 75
        let provisional = f
            .voter
            .propose_resolution(&task, &f.params, Timestamp::new(100))
            .unwrap();
        // (90·100 + 40·75) / 175 = 68.57
        assert_eq!(provisional.outcome.percent(), 68);
    }

    #[test]
    fn challenge_and_finalize_windows_are_exclusive() {
        let mut f = fixture(TallyMode::Threshold);
        let task = f.open();
        f.vote(&task, "alice", Ballot::Approve, 1).unwrap();

        let err = f
            .voter
            .challenge_verification(&task, &id("dave"), Timestamp::new(50))
            .unwrap_err();
        assert!(matches!(err, VerificationError::NotProvisional(_)));

        f.voter
            .propose_resolution(&task, &f.params, Timestamp::new(100))
            .unwrap();
        for at in 100..160 {
            let now = Timestamp::new(at);
            let challenge = f.voter.preview_challenge(&task, &id("dave"), now).is_ok();
            let finalize = f.voter.preview_finalize(&task, now).is_ok();
            assert!(challenge ^ finalize, "at {at}");
        }

        let err = f
            .voter
            .challenge_verification(&task, &id("dave"), Timestamp::new(150))
            .unwrap_err();
        assert!(matches!(err, VerificationError::ChallengeWindowClosed(_)));
    }

    #[test]
    fn challenged_task_cannot_finalize() {
        let mut f = fixture(TallyMode::Threshold);
        let task = f.open();
        f.vote(&task, "alice", Ballot::Approve, 1).unwrap();
        f.vote(&task, "bob", Ballot::Approve, 1).unwrap();
        f.voter
            .propose_resolution(&task, &f.params, Timestamp::new(100))
            .unwrap();

        let ticket = f
            .voter
            .challenge_verification(&task, &id("dave"), Timestamp::new(120))
            .unwrap();
        assert_eq!(ticket.voters, vec![id("alice"), id("bob")]);
        assert_eq!(ticket.provisional_outcome, OutcomeFraction::FULL);

        let err = f
            .voter
            .finalize_verification(&task, Timestamp::new(500))
            .unwrap_err();
        assert!(matches!(err, VerificationError::ChallengeExists(_)));
        let err = f
            .voter
            .challenge_verification(&task, &id("erin"), Timestamp::new(121))
            .unwrap_err();
        assert!(matches!(err, VerificationError::NotProvisional(_)));
    }

    fn challenged(f: &mut Fixture) -> TaskId {
        let task = f.open();
        f.vote(&task, "alice", Ballot::Approve, 1).unwrap();
        f.vote(&task, "bob", Ballot::Approve, 1).unwrap();
        f.vote(&task, "carol", Ballot::Score(5), 1).unwrap();
        f.voter
            .propose_resolution(&task, &f.params, Timestamp::new(100))
            .unwrap();
        f.voter
            .challenge_verification(&task, &id("dave"), Timestamp::new(110))
            .unwrap();
        task
    }

    #[test]
    fn only_council_reports_arbitration() {
        let mut f = fixture(TallyMode::Threshold);
        let task = challenged(&mut f);
        let verdict = Verdict {
            outcome: OutcomeFraction::ZERO,
            upheld: false,
        };
        let err = f
            .voter
            .process_arbitration_result(&Caller::account("alice"), &task, verdict, &f.params)
            .unwrap_err();
        assert!(matches!(err, VerificationError::Unauthorized(_)));
        assert_eq!(f.voter.task(&task).unwrap().status, TaskStatus::Challenged);
    }

    #[test]
    fn overturn_slashes_dissenters_beyond_tolerance() {
        let mut f = fixture(TallyMode::Threshold);
        let task = challenged(&mut f);
        let verdict = Verdict {
            outcome: OutcomeFraction::ZERO,
            upheld: false,
        };
        let settlement = f
            .voter
            .process_arbitration_result(&Caller::Council, &task, verdict, &f.params)
            .unwrap();
        assert!(!settlement.upheld);
        assert_eq!(settlement.slash, vec![id("alice"), id("bob")]);
        assert_eq!(settlement.fulfillment.outcome, OutcomeFraction::ZERO);
        assert!(!settlement.fulfillment.is_reversal);

        let record = f.voter.task(&task).unwrap();
        assert_eq!(record.status, TaskStatus::Overturned);
        assert_eq!(record.final_outcome, Some(OutcomeFraction::ZERO));

        let err = f
            .voter
            .process_arbitration_result(&Caller::Council, &task, verdict, &f.params)
            .unwrap_err();
        assert!(matches!(err, VerificationError::NotChallenged(_)));
    }

    #[test]
    fn upheld_verdict_finalizes_with_provisional() {
        let mut f = fixture(TallyMode::Threshold);
        let task = challenged(&mut f);
        let verdict = Verdict {
            outcome: OutcomeFraction::new(95).unwrap(),
            upheld: true,
        };
        let settlement = f
            .voter
            .process_arbitration_result(&Caller::Council, &task, verdict, &f.params)
            .unwrap();
        assert!(settlement.slash.is_empty());
        assert_eq!(settlement.fulfillment.outcome, OutcomeFraction::FULL);
        assert_eq!(f.voter.task(&task).unwrap().status, TaskStatus::Finalized);
    }

    #[test]
    fn optimistic_issuance_flags_reversal() {
        let mut f = fixture(TallyMode::Threshold);
        f.params.issuance_mode = IssuanceMode::Optimistic;
        let task = challenged(&mut f);
        assert!(f.voter.task(&task).unwrap().provisionally_issued);

        let settlement = f
            .voter
            .process_arbitration_result(
                &Caller::Council,
                &task,
                Verdict {
                    outcome: OutcomeFraction::ZERO,
                    upheld: false,
                },
                &f.params,
            )
            .unwrap();
        assert!(settlement.fulfillment.is_reversal);
    }

    #[test]
    fn open_votes_last_until_the_task_is_terminal() {
        let mut f = fixture(TallyMode::Threshold);
        let task = f.open();
        assert!(!f.voter.has_open_vote(&id("alice")));
        f.vote(&task, "alice", Ballot::Approve, 10).unwrap();
        assert!(f.voter.has_open_vote(&id("alice")));
        assert!(!f.voter.has_open_vote(&id("bob")));

        f.voter
            .propose_resolution(&task, &f.params, Timestamp::new(100))
            .unwrap();
        assert!(f.voter.has_open_vote(&id("alice")));
        f.voter
            .finalize_verification(&task, Timestamp::new(150))
            .unwrap();
        assert!(!f.voter.has_open_vote(&id("alice")));
    }

    #[test]
    fn resubmitted_claim_gets_fresh_id() {
        let mut f = fixture(TallyMode::Threshold);
        let a = f.open();
        let b = f.open();
        assert_ne!(a, b);
    }

    #[test]
    fn snapshot_restores_tasks() {
        let mut f = fixture(TallyMode::Quantitative);
        let task = f.open();
        f.vote(&task, "alice", Ballot::Score(50), 1).unwrap();

        let restored = OptimisticVoter::restore(f.voter.snapshot());
        assert_eq!(restored.mode(), TallyMode::Quantitative);
        assert_eq!(restored.task(&task), f.voter.task(&task));

        let mut restored = restored;
        let next = restored
            .open_task(request(), &f.params, Timestamp::new(0))
            .unwrap();
        assert_ne!(next, task);
    }

    #[test]
    fn events_emitted_only_on_commit() {
        let mut f = fixture(TallyMode::Threshold);
        let task = f.open();
        let _ = f.vote(&task, "mallory", Ballot::Approve, 1);
        let _ = f.voter.propose_resolution(&task, &f.params, Timestamp::new(1));
        assert!(f.voter.drain_events().is_empty());

        f.vote(&task, "alice", Ballot::Approve, 1).unwrap();
        assert_eq!(f.voter.drain_events().len(), 1);
    }
}
