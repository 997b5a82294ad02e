//! Nullable credit issuer: records every call.

use std::sync::{Arc, Mutex};
use verity_coordinator::CreditIssuer;
use verity_types::{CollaboratorError, Identity, ProjectId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssuerCall {
    Issue {
        beneficiary: Identity,
        unit: ProjectId,
        amount: u128,
        evidence_ref: String,
    },
    Reverse {
        unit: ProjectId,
        amount: u128,
    },
}

#[derive(Default)]
struct State {
    calls: Vec<IssuerCall>,
    fail_issue: bool,
    fail_reverse: bool,
}

#[derive(Clone, Default)]
pub struct NullIssuer {
    state: Arc<Mutex<State>>,
}

impl NullIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful calls, in order.
    pub fn calls(&self) -> Vec<IssuerCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Net credits outstanding for `unit`.
    pub fn outstanding(&self, unit: &ProjectId) -> i128 {
        self.calls()
            .iter()
            .map(|call| match call {
                IssuerCall::Issue { unit: u, amount, .. } if u == unit => *amount as i128,
                IssuerCall::Reverse { unit: u, amount } if u == unit => -(*amount as i128),
                _ => 0,
            })
            .sum()
    }

    pub fn set_failing(&self, failing: bool) {
        let mut state = self.state.lock().unwrap();
        state.fail_issue = failing;
        state.fail_reverse = failing;
    }

    /// Fail only `issue`, leaving `reverse` working.
    pub fn set_issue_failing(&self, failing: bool) {
        self.state.lock().unwrap().fail_issue = failing;
    }
}

impl CreditIssuer for NullIssuer {
    fn issue(
        &mut self,
        beneficiary: &Identity,
        unit: &ProjectId,
        amount: u128,
        evidence_ref: &str,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_issue {
            return Err(CollaboratorError::rejected("issuer", "set to fail"));
        }
        state.calls.push(IssuerCall::Issue {
            beneficiary: beneficiary.clone(),
            unit: unit.clone(),
            amount,
            evidence_ref: evidence_ref.to_string(),
        });
        Ok(())
    }

    fn reverse(&mut self, unit: &ProjectId, amount: u128) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_reverse {
            return Err(CollaboratorError::rejected("issuer", "set to fail"));
        }
        state.calls.push(IssuerCall::Reverse {
            unit: unit.clone(),
            amount,
        });
        Ok(())
    }
}
