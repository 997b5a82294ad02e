//! External collaborators consumed by the coordinator.

use serde::{Deserialize, Serialize};
use verity_types::{CollaboratorError, Identity, ProjectId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    Pending,
    Active,
    Paused,
    Archived,
}

/// The project registry. Only `Active` projects accept claims.
pub trait ProjectCatalog: Send {
    fn status(&self, project: &ProjectId) -> Option<ProjectStatus>;
    /// Beneficiary of credits issued for the project.
    fn owner(&self, project: &ProjectId) -> Option<Identity>;
}

/// The credit-unit ledger. The project id doubles as the unit id.
pub trait CreditIssuer: Send {
    fn issue(
        &mut self,
        beneficiary: &Identity,
        unit: &ProjectId,
        amount: u128,
        evidence_ref: &str,
    ) -> Result<(), CollaboratorError>;

    fn reverse(&mut self, unit: &ProjectId, amount: u128) -> Result<(), CollaboratorError>;
}
