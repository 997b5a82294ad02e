//! Role-based access control and the pause switch.
//!
//! Roles are held per identity as a set, so an identity holding several
//! roles is counted once per role and enumeration is exact.

use crate::error::GovernanceError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use verity_types::{AuditEvent, Caller, Identity};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Holds every capability, including granting roles.
    Admin,
    Pauser,
    MethodologyProposer,
    MethodologyApprover,
    ParameterSetter,
}

/// A privileged action. Each entry point names the one it requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Pause,
    ProposeMethodology,
    ApproveMethodology,
    DeprecateMethodology,
    ActivateMethodology,
    RegisterStrategy,
    SetParameter,
    AdminOverride,
    GrantRole,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Pauser,
        Role::MethodologyProposer,
        Role::MethodologyApprover,
        Role::ParameterSetter,
    ];

    pub fn grants(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Pauser => capability == Capability::Pause,
            Role::MethodologyProposer => capability == Capability::ProposeMethodology,
            Role::MethodologyApprover => matches!(
                capability,
                Capability::ApproveMethodology
                    | Capability::DeprecateMethodology
                    | Capability::ActivateMethodology
            ),
            Role::ParameterSetter => capability == Capability::SetParameter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pauser => "pauser",
            Role::MethodologyProposer => "methodology_proposer",
            Role::MethodologyApprover => "methodology_approver",
            Role::ParameterSetter => "parameter_setter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccessControl {
    roles: BTreeMap<Identity, BTreeSet<Role>>,
    paused: bool,
    #[serde(skip)]
    pending_events: Vec<AuditEvent>,
}

impl AccessControl {
    /// Seed the initial administrators. Seeding emits no audit events.
    pub fn new(admins: impl IntoIterator<Item = Identity>) -> Self {
        let mut roles: BTreeMap<Identity, BTreeSet<Role>> = BTreeMap::new();
        for admin in admins.into_iter().filter(Identity::is_valid) {
            roles.entry(admin).or_default().insert(Role::Admin);
        }
        Self {
            roles,
            paused: false,
            pending_events: Vec::new(),
        }
    }

    pub fn has_role(&self, who: &Identity, role: Role) -> bool {
        self.roles.get(who).is_some_and(|set| set.contains(&role))
    }

    pub fn roles_of(&self, who: &Identity) -> Vec<Role> {
        self.roles
            .get(who)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every identity holding `role`, sorted.
    pub fn members(&self, role: Role) -> Vec<Identity> {
        self.roles
            .iter()
            .filter(|(_, set)| set.contains(&role))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn member_count(&self, role: Role) -> usize {
        self.roles.values().filter(|set| set.contains(&role)).count()
    }

    /// Whether `caller` holds `capability` through any of its roles.
    /// Only account callers hold roles.
    pub fn permits(&self, caller: &Caller, capability: Capability) -> bool {
        caller
            .identity()
            .and_then(|id| self.roles.get(id))
            .is_some_and(|set| set.iter().any(|r| r.grants(capability)))
    }

    pub fn check(&self, caller: &Caller, capability: Capability) -> Result<(), GovernanceError> {
        if self.permits(caller, capability) {
            Ok(())
        } else {
            tracing::warn!(%caller, %capability, "unauthorized call rejected");
            Err(GovernanceError::Unauthorized {
                caller: caller.to_string(),
                capability: capability.to_string(),
            })
        }
    }

    pub fn grant_role(
        &mut self,
        caller: &Caller,
        account: &Identity,
        role: Role,
    ) -> Result<(), GovernanceError> {
        self.check(caller, Capability::GrantRole)?;
        if !account.is_valid() {
            return Err(GovernanceError::InvalidIdentity);
        }
        if self.roles.entry(account.clone()).or_default().insert(role) {
            self.pending_events.push(AuditEvent::RoleGranted {
                account: account.clone(),
                role: role.name().to_string(),
            });
            tracing::info!(%account, %role, "role granted");
        }
        Ok(())
    }

    pub fn revoke_role(
        &mut self,
        caller: &Caller,
        account: &Identity,
        role: Role,
    ) -> Result<(), GovernanceError> {
        self.check(caller, Capability::GrantRole)?;
        if !self.has_role(account, role) {
            return Ok(());
        }
        if role == Role::Admin && self.member_count(Role::Admin) == 1 {
            return Err(GovernanceError::LastAdmin);
        }
        if let Some(set) = self.roles.get_mut(account) {
            set.remove(&role);
            if set.is_empty() {
                self.roles.remove(account);
            }
        }
        self.pending_events.push(AuditEvent::RoleRevoked {
            account: account.clone(),
            role: role.name().to_string(),
        });
        tracing::info!(%account, %role, "role revoked");
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fails with [`GovernanceError::Paused`] while the switch is on.
    pub fn ensure_not_paused(&self) -> Result<(), GovernanceError> {
        if self.paused {
            Err(GovernanceError::Paused)
        } else {
            Ok(())
        }
    }

    pub fn pause(&mut self, caller: &Caller) -> Result<(), GovernanceError> {
        self.set_paused(caller, true)
    }

    pub fn unpause(&mut self, caller: &Caller) -> Result<(), GovernanceError> {
        self.set_paused(caller, false)
    }

    fn set_paused(&mut self, caller: &Caller, paused: bool) -> Result<(), GovernanceError> {
        self.check(caller, Capability::Pause)?;
        let Some(by) = caller.identity().cloned() else {
            return Ok(());
        };
        if self.paused == paused {
            return Ok(());
        }
        self.paused = paused;
        if paused {
            tracing::warn!(%by, "system paused");
            self.pending_events.push(AuditEvent::Paused { by });
        } else {
            tracing::info!(%by, "system unpaused");
            self.pending_events.push(AuditEvent::Unpaused { by });
        }
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
