//! Nullable project catalog.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use verity_coordinator::{ProjectCatalog, ProjectStatus};
use verity_types::{Identity, ProjectId};

#[derive(Clone, Default)]
pub struct NullProjectCatalog {
    projects: Arc<Mutex<HashMap<ProjectId, (Identity, ProjectStatus)>>>,
}

impl NullProjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, project: &ProjectId, owner: &Identity, status: ProjectStatus) {
        self.projects
            .lock()
            .unwrap()
            .insert(project.clone(), (owner.clone(), status));
    }

    /// Change a known project's status. Unknown projects are ignored.
    pub fn set_status(&self, project: &ProjectId, status: ProjectStatus) {
        if let Some(entry) = self.projects.lock().unwrap().get_mut(project) {
            entry.1 = status;
        }
    }
}

impl ProjectCatalog for NullProjectCatalog {
    fn status(&self, project: &ProjectId) -> Option<ProjectStatus> {
        self.projects.lock().unwrap().get(project).map(|(_, s)| *s)
    }

    fn owner(&self, project: &ProjectId) -> Option<Identity> {
        self.projects
            .lock()
            .unwrap()
            .get(project)
            .map(|(o, _)| o.clone())
    }
}
