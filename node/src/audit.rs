//! Append-only audit log.
//!
//! Every event an engine commits is drained into the log after the call
//! that produced it, stamped with a sequence number and the node time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use verity_types::{AuditEvent, TaskId, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Position in the log, starting at 0 and never reused.
    pub seq: u64,
    pub at: Timestamp,
    pub event: AuditEvent,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
    by_task: BTreeMap<TaskId, Vec<u64>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, at: Timestamp, event: AuditEvent) -> u64 {
        let seq = self.records.len() as u64;
        if let Some(task) = event.task() {
            self.by_task.entry(task).or_default().push(seq);
        }
        tracing::trace!(seq, ?event, "audit");
        self.records.push(AuditRecord { seq, at, event });
        seq
    }

    pub fn extend(&mut self, at: Timestamp, events: impl IntoIterator<Item = AuditEvent>) {
        for event in events {
            self.append(at, event);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn get(&self, seq: u64) -> Option<&AuditRecord> {
        usize::try_from(seq).ok().and_then(|i| self.records.get(i))
    }

    /// Records with `seq >= from`, for consumers tailing the log.
    pub fn since(&self, from: u64) -> &[AuditRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    /// Every record about `task`, in log order.
    pub fn for_task(&self, task: &TaskId) -> Vec<&AuditRecord> {
        self.by_task
            .get(task)
            .into_iter()
            .flatten()
            .filter_map(|seq| self.get(*seq))
            .collect()
    }
}
