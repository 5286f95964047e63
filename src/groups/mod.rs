//! Group membership synchronization: diff model and the durable queue.
//!
//! Every group mutation is distilled into a [`SyncRecord`]: one queue of
//! per-member diffs, stored alongside resources so that a crashed worker
//! resumes where it stopped. The worker (see [`worker`]) drains records
//! oldest-first and keeps each user's `groups` array consistent with the
//! groups that actually reference it, including transitive membership.

pub mod worker;

pub use worker::GroupSyncWorker;

use crate::error::ScimResult;
use crate::expr::compile_path_cached;
use crate::property::Resource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use uuid::Uuid;

/// Whether a member entered or left the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiffStatus {
    /// The member id appears in the new state only
    Joined,
    /// The member id appears in the old state only
    Left,
}

/// What the member id refers to, once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiffKind {
    /// The id names a user
    Direct,
    /// The id names another group
    Indirect,
    /// Not yet resolved against the user store
    Unknown,
}

/// One pending membership change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDiff {
    /// Member id the change concerns
    pub value: String,
    /// Join or leave
    pub status: DiffStatus,
    /// Resolution state
    pub kind: DiffKind,
}

/// Durable unit of group-sync work: the origin group plus a FIFO of diffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord {
    /// Record id, also the lock key while a worker holds it
    pub id: String,
    /// Id of the group whose membership changed
    pub group_id: String,
    /// Display name of the origin group, denormalized for `groups[].display`
    pub group_display: String,
    /// `meta.location` of the origin group, denormalized for `groups[].$ref`
    pub group_location: String,
    /// Member ids directly listed by the origin group after the change;
    /// used to distinguish `direct` from `indirect` user entries
    pub direct_members: HashSet<String>,
    /// Group ids already expanded in this traversal; breaks cycles
    pub visited: HashSet<String>,
    /// Creation instant; records drain oldest-first
    pub created: DateTime<Utc>,
    /// Pending diffs, processed front to back
    pub diffs: VecDeque<SyncDiff>,
}

/// Compute the member diffs between two states of one group.
///
/// `old` is `None` on create, `new` is `None` on delete. Every diff starts
/// out [`DiffKind::Unknown`]; the worker resolves it against the user store.
pub fn membership_diffs(old: Option<&Resource>, new: Option<&Resource>) -> Vec<SyncDiff> {
    let old_members = member_values(old);
    let new_members = member_values(new);
    let mut diffs = Vec::new();
    for joined in new_members.difference(&old_members) {
        diffs.push(SyncDiff {
            value: joined.clone(),
            status: DiffStatus::Joined,
            kind: DiffKind::Unknown,
        });
    }
    for left in old_members.difference(&new_members) {
        diffs.push(SyncDiff {
            value: left.clone(),
            status: DiffStatus::Left,
            kind: DiffKind::Unknown,
        });
    }
    diffs
}

/// The `members.value` set of a group resource.
pub fn member_values(group: Option<&Resource>) -> HashSet<String> {
    let Some(group) = group else {
        return HashSet::new();
    };
    let Ok(path) = compile_path_cached("members.value") else {
        return HashSet::new();
    };
    match group.get(&path) {
        Ok(serde_json::Value::Array(values)) => values
            .into_iter()
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect(),
        Ok(serde_json::Value::String(single)) => HashSet::from([single]),
        _ => HashSet::new(),
    }
}

/// Build the sync record for one observed group change, or `None` when the
/// membership did not change.
pub fn record_for_change(old: Option<&Resource>, new: Option<&Resource>) -> Option<SyncRecord> {
    let diffs = membership_diffs(old, new);
    if diffs.is_empty() {
        return None;
    }
    let source = new.or(old)?;
    let group_id = source.id()?.to_string();
    Some(SyncRecord {
        id: Uuid::new_v4().to_string(),
        group_id: group_id.clone(),
        group_display: source
            .root()
            .sub_property("displayName")
            .and_then(crate::property::Property::as_str)
            .unwrap_or_default()
            .to_string(),
        group_location: source.location().unwrap_or_default().to_string(),
        direct_members: member_values(new),
        visited: HashSet::from([group_id]),
        created: Utc::now(),
        diffs: VecDeque::from(diffs),
    })
}

/// Durable storage for sync records.
#[async_trait]
pub trait SyncQueue: Send + Sync {
    /// Enqueue a new record.
    async fn push(&self, record: SyncRecord) -> ScimResult<()>;

    /// The oldest record by creation time, left in place; the worker locks
    /// it by id before processing.
    async fn pull_oldest(&self) -> ScimResult<Option<SyncRecord>>;

    /// Overwrite a record that still has pending diffs.
    async fn save(&self, record: SyncRecord) -> ScimResult<()>;

    /// Remove a drained record.
    async fn delete(&self, id: &str) -> ScimResult<()>;
}

/// In-memory [`SyncQueue`] used by tests and the default service wiring.
#[derive(Default)]
pub struct MemorySyncQueue {
    records: Mutex<Vec<SyncRecord>>,
}

impl MemorySyncQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued records, for tests.
    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SyncQueue for MemorySyncQueue {
    async fn push(&self, record: SyncRecord) -> ScimResult<()> {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
        Ok(())
    }

    async fn pull_oldest(&self) -> ScimResult<Option<SyncRecord>> {
        Ok(self.records.lock().ok().and_then(|records| {
            records
                .iter()
                .min_by_key(|record| record.created)
                .cloned()
        }))
    }

    async fn save(&self, record: SyncRecord) -> ScimResult<()> {
        if let Ok(mut records) = self.records.lock() {
            match records.iter_mut().find(|existing| existing.id == record.id) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> ScimResult<()> {
        if let Ok(mut records) = self.records.lock() {
            records.retain(|record| record.id != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::deserialize_resource;
    use crate::schema::SchemaRegistry;
    use serde_json::json;

    fn group(id: &str, members: &[&str]) -> Resource {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("Group").unwrap();
        let members: Vec<_> = members
            .iter()
            .map(|value| json!({"value": value}))
            .collect();
        let mut resource = deserialize_resource(
            rt,
            &json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"],
                "displayName": format!("group-{id}"),
                "members": members
            }),
        )
        .unwrap();
        resource
            .replace(&crate::expr::compile_path("id").unwrap(), &json!(id))
            .unwrap();
        resource
    }

    #[test]
    fn diffs_capture_joins_and_leaves() {
        let old = group("g1", &["u1", "u2"]);
        let new = group("g1", &["u2", "u3"]);
        let diffs = membership_diffs(Some(&old), Some(&new));
        assert_eq!(diffs.len(), 2);
        assert!(diffs.iter().any(|d| d.value == "u3" && d.status == DiffStatus::Joined));
        assert!(diffs.iter().any(|d| d.value == "u1" && d.status == DiffStatus::Left));
        assert!(diffs.iter().all(|d| d.kind == DiffKind::Unknown));
    }

    #[test]
    fn unchanged_membership_produces_no_record() {
        let old = group("g1", &["u1"]);
        let new = group("g1", &["u1"]);
        assert!(record_for_change(Some(&old), Some(&new)).is_none());
    }

    #[test]
    fn delete_emits_leaves_for_every_member() {
        let old = group("g1", &["u1", "u2"]);
        let record = record_for_change(Some(&old), None).unwrap();
        assert_eq!(record.diffs.len(), 2);
        assert!(record.diffs.iter().all(|d| d.status == DiffStatus::Left));
        assert!(record.visited.contains("g1"));
    }

    #[tokio::test]
    async fn queue_drains_oldest_first() {
        let queue = MemorySyncQueue::new();
        let mut first = record_for_change(None, Some(&group("g1", &["u1"]))).unwrap();
        first.created = Utc::now() - chrono::Duration::seconds(10);
        let second = record_for_change(None, Some(&group("g2", &["u2"]))).unwrap();
        queue.push(second).await.unwrap();
        queue.push(first.clone()).await.unwrap();

        let pulled = queue.pull_oldest().await.unwrap().unwrap();
        assert_eq!(pulled.id, first.id);

        queue.delete(&pulled.id).await.unwrap();
        assert_eq!(queue.len(), 1);
    }
}
