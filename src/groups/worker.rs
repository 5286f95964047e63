//! The group-sync worker loop.
//!
//! A single worker pulls the oldest pending sync record, locks it, and
//! works through its diff queue one entry at a time. User-valued diffs
//! rewrite that user's `groups` array under the user's lock; group-valued
//! diffs fan the nested group's members out as new diffs. A visited set per
//! record keeps cyclic group graphs from looping; a failed diff goes back
//! to the front of its queue and the worker resumes on a later pass.

use super::{DiffKind, DiffStatus, SyncDiff, SyncQueue, SyncRecord, member_values};
use crate::context::RequestContext;
use crate::error::{ScimError, ScimResult};
use crate::expr::compile_path_cached;
use crate::lock::LockManager;
use crate::storage::Storage;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Asynchronous reconciler of group membership into user resources.
pub struct GroupSyncWorker {
    users: Arc<dyn Storage>,
    groups: Arc<dyn Storage>,
    queue: Arc<dyn SyncQueue>,
    locks: Arc<LockManager>,
    poll: Duration,
}

impl GroupSyncWorker {
    /// Wire a worker over the two resource stores and the sync queue.
    pub fn new(
        users: Arc<dyn Storage>,
        groups: Arc<dyn Storage>,
        queue: Arc<dyn SyncQueue>,
        locks: Arc<LockManager>,
        poll_seconds: u64,
    ) -> Self {
        Self {
            users,
            groups,
            queue,
            locks,
            poll: Duration::from_secs(poll_seconds.max(1)),
        }
    }

    /// Run until `shutdown` flips to `true`. Sleeps the poll interval when
    /// the queue is empty or a record failed.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        log::info!("group sync worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let idle = match self.process_next().await {
                Ok(processed) => !processed,
                Err(err) => {
                    log::warn!("group sync pass failed: {err}");
                    true
                }
            };
            if !idle {
                continue;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.poll) => {}
                _ = shutdown.changed() => {}
            }
        }
        log::info!("group sync worker stopped");
    }

    /// Process the oldest pending record, if any. Returns whether one was
    /// processed to completion or parked again with remaining diffs.
    pub async fn process_next(&self) -> ScimResult<bool> {
        let Some(mut record) = self.queue.pull_oldest().await? else {
            return Ok(false);
        };
        let ctx = RequestContext::with_generated_id();
        let _guard = self.locks.lock(&ctx, &record.id).await?;
        let outcome = self.drain_record(&ctx, &mut record).await;
        if record.diffs.is_empty() {
            self.queue.delete(&record.id).await?;
        } else {
            self.queue.save(record).await?;
        }
        outcome?;
        Ok(true)
    }

    /// Drain all queued diffs until the queue is processed fully or until the
    /// queue has to be parked because some diff failed.
    async fn drain_record(&self, ctx: &RequestContext, record: &mut SyncRecord) -> ScimResult<()> {
        while let Some(diff) = record.diffs.pop_front() {
            if let Err(err) = self.process_diff(ctx, record, &diff).await {
                // Leave the failed diff queued; the next pass retries it.
                record.diffs.push_front(diff);
                return Err(err);
            }
        }
        Ok(())
    }

    async fn process_diff(
        &self,
        ctx: &RequestContext,
        record: &mut SyncRecord,
        diff: &SyncDiff,
    ) -> ScimResult<()> {
        let kind = match diff.kind {
            DiffKind::Unknown => {
                let filter = format!("id eq \"{}\"", escape(&diff.value));
                if self.users.count(ctx, &filter).await? > 0 {
                    DiffKind::Direct
                } else {
                    DiffKind::Indirect
                }
            }
            resolved => resolved,
        };
        match kind {
            DiffKind::Direct => self.sync_user(ctx, record, diff).await,
            DiffKind::Indirect => self.expand_group(ctx, record, diff).await,
            DiffKind::Unknown => Err(ScimError::internal("unresolved diff kind")),
        }
    }

    /// Rewrite one user's `groups` entry for the origin group.
    async fn sync_user(
        &self,
        ctx: &RequestContext,
        record: &SyncRecord,
        diff: &SyncDiff,
    ) -> ScimResult<()> {
        let _guard = self.locks.lock(ctx, &diff.value).await?;
        let mut user = match self.users.get(ctx, &diff.value, None).await {
            Ok(user) => user,
            // Deleted since the diff was queued; nothing to reconcile.
            Err(ScimError::ResourceNotFound { .. }) => return Ok(()),
            Err(err) => return Err(err),
        };

        let remove = compile_path_cached(&format!(
            "groups[value eq \"{}\"]",
            escape(&record.group_id)
        ))?;
        match user.delete(&remove) {
            Ok(_) => {}
            Err(ScimError::NoTarget { .. }) => {}
            Err(err) => return Err(err),
        }

        if diff.status == DiffStatus::Joined {
            let membership = if record.direct_members.contains(&diff.value) {
                "direct"
            } else {
                "indirect"
            };
            let mut entry = Map::new();
            entry.insert("value".into(), json!(record.group_id));
            if !record.group_location.is_empty() {
                entry.insert("$ref".into(), json!(record.group_location));
            }
            if !record.group_display.is_empty() {
                entry.insert("display".into(), json!(record.group_display));
            }
            entry.insert("type".into(), json!(membership));
            user.add(&*compile_path_cached("groups")?, &Value::Object(entry))?;
        }

        log::debug!(
            "[{}] synced group {} on user {} ({:?})",
            ctx.request_id,
            record.group_id,
            diff.value,
            diff.status
        );
        self.users.replace(ctx, user).await
    }

    /// Fan a nested group's members out as fresh diffs.
    async fn expand_group(
        &self,
        ctx: &RequestContext,
        record: &mut SyncRecord,
        diff: &SyncDiff,
    ) -> ScimResult<()> {
        if record.visited.contains(&diff.value) {
            return Ok(());
        }
        record.visited.insert(diff.value.clone());
        let group = match self.groups.get(ctx, &diff.value, None).await {
            Ok(group) => group,
            Err(ScimError::ResourceNotFound { .. }) => return Ok(()),
            Err(err) => return Err(err),
        };
        for member in member_values(Some(&group)) {
            record.diffs.push_back(SyncDiff {
                value: member,
                status: diff.status,
                kind: DiffKind::Unknown,
            });
        }
        Ok(())
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::{MemorySyncQueue, record_for_change};
    use crate::json::deserialize_resource;
    use crate::schema::SchemaRegistry;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    struct Fixture {
        users: Arc<MemoryStorage>,
        groups: Arc<MemoryStorage>,
        queue: Arc<MemorySyncQueue>,
        worker: GroupSyncWorker,
        ctx: RequestContext,
    }

    fn fixture() -> Fixture {
        let users: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
        let groups: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
        let queue = Arc::new(MemorySyncQueue::new());
        let worker = GroupSyncWorker::new(
            Arc::clone(&users) as Arc<dyn Storage>,
            Arc::clone(&groups) as Arc<dyn Storage>,
            Arc::clone(&queue) as Arc<dyn SyncQueue>,
            Arc::new(LockManager::new()),
            1,
        );
        Fixture {
            users,
            groups,
            queue,
            worker,
            ctx: RequestContext::with_generated_id(),
        }
    }

    async fn seed_user(fixture: &Fixture, id: &str) {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        let mut user = deserialize_resource(
            rt,
            &json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": format!("user-{id}")
            }),
        )
        .unwrap();
        user.replace(&crate::expr::compile_path("id").unwrap(), &json!(id))
            .unwrap();
        fixture.users.insert(&fixture.ctx, user).await.unwrap();
    }

    async fn seed_group(fixture: &Fixture, id: &str, members: &[&str]) {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("Group").unwrap();
        let members: Vec<_> = members.iter().map(|m| json!({"value": m})).collect();
        let mut group = deserialize_resource(
            rt,
            &json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"],
                "displayName": format!("group-{id}"),
                "members": members
            }),
        )
        .unwrap();
        group
            .replace(&crate::expr::compile_path("id").unwrap(), &json!(id))
            .unwrap();
        fixture.groups.insert(&fixture.ctx, group.clone()).await.unwrap();
        if let Some(record) = record_for_change(None, Some(&group)) {
            fixture.queue.push(record).await.unwrap();
        }
    }

    async fn drain(fixture: &Fixture) {
        // Cycle-safe by construction; a handful of passes empties any
        // finite queue used in these tests.
        for _ in 0..16 {
            if !fixture.worker.process_next().await.unwrap() {
                break;
            }
        }
    }

    async fn groups_of(fixture: &Fixture, user_id: &str) -> Value {
        let user = fixture.users.get(&fixture.ctx, user_id, None).await.unwrap();
        user.get(&crate::expr::compile_path("groups").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn direct_membership_is_reflected() {
        let fixture = fixture();
        seed_user(&fixture, "u1").await;
        seed_group(&fixture, "g1", &["u1"]).await;
        drain(&fixture).await;

        let groups = groups_of(&fixture, "u1").await;
        assert_eq!(groups[0]["value"], "g1");
        assert_eq!(groups[0]["type"], "direct");
        assert!(fixture.queue.is_empty());
    }

    #[tokio::test]
    async fn transitive_membership_is_indirect() {
        let fixture = fixture();
        seed_user(&fixture, "u1").await;
        seed_group(&fixture, "g1", &["u1"]).await;
        seed_group(&fixture, "g2", &["g1"]).await;
        drain(&fixture).await;

        let groups = groups_of(&fixture, "u1").await;
        let entries: Vec<(String, String)> = groups
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| {
                (
                    entry["value"].as_str().unwrap().to_string(),
                    entry["type"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert!(entries.contains(&("g1".to_string(), "direct".to_string())));
        assert!(entries.contains(&("g2".to_string(), "indirect".to_string())));
    }

    #[tokio::test]
    async fn cyclic_groups_terminate() {
        let fixture = fixture();
        seed_user(&fixture, "u1").await;
        seed_group(&fixture, "g1", &["g2", "u1"]).await;
        seed_group(&fixture, "g2", &["g1"]).await;
        drain(&fixture).await;
        assert!(fixture.queue.is_empty());
    }

    #[tokio::test]
    async fn leaving_removes_the_entry() {
        let fixture = fixture();
        seed_user(&fixture, "u1").await;
        seed_group(&fixture, "g1", &["u1"]).await;
        drain(&fixture).await;

        let old = fixture.groups.get(&fixture.ctx, "g1", None).await.unwrap();
        let mut updated = old.clone();
        updated
            .delete(&crate::expr::compile_path("members").unwrap())
            .unwrap();
        fixture
            .groups
            .replace(&fixture.ctx, updated.clone())
            .await
            .unwrap();
        if let Some(record) = record_for_change(Some(&old), Some(&updated)) {
            fixture.queue.push(record).await.unwrap();
        }
        drain(&fixture).await;

        let groups = groups_of(&fixture, "u1").await;
        assert!(groups.as_array().map(Vec::is_empty).unwrap_or(true) || groups.is_null());
    }
}
