//! In-memory storage backend.
//!
//! A single read-write lock guards a map from resource id to resource.
//! Intended for tests, development and as the reference implementation of
//! the [`Storage`] contract. Filters are compiled and evaluated against the
//! property tree on every call; there are no indexes.

use super::{QueryParams, QueryResult, Storage};
use crate::context::RequestContext;
use crate::error::{ScimError, ScimResult};
use crate::expr::{compile_filter_cached, compile_path_cached};
use crate::json::Projection;
use crate::property::Resource;
use crate::query::{compare_resources, evaluate};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Thread-safe in-memory implementation of [`Storage`].
#[derive(Default)]
pub struct MemoryStorage {
    resources: RwLock<HashMap<String, Resource>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored resources, for tests and diagnostics.
    pub async fn len(&self) -> usize {
        self.resources.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.resources.read().await.is_empty()
    }

    /// Remove everything, for tests.
    pub async fn clear(&self) {
        self.resources.write().await.clear();
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn insert(&self, ctx: &RequestContext, resource: Resource) -> ScimResult<()> {
        let id = required_id(&resource)?;
        let mut guard = self.resources.write().await;
        if guard.contains_key(&id) {
            return Err(ScimError::Uniqueness {
                attribute: "id".to_string(),
            });
        }
        log::debug!("[{}] insert resource {id}", ctx.request_id);
        guard.insert(id, resource);
        Ok(())
    }

    async fn get(
        &self,
        ctx: &RequestContext,
        id: &str,
        _projection: Option<&Projection>,
    ) -> ScimResult<Resource> {
        let guard = self.resources.read().await;
        log::debug!("[{}] get resource {id}", ctx.request_id);
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| ScimError::ResourceNotFound { id: id.to_string() })
    }

    async fn replace(&self, ctx: &RequestContext, resource: Resource) -> ScimResult<()> {
        let id = required_id(&resource)?;
        let mut guard = self.resources.write().await;
        if !guard.contains_key(&id) {
            return Err(ScimError::ResourceNotFound { id });
        }
        log::debug!("[{}] replace resource {id}", ctx.request_id);
        guard.insert(id, resource);
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, id: &str) -> ScimResult<()> {
        let mut guard = self.resources.write().await;
        log::debug!("[{}] delete resource {id}", ctx.request_id);
        guard
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ScimError::ResourceNotFound { id: id.to_string() })
    }

    async fn count(&self, _ctx: &RequestContext, filter: &str) -> ScimResult<usize> {
        let compiled = compile_filter_cached(filter)?;
        let guard = self.resources.read().await;
        let mut total = 0;
        for resource in guard.values() {
            if evaluate(&compiled, resource.root())? {
                total += 1;
            }
        }
        Ok(total)
    }

    async fn query(
        &self,
        _ctx: &RequestContext,
        params: &QueryParams,
        _projection: Option<&Projection>,
    ) -> ScimResult<QueryResult> {
        let compiled = match &params.filter {
            Some(filter) => Some(compile_filter_cached(filter)?),
            None => None,
        };
        let guard = self.resources.read().await;
        let mut matched: Vec<Resource> = Vec::new();
        for resource in guard.values() {
            let keep = match &compiled {
                Some(filter) => evaluate(filter, resource.root())?,
                None => true,
            };
            if keep {
                matched.push(resource.clone());
            }
        }
        drop(guard);

        match &params.sort_by {
            Some(sort_by) => {
                let path = compile_path_cached(sort_by)?;
                matched
                    .sort_by(|a, b| compare_resources(a, b, &path, params.sort_order));
            }
            None => {
                // Deterministic default order for stable pagination.
                matched.sort_by(|a, b| a.id().unwrap_or("").cmp(b.id().unwrap_or("")));
            }
        }

        let total_results = matched.len();
        let start = params.start_index.max(1) - 1;
        let resources: Vec<Resource> = matched
            .into_iter()
            .skip(start)
            .take(params.count.unwrap_or(usize::MAX))
            .collect();
        Ok(QueryResult {
            total_results,
            resources,
        })
    }
}

fn required_id(resource: &Resource) -> ScimResult<String> {
    resource
        .id()
        .map(str::to_string)
        .ok_or_else(|| ScimError::internal("resource has no id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::compile_path;
    use crate::schema::SchemaRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn user(id: &str, user_name: &str) -> Resource {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        let mut resource = Resource::new(Arc::clone(rt));
        resource
            .replace(&compile_path("id").unwrap(), &json!(id))
            .unwrap();
        resource
            .replace(&compile_path("userName").unwrap(), &json!(user_name))
            .unwrap();
        resource
    }

    #[tokio::test]
    async fn insert_get_replace_delete_cycle() {
        let storage = MemoryStorage::new();
        let ctx = RequestContext::with_generated_id();
        storage.insert(&ctx, user("1", "alice")).await.unwrap();

        let fetched = storage.get(&ctx, "1", None).await.unwrap();
        assert_eq!(fetched.id(), Some("1"));

        storage.replace(&ctx, user("1", "alice2")).await.unwrap();
        storage.delete(&ctx, "1").await.unwrap();
        assert!(matches!(
            storage.get(&ctx, "1", None).await,
            Err(ScimError::ResourceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn insert_rejects_id_collision() {
        let storage = MemoryStorage::new();
        let ctx = RequestContext::with_generated_id();
        storage.insert(&ctx, user("1", "alice")).await.unwrap();
        assert!(matches!(
            storage.insert(&ctx, user("1", "bob")).await,
            Err(ScimError::Uniqueness { .. })
        ));
    }

    #[tokio::test]
    async fn replace_requires_existing_id() {
        let storage = MemoryStorage::new();
        let ctx = RequestContext::with_generated_id();
        assert!(matches!(
            storage.replace(&ctx, user("9", "ghost")).await,
            Err(ScimError::ResourceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn query_filters_sorts_and_paginates() {
        let storage = MemoryStorage::new();
        let ctx = RequestContext::with_generated_id();
        for (id, name) in [("1", "carol"), ("2", "alice"), ("3", "bob")] {
            storage.insert(&ctx, user(id, name)).await.unwrap();
        }

        let result = storage
            .query(
                &ctx,
                &QueryParams {
                    sort_by: Some("userName".to_string()),
                    start_index: 2,
                    count: Some(1),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(result.total_results, 3);
        assert_eq!(result.resources.len(), 1);
        assert_eq!(
            result.resources[0]
                .get(&compile_path("userName").unwrap())
                .unwrap(),
            json!("bob")
        );

        let filtered = storage
            .query(
                &ctx,
                &QueryParams {
                    filter: Some(r#"userName sw "b""#.to_string()),
                    start_index: 1,
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(filtered.total_results, 1);
    }

    #[tokio::test]
    async fn count_evaluates_filters() {
        let storage = MemoryStorage::new();
        let ctx = RequestContext::with_generated_id();
        storage.insert(&ctx, user("1", "alice")).await.unwrap();
        storage.insert(&ctx, user("2", "bob")).await.unwrap();
        assert_eq!(
            storage.count(&ctx, r#"userName eq "alice""#).await.unwrap(),
            1
        );
        assert_eq!(
            storage.count(&ctx, r#"userName eq "carol""#).await.unwrap(),
            0
        );
    }
}
