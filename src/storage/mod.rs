//! Storage abstraction for SCIM resources.
//!
//! The [`Storage`] trait is the contract the request pipeline relies on:
//! insert/get/replace/delete plus filtered count and query. Filters cross
//! this boundary as SCIM filter strings so that backends may compile or
//! translate them however suits their engine; the bundled in-memory backend
//! evaluates them against the property tree.

pub mod memory;

pub use memory::MemoryStorage;

use crate::context::RequestContext;
use crate::error::ScimResult;
use crate::json::Projection;
use crate::property::Resource;
use crate::query::SortOrder;
use async_trait::async_trait;

/// Query parameters understood by every backend.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// SCIM filter string; absent means all resources
    pub filter: Option<String>,
    /// Attribute path to sort by
    pub sort_by: Option<String>,
    /// Sort direction, meaningful only with `sort_by`
    pub sort_order: SortOrder,
    /// 1-based index of the first returned resource
    pub start_index: usize,
    /// Maximum resources to return; absent means backend default
    pub count: Option<usize>,
}

/// Result page of a query.
#[derive(Debug, Default)]
pub struct QueryResult {
    /// Total matches before pagination
    pub total_results: usize,
    /// The requested page, in sort order
    pub resources: Vec<Resource>,
}

/// Pluggable persistence for one resource type.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a new resource; fails with `uniqueness` on id collision.
    async fn insert(&self, ctx: &RequestContext, resource: Resource) -> ScimResult<()>;

    /// Fetch a resource by id; fails with `resourceNotFound` when absent.
    /// Backends may use `projection` to avoid materializing never-returned
    /// data; the in-memory backend returns full resources.
    async fn get(
        &self,
        ctx: &RequestContext,
        id: &str,
        projection: Option<&Projection>,
    ) -> ScimResult<Resource>;

    /// Overwrite an existing resource; fails with `resourceNotFound` when
    /// the id is missing.
    async fn replace(&self, ctx: &RequestContext, resource: Resource) -> ScimResult<()>;

    /// Remove a resource by id; fails with `resourceNotFound` when absent.
    async fn delete(&self, ctx: &RequestContext, id: &str) -> ScimResult<()>;

    /// Number of resources matching a SCIM filter string.
    async fn count(&self, ctx: &RequestContext, filter: &str) -> ScimResult<usize>;

    /// Filtered, sorted, paginated query.
    async fn query(
        &self,
        ctx: &RequestContext,
        params: &QueryParams,
        projection: Option<&Projection>,
    ) -> ScimResult<QueryResult>;
}
