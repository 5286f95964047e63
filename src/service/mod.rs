//! Service layer: per-resource-type orchestration of the write pipeline,
//! locking, storage and group-sync production, plus the aggregate
//! [`ScimService`] an embedding application talks to.
//!
//! The control flow for a write is the one the rest of the crate is built
//! around: decode JSON into a property tree, run the filter pipeline,
//! serialize the stored resource back out. Replace, patch and delete
//! acquire the per-id lock first; reads are lock-free.

pub mod bulk;
pub mod discovery;
pub mod query;
pub mod resources;

use crate::config::ServiceConfig;
use crate::error::ScimResult;
use crate::groups::{GroupSyncWorker, MemorySyncQueue, SyncQueue};
use crate::lock::LockManager;
use crate::pipeline::Pipeline;
use crate::schema::{ResourceType, SchemaRegistry};
use crate::storage::{MemoryStorage, Storage};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// Outcome of one service operation, ready for an HTTP mapping.
#[derive(Debug, Clone)]
pub struct ResourceResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, absent for 204/304
    pub body: Option<Value>,
    /// `Location` header value, when the operation addresses a resource
    pub location: Option<String>,
    /// `ETag` header value, when a version is known
    pub version: Option<String>,
}

impl ResourceResponse {
    fn ok(body: Value, location: Option<String>, version: Option<String>) -> Self {
        Self {
            status: 200,
            body: Some(body),
            location,
            version,
        }
    }

    fn created(body: Value, location: Option<String>, version: Option<String>) -> Self {
        Self {
            status: 201,
            body: Some(body),
            location,
            version,
        }
    }

    fn no_content(version: Option<String>) -> Self {
        Self {
            status: 204,
            body: None,
            location: None,
            version,
        }
    }

    fn not_modified(version: Option<String>) -> Self {
        Self {
            status: 304,
            body: None,
            location: None,
            version,
        }
    }
}

/// CRUD and query service for one resource type.
pub struct ResourceService {
    resource_type: Arc<ResourceType>,
    storage: Arc<dyn Storage>,
    pipeline: Pipeline,
    patch_pipeline: Pipeline,
    locks: Arc<LockManager>,
    config: Arc<ServiceConfig>,
    /// Present on group services; every accepted write feeds the sync queue
    sync_queue: Option<Arc<dyn SyncQueue>>,
    /// Query result ceiling from the service provider configuration
    max_results: usize,
}

impl ResourceService {
    /// Wire a service for `resource_type` over `storage`.
    pub fn new(
        resource_type: Arc<ResourceType>,
        storage: Arc<dyn Storage>,
        locks: Arc<LockManager>,
        config: Arc<ServiceConfig>,
        sync_queue: Option<Arc<dyn SyncQueue>>,
        max_results: usize,
    ) -> Self {
        Self {
            pipeline: Pipeline::standard(Arc::clone(&config), Arc::clone(&storage)),
            patch_pipeline: Pipeline::for_patch(Arc::clone(&config), Arc::clone(&storage)),
            resource_type,
            storage,
            locks,
            config,
            sync_queue,
            max_results,
        }
    }

    /// The resource type this service manages.
    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.resource_type
    }

    /// The storage backend behind this service.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}

/// The aggregate SCIM service: one [`ResourceService`] per resource type,
/// discovery documents, bulk dispatch and the group-sync worker wiring.
pub struct ScimService {
    registry: Arc<SchemaRegistry>,
    config: Arc<ServiceConfig>,
    users: ResourceService,
    groups: ResourceService,
    user_storage: Arc<dyn Storage>,
    group_storage: Arc<dyn Storage>,
    locks: Arc<LockManager>,
    sync_queue: Arc<dyn SyncQueue>,
}

impl ScimService {
    /// Build a service over in-memory backends.
    pub fn new(config: ServiceConfig) -> ScimResult<Self> {
        Self::with_backends(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
            Arc::new(MemorySyncQueue::new()),
        )
    }

    /// Build a service over explicit backends.
    pub fn with_backends(
        config: ServiceConfig,
        user_storage: Arc<dyn Storage>,
        group_storage: Arc<dyn Storage>,
        sync_queue: Arc<dyn SyncQueue>,
    ) -> ScimResult<Self> {
        let registry = Arc::new(SchemaRegistry::new()?);
        let config = Arc::new(config);
        let locks = Arc::new(LockManager::new());
        let max_results = registry.service_provider_config().filter.max_results;

        let user_type = registry
            .resource_type("User")
            .cloned()
            .ok_or_else(|| crate::error::ScimError::internal("User resource type missing"))?;
        let group_type = registry
            .resource_type("Group")
            .cloned()
            .ok_or_else(|| crate::error::ScimError::internal("Group resource type missing"))?;

        let users = ResourceService::new(
            user_type,
            Arc::clone(&user_storage),
            Arc::clone(&locks),
            Arc::clone(&config),
            None,
            max_results,
        );
        let groups = ResourceService::new(
            group_type,
            Arc::clone(&group_storage),
            Arc::clone(&locks),
            Arc::clone(&config),
            Some(Arc::clone(&sync_queue)),
            max_results,
        );

        Ok(Self {
            registry,
            config,
            users,
            groups,
            user_storage,
            group_storage,
            locks,
            sync_queue,
        })
    }

    /// The schema registry.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// The service configuration.
    pub fn config(&self) -> &Arc<ServiceConfig> {
        &self.config
    }

    /// The user service.
    pub fn users(&self) -> &ResourceService {
        &self.users
    }

    /// The group service.
    pub fn groups(&self) -> &ResourceService {
        &self.groups
    }

    /// Look up the service for a resource type name or endpoint.
    pub fn resource_service(&self, name_or_endpoint: &str) -> Option<&ResourceService> {
        [&self.users, &self.groups].into_iter().find(|service| {
            service.resource_type.name == name_or_endpoint
                || service.resource_type.endpoint == name_or_endpoint
        })
    }

    /// Build the group-sync worker over this service's backends.
    pub fn group_sync_worker(&self) -> GroupSyncWorker {
        GroupSyncWorker::new(
            Arc::clone(&self.user_storage),
            Arc::clone(&self.group_storage),
            Arc::clone(&self.sync_queue),
            Arc::clone(&self.locks),
            self.config.sync_poll_seconds,
        )
    }

    /// Spawn the group-sync worker on the runtime. Send `true` on the
    /// returned channel to stop it.
    pub fn start_group_sync(&self) -> watch::Sender<bool> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = self.group_sync_worker();
        tokio::spawn(async move {
            worker.run(shutdown_rx).await;
        });
        shutdown_tx
    }
}
