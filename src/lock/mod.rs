//! Per-resource pessimistic locking.
//!
//! One token per resource id; [`LockManager::lock`] parks until the token is
//! free or the request deadline passes. The contract is non-reentrant and
//! makes no fairness guarantee. Reads never take the lock; only writers
//! serialize here.

use crate::context::RequestContext;
use crate::error::{ScimError, ScimResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Holds the lock for one resource id; dropping it releases the lock.
pub struct LockGuard {
    _permit: OwnedSemaphorePermit,
}

/// Mutual exclusion keyed by resource id.
#[derive(Default)]
pub struct LockManager {
    tokens: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl LockManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `id`, waiting until it is free or the context
    /// deadline passes. Resources without ids cannot be locked.
    pub async fn lock(&self, ctx: &RequestContext, id: &str) -> ScimResult<LockGuard> {
        if id.is_empty() {
            return Err(ScimError::invalid_value("cannot lock a resource without an id"));
        }
        let semaphore = {
            let mut tokens = self
                .tokens
                .lock()
                .map_err(|_| ScimError::internal("lock table poisoned"))?;
            Arc::clone(
                tokens
                    .entry(id.to_string())
                    .or_insert_with(|| Arc::new(Semaphore::new(1))),
            )
        };
        let acquired = match ctx.remaining() {
            Some(remaining) => tokio::time::timeout(remaining, semaphore.acquire_owned())
                .await
                .map_err(|_| {
                    log::warn!("[{}] lock wait on {id} hit the deadline", ctx.request_id);
                    ScimError::internal(format!("deadline exceeded while locking '{id}'"))
                })?,
            None => semaphore.acquire_owned().await,
        };
        let permit = acquired.map_err(|_| ScimError::internal("lock semaphore closed"))?;
        Ok(LockGuard { _permit: permit })
    }
}
