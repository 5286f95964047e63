//! The per-request filter pipeline.
//!
//! A pipeline is an ordered list of filters built at service-construction
//! time and run on every write. Per-resource filters see the whole resource
//! (and, on update, the stored reference); per-property filters are applied
//! through a tree visitor that walks live and reference trees in lock-step.
//!
//! The standard order is ClearReadOnly, CopyReadOnly, ID, Password, Meta,
//! Validation. Patch flows run the tail of the pipeline starting at
//! CopyReadOnly, since a patch starts from the stored resource rather than
//! a freshly decoded one.

pub mod id;
pub mod meta;
pub mod password;
pub mod readonly;
pub mod validation;
pub mod visitor;

pub use id::IdFilter;
pub use meta::MetaFilter;
pub use password::PasswordFilter;
pub use readonly::{ClearReadOnly, CopyReadOnly};
pub use validation::ValidationFilter;
pub use visitor::visit_pairs;

use crate::config::ServiceConfig;
use crate::context::RequestContext;
use crate::error::ScimResult;
use crate::property::{Property, Resource};
use crate::schema::Attribute;
use crate::storage::Storage;
use async_trait::async_trait;
use std::sync::Arc;

/// Which write produced the resource under filtration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    /// The resource is new
    Create,
    /// The resource replaces or patches a stored one
    Update,
}

/// Mutable state threaded through one pipeline run.
#[derive(Debug)]
pub struct FilterContext {
    /// The kind of write being filtered
    pub op: WriteOp,
    /// Set by the meta filter when an update changed nothing
    pub no_change: bool,
    /// The request this run serves
    pub request: RequestContext,
}

impl FilterContext {
    fn new(op: WriteOp, request: RequestContext) -> Self {
        Self {
            op,
            no_change: false,
            request,
        }
    }
}

/// A pipeline stage invoked once per resource.
#[async_trait]
pub trait ResourceFilter: Send + Sync {
    /// Process `resource`; `reference` is the stored resource on update.
    async fn filter(
        &self,
        ctx: &mut FilterContext,
        resource: &mut Resource,
        reference: Option<&Resource>,
    ) -> ScimResult<()>;
}

/// A pipeline stage invoked per property during a tree visit.
pub trait PropertyFilter: Send + Sync {
    /// Whether this filter applies to properties of `attr`.
    fn supports(&self, attr: &Attribute) -> bool;

    /// Process one property; `reference` is the matching property of the
    /// stored resource, or `None` when out of sync.
    fn on_property(
        &self,
        ctx: &mut FilterContext,
        prop: &mut Property,
        reference: Option<&Property>,
    ) -> ScimResult<()>;
}

/// Adapter running one property filter over the whole tree.
pub struct PropertyStage<F: PropertyFilter> {
    inner: F,
}

impl<F: PropertyFilter> PropertyStage<F> {
    /// Wrap a property filter as a pipeline stage.
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<F: PropertyFilter> ResourceFilter for PropertyStage<F> {
    async fn filter(
        &self,
        ctx: &mut FilterContext,
        resource: &mut Resource,
        reference: Option<&Resource>,
    ) -> ScimResult<()> {
        visit_pairs(resource, reference, &mut |prop, ref_prop| {
            if self.inner.supports(prop.attr()) {
                self.inner.on_property(ctx, prop, ref_prop)?;
            }
            Ok(())
        })
    }
}

/// An ordered list of filters run on create, replace and patch.
pub struct Pipeline {
    stages: Vec<Box<dyn ResourceFilter>>,
}

impl Pipeline {
    /// The standard pipeline for create and replace.
    pub fn standard(config: Arc<ServiceConfig>, storage: Arc<dyn Storage>) -> Self {
        Self {
            stages: vec![
                Box::new(PropertyStage::new(ClearReadOnly)),
                Box::new(PropertyStage::new(CopyReadOnly)),
                Box::new(IdFilter),
                Box::new(PropertyStage::new(PasswordFilter::new(config.bcrypt_cost))),
                Box::new(MetaFilter::new(Arc::clone(&config))),
                Box::new(ValidationFilter::new(storage)),
            ],
        }
    }

    /// The pipeline tail for patch: everything from CopyReadOnly on.
    pub fn for_patch(config: Arc<ServiceConfig>, storage: Arc<dyn Storage>) -> Self {
        Self {
            stages: vec![
                Box::new(PropertyStage::new(CopyReadOnly)),
                Box::new(PropertyStage::new(PasswordFilter::new(config.bcrypt_cost))),
                Box::new(MetaFilter::new(Arc::clone(&config))),
                Box::new(ValidationFilter::new(storage)),
            ],
        }
    }

    /// Run every stage in order. Returns `true` when the meta filter
    /// detected that an update changed nothing.
    pub async fn run(
        &self,
        request: &RequestContext,
        op: WriteOp,
        resource: &mut Resource,
        reference: Option<&Resource>,
    ) -> ScimResult<bool> {
        let mut ctx = FilterContext::new(op, request.clone());
        for stage in &self.stages {
            stage.filter(&mut ctx, resource, reference).await?;
        }
        Ok(ctx.no_change)
    }
}
