//! Create, retrieve, replace, patch and delete for one resource type.

use super::{ResourceResponse, ResourceService};
use crate::context::RequestContext;
use crate::error::{ScimError, ScimResult};
use crate::groups::record_for_change;
use crate::json::{Projection, deserialize_resource, serialize};
use crate::patch::PatchRequest;
use crate::pipeline::WriteOp;
use crate::property::Resource;
use crate::protocol::version_matches;
use serde_json::Value;

impl ResourceService {
    /// Create a resource from a decoded request body.
    pub async fn create(&self, ctx: &RequestContext, body: &Value) -> ScimResult<ResourceResponse> {
        let mut resource = deserialize_resource(&self.resource_type, body)?;
        self.pipeline
            .run(ctx, WriteOp::Create, &mut resource, None)
            .await?;
        self.storage.insert(ctx, resource.clone()).await?;
        self.enqueue_sync(None, Some(&resource)).await?;
        log::info!(
            "[{}] created {} {}",
            ctx.request_id,
            self.resource_type.name,
            resource.id().unwrap_or("?")
        );
        let body = serialize(&resource, &Projection::default())?;
        Ok(ResourceResponse::created(
            body,
            resource.location().map(str::to_string),
            resource.version().map(str::to_string),
        ))
    }

    /// Retrieve a resource; honors `If-None-Match` with a 304 outcome.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        id: &str,
        projection: &Projection,
        if_none_match: Option<&str>,
    ) -> ScimResult<ResourceResponse> {
        let resource = self.storage.get(ctx, id, Some(projection)).await?;
        if let Some(header) = if_none_match {
            if version_matches(header, resource.version()) {
                return Ok(ResourceResponse::not_modified(
                    resource.version().map(str::to_string),
                ));
            }
        }
        let body = serialize(&resource, projection)?;
        Ok(ResourceResponse::ok(
            body,
            resource.location().map(str::to_string),
            resource.version().map(str::to_string),
        ))
    }

    /// Replace a resource wholesale; honors `If-Match`.
    pub async fn replace(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: &Value,
        if_match: Option<&str>,
    ) -> ScimResult<ResourceResponse> {
        let _guard = self.locks.lock(ctx, id).await?;
        let reference = self.storage.get(ctx, id, None).await?;
        check_precondition(id, if_match, &reference)?;

        let mut resource = deserialize_resource(&self.resource_type, body)?;
        if let Some(sent) = resource.id() {
            if sent != id {
                return Err(ScimError::mutability("the id attribute cannot be changed"));
            }
        }

        let no_change = self
            .pipeline
            .run(ctx, WriteOp::Update, &mut resource, Some(&reference))
            .await?;
        if no_change {
            log::debug!("[{}] replace of {id} changed nothing", ctx.request_id);
            return Ok(ResourceResponse::no_content(
                reference.version().map(str::to_string),
            ));
        }

        self.storage.replace(ctx, resource.clone()).await?;
        self.enqueue_sync(Some(&reference), Some(&resource)).await?;
        log::info!(
            "[{}] replaced {} {id}",
            ctx.request_id,
            self.resource_type.name
        );
        let body = serialize(&resource, &Projection::default())?;
        Ok(ResourceResponse::ok(
            body,
            resource.location().map(str::to_string),
            resource.version().map(str::to_string),
        ))
    }

    /// Apply a PatchOp document; honors `If-Match`.
    pub async fn patch(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: &Value,
        if_match: Option<&str>,
    ) -> ScimResult<ResourceResponse> {
        let request = PatchRequest::from_value(body)?;
        let _guard = self.locks.lock(ctx, id).await?;
        let reference = self.storage.get(ctx, id, None).await?;
        check_precondition(id, if_match, &reference)?;

        let mut resource = reference.clone();
        crate::patch::apply(&mut resource, &request)?;

        let no_change = self
            .patch_pipeline
            .run(ctx, WriteOp::Update, &mut resource, Some(&reference))
            .await?;
        if no_change {
            log::debug!("[{}] patch of {id} changed nothing", ctx.request_id);
            return Ok(ResourceResponse::no_content(
                reference.version().map(str::to_string),
            ));
        }

        self.storage.replace(ctx, resource.clone()).await?;
        self.enqueue_sync(Some(&reference), Some(&resource)).await?;
        log::info!(
            "[{}] patched {} {id}",
            ctx.request_id,
            self.resource_type.name
        );
        let body = serialize(&resource, &Projection::default())?;
        Ok(ResourceResponse::ok(
            body,
            resource.location().map(str::to_string),
            resource.version().map(str::to_string),
        ))
    }

    /// Delete a resource; honors `If-Match`.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: &str,
        if_match: Option<&str>,
    ) -> ScimResult<ResourceResponse> {
        let _guard = self.locks.lock(ctx, id).await?;
        let reference = self.storage.get(ctx, id, None).await?;
        check_precondition(id, if_match, &reference)?;

        self.storage.delete(ctx, id).await?;
        self.enqueue_sync(Some(&reference), None).await?;
        log::info!(
            "[{}] deleted {} {id}",
            ctx.request_id,
            self.resource_type.name
        );
        Ok(ResourceResponse::no_content(None))
    }

    /// Feed the sync queue when this service produces membership changes.
    pub(super) async fn enqueue_sync(
        &self,
        old: Option<&Resource>,
        new: Option<&Resource>,
    ) -> ScimResult<()> {
        let Some(queue) = &self.sync_queue else {
            return Ok(());
        };
        if let Some(record) = record_for_change(old, new) {
            log::debug!(
                "queued {} membership diffs for group {}",
                record.diffs.len(),
                record.group_id
            );
            queue.push(record).await?;
        }
        Ok(())
    }
}

fn check_precondition(
    id: &str,
    if_match: Option<&str>,
    reference: &Resource,
) -> ScimResult<()> {
    if let Some(header) = if_match {
        if !version_matches(header, reference.version()) {
            return Err(ScimError::PreConditionFailed { id: id.to_string() });
        }
    }
    Ok(())
}
