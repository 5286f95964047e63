//! Query and search over one resource type.

use super::ResourceService;
use crate::context::RequestContext;
use crate::error::{ScimError, ScimResult};
use crate::json::{Projection, serialize};
use crate::protocol::{ListResponse, SearchParams, SearchRequest};
use crate::storage::QueryParams;
use serde_json::Value;

impl ResourceService {
    /// Run a filtered, sorted, paginated query and serialize the page.
    pub async fn query(
        &self,
        ctx: &RequestContext,
        params: &SearchParams,
    ) -> ScimResult<ListResponse> {
        let projection = Projection::from_params(
            params.attributes.as_deref(),
            params.excluded_attributes.as_deref(),
        )?;
        let start_index = params.start_index.unwrap_or(1).max(1);
        let count = params
            .count
            .unwrap_or(self.config.default_page_size)
            .min(self.config.max_page_size);

        let result = self
            .storage
            .query(
                ctx,
                &QueryParams {
                    filter: params.filter.clone(),
                    sort_by: params.sort_by.clone(),
                    sort_order: params.sort_order,
                    start_index,
                    count: Some(count),
                },
                Some(&projection),
            )
            .await?;

        if result.total_results > self.max_results {
            return Err(ScimError::TooMany {
                detail: format!(
                    "{} matches exceed the maximum of {}",
                    result.total_results, self.max_results
                ),
            });
        }

        log::debug!(
            "[{}] query on {} matched {} resources",
            ctx.request_id,
            self.resource_type.name,
            result.total_results
        );

        let mut bodies = Vec::with_capacity(result.resources.len());
        for resource in &result.resources {
            bodies.push(serialize(resource, &projection)?);
        }
        Ok(ListResponse::new(result.total_results, start_index, bodies))
    }

    /// Handle a `POST …/.search` body.
    pub async fn search(&self, ctx: &RequestContext, body: &Value) -> ScimResult<ListResponse> {
        let params = SearchRequest::into_params(body)?;
        self.query(ctx, &params).await
    }
}
