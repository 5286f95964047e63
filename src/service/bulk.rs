//! Bulk request dispatch.
//!
//! Each bulk operation is routed to the per-method handler of its target
//! resource type and the results are collected in submission order.
//! Sequencing is best-effort: operations after a failure still run until
//! the failure count exceeds `failOnErrors`. `bulkId:<id>` references in
//! operation data resolve to the ids of resources created earlier in the
//! same request.

use super::{ResourceResponse, ResourceService, ScimService};
use crate::context::RequestContext;
use crate::error::{ScimError, ScimResult};
use crate::protocol::{BulkOperation, BulkRequest, BulkResponse, BulkResultOperation, status_for};
use serde_json::Value;
use std::collections::HashMap;

impl ScimService {
    /// Process a bulk request body into a bulk response.
    pub async fn bulk(&self, ctx: &RequestContext, body: &Value) -> ScimResult<BulkResponse> {
        let request = BulkRequest::from_value(body)?;
        let max_operations = self
            .registry()
            .service_provider_config()
            .bulk
            .max_operations;
        if request.operations.len() > max_operations {
            return Err(ScimError::TooMany {
                detail: format!(
                    "{} bulk operations exceed the maximum of {max_operations}",
                    request.operations.len()
                ),
            });
        }

        let mut results = Vec::with_capacity(request.operations.len());
        let mut failures = 0usize;
        let mut bulk_ids: HashMap<String, String> = HashMap::new();

        for operation in &request.operations {
            if let Some(limit) = request.fail_on_errors {
                if failures > limit {
                    break;
                }
            }
            match self.dispatch_bulk(ctx, operation, &bulk_ids).await {
                Ok(outcome) => {
                    if let (Some(bulk_id), Some(body)) = (&operation.bulk_id, &outcome.body) {
                        if let Some(id) = body.get("id").and_then(Value::as_str) {
                            bulk_ids.insert(bulk_id.clone(), id.to_string());
                        }
                    }
                    results.push(BulkResultOperation {
                        method: operation.method.clone(),
                        bulk_id: operation.bulk_id.clone(),
                        location: outcome.location,
                        version: outcome.version,
                        status: outcome.status.to_string(),
                        response: None,
                    });
                }
                Err(err) => {
                    failures += 1;
                    let status = status_for(&err, operation.version.is_some());
                    log::debug!(
                        "[{}] bulk {} {} failed: {err}",
                        ctx.request_id,
                        operation.method,
                        operation.path
                    );
                    results.push(BulkResultOperation {
                        method: operation.method.clone(),
                        bulk_id: operation.bulk_id.clone(),
                        location: None,
                        version: None,
                        status: status.to_string(),
                        response: Some(err.to_body()),
                    });
                }
            }
        }

        Ok(BulkResponse::new(results))
    }

    async fn dispatch_bulk(
        &self,
        ctx: &RequestContext,
        operation: &BulkOperation,
        bulk_ids: &HashMap<String, String>,
    ) -> ScimResult<ResourceResponse> {
        let data = operation
            .data
            .as_ref()
            .map(|data| resolve_bulk_ids(data, bulk_ids));
        let (service, target) = self.bulk_target(&operation.path)?;
        let if_match = operation.version.as_deref();

        match (operation.method.to_ascii_uppercase().as_str(), target) {
            ("POST", None) => {
                let data = data
                    .ok_or_else(|| ScimError::invalid_syntax("bulk POST requires data"))?;
                service.create(ctx, &data).await
            }
            ("PUT", Some(id)) => {
                let data =
                    data.ok_or_else(|| ScimError::invalid_syntax("bulk PUT requires data"))?;
                service.replace(ctx, &id, &data, if_match).await
            }
            ("PATCH", Some(id)) => {
                let data =
                    data.ok_or_else(|| ScimError::invalid_syntax("bulk PATCH requires data"))?;
                service.patch(ctx, &id, &data, if_match).await
            }
            ("DELETE", Some(id)) => service.delete(ctx, &id, if_match).await,
            (method, _) => Err(ScimError::invalid_syntax(format!(
                "unsupported bulk operation {method} {}",
                operation.path
            ))),
        }
    }

    fn bulk_target(&self, path: &str) -> ScimResult<(&ResourceService, Option<String>)> {
        for service in [&self.users, &self.groups] {
            let endpoint = service.resource_type.endpoint.as_str();
            if path == endpoint {
                return Ok((service, None));
            }
            if let Some(rest) = path.strip_prefix(endpoint) {
                if let Some(id) = rest.strip_prefix('/') {
                    if !id.is_empty() && !id.contains('/') {
                        return Ok((service, Some(id.to_string())));
                    }
                }
            }
        }
        Err(ScimError::invalid_path(format!(
            "no bulk target at '{path}'"
        )))
    }
}

/// Substitute `bulkId:<id>` string values with the ids of resources created
/// earlier in the same bulk request. Unresolved references pass through and
/// fail wherever the value is validated.
fn resolve_bulk_ids(value: &Value, bulk_ids: &HashMap<String, String>) -> Value {
    match value {
        Value::String(text) => match text.strip_prefix("bulkId:") {
            Some(reference) => bulk_ids
                .get(reference)
                .map(|id| Value::String(id.clone()))
                .unwrap_or_else(|| value.clone()),
            None => value.clone(),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_bulk_ids(item, bulk_ids))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), resolve_bulk_ids(item, bulk_ids)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bulk_id_references_resolve_recursively() {
        let mut ids = HashMap::new();
        ids.insert("q1".to_string(), "real-id".to_string());
        let data = json!({
            "members": [{"value": "bulkId:q1"}, {"value": "other"}],
            "note": "bulkId:unknown"
        });
        let resolved = resolve_bulk_ids(&data, &ids);
        assert_eq!(resolved["members"][0]["value"], "real-id");
        assert_eq!(resolved["members"][1]["value"], "other");
        assert_eq!(resolved["note"], "bulkId:unknown");
    }
}
