//! SCIM 2.0 API message documents (RFC 7644 §3).

use crate::error::{ScimError, ScimResult};
use crate::query::SortOrder;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// URN of the ListResponse message schema.
pub const LIST_RESPONSE_URN: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";
/// URN of the SearchRequest message schema.
pub const SEARCH_REQUEST_URN: &str = "urn:ietf:params:scim:api:messages:2.0:SearchRequest";
/// URN of the BulkRequest message schema.
pub const BULK_REQUEST_URN: &str = "urn:ietf:params:scim:api:messages:2.0:BulkRequest";
/// URN of the BulkResponse message schema.
pub const BULK_RESPONSE_URN: &str = "urn:ietf:params:scim:api:messages:2.0:BulkResponse";

/// Query parameters of a resource query, from either the GET query string
/// or a `.search` POST body.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    /// SCIM filter string
    pub filter: Option<String>,
    /// Sort attribute path
    pub sort_by: Option<String>,
    /// Sort direction
    pub sort_order: SortOrder,
    /// 1-based first index, defaulting to 1
    pub start_index: Option<usize>,
    /// Page size; capped by the service configuration
    pub count: Option<usize>,
    /// Comma-separated include list
    pub attributes: Option<String>,
    /// Comma-separated exclude list
    pub excluded_attributes: Option<String>,
}

/// The `.search` request document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Must contain [`SEARCH_REQUEST_URN`]
    pub schemas: Vec<String>,
    #[serde(default)]
    attributes: Option<Vec<String>>,
    #[serde(default)]
    excluded_attributes: Option<Vec<String>>,
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    sort_by: Option<String>,
    #[serde(default)]
    sort_order: Option<SortOrder>,
    #[serde(default)]
    start_index: Option<usize>,
    #[serde(default)]
    count: Option<usize>,
}

impl SearchRequest {
    /// Parse and validate a `.search` body into query parameters.
    pub fn into_params(body: &Value) -> ScimResult<SearchParams> {
        let request: SearchRequest = serde_json::from_value(body.clone())?;
        if !request.schemas.iter().any(|urn| urn == SEARCH_REQUEST_URN) {
            return Err(ScimError::invalid_syntax(format!(
                "search request must declare schema '{SEARCH_REQUEST_URN}'"
            )));
        }
        Ok(SearchParams {
            filter: request.filter,
            sort_by: request.sort_by,
            sort_order: request.sort_order.unwrap_or_default(),
            start_index: request.start_index,
            count: request.count,
            attributes: request.attributes.map(|paths| paths.join(",")),
            excluded_attributes: request.excluded_attributes.map(|paths| paths.join(",")),
        })
    }
}

/// The ListResponse document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    /// Always [`LIST_RESPONSE_URN`]
    pub schemas: Vec<String>,
    /// Matches before pagination
    pub total_results: usize,
    /// Size of this page
    pub items_per_page: usize,
    /// 1-based index of the first result
    pub start_index: usize,
    /// Serialized resources
    #[serde(rename = "Resources")]
    pub resources: Vec<Value>,
}

impl ListResponse {
    /// Assemble a list response page.
    pub fn new(total_results: usize, start_index: usize, resources: Vec<Value>) -> Self {
        Self {
            schemas: vec![LIST_RESPONSE_URN.to_string()],
            total_results,
            items_per_page: resources.len(),
            start_index,
            resources,
        }
    }
}

/// One operation of a bulk request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperation {
    /// HTTP method: POST, PUT, PATCH or DELETE
    pub method: String,
    /// Endpoint-relative path, e.g. `/Users` or `/Users/{id}`
    pub path: String,
    /// Client-chosen id for referencing this operation's result
    #[serde(default)]
    pub bulk_id: Option<String>,
    /// Request body for methods that carry one
    #[serde(default)]
    pub data: Option<Value>,
    /// Version precondition, as an `If-Match` value
    #[serde(default)]
    pub version: Option<String>,
}

/// The BulkRequest document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    /// Must contain [`BULK_REQUEST_URN`]
    pub schemas: Vec<String>,
    /// Operations in submission order
    #[serde(rename = "Operations")]
    pub operations: Vec<BulkOperation>,
    /// Abort once more than this many operations failed
    #[serde(default)]
    pub fail_on_errors: Option<usize>,
}

impl BulkRequest {
    /// Parse and validate a bulk body.
    pub fn from_value(body: &Value) -> ScimResult<Self> {
        let request: BulkRequest = serde_json::from_value(body.clone())?;
        if !request.schemas.iter().any(|urn| urn == BULK_REQUEST_URN) {
            return Err(ScimError::invalid_syntax(format!(
                "bulk request must declare schema '{BULK_REQUEST_URN}'"
            )));
        }
        Ok(request)
    }
}

/// One result entry of a bulk response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResultOperation {
    /// Echoed method
    pub method: String,
    /// Echoed bulk id, when given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk_id: Option<String>,
    /// Location of the affected resource, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Version of the affected resource, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// HTTP status for this operation, as a string per RFC 7644
    pub status: String,
    /// Error body for failed operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

/// The BulkResponse document.
#[derive(Debug, Clone, Serialize)]
pub struct BulkResponse {
    /// Always [`BULK_RESPONSE_URN`]
    pub schemas: Vec<String>,
    /// Results in submission order
    #[serde(rename = "Operations")]
    pub operations: Vec<BulkResultOperation>,
}

impl BulkResponse {
    /// Wrap the collected per-operation results.
    pub fn new(operations: Vec<BulkResultOperation>) -> Self {
        Self {
            schemas: vec![BULK_RESPONSE_URN.to_string()],
            operations,
        }
    }

    /// The JSON body of this response.
    pub fn to_body(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_maps_to_params() {
        let params = SearchRequest::into_params(&json!({
            "schemas": [SEARCH_REQUEST_URN],
            "filter": "userName pr",
            "sortBy": "userName",
            "sortOrder": "descending",
            "startIndex": 3,
            "count": 7,
            "attributes": ["userName", "emails"]
        }))
        .unwrap();
        assert_eq!(params.filter.as_deref(), Some("userName pr"));
        assert_eq!(params.sort_order, SortOrder::Descending);
        assert_eq!(params.start_index, Some(3));
        assert_eq!(params.attributes.as_deref(), Some("userName,emails"));
    }

    #[test]
    fn search_request_requires_its_urn() {
        let err = SearchRequest::into_params(&json!({
            "schemas": ["urn:wrong"],
            "filter": "userName pr"
        }))
        .unwrap_err();
        assert!(matches!(err, ScimError::InvalidSyntax { .. }));
    }

    #[test]
    fn list_response_serializes_with_page_shape() {
        let response = ListResponse::new(10, 3, vec![json!({"id": "1"})]);
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["totalResults"], 10);
        assert_eq!(body["itemsPerPage"], 1);
        assert_eq!(body["startIndex"], 3);
        assert_eq!(body["Resources"][0]["id"], "1");
        assert_eq!(body["schemas"][0], LIST_RESPONSE_URN);
    }

    #[test]
    fn bulk_request_parses_operations() {
        let request = BulkRequest::from_value(&json!({
            "schemas": [BULK_REQUEST_URN],
            "failOnErrors": 1,
            "Operations": [
                {"method": "POST", "path": "/Users", "bulkId": "q1", "data": {"userName": "u"}},
                {"method": "DELETE", "path": "/Users/42"}
            ]
        }))
        .unwrap();
        assert_eq!(request.operations.len(), 2);
        assert_eq!(request.fail_on_errors, Some(1));
        assert_eq!(request.operations[0].bulk_id.as_deref(), Some("q1"));
    }
}
