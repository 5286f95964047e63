//! Schema-driven population of a property tree from JSON.

use crate::error::{ScimError, ScimResult};
use crate::property::Resource;
use crate::schema::ResourceType;
use serde_json::Value;
use std::sync::Arc;

/// Build a resource of `resource_type` from a JSON request body.
///
/// Every key must name an attribute of the resource type (extension
/// containers are addressed by their URN key); unknown attributes and
/// type-mismatched values are rejected.
pub fn deserialize_resource(
    resource_type: &Arc<ResourceType>,
    body: &Value,
) -> ScimResult<Resource> {
    if !body.is_object() {
        return Err(ScimError::invalid_syntax("resource body must be a JSON object"));
    }
    let mut resource = Resource::new(Arc::clone(resource_type));
    match resource.root_mut().add(body) {
        Ok(mut events) => {
            // Run the root subscribers so the schemas list reflects any
            // extension content the body carried.
            crate::property::subscriber::notify(resource.root_mut(), &mut events);
            Ok(resource)
        }
        // An unknown key in a request body is a syntax problem, not a
        // path-resolution one.
        Err(ScimError::NoTarget { detail }) => Err(ScimError::InvalidSyntax { detail }),
        Err(other) => Err(other),
    }
}
