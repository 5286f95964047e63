//! RFC 7644 PATCH: the PatchOp document and its application.
//!
//! Operations apply sequentially; each one sees the effect of the previous.
//! Values are coerced against the attribute resolved at the target path by
//! the property layer itself. The caller runs the post-filter pipeline
//! afterwards and only writes to storage when the resource hash changed.

use crate::error::{ScimError, ScimResult};
use crate::expr::{Path, Step, compile_path_cached, strip_resource_urn};
use crate::property::Resource;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// URN of the PatchOp message schema.
pub const PATCH_OP_URN: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// One `{op, path?, value?}` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PatchOperation {
    /// `add`, `replace` or `remove`, case-insensitive
    pub op: String,
    /// Target path; absent means the resource root
    #[serde(default)]
    pub path: Option<String>,
    /// New value; forbidden for `remove`
    #[serde(default)]
    pub value: Option<Value>,
}

/// The PatchOp request document.
#[derive(Debug, Clone, Deserialize)]
pub struct PatchRequest {
    /// Must contain [`PATCH_OP_URN`]
    pub schemas: Vec<String>,
    /// Operations in application order
    #[serde(rename = "Operations")]
    pub operations: Vec<PatchOperation>,
}

impl PatchRequest {
    /// Parse and structurally validate a PatchOp body.
    pub fn from_value(body: &Value) -> ScimResult<Self> {
        let request: PatchRequest = serde_json::from_value(body.clone())?;
        if !request.schemas.iter().any(|urn| urn == PATCH_OP_URN) {
            return Err(ScimError::invalid_syntax(format!(
                "patch request must declare schema '{PATCH_OP_URN}'"
            )));
        }
        if request.operations.is_empty() {
            return Err(ScimError::invalid_syntax(
                "patch request carries no operations",
            ));
        }
        Ok(request)
    }
}

enum PatchKind {
    Add,
    Replace,
    Remove,
}

/// Apply every operation of `request` to `resource`, in order.
pub fn apply(resource: &mut Resource, request: &PatchRequest) -> ScimResult<()> {
    for operation in &request.operations {
        apply_one(resource, operation)?;
    }
    Ok(())
}

fn apply_one(resource: &mut Resource, operation: &PatchOperation) -> ScimResult<()> {
    let kind = match operation.op.to_ascii_lowercase().as_str() {
        "add" => PatchKind::Add,
        "replace" => PatchKind::Replace,
        "remove" => PatchKind::Remove,
        other => {
            return Err(ScimError::invalid_syntax(format!(
                "unknown patch op '{other}'"
            )));
        }
    };

    match kind {
        PatchKind::Remove => {
            if operation.value.is_some() {
                return Err(ScimError::invalid_syntax("'remove' forbids a value"));
            }
            let Some(path) = operation.path.as_deref() else {
                return Err(ScimError::invalid_syntax("'remove' requires a path"));
            };
            let path = compile_target(resource, path)?;
            resource.delete(&path)?;
        }
        PatchKind::Add | PatchKind::Replace => {
            let Some(value) = operation.value.as_ref() else {
                return Err(ScimError::invalid_syntax(format!(
                    "'{}' requires a value",
                    operation.op
                )));
            };
            match operation.path.as_deref() {
                Some(path) => {
                    let path = compile_target(resource, path)?;
                    match kind {
                        PatchKind::Add => resource.add(&path, value)?,
                        _ => resource.replace(&path, value)?,
                    };
                }
                None => apply_at_root(resource, &kind, value)?,
            }
        }
    }
    Ok(())
}

/// A path-less add/replace carries an object whose keys are attribute
/// names; each key is applied at its own sub-path.
fn apply_at_root(resource: &mut Resource, kind: &PatchKind, value: &Value) -> ScimResult<()> {
    let map = value.as_object().ok_or_else(|| {
        ScimError::invalid_value("a path-less patch operation requires an object value")
    })?;
    for (key, sub_value) in map {
        let path = Path {
            steps: vec![Step::Attr(key.clone())],
        };
        match kind {
            PatchKind::Add => resource.add(&path, sub_value)?,
            _ => resource.replace(&path, sub_value)?,
        };
    }
    Ok(())
}

/// Compile an operation path, stripping a leading resource-schema URN
/// (`urn:…:core:2.0:User:userName` → `userName`).
fn compile_target(resource: &Resource, path: &str) -> ScimResult<Arc<Path>> {
    let stripped = strip_resource_urn(path, &resource.resource_type().schema);
    compile_path_cached(stripped)
}
