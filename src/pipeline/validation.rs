//! Schema validation: required, canonical values, mutability, uniqueness.

use super::{FilterContext, ResourceFilter, WriteOp};
use crate::error::{ScimError, ScimResult};
use crate::property::{Property, PropertyData, Resource};
use crate::schema::Mutability;
use crate::storage::Storage;
use async_trait::async_trait;
use std::sync::Arc;

/// Enforces the attribute characteristics the schema declares. Required,
/// canonical and immutability violations surface during the tree walk;
/// uniqueness checks are collected and resolved against storage afterwards,
/// because the walk itself never blocks.
pub struct ValidationFilter {
    storage: Arc<dyn Storage>,
}

impl ValidationFilter {
    /// Create the filter over the storage backend used for uniqueness.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

/// One deferred uniqueness probe.
struct UniqueCheck {
    path: String,
    literal: String,
}

#[async_trait]
impl ResourceFilter for ValidationFilter {
    async fn filter(
        &self,
        ctx: &mut FilterContext,
        resource: &mut Resource,
        reference: Option<&Resource>,
    ) -> ScimResult<()> {
        if ctx.no_change {
            return Ok(());
        }
        let mut checks = Vec::new();
        validate_children(
            ctx.op,
            resource.root(),
            reference.map(|r| r.root()),
            true,
            &mut checks,
        )?;
        for check in checks {
            let filter = format!("{} eq {}", check.path, check.literal);
            let existing = self.storage.count(&ctx.request, &filter).await?;
            if existing > 0 {
                return Err(ScimError::Uniqueness {
                    attribute: check.path,
                });
            }
        }
        Ok(())
    }
}

fn validate_children(
    op: WriteOp,
    prop: &Property,
    reference: Option<&Property>,
    parent_assigned: bool,
    checks: &mut Vec<UniqueCheck>,
) -> ScimResult<()> {
    if prop.is_complex() {
        for sub in prop.sub_properties() {
            let ref_sub = reference.and_then(|r| r.sub_property(sub.attr().name()));
            validate_one(op, sub, ref_sub, parent_assigned, checks)?;
        }
    } else if prop.is_multi() {
        for elem in prop.elements() {
            let ref_elem =
                reference.and_then(|r| r.elements().iter().find(|candidate| candidate.matches(elem)));
            validate_children(op, elem, ref_elem, !elem.is_unassigned(), checks)?;
        }
    }
    Ok(())
}

fn validate_one(
    op: WriteOp,
    prop: &Property,
    reference: Option<&Property>,
    parent_assigned: bool,
    checks: &mut Vec<UniqueCheck>,
) -> ScimResult<()> {
    let attr = prop.attr();

    if attr.required() && parent_assigned && prop.is_unassigned() {
        return Err(ScimError::invalid_value(format!(
            "missing required attribute '{}'",
            attr.path()
        )));
    }

    if !attr.canonical_values().is_empty() && !prop.is_multi() {
        if let Some(value) = prop.as_str() {
            let legal = attr.canonical_values().iter().any(|canonical| {
                if attr.case_exact() {
                    canonical == value
                } else {
                    canonical.eq_ignore_ascii_case(value)
                }
            });
            if !legal {
                return Err(ScimError::invalid_value(format!(
                    "'{value}' is not a canonical value of '{}'",
                    attr.path()
                )));
            }
        }
    }

    if attr.mutability() == Mutability::Immutable {
        if let Some(reference) = reference {
            if !reference.is_unassigned() && !prop.matches(reference) {
                return Err(ScimError::mutability(format!(
                    "attribute '{}' is immutable",
                    attr.path()
                )));
            }
        }
    }

    if attr.uniqueness() != crate::schema::Uniqueness::None
        && !prop.is_unassigned()
        && !prop.is_complex()
        && !prop.is_multi()
    {
        let unchanged = op == WriteOp::Update
            && reference.map(|r| prop.matches(r)).unwrap_or(false);
        if !unchanged {
            if let Some(literal) = filter_literal(prop) {
                checks.push(UniqueCheck {
                    path: attr.path().to_string(),
                    literal,
                });
            }
        }
    }

    validate_children(op, prop, reference, !prop.is_unassigned(), checks)
}

/// Render the property value as a filter literal for the uniqueness probe.
fn filter_literal(prop: &Property) -> Option<String> {
    match prop.data() {
        PropertyData::Str(Some(value)) | PropertyData::Ref(Some(value)) => Some(format!(
            "\"{}\"",
            value.replace('\\', "\\\\").replace('"', "\\\"")
        )),
        PropertyData::Int(Some(value)) => Some(value.to_string()),
        PropertyData::Dec(Some(value)) => Some(value.to_string()),
        PropertyData::Bool(Some(value)) => Some(value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::expr::compile_path;
    use crate::schema::SchemaRegistry;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn user(user_name: &str) -> Resource {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        let mut resource = Resource::new(Arc::clone(rt));
        resource
            .replace(
                &compile_path("schemas").unwrap(),
                &json!(["urn:ietf:params:scim:schemas:core:2.0:User"]),
            )
            .unwrap();
        resource
            .replace(&compile_path("id").unwrap(), &json!(format!("id-{user_name}")))
            .unwrap();
        resource
            .replace(&compile_path("userName").unwrap(), &json!(user_name))
            .unwrap();
        resource
    }

    fn filter_over(storage: Arc<MemoryStorage>) -> ValidationFilter {
        ValidationFilter::new(storage)
    }

    fn ctx(op: WriteOp) -> FilterContext {
        FilterContext {
            op,
            no_change: false,
            request: RequestContext::with_generated_id(),
        }
    }

    #[tokio::test]
    async fn missing_required_attribute_is_invalid_value() {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        let mut resource = Resource::new(Arc::clone(rt));
        resource
            .replace(
                &compile_path("schemas").unwrap(),
                &json!(["urn:ietf:params:scim:schemas:core:2.0:User"]),
            )
            .unwrap();
        let filter = filter_over(Arc::new(MemoryStorage::new()));
        let err = filter
            .filter(&mut ctx(WriteOp::Create), &mut resource, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ScimError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn non_canonical_value_is_rejected() {
        let mut resource = user("alice");
        resource
            .replace(&compile_path("userType").unwrap(), &json!("NotLegal"))
            .unwrap();
        let filter = filter_over(Arc::new(MemoryStorage::new()));
        let err = filter
            .filter(&mut ctx(WriteOp::Create), &mut resource, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ScimError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn canonical_value_passes_case_insensitively() {
        let mut resource = user("alice");
        resource
            .replace(&compile_path("userType").unwrap(), &json!("employee"))
            .unwrap();
        let filter = filter_over(Arc::new(MemoryStorage::new()));
        filter
            .filter(&mut ctx(WriteOp::Create), &mut resource, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_server_unique_value_conflicts() {
        let storage = Arc::new(MemoryStorage::new());
        let request = RequestContext::with_generated_id();
        storage.insert(&request, user("alice")).await.unwrap();

        let mut duplicate = user("alice");
        duplicate
            .replace(&compile_path("id").unwrap(), &json!("other-id"))
            .unwrap();
        let filter = filter_over(Arc::clone(&storage));
        let err = filter
            .filter(&mut ctx(WriteOp::Create), &mut duplicate, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ScimError::Uniqueness { .. }));
    }

    #[tokio::test]
    async fn unchanged_unique_value_passes_on_update() {
        let storage = Arc::new(MemoryStorage::new());
        let request = RequestContext::with_generated_id();
        let stored = user("alice");
        storage.insert(&request, stored.clone()).await.unwrap();

        let mut update = stored.clone();
        update
            .replace(&compile_path("displayName").unwrap(), &json!("Alice L."))
            .unwrap();
        let filter = filter_over(storage);
        filter
            .filter(&mut ctx(WriteOp::Update), &mut update, Some(&stored))
            .await
            .unwrap();
    }
}
