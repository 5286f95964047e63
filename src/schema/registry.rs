//! Schema registry: loads, finalizes and serves schema definitions.
//!
//! The registry parses the embedded schema JSON, assigns every attribute its
//! full path, stable id and sort index, and synthesizes the per-resource-type
//! super attribute (common attributes ⊕ core schema ⊕ one container per
//! extension). Everything it hands out is `Arc`-shared and immutable, so the
//! registry is safe for unsynchronized concurrent reads.

use super::embedded;
use super::types::{
    AnnotationParams, Attribute, AttributeType, Mutability, ResourceType, Returned, Schema,
    SchemaExtension, ServiceProviderConfig, Uniqueness, annotations,
};
use crate::error::{ScimError, ScimResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Attribute definition as it appears in schema JSON, before finalization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttribute {
    name: String,
    #[serde(rename = "type")]
    data_type: AttributeType,
    #[serde(default)]
    multi_valued: bool,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    case_exact: bool,
    #[serde(default)]
    mutability: Mutability,
    #[serde(default)]
    returned: Returned,
    #[serde(default)]
    uniqueness: Uniqueness,
    #[serde(default)]
    canonical_values: Vec<String>,
    #[serde(default)]
    reference_types: Vec<String>,
    #[serde(default)]
    sub_attributes: Vec<RawAttribute>,
    #[serde(default)]
    annotations: HashMap<String, AnnotationParams>,
}

/// Schema definition as it appears in schema JSON.
#[derive(Debug, Deserialize)]
struct RawSchema {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    attributes: Vec<RawAttribute>,
}

/// Resource type definition as it appears in JSON.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResourceType {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    endpoint: String,
    schema: String,
    #[serde(default)]
    schema_extensions: Vec<SchemaExtension>,
}

/// Registry of schemas, resource types and the service provider config.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: Vec<Arc<Schema>>,
    schemas_by_id: HashMap<String, Arc<Schema>>,
    resource_types: Vec<Arc<ResourceType>>,
    resource_types_by_name: HashMap<String, Arc<ResourceType>>,
    service_provider_config: ServiceProviderConfig,
}

impl SchemaRegistry {
    /// Build the registry from the embedded definitions.
    pub fn new() -> ScimResult<Self> {
        let common = parse_schema(embedded::common_attributes())?;
        let user = parse_schema(embedded::core_user_schema())?;
        let group = parse_schema(embedded::core_group_schema())?;
        let enterprise = parse_schema(embedded::enterprise_user_schema())?;

        let mut schemas_by_id = HashMap::new();
        // The common pseudo-schema is not discoverable; only real schemas are.
        let schemas = vec![user, group, enterprise];
        for schema in &schemas {
            schemas_by_id.insert(schema.id.clone(), Arc::clone(schema));
        }

        let raw_types: Vec<RawResourceType> = serde_json::from_str(embedded::resource_types())?;
        let mut resource_types = Vec::with_capacity(raw_types.len());
        let mut resource_types_by_name = HashMap::new();
        for raw in raw_types {
            let core = schemas_by_id.get(&raw.schema).ok_or_else(|| {
                ScimError::internal(format!("resource type '{}' names unknown schema", raw.name))
            })?;
            let extensions: Vec<Arc<Schema>> = raw
                .schema_extensions
                .iter()
                .map(|ext| {
                    schemas_by_id.get(&ext.schema).cloned().ok_or_else(|| {
                        ScimError::internal(format!("unknown extension schema '{}'", ext.schema))
                    })
                })
                .collect::<ScimResult<_>>()?;
            let super_attribute = synthesize_super_attribute(&raw, &common, core, &extensions);
            let resource_type = Arc::new(ResourceType {
                id: raw.id,
                name: raw.name,
                description: raw.description,
                endpoint: raw.endpoint,
                schema: raw.schema,
                schema_extensions: raw.schema_extensions,
                super_attribute,
            });
            resource_types_by_name.insert(resource_type.name.clone(), Arc::clone(&resource_type));
            resource_types.push(resource_type);
        }

        let service_provider_config: ServiceProviderConfig =
            serde_json::from_str(embedded::service_provider_config())?;

        Ok(Self {
            schemas,
            schemas_by_id,
            resource_types,
            resource_types_by_name,
            service_provider_config,
        })
    }

    /// All discoverable schemas in registration order.
    pub fn schemas(&self) -> &[Arc<Schema>] {
        &self.schemas
    }

    /// Look up a schema by URN.
    pub fn schema_by_id(&self, id: &str) -> Option<&Arc<Schema>> {
        self.schemas_by_id.get(id)
    }

    /// All resource types in registration order.
    pub fn resource_types(&self) -> &[Arc<ResourceType>] {
        &self.resource_types
    }

    /// Look up a resource type by name (`User`, `Group`).
    pub fn resource_type(&self, name: &str) -> Option<&Arc<ResourceType>> {
        self.resource_types_by_name.get(name)
    }

    /// The service provider configuration document.
    pub fn service_provider_config(&self) -> &ServiceProviderConfig {
        &self.service_provider_config
    }
}

impl ResourceType {
    /// Resolve a dotted, optionally URN-qualified attribute path against
    /// this resource type, case-insensitively.
    ///
    /// `emails.value` resolves through the core schema;
    /// `urn:…:enterprise:2.0:User:manager.displayName` resolves through the
    /// matching extension container.
    pub fn find_attribute(&self, path: &str) -> Option<Arc<Attribute>> {
        let (mut current, remainder) = self.split_extension_prefix(path);
        let mut rest = remainder;
        while !rest.is_empty() {
            let (head, tail) = match rest.split_once('.') {
                Some((head, tail)) => (head, tail),
                None => (rest, ""),
            };
            let next = current.sub_attribute(head)?;
            current = Arc::clone(next);
            rest = tail;
        }
        Some(current)
    }

    /// If the path starts with a known extension URN, return that extension
    /// container and the remaining sub-path. Otherwise start at the root.
    fn split_extension_prefix<'p>(&self, path: &'p str) -> (Arc<Attribute>, &'p str) {
        let lowered = path.to_ascii_lowercase();
        for sub in self.super_attribute.sub_attributes() {
            if !sub.has_annotation(annotations::SCHEMA_EXTENSION_ROOT) {
                continue;
            }
            let urn = sub.name().to_ascii_lowercase();
            if lowered == urn {
                return (Arc::clone(sub), "");
            }
            if let Some(rest) = lowered.strip_prefix(&urn) {
                if rest.starts_with(':') {
                    // Slice the original string to preserve its casing.
                    return (Arc::clone(sub), &path[urn.len() + 1..]);
                }
            }
        }
        (Arc::clone(&self.super_attribute), path)
    }
}

fn parse_schema(content: &str) -> ScimResult<Arc<Schema>> {
    let raw: RawSchema = serde_json::from_str(content)?;
    let extension = raw.id.contains(":extension:");
    let attributes = raw
        .attributes
        .into_iter()
        .enumerate()
        .map(|(index, attr)| {
            // Extension attributes are addressed as `<urn>:<name>`, core
            // attributes as bare names.
            let parent_path = if extension { raw.id.as_str() } else { "" };
            finalize_attribute(attr, &raw.id, parent_path, extension, index)
        })
        .collect();
    Ok(Arc::new(Schema {
        id: raw.id,
        name: raw.name,
        description: raw.description,
        attributes,
    }))
}

/// Assign path, id and index to a raw attribute and its sub-attributes.
fn finalize_attribute(
    raw: RawAttribute,
    urn: &str,
    parent_path: &str,
    urn_joined: bool,
    index: usize,
) -> Arc<Attribute> {
    let path = if parent_path.is_empty() {
        raw.name.clone()
    } else if urn_joined {
        format!("{}:{}", parent_path, raw.name)
    } else {
        format!("{}.{}", parent_path, raw.name)
    };
    let sub_attributes = raw
        .sub_attributes
        .into_iter()
        .enumerate()
        .map(|(sub_index, sub)| finalize_attribute(sub, urn, &path, false, sub_index))
        .collect();
    Arc::new(Attribute::new(
        raw.name,
        path.clone(),
        format!("{}:{}", urn, path),
        raw.data_type,
        raw.multi_valued,
        raw.required,
        raw.case_exact,
        raw.mutability,
        raw.returned,
        raw.uniqueness,
        raw.canonical_values,
        raw.reference_types,
        sub_attributes,
        index,
        raw.annotations,
    ))
}

/// Build the synthetic root attribute for a resource type.
fn synthesize_super_attribute(
    raw: &RawResourceType,
    common: &Schema,
    core: &Schema,
    extensions: &[Arc<Schema>],
) -> Arc<Attribute> {
    let mut subs: Vec<Arc<Attribute>> = Vec::new();
    for attr in common.attributes.iter().chain(core.attributes.iter()) {
        subs.push(reindex(attr, subs.len()));
    }
    for extension in extensions {
        let mut container_annotations = HashMap::new();
        container_annotations.insert(annotations::SCHEMA_EXTENSION_ROOT.to_string(), HashMap::new());
        container_annotations.insert(annotations::STATE_SUMMARY.to_string(), HashMap::new());
        let index = subs.len();
        subs.push(Arc::new(Attribute::new(
            extension.id.clone(),
            extension.id.clone(),
            extension.id.clone(),
            AttributeType::Complex,
            false,
            false,
            true,
            Mutability::ReadWrite,
            Returned::Default,
            Uniqueness::None,
            Vec::new(),
            Vec::new(),
            extension.attributes.clone(),
            index,
            container_annotations,
        )));
    }
    let mut root_annotations = HashMap::new();
    root_annotations.insert(annotations::SYNC_SCHEMA.to_string(), HashMap::new());
    Arc::new(Attribute::new(
        raw.name.clone(),
        String::new(),
        raw.schema.clone(),
        AttributeType::Complex,
        false,
        false,
        true,
        Mutability::ReadWrite,
        Returned::Default,
        Uniqueness::None,
        Vec::new(),
        Vec::new(),
        subs,
        0,
        root_annotations,
    ))
}

/// Clone an attribute with a new sibling index.
fn reindex(attr: &Arc<Attribute>, index: usize) -> Arc<Attribute> {
    if attr.index() == index {
        return Arc::clone(attr);
    }
    Arc::new(Attribute::new(
        attr.name().to_string(),
        attr.path().to_string(),
        attr.id().to_string(),
        attr.typ(),
        attr.multi_valued(),
        attr.required(),
        attr.case_exact(),
        attr.mutability(),
        attr.returned(),
        attr.uniqueness(),
        attr.canonical_values().to_vec(),
        attr.reference_types().to_vec(),
        attr.sub_attributes().to_vec(),
        index,
        attr_annotations(attr),
    ))
}

fn attr_annotations(attr: &Attribute) -> HashMap<String, AnnotationParams> {
    let mut out = HashMap::new();
    for name in [
        annotations::PRIMARY,
        annotations::IDENTITY,
        annotations::EXCLUSIVE_PRIMARY,
        annotations::STATE_SUMMARY,
        annotations::AUTO_COMPACT,
        annotations::SYNC_SCHEMA,
        annotations::SCHEMA_EXTENSION_ROOT,
        annotations::COPY_READ_ONLY,
        annotations::READ_ONLY,
    ] {
        if let Some(params) = attr.annotation(name) {
            out.insert(name.to_string(), params.clone());
        }
    }
    out
}
