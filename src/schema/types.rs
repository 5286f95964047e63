//! Core schema type definitions for SCIM resources.
//!
//! This module contains the attribute model everything else is driven by:
//! [`Attribute`] describes one field of a resource, [`Schema`] groups the
//! attributes of one URN, [`ResourceType`] composes a core schema with its
//! extensions, and [`ServiceProviderConfig`] mirrors the discovery document
//! of RFC 7643 §5.
//!
//! Attributes are immutable after registry load and shared behind [`Arc`],
//! so concurrent readers never synchronize.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

/// Annotation names recognized by the property tree and the filter pipeline.
///
/// Annotations ride on attribute definitions as stringly-keyed markers with
/// an optional parameter map; unknown annotations are preserved but inert.
pub mod annotations {
    /// Marks the boolean sub-attribute that is the exclusive primary flag of
    /// a multi-valued complex attribute.
    pub const PRIMARY: &str = "@Primary";
    /// Marks sub-attributes that collectively determine the identity of a
    /// complex property for hashing and matching.
    pub const IDENTITY: &str = "@Identity";
    /// Enforces at-most-one `primary == true` across the elements of a
    /// multi-valued complex attribute.
    pub const EXCLUSIVE_PRIMARY: &str = "@ExclusivePrimary";
    /// Propagates sub-property state changes to the enclosing complex.
    pub const STATE_SUMMARY: &str = "@StateSummary";
    /// Drops unassigned elements from a multi-valued property after
    /// mutation.
    pub const AUTO_COMPACT: &str = "@AutoCompact";
    /// Keeps the `schemas` list in sync with assigned extension properties.
    pub const SYNC_SCHEMA: &str = "@SyncSchema";
    /// Marks a namespaced extension root attribute.
    pub const SCHEMA_EXTENSION_ROOT: &str = "@SchemaExtensionRoot";
    /// Server copies the value from the reference resource on update.
    pub const COPY_READ_ONLY: &str = "@CopyReadOnly";
    /// ReadOnly handling with `reset` / `copy` boolean parameters.
    pub const READ_ONLY: &str = "@ReadOnly";
}

/// Parameter map attached to an annotation.
pub type AnnotationParams = HashMap<String, Value>;

/// SCIM attribute data types (RFC 7643 §2.3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    /// String value
    String,
    /// Boolean value
    Boolean,
    /// Decimal number
    Decimal,
    /// Integer number
    Integer,
    /// DateTime in RFC3339 format
    DateTime,
    /// Binary data (base64 encoded)
    Binary,
    /// URI reference
    Reference,
    /// Complex attribute with sub-attributes
    Complex,
}

impl Default for AttributeType {
    fn default() -> Self {
        Self::String
    }
}

impl AttributeType {
    /// The RFC token for this type, as it appears in schema JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::DateTime => "dateTime",
            Self::Binary => "binary",
            Self::Reference => "reference",
            Self::Complex => "complex",
        }
    }
}

/// Attribute mutability characteristics (RFC 7643 §2.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Mutability {
    /// Read-only attribute (managed by server)
    ReadOnly,
    /// Read-write attribute (can be modified by clients)
    ReadWrite,
    /// Immutable attribute (set once, never modified)
    Immutable,
    /// Write-only attribute (passwords, etc.)
    WriteOnly,
}

impl Default for Mutability {
    fn default() -> Self {
        Self::ReadWrite
    }
}

/// When an attribute is emitted in responses (RFC 7643 §2.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Returned {
    /// Always emitted, even when unassigned
    Always,
    /// Never emitted
    Never,
    /// Emitted unless excluded by the request
    Default,
    /// Emitted only when the request selects it
    Request,
}

impl Default for Returned {
    fn default() -> Self {
        Self::Default
    }
}

/// Attribute uniqueness constraints (RFC 7643 §2.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Uniqueness {
    /// No uniqueness constraint
    None,
    /// Unique within the server
    Server,
    /// Globally unique
    Global,
}

impl Default for Uniqueness {
    fn default() -> Self {
        Self::None
    }
}

/// Suffix distinguishing derived element attributes from their multi-valued
/// parent. Element attributes are generated, never declared.
pub const ELEMENT_SUFFIX: &str = "$elem";

/// Immutable description of one field of a resource.
///
/// Two attributes are equal iff their ids match; the id is
/// `<schema urn>:<full path>` for declared attributes and the parent id
/// suffixed with [`ELEMENT_SUFFIX`] for derived element attributes.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    path: String,
    id: String,
    typ: AttributeType,
    multi_valued: bool,
    required: bool,
    case_exact: bool,
    mutability: Mutability,
    returned: Returned,
    uniqueness: Uniqueness,
    canonical_values: Vec<String>,
    reference_types: Vec<String>,
    sub_attributes: Vec<Arc<Attribute>>,
    index: usize,
    annotations: HashMap<String, AnnotationParams>,
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Attribute {}

impl std::hash::Hash for Attribute {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Attribute {
    /// Builder used by the registry while finalizing parsed definitions.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        path: String,
        id: String,
        typ: AttributeType,
        multi_valued: bool,
        required: bool,
        case_exact: bool,
        mutability: Mutability,
        returned: Returned,
        uniqueness: Uniqueness,
        canonical_values: Vec<String>,
        reference_types: Vec<String>,
        sub_attributes: Vec<Arc<Attribute>>,
        index: usize,
        annotations: HashMap<String, AnnotationParams>,
    ) -> Self {
        Self {
            name,
            path,
            id,
            typ,
            multi_valued,
            required,
            case_exact,
            mutability,
            returned,
            uniqueness,
            canonical_values,
            reference_types,
            sub_attributes,
            index,
            annotations,
        }
    }

    /// Attribute name as declared (e.g. `value`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full dotted path from the resource root (e.g. `emails.value`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Stable id, `<schema urn>:<path>`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Data type.
    pub fn typ(&self) -> AttributeType {
        self.typ
    }

    /// Whether this attribute holds a sequence of elements.
    pub fn multi_valued(&self) -> bool {
        self.multi_valued
    }

    /// Whether a value must be assigned.
    pub fn required(&self) -> bool {
        self.required
    }

    /// Whether string comparison is case-sensitive.
    pub fn case_exact(&self) -> bool {
        self.case_exact
    }

    /// Mutability characteristic.
    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    /// Return-ability characteristic.
    pub fn returned(&self) -> Returned {
        self.returned
    }

    /// Uniqueness constraint.
    pub fn uniqueness(&self) -> Uniqueness {
        self.uniqueness
    }

    /// Allowed values, empty when unconstrained.
    pub fn canonical_values(&self) -> &[String] {
        &self.canonical_values
    }

    /// Resource types a reference may point at.
    pub fn reference_types(&self) -> &[String] {
        &self.reference_types
    }

    /// Sub-attributes in declaration (index) order.
    pub fn sub_attributes(&self) -> &[Arc<Attribute>] {
        &self.sub_attributes
    }

    /// Declaration order among siblings.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Look up a sub-attribute by name, case-insensitively.
    pub fn sub_attribute(&self, name: &str) -> Option<&Arc<Attribute>> {
        self.sub_attributes
            .iter()
            .find(|sub| sub.name.eq_ignore_ascii_case(name))
    }

    /// Whether the annotation is present.
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.contains_key(name)
    }

    /// Parameters of an annotation, if present.
    pub fn annotation(&self, name: &str) -> Option<&AnnotationParams> {
        self.annotations.get(name)
    }

    /// Boolean parameter of an annotation, defaulting to `false` when the
    /// annotation or the parameter is absent.
    pub fn annotation_flag(&self, name: &str, param: &str) -> bool {
        self.annotation(name)
            .and_then(|params| params.get(param))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Whether this is a derived element attribute.
    pub fn is_element(&self) -> bool {
        self.id.ends_with(ELEMENT_SUFFIX)
    }

    /// Derive the element attribute for one element of a multi-valued
    /// attribute: identical except singular, identified by the `$elem`
    /// suffix. Container-level annotations do not carry over.
    pub fn element_attribute(&self) -> Arc<Attribute> {
        debug_assert!(self.multi_valued);
        let mut annotations = self.annotations.clone();
        annotations.remove(annotations::AUTO_COMPACT);
        annotations.remove(annotations::EXCLUSIVE_PRIMARY);
        Arc::new(Self {
            name: self.name.clone(),
            path: self.path.clone(),
            id: format!("{}{}", self.id, ELEMENT_SUFFIX),
            typ: self.typ,
            multi_valued: false,
            required: false,
            case_exact: self.case_exact,
            mutability: self.mutability,
            returned: self.returned,
            uniqueness: Uniqueness::None,
            canonical_values: self.canonical_values.clone(),
            reference_types: self.reference_types.clone(),
            sub_attributes: self.sub_attributes.clone(),
            index: self.index,
            annotations,
        })
    }

    /// Names of the sub-attributes annotated `@Identity`, empty when the
    /// complex attribute has no identity declaration.
    pub fn identity_sub_attributes(&self) -> Vec<&Arc<Attribute>> {
        self.sub_attributes
            .iter()
            .filter(|sub| sub.has_annotation(annotations::IDENTITY))
            .collect()
    }

    /// The `@Primary`-annotated boolean sub-attribute, if declared.
    pub fn primary_sub_attribute(&self) -> Option<&Arc<Attribute>> {
        self.sub_attributes
            .iter()
            .find(|sub| sub.has_annotation(annotations::PRIMARY) && sub.typ == AttributeType::Boolean)
    }

    /// Render the RFC 7643 JSON shape of this attribute for discovery.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("name".into(), json!(self.name));
        out.insert("type".into(), json!(self.typ.as_str()));
        out.insert("multiValued".into(), json!(self.multi_valued));
        out.insert("required".into(), json!(self.required));
        out.insert("caseExact".into(), json!(self.case_exact));
        out.insert(
            "mutability".into(),
            serde_json::to_value(self.mutability).unwrap_or(Value::Null),
        );
        out.insert(
            "returned".into(),
            serde_json::to_value(self.returned).unwrap_or(Value::Null),
        );
        out.insert(
            "uniqueness".into(),
            serde_json::to_value(self.uniqueness).unwrap_or(Value::Null),
        );
        if !self.canonical_values.is_empty() {
            out.insert("canonicalValues".into(), json!(self.canonical_values));
        }
        if !self.reference_types.is_empty() {
            out.insert("referenceTypes".into(), json!(self.reference_types));
        }
        if !self.sub_attributes.is_empty() {
            out.insert(
                "subAttributes".into(),
                Value::Array(self.sub_attributes.iter().map(|sub| sub.to_json()).collect()),
            );
        }
        Value::Object(out)
    }
}

/// A SCIM schema: one URN with its attribute definitions.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Unique schema identifier (URN)
    pub id: String,
    /// Human-readable schema name
    pub name: String,
    /// Schema description
    pub description: String,
    /// Finalized attribute definitions in declaration order
    pub attributes: Vec<Arc<Attribute>>,
}

impl Schema {
    /// Render the discovery JSON for this schema, including its `meta` block.
    pub fn to_json(&self, base_url: &str) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "attributes": self.attributes.iter().map(|attr| attr.to_json()).collect::<Vec<_>>(),
            "meta": {
                "resourceType": "Schema",
                "location": format!("{}/Schemas/{}", base_url, self.id),
            },
        })
    }
}

/// Reference to an extension schema within a resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaExtension {
    /// URN of the extension schema
    pub schema: String,
    /// Whether resources must carry the extension
    pub required: bool,
}

/// A resource type: a core schema composed with zero or more extensions.
#[derive(Debug, Clone)]
pub struct ResourceType {
    /// Resource type id (commonly equal to the name)
    pub id: String,
    /// Resource type name, e.g. `User`
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// HTTP endpoint, e.g. `/Users`
    pub endpoint: String,
    /// URN of the core schema
    pub schema: String,
    /// Extension schemas
    pub schema_extensions: Vec<SchemaExtension>,
    /// Synthetic root attribute: common attributes ⊕ core schema
    /// attributes ⊕ one container per extension
    pub super_attribute: Arc<Attribute>,
}

impl ResourceType {
    /// Render the discovery JSON for this resource type.
    pub fn to_json(&self, base_url: &str) -> Value {
        json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:ResourceType"],
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "endpoint": self.endpoint,
            "schema": self.schema,
            "schemaExtensions": self.schema_extensions,
            "meta": {
                "resourceType": "ResourceType",
                "location": format!("{}/ResourceTypes/{}", base_url, self.name),
            },
        })
    }
}

/// A boolean capability entry in the service provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supported {
    /// Whether the capability is available
    pub supported: bool,
}

/// Bulk capability entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSupport {
    /// Whether bulk requests are accepted
    pub supported: bool,
    /// Maximum operations per bulk request
    pub max_operations: usize,
    /// Maximum bulk payload size in bytes
    pub max_payload_size: usize,
}

/// Filter capability entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSupport {
    /// Whether filtering is available
    pub supported: bool,
    /// Maximum resources a query may return
    pub max_results: usize,
}

/// Service provider configuration document (RFC 7643 §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderConfig {
    /// Link to service documentation
    #[serde(default)]
    pub documentation_uri: Option<String>,
    /// PATCH capability
    pub patch: Supported,
    /// Bulk capability
    pub bulk: BulkSupport,
    /// Filter capability
    pub filter: FilterSupport,
    /// Self-service password change capability
    pub change_password: Supported,
    /// Sorting capability
    pub sort: Supported,
    /// ETag capability
    pub etag: Supported,
    /// Advertised authentication schemes
    #[serde(default)]
    pub authentication_schemes: Vec<Value>,
}

impl ServiceProviderConfig {
    /// Render the discovery JSON, including the message schema URN.
    pub fn to_json(&self, base_url: &str) -> Value {
        let mut body = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(obj) = body.as_object_mut() {
            obj.insert(
                "schemas".into(),
                json!(["urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig"]),
            );
            obj.insert(
                "meta".into(),
                json!({
                    "resourceType": "ServiceProviderConfig",
                    "location": format!("{}/ServiceProviderConfig", base_url),
                }),
            );
        }
        body
    }
}
