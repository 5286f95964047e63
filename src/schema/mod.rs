//! Schema definitions and the registry that serves them.
//!
//! The schema subsystem owns the static description of every field the
//! server manages: [`Attribute`] definitions with their SCIM characteristics
//! and pipeline annotations, [`Schema`] groupings, [`ResourceType`]
//! composition and the [`ServiceProviderConfig`] discovery document.

pub mod embedded;
pub mod registry;
pub mod types;

pub use registry::SchemaRegistry;
pub use types::{
    AnnotationParams, Attribute, AttributeType, ELEMENT_SUFFIX, Mutability, ResourceType, Returned,
    Schema, SchemaExtension, ServiceProviderConfig, Uniqueness, annotations,
};
