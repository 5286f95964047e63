//! Resource: a root complex property tied to a resource type.
//!
//! The root property's attribute is the resource type's synthetic super
//! attribute (common attributes ⊕ core schema ⊕ extension containers).
//! Cloning a resource deep-copies the whole tree.

use super::crud;
use super::event::Event;
use super::navigator::Navigator;
use super::property::Property;
use crate::error::ScimResult;
use crate::expr::Path;
use crate::schema::ResourceType;
use serde_json::Value;
use std::sync::Arc;

/// A wrapper around the root complex property of a resource type.
#[derive(Debug, Clone)]
pub struct Resource {
    resource_type: Arc<ResourceType>,
    root: Property,
}

impl Resource {
    /// Create an empty resource of the given type.
    pub fn new(resource_type: Arc<ResourceType>) -> Self {
        let root = Property::new(Arc::clone(&resource_type.super_attribute));
        Self {
            resource_type,
            root,
        }
    }

    /// The resource type this resource belongs to.
    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.resource_type
    }

    /// The root property.
    pub fn root(&self) -> &Property {
        &self.root
    }

    /// Mutable access to the root property.
    pub fn root_mut(&mut self) -> &mut Property {
        &mut self.root
    }

    /// A navigator rooted at this resource.
    pub fn navigator(&mut self) -> Navigator<'_> {
        Navigator::new(&mut self.root)
    }

    /// The `id` value, when assigned.
    pub fn id(&self) -> Option<&str> {
        self.root.sub_property("id").and_then(Property::as_str)
    }

    /// The `meta.location` value, when assigned.
    pub fn location(&self) -> Option<&str> {
        self.meta_sub("location")
    }

    /// The `meta.version` value, when assigned.
    pub fn version(&self) -> Option<&str> {
        self.meta_sub("version")
    }

    /// A resource's hash equals its root property's hash.
    pub fn hash_value(&self) -> u64 {
        self.root.hash_value()
    }

    /// Raw value at `path` (see [`crud::get_at`]).
    pub fn get(&self, path: &Path) -> ScimResult<Value> {
        crud::get_at(&self.root, path)
    }

    /// Add `value` at `path`.
    pub fn add(&mut self, path: &Path, value: &Value) -> ScimResult<Vec<Event>> {
        crud::add_at(&mut self.root, path, value)
    }

    /// Replace the target of `path` with `value`.
    pub fn replace(&mut self, path: &Path, value: &Value) -> ScimResult<Vec<Event>> {
        crud::replace_at(&mut self.root, path, value)
    }

    /// Delete the target of `path`.
    pub fn delete(&mut self, path: &Path) -> ScimResult<Vec<Event>> {
        crud::delete_at(&mut self.root, path)
    }

    fn meta_sub(&self, name: &str) -> Option<&str> {
        self.root
            .sub_property("meta")
            .and_then(|meta| meta.sub_property(name))
            .and_then(Property::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::compile_path;
    use crate::schema::SchemaRegistry;
    use serde_json::json;

    #[test]
    fn clone_is_deep_and_hash_stable() {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        let mut resource = Resource::new(Arc::clone(rt));
        resource
            .replace(&compile_path("userName").unwrap(), &json!("alice"))
            .unwrap();

        let mut copy = resource.clone();
        assert_eq!(resource.hash_value(), copy.hash_value());

        copy.replace(&compile_path("userName").unwrap(), &json!("bob"))
            .unwrap();
        assert_ne!(resource.hash_value(), copy.hash_value());
        assert_eq!(
            resource.get(&compile_path("userName").unwrap()).unwrap(),
            json!("alice")
        );
    }

    #[test]
    fn accessors_read_id_and_meta() {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        let mut resource = Resource::new(Arc::clone(rt));
        assert!(resource.id().is_none());
        resource
            .replace(&compile_path("id").unwrap(), &json!("abc-123"))
            .unwrap();
        resource
            .replace(
                &compile_path("meta.version").unwrap(),
                &json!("W/\"deadbeef\""),
            )
            .unwrap();
        assert_eq!(resource.id(), Some("abc-123"));
        assert_eq!(resource.version(), Some("W/\"deadbeef\""));
    }
}
