//! The schema-driven property tree.
//!
//! Resources are trees of [`Property`] nodes, each carrying one
//! [`crate::schema::Attribute`] and, when assigned, a typed value. The tree
//! supports structural CRUD at arbitrary compiled paths, content hashing and
//! matching, and synchronous event propagation through a retractable
//! [`Navigator`].

pub mod crud;
pub mod event;
pub mod navigator;
pub mod property;
pub mod resource;
pub mod subscriber;

pub use crud::{Op, add_at, delete_at, get_at, replace_at};
pub use event::{Event, EventKind};
pub use navigator::Navigator;
pub use property::{Property, PropertyData};
pub use resource::Resource;
