//! # SCIM 2.0 Identity-Provisioning Server Library
//!
//! A System for Cross-domain Identity Management (RFC 7643/7644) server
//! core: a managed store of user and group resources behind a typed,
//! schema-driven service surface for create, read, replace, patch, delete
//! and query.
//!
//! ## Architecture
//!
//! Two subsystems carry the design weight:
//!
//! - **The schema-driven property tree** ([`property`], described by
//!   [`schema`]): every resource is a tree of typed properties keyed by
//!   attribute definitions, with structural CRUD at compiled paths
//!   ([`expr`]), content hashing, filter evaluation ([`query`]) and
//!   synchronous event propagation through annotation-driven subscribers.
//! - **The request pipeline** ([`pipeline`]): an ordered filter chain run
//!   per write that resets and copies server-managed values, stamps ids and
//!   meta, hashes passwords and validates the schema contract, combined
//!   with per-resource locking ([`lock`]) and the asynchronous group
//!   membership synchronizer ([`groups`]).
//!
//! The crate ships no HTTP router. An embedding application maps requests
//! onto [`service::ScimService`] and renders [`protocol`] messages; the
//! storage backend is pluggable through [`storage::Storage`].
//!
//! ## Quick Start
//!
//! ```rust
//! use scimd::config::ServiceConfig;
//! use scimd::context::RequestContext;
//! use scimd::service::ScimService;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ScimService::new(ServiceConfig::default())?;
//!     let ctx = RequestContext::with_generated_id();
//!
//!     let created = service
//!         .users()
//!         .create(
//!             &ctx,
//!             &json!({
//!                 "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
//!                 "userName": "ada",
//!             }),
//!         )
//!         .await?;
//!     assert_eq!(created.status, 201);
//!
//!     // Reconcile group membership in the background.
//!     let shutdown = service.start_group_sync();
//!     shutdown.send(true).ok();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod expr;
pub mod groups;
pub mod json;
pub mod lock;
pub mod patch;
pub mod pipeline;
pub mod property;
pub mod protocol;
pub mod query;
pub mod schema;
pub mod service;
pub mod storage;

// Core re-exports for library users
pub use config::ServiceConfig;
pub use context::RequestContext;
pub use error::{ScimError, ScimResult};
pub use property::{Navigator, Property, Resource};
pub use schema::{Attribute, AttributeType, Mutability, Returned, SchemaRegistry, Uniqueness};
pub use service::{ResourceService, ScimService};
pub use storage::{MemoryStorage, Storage};
