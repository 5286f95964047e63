//! Wire-level message types and HTTP projections.
//!
//! The crate exposes no router of its own; an embedding application maps
//! requests onto the service layer and uses this module for the SCIM
//! message documents, status mapping, conditional-header semantics and
//! panic recovery.

pub mod messages;
pub mod status;

pub use messages::{
    BULK_REQUEST_URN, BULK_RESPONSE_URN, BulkOperation, BulkRequest, BulkResponse,
    BulkResultOperation, LIST_RESPONSE_URN, ListResponse, SEARCH_REQUEST_URN, SearchParams,
    SearchRequest,
};
pub use status::{recovered, status_for, version_matches};
