//! Error types for SCIM server operations.
//!
//! Every fallible operation in the crate returns [`ScimError`]. The variants
//! correspond one-to-one with the SCIM 2.0 error vocabulary (RFC 7644 §3.12)
//! plus the internal kinds the pipeline and storage layers need. The HTTP
//! status and `scimType` projections live here so that callers embedding the
//! library behind any router map errors the same way.

use serde_json::Value;

/// Convenience alias used throughout the crate.
pub type ScimResult<T> = Result<T, ScimError>;

/// Main error type for SCIM server operations.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// The path portion of a request could not be compiled or resolved.
    #[error("invalid path: {detail}")]
    InvalidPath {
        /// Description of the offending path
        detail: String,
    },

    /// A SCIM filter expression could not be compiled or evaluated.
    #[error("invalid filter: {detail}")]
    InvalidFilter {
        /// Description of the offending filter
        detail: String,
    },

    /// The request body is structurally malformed.
    #[error("invalid syntax: {detail}")]
    InvalidSyntax {
        /// Description of the malformation
        detail: String,
    },

    /// A value does not conform to its attribute definition. Covers type
    /// mismatches, canonical-value violations and missing required values.
    #[error("invalid value: {detail}")]
    InvalidValue {
        /// Description of the violation
        detail: String,
    },

    /// A path compiled correctly but addresses no attribute of the schema.
    #[error("no target: {detail}")]
    NoTarget {
        /// The path that failed to resolve
        detail: String,
    },

    /// An immutable or readOnly attribute would be modified.
    #[error("mutability violation: {detail}")]
    Mutability {
        /// Description of the violation
        detail: String,
    },

    /// A server- or globally-unique attribute value is already taken.
    #[error("uniqueness violation on '{attribute}'")]
    Uniqueness {
        /// Full path of the constrained attribute
        attribute: String,
    },

    /// No resource with the given id exists.
    #[error("resource '{id}' not found")]
    ResourceNotFound {
        /// The id that was looked up
        id: String,
    },

    /// A conditional request's version precondition did not hold.
    #[error("precondition failed for resource '{id}'")]
    PreConditionFailed {
        /// The id of the resource whose version mismatched
        id: String,
    },

    /// The query would return more results than the configured maximum.
    #[error("too many results: {detail}")]
    TooMany {
        /// Description of the limit that was exceeded
        detail: String,
    },

    /// Unexpected internal failure.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl ScimError {
    /// Shorthand constructor for [`ScimError::InvalidPath`].
    pub fn invalid_path(detail: impl Into<String>) -> Self {
        Self::InvalidPath {
            detail: detail.into(),
        }
    }

    /// Shorthand constructor for [`ScimError::InvalidFilter`].
    pub fn invalid_filter(detail: impl Into<String>) -> Self {
        Self::InvalidFilter {
            detail: detail.into(),
        }
    }

    /// Shorthand constructor for [`ScimError::InvalidSyntax`].
    pub fn invalid_syntax(detail: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            detail: detail.into(),
        }
    }

    /// Shorthand constructor for [`ScimError::InvalidValue`].
    pub fn invalid_value(detail: impl Into<String>) -> Self {
        Self::InvalidValue {
            detail: detail.into(),
        }
    }

    /// Shorthand constructor for [`ScimError::NoTarget`].
    pub fn no_target(detail: impl Into<String>) -> Self {
        Self::NoTarget {
            detail: detail.into(),
        }
    }

    /// Shorthand constructor for [`ScimError::Mutability`].
    pub fn mutability(detail: impl Into<String>) -> Self {
        Self::Mutability {
            detail: detail.into(),
        }
    }

    /// Shorthand constructor for [`ScimError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The `scimType` token for the error body, where RFC 7644 defines one.
    pub fn scim_type(&self) -> Option<&'static str> {
        match self {
            Self::InvalidPath { .. } => Some("invalidPath"),
            Self::InvalidFilter { .. } => Some("invalidFilter"),
            Self::InvalidSyntax { .. } => Some("invalidSyntax"),
            Self::InvalidValue { .. } => Some("invalidValue"),
            Self::Mutability { .. } => Some("mutability"),
            Self::Uniqueness { .. } => Some("uniqueness"),
            _ => None,
        }
    }

    /// The HTTP status this error maps to on a non-conditional request.
    ///
    /// Conditional requests remap [`ScimError::ResourceNotFound`] to 412;
    /// that adjustment lives in [`crate::protocol::status`] because it needs
    /// request headers.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidPath { .. }
            | Self::InvalidFilter { .. }
            | Self::InvalidSyntax { .. }
            | Self::InvalidValue { .. }
            | Self::Mutability { .. }
            | Self::NoTarget { .. }
            | Self::TooMany { .. } => 400,
            Self::ResourceNotFound { .. } => 404,
            Self::PreConditionFailed { .. } => 412,
            Self::Uniqueness { .. } => 409,
            Self::Internal { .. } => 500,
        }
    }

    /// Render the RFC 7644 error body for this error.
    pub fn to_body(&self) -> Value {
        let mut body = serde_json::json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
            "status": self.http_status().to_string(),
            "detail": self.to_string(),
        });
        if let Some(scim_type) = self.scim_type() {
            body["scimType"] = Value::String(scim_type.to_string());
        }
        body
    }
}

impl From<serde_json::Error> for ScimError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSyntax {
            detail: err.to_string(),
        }
    }
}
