//! JSON boundary: projection-aware serialization and schema-driven
//! deserialization.

pub mod deserialize;
pub mod serialize;

pub use deserialize::deserialize_resource;
pub use serialize::serialize;

use crate::error::{ScimError, ScimResult};

/// Attribute selection for serialization, from the `attributes` /
/// `excludedAttributes` request parameters.
///
/// Paths match case-insensitively against full attribute paths; selecting a
/// path selects its whole subtree, and keeps its ancestors as shells.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    attributes: Vec<String>,
    excluded: Vec<String>,
}

impl Projection {
    /// Build a projection from the two comma-separated request parameters.
    /// Supplying both is rejected.
    pub fn from_params(
        attributes: Option<&str>,
        excluded_attributes: Option<&str>,
    ) -> ScimResult<Self> {
        if attributes.is_some() && excluded_attributes.is_some() {
            return Err(ScimError::invalid_syntax(
                "at most one of 'attributes' and 'excludedAttributes' may be given",
            ));
        }
        Ok(Self {
            attributes: split_paths(attributes),
            excluded: split_paths(excluded_attributes),
        })
    }

    /// Whether the request explicitly selects `path` (for
    /// `returned=request` attributes, and for defaults when an `attributes`
    /// list is present).
    pub fn selects(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        self.attributes
            .iter()
            .any(|entry| related(entry, &path))
    }

    /// Whether a `returned=default` attribute at `path` is emitted.
    pub fn emits_by_default(&self, path: &str) -> bool {
        if !self.attributes.is_empty() {
            return self.selects(path);
        }
        let path = path.to_ascii_lowercase();
        !self
            .excluded
            .iter()
            .any(|entry| entry == &path || is_under(&path, entry))
    }
}

fn split_paths(param: Option<&str>) -> Vec<String> {
    param
        .map(|text| {
            text.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_ascii_lowercase)
                .collect()
        })
        .unwrap_or_default()
}

/// True when `entry` selects `path`: equal, `path` inside `entry`'s
/// subtree, or `path` an ancestor of `entry`.
fn related(entry: &str, path: &str) -> bool {
    entry == path || is_under(path, entry) || is_under(entry, path)
}

/// Whether `path` lies strictly under `ancestor` (dot- or URN-joined).
fn is_under(path: &str, ancestor: &str) -> bool {
    path.strip_prefix(ancestor)
        .map(|rest| rest.starts_with('.') || rest.starts_with(':'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_lists_are_rejected() {
        assert!(matches!(
            Projection::from_params(Some("a"), Some("b")),
            Err(ScimError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn selection_covers_subtrees_and_ancestors() {
        let projection = Projection::from_params(Some("name.givenName"), None).unwrap();
        assert!(projection.selects("name"));
        assert!(projection.selects("name.givenName"));
        assert!(!projection.selects("name.familyName"));
        assert!(!projection.selects("userName"));

        let subtree = Projection::from_params(Some("emails"), None).unwrap();
        assert!(subtree.selects("emails.value"));
    }

    #[test]
    fn exclusion_drops_subtrees_but_not_ancestors() {
        let projection = Projection::from_params(None, Some("name.givenName")).unwrap();
        assert!(projection.emits_by_default("name"));
        assert!(!projection.emits_by_default("name.givenName"));
        assert!(projection.emits_by_default("userName"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let projection = Projection::from_params(Some("eMaIls"), None).unwrap();
        assert!(projection.selects("emails.value"));
    }
}
