//! Service configuration.
//!
//! A plain value struct covering the tunables the request pipeline and the
//! group-sync worker consult. Loading it from a file or CLI flags is left to
//! the embedding application.

use serde::{Deserialize, Serialize};

/// Tunables for a SCIM service instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    /// Base URL prepended to `meta.location` values, without trailing slash
    /// (e.g. `https://idp.example.com/scim/v2`).
    pub base_url: String,
    /// bcrypt cost used by the password filter.
    pub bcrypt_cost: u32,
    /// Page size applied when a query omits `count`.
    pub default_page_size: usize,
    /// Hard cap on `count`; larger requests are clamped.
    pub max_page_size: usize,
    /// Seconds the group-sync worker sleeps when its queue is empty.
    pub sync_poll_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5050".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            default_page_size: 100,
            max_page_size: 500,
            sync_poll_seconds: 3,
        }
    }
}

impl ServiceConfig {
    /// The `meta.location` value for a resource at `endpoint` with `id`.
    pub fn location_of(&self, endpoint: &str, id: &str) -> String {
        format!("{}{}/{}", self.base_url, endpoint, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_joins_base_endpoint_and_id() {
        let config = ServiceConfig {
            base_url: "https://idp.example.com/scim/v2".into(),
            ..Default::default()
        };
        assert_eq!(
            config.location_of("/Users", "abc"),
            "https://idp.example.com/scim/v2/Users/abc"
        );
    }

    #[test]
    fn deserializes_with_defaults_for_missing_fields() {
        let config: ServiceConfig = serde_json::from_str(r#"{"bcryptCost": 4}"#).unwrap();
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.default_page_size, 100);
    }
}
