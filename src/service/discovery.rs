//! Discovery endpoints: `/Schemas`, `/ResourceTypes`,
//! `/ServiceProviderConfig`.

use super::ScimService;
use serde_json::Value;

impl ScimService {
    /// All discoverable schemas, as the `/Schemas` list body.
    pub fn schemas_body(&self) -> Value {
        Value::Array(
            self.registry()
                .schemas()
                .iter()
                .map(|schema| schema.to_json(&self.config().base_url))
                .collect(),
        )
    }

    /// One schema by URN, as the `/Schemas/{urn}` body.
    pub fn schema_body(&self, urn: &str) -> Option<Value> {
        self.registry()
            .schema_by_id(urn)
            .map(|schema| schema.to_json(&self.config().base_url))
    }

    /// All resource types, as the `/ResourceTypes` list body.
    pub fn resource_types_body(&self) -> Value {
        Value::Array(
            self.registry()
                .resource_types()
                .iter()
                .map(|rt| rt.to_json(&self.config().base_url))
                .collect(),
        )
    }

    /// One resource type by name, as the `/ResourceTypes/{name}` body.
    pub fn resource_type_body(&self, name: &str) -> Option<Value> {
        self.registry()
            .resource_type(name)
            .map(|rt| rt.to_json(&self.config().base_url))
    }

    /// The `/ServiceProviderConfig` body.
    pub fn service_provider_config_body(&self) -> Value {
        self.registry()
            .service_provider_config()
            .to_json(&self.config().base_url)
    }
}
