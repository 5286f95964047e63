//! Password hashing.

use super::{FilterContext, PropertyFilter};
use crate::error::{ScimError, ScimResult};
use crate::property::Property;
use crate::schema::{Attribute, AttributeType, Mutability};
use serde_json::json;

/// bcrypt-hashes an incoming plain-text password. Values that already look
/// like bcrypt digests pass through untouched, so replaying a stored
/// resource never double-hashes.
pub struct PasswordFilter {
    cost: u32,
}

impl PasswordFilter {
    /// Create the filter with the configured bcrypt cost.
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PropertyFilter for PasswordFilter {
    fn supports(&self, attr: &Attribute) -> bool {
        attr.path() == "password"
            && attr.typ() == AttributeType::String
            && attr.mutability() == Mutability::WriteOnly
    }

    fn on_property(
        &self,
        _ctx: &mut FilterContext,
        prop: &mut Property,
        _reference: Option<&Property>,
    ) -> ScimResult<()> {
        let Some(plain) = prop.as_str().map(str::to_string) else {
            return Ok(());
        };
        if is_bcrypt_digest(&plain) {
            return Ok(());
        }
        let hashed = bcrypt::hash(&plain, self.cost)
            .map_err(|err| ScimError::internal(format!("bcrypt failure: {err}")))?;
        prop.replace(&json!(hashed))?;
        Ok(())
    }
}

fn is_bcrypt_digest(value: &str) -> bool {
    value.starts_with("$2a$") || value.starts_with("$2b$") || value.starts_with("$2y$")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::expr::compile_path;
    use crate::pipeline::{PropertyStage, ResourceFilter, WriteOp};
    use crate::property::Resource;
    use crate::schema::SchemaRegistry;
    use std::sync::Arc;

    #[tokio::test]
    async fn plain_password_is_hashed_and_verifiable() {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        let mut resource = Resource::new(Arc::clone(rt));
        resource
            .replace(&compile_path("password").unwrap(), &json!("s3cret"))
            .unwrap();

        let mut ctx = FilterContext {
            op: WriteOp::Create,
            no_change: false,
            request: RequestContext::with_generated_id(),
        };
        // Minimum cost keeps the test fast.
        PropertyStage::new(PasswordFilter::new(4))
            .filter(&mut ctx, &mut resource, None)
            .await
            .unwrap();

        let stored = resource
            .get(&compile_path("password").unwrap())
            .unwrap()
            .as_str()
            .unwrap()
            .to_string();
        assert!(is_bcrypt_digest(&stored));
        assert!(bcrypt::verify("s3cret", &stored).unwrap());
    }

    #[tokio::test]
    async fn existing_digest_is_left_alone() {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        let mut resource = Resource::new(Arc::clone(rt));
        let digest = bcrypt::hash("x", 4).unwrap();
        resource
            .replace(&compile_path("password").unwrap(), &json!(digest))
            .unwrap();

        let mut ctx = FilterContext {
            op: WriteOp::Update,
            no_change: false,
            request: RequestContext::with_generated_id(),
        };
        PropertyStage::new(PasswordFilter::new(4))
            .filter(&mut ctx, &mut resource, None)
            .await
            .unwrap();
        assert_eq!(
            resource.get(&compile_path("password").unwrap()).unwrap(),
            json!(digest)
        );
    }
}
