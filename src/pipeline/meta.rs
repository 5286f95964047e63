//! Meta stamping: resourceType, timestamps, location and version.

use super::{FilterContext, ResourceFilter, WriteOp};
use crate::config::ServiceConfig;
use crate::error::{ScimError, ScimResult};
use crate::expr::compile_path_cached;
use crate::property::Resource;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use sha1::{Digest, Sha1};
use std::sync::Arc;

/// Stamps the `meta` complex. On update, stamping is skipped entirely when
/// the resource hash equals the reference hash; the caller then reports
/// "no change" instead of writing.
pub struct MetaFilter {
    config: Arc<ServiceConfig>,
}

impl MetaFilter {
    /// Create the filter with the service configuration.
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ResourceFilter for MetaFilter {
    async fn filter(
        &self,
        ctx: &mut FilterContext,
        resource: &mut Resource,
        reference: Option<&Resource>,
    ) -> ScimResult<()> {
        if ctx.op == WriteOp::Update {
            if let Some(reference) = reference {
                if resource.hash_value() == reference.hash_value() {
                    ctx.no_change = true;
                    return Ok(());
                }
            }
        }

        let id = resource
            .id()
            .ok_or_else(|| ScimError::internal("meta stamping before id assignment"))?
            .to_string();
        let resource_type = Arc::clone(resource.resource_type());
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        resource.replace(
            &*compile_path_cached("meta.resourceType")?,
            &json!(resource_type.name),
        )?;
        if ctx.op == WriteOp::Create {
            resource.replace(&*compile_path_cached("meta.created")?, &json!(now))?;
        }
        resource.replace(&*compile_path_cached("meta.lastModified")?, &json!(now))?;
        resource.replace(
            &*compile_path_cached("meta.location")?,
            &json!(self.config.location_of(&resource_type.endpoint, &id)),
        )?;
        resource.replace(&*compile_path_cached("meta.version")?, &json!(version_of(&id)))?;
        Ok(())
    }
}

/// Weak entity tag: `W/"<hex>"` with `<hex>` = SHA-1(id ∥ random u64).
/// The randomness makes every stamp distinct; the tag is a weak validator,
/// not a content digest.
fn version_of(id: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(id.as_bytes());
    hasher.update(rand::random::<u64>().to_be_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("W/\"{hex}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::expr::compile_path;
    use crate::schema::SchemaRegistry;

    fn user_with_id(id: &str) -> Resource {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        let mut resource = Resource::new(Arc::clone(rt));
        resource
            .replace(&compile_path("id").unwrap(), &json!(id))
            .unwrap();
        resource
            .replace(&compile_path("userName").unwrap(), &json!("alice"))
            .unwrap();
        resource
    }

    #[tokio::test]
    async fn create_stamps_full_meta() {
        let mut resource = user_with_id("u-1");
        let filter = MetaFilter::new(Arc::new(ServiceConfig::default()));
        let mut ctx = FilterContext {
            op: WriteOp::Create,
            no_change: false,
            request: RequestContext::with_generated_id(),
        };
        filter.filter(&mut ctx, &mut resource, None).await.unwrap();

        assert_eq!(
            resource.get(&compile_path("meta.resourceType").unwrap()).unwrap(),
            json!("User")
        );
        assert!(resource.location().unwrap().ends_with("/Users/u-1"));
        let version = resource.version().unwrap();
        assert!(version.starts_with("W/\"") && version.ends_with('"'));
        assert!(
            resource
                .get(&compile_path("meta.created").unwrap())
                .unwrap()
                .is_string()
        );
    }

    #[tokio::test]
    async fn unchanged_update_skips_stamping() {
        let mut resource = user_with_id("u-1");
        let reference = resource.clone();
        let filter = MetaFilter::new(Arc::new(ServiceConfig::default()));
        let mut ctx = FilterContext {
            op: WriteOp::Update,
            no_change: false,
            request: RequestContext::with_generated_id(),
        };
        filter
            .filter(&mut ctx, &mut resource, Some(&reference))
            .await
            .unwrap();
        assert!(ctx.no_change);
        assert!(resource.version().is_none());
    }

    #[tokio::test]
    async fn versions_differ_between_stamps() {
        let mut a = user_with_id("u-1");
        let mut b = user_with_id("u-1");
        let filter = MetaFilter::new(Arc::new(ServiceConfig::default()));
        let mut ctx = FilterContext {
            op: WriteOp::Create,
            no_change: false,
            request: RequestContext::with_generated_id(),
        };
        filter.filter(&mut ctx, &mut a, None).await.unwrap();
        filter.filter(&mut ctx, &mut b, None).await.unwrap();
        assert_ne!(a.version(), b.version());
    }
}
