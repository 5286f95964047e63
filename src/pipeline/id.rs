//! Resource id assignment.

use super::{FilterContext, ResourceFilter, WriteOp};
use crate::error::ScimResult;
use crate::expr::compile_path_cached;
use crate::property::Resource;
use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

/// Stamps a fresh random UUID as the resource id on create. On update the
/// id was already copied back from the stored resource.
pub struct IdFilter;

#[async_trait]
impl ResourceFilter for IdFilter {
    async fn filter(
        &self,
        ctx: &mut FilterContext,
        resource: &mut Resource,
        _reference: Option<&Resource>,
    ) -> ScimResult<()> {
        if ctx.op != WriteOp::Create {
            return Ok(());
        }
        let id = Uuid::new_v4().to_string();
        let path = compile_path_cached("id")?;
        resource.replace(&path, &json!(id))?;
        Ok(())
    }
}
