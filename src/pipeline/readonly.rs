//! ReadOnly handling: reset before the pipeline, copy-back on update.

use super::{FilterContext, PropertyFilter, WriteOp};
use crate::error::ScimResult;
use crate::property::Property;
use crate::schema::{Attribute, annotations};

/// Resets properties whose attribute carries `@ReadOnly{reset}`, discarding
/// whatever the client sent for server-managed attributes.
pub struct ClearReadOnly;

impl PropertyFilter for ClearReadOnly {
    fn supports(&self, attr: &Attribute) -> bool {
        attr.annotation_flag(annotations::READ_ONLY, "reset")
    }

    fn on_property(
        &self,
        _ctx: &mut FilterContext,
        prop: &mut Property,
        _reference: Option<&Property>,
    ) -> ScimResult<()> {
        prop.delete()?;
        Ok(())
    }
}

/// On update, restores server-managed values from the stored resource for
/// `@CopyReadOnly` / `@ReadOnly{copy}` attributes.
pub struct CopyReadOnly;

impl PropertyFilter for CopyReadOnly {
    fn supports(&self, attr: &Attribute) -> bool {
        attr.has_annotation(annotations::COPY_READ_ONLY)
            || attr.annotation_flag(annotations::READ_ONLY, "copy")
    }

    fn on_property(
        &self,
        ctx: &mut FilterContext,
        prop: &mut Property,
        reference: Option<&Property>,
    ) -> ScimResult<()> {
        if ctx.op != WriteOp::Update {
            return Ok(());
        }
        if let Some(reference) = reference {
            if !reference.is_unassigned() {
                prop.replace(&reference.raw())?;
            }
        }
        Ok(())
    }
}
