//! DFS tree visitor with a lock-step reference cursor.
//!
//! Walks every property of a resource in attribute-index order, pre-order.
//! When a reference resource is supplied, the visitor keeps a parallel
//! cursor into it: complex sub-properties pair by name, multi-valued
//! elements pair by [`Property::matches`]. A property without a
//! counterpart visits with `None` (loss of sync).

use crate::error::ScimResult;
use crate::property::{Property, Resource};

/// Visit every property of `resource` with its reference counterpart.
pub fn visit_pairs<F>(
    resource: &mut Resource,
    reference: Option<&Resource>,
    visit: &mut F,
) -> ScimResult<()>
where
    F: FnMut(&mut Property, Option<&Property>) -> ScimResult<()>,
{
    let reference_root = reference.map(|r| r.root());
    visit_children(resource.root_mut(), reference_root, visit)
}

fn visit_children<F>(
    prop: &mut Property,
    reference: Option<&Property>,
    visit: &mut F,
) -> ScimResult<()>
where
    F: FnMut(&mut Property, Option<&Property>) -> ScimResult<()>,
{
    if prop.is_complex() {
        let count = prop.sub_properties().len();
        for index in 0..count {
            let name = prop.sub_properties()[index].attr().name().to_string();
            let ref_sub = reference.and_then(|r| r.sub_property(&name));
            let sub = &mut prop.sub_properties_mut()[index];
            visit_one(sub, ref_sub, visit)?;
        }
    } else if prop.is_multi() {
        // The visited filter may drop elements; re-check the bound.
        let mut index = 0;
        while index < prop.elements().len() {
            let ref_elem = reference.and_then(|r| {
                let live = &prop.elements()[index];
                r.elements().iter().find(|candidate| candidate.matches(live))
            });
            let elem = &mut prop.elements_mut()[index];
            visit_one(elem, ref_elem, visit)?;
            index += 1;
        }
    }
    Ok(())
}

fn visit_one<F>(
    prop: &mut Property,
    reference: Option<&Property>,
    visit: &mut F,
) -> ScimResult<()>
where
    F: FnMut(&mut Property, Option<&Property>) -> ScimResult<()>,
{
    visit(prop, reference)?;
    visit_children(prop, reference, visit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::compile_path;
    use crate::schema::SchemaRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn user(emails: serde_json::Value) -> Resource {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        let mut resource = Resource::new(Arc::clone(rt));
        resource
            .replace(&compile_path("userName").unwrap(), &json!("alice"))
            .unwrap();
        resource
            .replace(&compile_path("emails").unwrap(), &emails)
            .unwrap();
        resource
    }

    #[test]
    fn visits_in_attribute_index_order() {
        let mut resource = user(json!([{"value": "a@x"}]));
        let mut seen = Vec::new();
        visit_pairs(&mut resource, None, &mut |prop, _| {
            seen.push(prop.attr().path().to_string());
            Ok(())
        })
        .unwrap();
        let schemas_pos = seen.iter().position(|p| p == "schemas").unwrap();
        let id_pos = seen.iter().position(|p| p == "id").unwrap();
        let user_name_pos = seen.iter().position(|p| p == "userName").unwrap();
        assert!(schemas_pos < id_pos && id_pos < user_name_pos);
        // Elements and their sub-properties are visited too.
        assert!(seen.iter().filter(|p| *p == "emails.value").count() >= 1);
    }

    #[test]
    fn reference_elements_pair_by_matching() {
        let mut live = user(json!([{"value": "b@x"}, {"value": "a@x"}]));
        let reference = user(json!([{"value": "a@x"}]));
        let mut paired = Vec::new();
        visit_pairs(&mut live, Some(&reference), &mut |prop, ref_prop| {
            if prop.attr().path() == "emails" && prop.attr().is_element() {
                paired.push((
                    prop.sub_property("value")
                        .and_then(Property::as_str)
                        .map(String::from),
                    ref_prop.is_some(),
                ));
            }
            Ok(())
        })
        .unwrap();
        assert!(paired.contains(&(Some("a@x".to_string()), true)));
        assert!(paired.contains(&(Some("b@x".to_string()), false)));
    }
}
