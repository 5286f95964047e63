//! Projection-aware serialization of resources to JSON.
//!
//! Serialization honors three concerns: the attribute's `returned`
//! characteristic, the request's `attributes` / `excludedAttributes` lists
//! (full-path, case-insensitive), and unassigned suppression (unassigned
//! properties are omitted unless `returned` is `always`).

use super::Projection;
use crate::error::ScimResult;
use crate::property::{Property, Resource};
use crate::schema::Returned;
use serde_json::{Map, Value};

/// Serialize `resource` to its JSON wire shape under `projection`.
pub fn serialize(resource: &Resource, projection: &Projection) -> ScimResult<Value> {
    Ok(serialize_complex(resource.root(), projection))
}

fn serialize_complex(prop: &Property, projection: &Projection) -> Value {
    let mut out = Map::new();
    for sub in prop.sub_properties() {
        if let Some(value) = serialize_property(sub, projection) {
            out.insert(sub.attr().name().to_string(), value);
        }
    }
    Value::Object(out)
}

fn serialize_property(prop: &Property, projection: &Projection) -> Option<Value> {
    let attr = prop.attr();
    match attr.returned() {
        Returned::Never => return None,
        Returned::Always => {}
        Returned::Request => {
            if !projection.selects(attr.path()) {
                return None;
            }
        }
        Returned::Default => {
            if !projection.emits_by_default(attr.path()) {
                return None;
            }
        }
    }
    if prop.is_unassigned() {
        // Unassigned suppression; `always` attributes surface their null.
        if attr.returned() == Returned::Always {
            return Some(Value::Null);
        }
        return None;
    }
    if prop.is_multi() {
        let elements: Vec<Value> = prop
            .elements()
            .iter()
            .filter(|elem| !elem.is_unassigned())
            .map(|elem| {
                if elem.is_complex() {
                    serialize_complex(elem, projection)
                } else {
                    elem.raw()
                }
            })
            .collect();
        return Some(Value::Array(elements));
    }
    if prop.is_complex() {
        let object = serialize_complex(prop, projection);
        // Projection may have filtered every sub-property away.
        if object.as_object().map(Map::is_empty).unwrap_or(true) {
            return None;
        }
        return Some(object);
    }
    Some(prop.raw())
}
