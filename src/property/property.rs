//! The property node: one attribute plus, when assigned, a typed value.
//!
//! Properties form the dynamically typed tree every other subsystem reads or
//! mutates. The payload is a tagged variant per attribute type; complex and
//! multi-valued containers own their children, so dropping a root sweeps the
//! whole tree. Mutations return the events they produced; containers with
//! `@AutoCompact` / `@ExclusivePrimary` tidy themselves after every
//! multi-valued mutation.

use super::event::Event;
use crate::error::{ScimError, ScimResult};
use crate::schema::{Attribute, AttributeType, annotations};
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Typed payload of a property.
#[derive(Debug, Clone)]
pub enum PropertyData {
    /// String value
    Str(Option<String>),
    /// 64-bit integer value
    Int(Option<i64>),
    /// Decimal value
    Dec(Option<f64>),
    /// Boolean value
    Bool(Option<bool>),
    /// Instant, serialized as RFC 3339 UTC
    DateTime(Option<DateTime<Utc>>),
    /// URI reference, always compared case-sensitively
    Ref(Option<String>),
    /// Base64 text, validated on assignment
    Bin(Option<String>),
    /// One sub-property per sub-attribute, in attribute-index order
    Complex(Vec<Property>),
    /// Element properties carrying the derived element attribute
    Multi(Vec<Property>),
}

/// A runtime node carrying one attribute and possibly a value.
#[derive(Debug, Clone)]
pub struct Property {
    attr: Arc<Attribute>,
    data: PropertyData,
}

impl Property {
    /// Create an unassigned property for `attr`, with the full sub-property
    /// skeleton for complex attributes.
    pub fn new(attr: Arc<Attribute>) -> Self {
        let data = if attr.multi_valued() {
            PropertyData::Multi(Vec::new())
        } else {
            match attr.typ() {
                AttributeType::Complex => PropertyData::Complex(
                    attr.sub_attributes()
                        .iter()
                        .map(|sub| Property::new(Arc::clone(sub)))
                        .collect(),
                ),
                AttributeType::String => PropertyData::Str(None),
                AttributeType::Integer => PropertyData::Int(None),
                AttributeType::Decimal => PropertyData::Dec(None),
                AttributeType::Boolean => PropertyData::Bool(None),
                AttributeType::DateTime => PropertyData::DateTime(None),
                AttributeType::Reference => PropertyData::Ref(None),
                AttributeType::Binary => PropertyData::Bin(None),
            }
        };
        Self { attr, data }
    }

    /// The attribute describing this property.
    pub fn attr(&self) -> &Arc<Attribute> {
        &self.attr
    }

    /// The typed payload.
    pub fn data(&self) -> &PropertyData {
        &self.data
    }

    /// Whether this is a multi-valued container.
    pub fn is_multi(&self) -> bool {
        matches!(self.data, PropertyData::Multi(_))
    }

    /// Whether this is a complex container.
    pub fn is_complex(&self) -> bool {
        matches!(self.data, PropertyData::Complex(_))
    }

    /// Sub-properties of a complex property, in attribute-index order.
    pub fn sub_properties(&self) -> &[Property] {
        match &self.data {
            PropertyData::Complex(subs) => subs,
            _ => &[],
        }
    }

    /// Mutable sub-properties of a complex property.
    pub fn sub_properties_mut(&mut self) -> &mut [Property] {
        match &mut self.data {
            PropertyData::Complex(subs) => subs,
            _ => &mut [],
        }
    }

    /// Look up a sub-property by name, case-insensitively.
    pub fn sub_property(&self, name: &str) -> Option<&Property> {
        self.sub_properties()
            .iter()
            .find(|sub| sub.attr.name().eq_ignore_ascii_case(name))
    }

    /// Mutable variant of [`Property::sub_property`].
    pub fn sub_property_mut(&mut self, name: &str) -> Option<&mut Property> {
        match &mut self.data {
            PropertyData::Complex(subs) => subs
                .iter_mut()
                .find(|sub| sub.attr.name().eq_ignore_ascii_case(name)),
            _ => None,
        }
    }

    /// Elements of a multi-valued property.
    pub fn elements(&self) -> &[Property] {
        match &self.data {
            PropertyData::Multi(elems) => elems,
            _ => &[],
        }
    }

    /// Mutable elements of a multi-valued property.
    pub(crate) fn elements_mut(&mut self) -> &mut Vec<Property> {
        match &mut self.data {
            PropertyData::Multi(elems) => elems,
            _ => panic!("elements_mut on non-multi-valued property"),
        }
    }

    /// A property is unassigned iff it carries no value: simple without a
    /// value, multi-valued with no assigned element, complex with every
    /// sub-property unassigned.
    pub fn is_unassigned(&self) -> bool {
        match &self.data {
            PropertyData::Str(v) => v.is_none(),
            PropertyData::Int(v) => v.is_none(),
            PropertyData::Dec(v) => v.is_none(),
            PropertyData::Bool(v) => v.is_none(),
            PropertyData::DateTime(v) => v.is_none(),
            PropertyData::Ref(v) => v.is_none(),
            PropertyData::Bin(v) => v.is_none(),
            PropertyData::Complex(subs) => subs.iter().all(Property::is_unassigned),
            PropertyData::Multi(elems) => elems.iter().all(Property::is_unassigned),
        }
    }

    /// Order-independent, case-normalized content hash. Unassigned
    /// properties hash to 0.
    pub fn hash_value(&self) -> u64 {
        if self.is_unassigned() {
            return 0;
        }
        let mut hasher = DefaultHasher::new();
        match &self.data {
            PropertyData::Str(Some(v)) => {
                if self.attr.case_exact() {
                    v.hash(&mut hasher);
                } else {
                    v.to_lowercase().hash(&mut hasher);
                }
            }
            PropertyData::Int(Some(v)) => v.hash(&mut hasher),
            PropertyData::Dec(Some(v)) => v.to_bits().hash(&mut hasher),
            PropertyData::Bool(Some(v)) => v.hash(&mut hasher),
            PropertyData::DateTime(Some(v)) => v.timestamp_millis().hash(&mut hasher),
            PropertyData::Ref(Some(v)) => v.hash(&mut hasher),
            PropertyData::Bin(Some(v)) => v.hash(&mut hasher),
            PropertyData::Complex(subs) => {
                let identity = self.attr.identity_sub_attributes();
                let mut entries: Vec<(String, u64)> = subs
                    .iter()
                    .filter(|sub| !sub.is_unassigned())
                    .filter(|sub| {
                        identity.is_empty()
                            || identity.iter().any(|id_attr| ***id_attr == *sub.attr)
                    })
                    .map(|sub| (sub.attr.name().to_lowercase(), sub.hash_value()))
                    .collect();
                entries.sort();
                entries.hash(&mut hasher);
            }
            PropertyData::Multi(elems) => {
                let mut hashes: Vec<u64> = elems
                    .iter()
                    .filter(|elem| !elem.is_unassigned())
                    .map(Property::hash_value)
                    .collect();
                hashes.sort_unstable();
                hashes.hash(&mut hasher);
            }
            _ => unreachable!("assigned simple property with empty payload"),
        }
        hasher.finish()
    }

    /// Two properties match iff their attributes are equal and either both
    /// are unassigned or their hashes coincide. Assignedness is consulted
    /// before hashes, so an absent integer never matches a zero-valued one.
    pub fn matches(&self, other: &Property) -> bool {
        if *self.attr != *other.attr {
            return false;
        }
        match (self.is_unassigned(), other.is_unassigned()) {
            (true, true) => true,
            (false, false) => self.hash_value() == other.hash_value(),
            _ => false,
        }
    }

    /// The raw JSON-native value of this property; `Null` when unassigned.
    pub fn raw(&self) -> Value {
        if self.is_unassigned() {
            return Value::Null;
        }
        match &self.data {
            PropertyData::Str(Some(v)) | PropertyData::Ref(Some(v)) | PropertyData::Bin(Some(v)) => {
                Value::String(v.clone())
            }
            PropertyData::Int(Some(v)) => Value::from(*v),
            PropertyData::Dec(Some(v)) => {
                serde_json::Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null)
            }
            PropertyData::Bool(Some(v)) => Value::Bool(*v),
            PropertyData::DateTime(Some(v)) => {
                Value::String(v.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            PropertyData::Complex(subs) => {
                let mut map = Map::new();
                for sub in subs {
                    if !sub.is_unassigned() {
                        map.insert(sub.attr.name().to_string(), sub.raw());
                    }
                }
                Value::Object(map)
            }
            PropertyData::Multi(elems) => Value::Array(
                elems
                    .iter()
                    .filter(|elem| !elem.is_unassigned())
                    .map(Property::raw)
                    .collect(),
            ),
            _ => unreachable!("assigned simple property with empty payload"),
        }
    }

    /// String payload, when this is an assigned string-like property.
    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            PropertyData::Str(Some(v)) | PropertyData::Ref(Some(v)) | PropertyData::Bin(Some(v)) => {
                Some(v)
            }
            _ => None,
        }
    }

    /// Boolean payload, when assigned.
    pub fn as_bool(&self) -> Option<bool> {
        match &self.data {
            PropertyData::Bool(v) => *v,
            _ => None,
        }
    }

    /// Add `value` to this property (RFC 7644 `add` semantics).
    ///
    /// Simple targets are replaced; complex targets merge per key;
    /// multi-valued targets append, skipping elements that match an existing
    /// one.
    pub fn add(&mut self, value: &Value) -> ScimResult<Vec<Event>> {
        if value.is_null() {
            return Ok(Vec::new());
        }
        match &self.data {
            PropertyData::Complex(_) => {
                let map = value.as_object().ok_or_else(|| {
                    ScimError::invalid_value(format!(
                        "attribute '{}' expects an object",
                        display_path(&self.attr)
                    ))
                })?;
                let pre = self.snapshot();
                let mut events = Vec::new();
                for (key, sub_value) in map {
                    let sub = self.sub_property_mut(key).ok_or_else(|| {
                        ScimError::no_target(format!("attribute '{key}' is not defined"))
                    })?;
                    events.extend(sub.add(sub_value)?);
                }
                self.push_transition(pre, &mut events);
                Ok(events)
            }
            PropertyData::Multi(_) => {
                let pre = self.snapshot();
                let mut events = Vec::new();
                let mut touched = None;
                let incoming: Vec<&Value> = match value {
                    Value::Array(items) => items.iter().collect(),
                    other => vec![other],
                };
                for item in incoming {
                    if let Some(index) = self.append_element(item)? {
                        touched = Some(index);
                    }
                }
                events.extend(self.finalize_multi_mutation(touched));
                self.push_transition(pre, &mut events);
                Ok(events)
            }
            _ => self.replace(value),
        }
    }

    /// Replace this property with `value` (RFC 7644 `replace` semantics).
    ///
    /// Complex targets replace named sub-properties and delete the rest;
    /// multi-valued targets are cleared then re-added.
    pub fn replace(&mut self, value: &Value) -> ScimResult<Vec<Event>> {
        if value.is_null() {
            return self.delete();
        }
        let pre = self.snapshot();
        match &self.data {
            PropertyData::Complex(_) => {
                let map = value.as_object().ok_or_else(|| {
                    ScimError::invalid_value(format!(
                        "attribute '{}' expects an object",
                        display_path(&self.attr)
                    ))
                })?;
                for (key, _) in map {
                    if self.sub_property(key).is_none() {
                        return Err(ScimError::no_target(format!(
                            "attribute '{key}' is not defined"
                        )));
                    }
                }
                let mut events = Vec::new();
                let names: Vec<String> = self
                    .sub_properties()
                    .iter()
                    .map(|sub| sub.attr.name().to_string())
                    .collect();
                for name in names {
                    let incoming = map
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(&name))
                        .map(|(_, v)| v.clone());
                    let sub = self
                        .sub_property_mut(&name)
                        .ok_or_else(|| ScimError::internal("sub-property skeleton out of sync"))?;
                    match incoming {
                        Some(v) => events.extend(sub.replace(&v)?),
                        None => events.extend(sub.delete()?),
                    }
                }
                self.push_transition(pre, &mut events);
                Ok(events)
            }
            PropertyData::Multi(_) => {
                let mut events = self.delete()?;
                events.extend(self.add(value)?);
                self.push_transition(pre, &mut events);
                Ok(events)
            }
            _ => {
                self.assign_simple(value)?;
                let mut events = Vec::new();
                self.push_transition(pre, &mut events);
                Ok(events)
            }
        }
    }

    /// Clear this property (RFC 7644 `remove` semantics).
    pub fn delete(&mut self) -> ScimResult<Vec<Event>> {
        let pre = self.snapshot();
        match &mut self.data {
            PropertyData::Str(v) | PropertyData::Ref(v) | PropertyData::Bin(v) => *v = None,
            PropertyData::Int(v) => *v = None,
            PropertyData::Dec(v) => *v = None,
            PropertyData::Bool(v) => *v = None,
            PropertyData::DateTime(v) => *v = None,
            PropertyData::Complex(subs) => {
                for sub in subs.iter_mut() {
                    sub.delete()?;
                }
            }
            PropertyData::Multi(elems) => elems.clear(),
        }
        let mut events = Vec::new();
        self.push_transition(pre, &mut events);
        Ok(events)
    }

    /// Append one element built from `value`; returns its index, or `None`
    /// when an equal element already exists.
    pub(crate) fn append_element(&mut self, value: &Value) -> ScimResult<Option<usize>> {
        let elem_attr = self.attr.element_attribute();
        let mut candidate = Property::new(elem_attr);
        candidate.add(value)?;
        if self.elements().iter().any(|elem| elem.matches(&candidate)) {
            return Ok(None);
        }
        let elems = self.elements_mut();
        elems.push(candidate);
        Ok(Some(elems.len() - 1))
    }

    /// Housekeeping after a multi-valued mutation: compact unassigned
    /// elements (`@AutoCompact`) and enforce at most one primary
    /// (`@ExclusivePrimary`), keeping the most recently assigned element.
    pub(crate) fn finalize_multi_mutation(&mut self, touched: Option<usize>) -> Vec<Event> {
        let mut events = Vec::new();
        if !self.is_multi() {
            return events;
        }
        let mut touched = touched;
        if self.attr.has_annotation(annotations::AUTO_COMPACT) {
            let elems = self.elements_mut();
            let mut removed_before = 0;
            let mut index = 0;
            elems.retain(|elem| {
                let keep = !elem.is_unassigned();
                if !keep {
                    if let Some(t) = touched {
                        if index < t {
                            removed_before += 1;
                        } else if index == t {
                            touched = None;
                        }
                    }
                }
                index += 1;
                keep
            });
            touched = touched.map(|t| t - removed_before);
        }
        if self.attr.has_annotation(annotations::EXCLUSIVE_PRIMARY) {
            if let Some(primary_attr) = self.attr.primary_sub_attribute().cloned() {
                let primary_name = primary_attr.name().to_string();
                let with_primary: Vec<usize> = self
                    .elements()
                    .iter()
                    .enumerate()
                    .filter(|(_, elem)| {
                        elem.sub_property(&primary_name)
                            .and_then(Property::as_bool)
                            .unwrap_or(false)
                    })
                    .map(|(index, _)| index)
                    .collect();
                if with_primary.len() > 1 {
                    let keep = touched
                        .filter(|t| with_primary.contains(t))
                        .unwrap_or(*with_primary.last().unwrap_or(&0));
                    for index in with_primary {
                        if index == keep {
                            continue;
                        }
                        if let Some(elem) = self.elements_mut().get_mut(index) {
                            if let Some(primary) = elem.sub_property_mut(&primary_name) {
                                let pre = primary.raw();
                                if primary.delete().is_ok() {
                                    events.push(Event::unassigned(
                                        Arc::clone(primary.attr()),
                                        pre,
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }
        events
    }

    /// Assign a coerced value to a simple payload.
    fn assign_simple(&mut self, value: &Value) -> ScimResult<()> {
        let attr = Arc::clone(&self.attr);
        match &mut self.data {
            PropertyData::Str(slot) => {
                *slot = Some(expect_string(&attr, value)?);
            }
            PropertyData::Ref(slot) => {
                *slot = Some(expect_string(&attr, value)?);
            }
            PropertyData::Bin(slot) => {
                let text = expect_string(&attr, value)?;
                base64::engine::general_purpose::STANDARD
                    .decode(text.as_bytes())
                    .map_err(|_| {
                        ScimError::invalid_value(format!(
                            "attribute '{}' expects base64 data",
                            display_path(&attr)
                        ))
                    })?;
                *slot = Some(text);
            }
            PropertyData::Int(slot) => {
                let number = value
                    .as_i64()
                    .or_else(|| value.as_u64().and_then(|u| i64::try_from(u).ok()))
                    .ok_or_else(|| {
                        ScimError::invalid_value(format!(
                            "attribute '{}' expects an integer",
                            display_path(&attr)
                        ))
                    })?;
                *slot = Some(number);
            }
            PropertyData::Dec(slot) => {
                let number = value.as_f64().ok_or_else(|| {
                    ScimError::invalid_value(format!(
                        "attribute '{}' expects a decimal",
                        display_path(&attr)
                    ))
                })?;
                *slot = Some(number);
            }
            PropertyData::Bool(slot) => {
                let flag = value.as_bool().ok_or_else(|| {
                    ScimError::invalid_value(format!(
                        "attribute '{}' expects a boolean",
                        display_path(&attr)
                    ))
                })?;
                *slot = Some(flag);
            }
            PropertyData::DateTime(slot) => {
                let text = expect_string(&attr, value)?;
                *slot = Some(parse_datetime(&attr, &text)?);
            }
            PropertyData::Complex(_) | PropertyData::Multi(_) => {
                return Err(ScimError::internal("assign_simple on container property"));
            }
        }
        Ok(())
    }

    /// Pre-mutation state used to derive the transition event.
    fn snapshot(&self) -> (bool, u64, Value) {
        let assigned = !self.is_unassigned();
        (assigned, if assigned { self.hash_value() } else { 0 }, self.raw())
    }

    /// Append the assigned/unassigned transition event for this property,
    /// comparing against a pre-mutation snapshot.
    fn push_transition(&self, pre: (bool, u64, Value), events: &mut Vec<Event>) {
        let (was_assigned, pre_hash, pre_value) = pre;
        let assigned = !self.is_unassigned();
        if was_assigned && !assigned {
            events.push(Event::unassigned(Arc::clone(&self.attr), pre_value));
        } else if assigned && (!was_assigned || self.hash_value() != pre_hash) {
            events.push(Event::assigned(Arc::clone(&self.attr), pre_value));
        }
    }
}

fn expect_string(attr: &Attribute, value: &Value) -> ScimResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ScimError::invalid_value(format!(
                "attribute '{}' expects a string",
                display_path(attr)
            ))
        })
}

/// Parse an RFC 3339 instant, accepting the zone-less
/// `YYYY-MM-DDTHH:MM:SS` form as UTC.
pub fn parse_datetime(attr: &Attribute, text: &str) -> ScimResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(parsed.and_utc());
    }
    Err(ScimError::invalid_value(format!(
        "attribute '{}' expects an ISO-8601 dateTime, got '{text}'",
        display_path(attr)
    )))
}

/// Path for error messages; element attributes render as their parent path.
fn display_path(attr: &Attribute) -> String {
    if attr.path().is_empty() {
        attr.name().to_string()
    } else {
        attr.path().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;
    use serde_json::json;

    fn user_attr(path: &str) -> Arc<Attribute> {
        let registry = SchemaRegistry::new().unwrap();
        registry
            .resource_type("User")
            .unwrap()
            .find_attribute(path)
            .unwrap()
    }

    #[test]
    fn simple_add_replace_delete_roundtrip() {
        let mut prop = Property::new(user_attr("userName"));
        assert!(prop.is_unassigned());
        assert_eq!(prop.hash_value(), 0);

        prop.add(&json!("alice")).unwrap();
        assert_eq!(prop.raw(), json!("alice"));

        prop.replace(&json!("bob")).unwrap();
        assert_eq!(prop.raw(), json!("bob"));

        prop.delete().unwrap();
        assert!(prop.is_unassigned());
        assert_eq!(prop.raw(), Value::Null);
    }

    #[test]
    fn case_insensitive_strings_hash_equal() {
        let mut a = Property::new(user_attr("userName"));
        let mut b = Property::new(user_attr("userName"));
        a.add(&json!("Alice")).unwrap();
        b.add(&json!("alice")).unwrap();
        assert_eq!(a.hash_value(), b.hash_value());
        assert!(a.matches(&b));
    }

    #[test]
    fn multi_add_skips_matching_elements() {
        let mut emails = Property::new(user_attr("emails"));
        emails
            .add(&json!([{"value": "a@x.com", "type": "work"}]))
            .unwrap();
        emails
            .add(&json!({"value": "a@x.com", "type": "work"}))
            .unwrap();
        assert_eq!(emails.elements().len(), 1);
    }

    #[test]
    fn multi_hash_is_order_independent() {
        let mut a = Property::new(user_attr("emails"));
        let mut b = Property::new(user_attr("emails"));
        a.add(&json!([{"value": "1@x"}, {"value": "2@x"}])).unwrap();
        b.add(&json!([{"value": "2@x"}, {"value": "1@x"}])).unwrap();
        assert_eq!(a.hash_value(), b.hash_value());
    }

    #[test]
    fn exclusive_primary_keeps_single_primary() {
        let mut emails = Property::new(user_attr("emails"));
        emails
            .add(&json!([{"value": "a@x", "primary": true}]))
            .unwrap();
        emails
            .add(&json!({"value": "b@x", "primary": true}))
            .unwrap();
        let primaries: Vec<bool> = emails
            .elements()
            .iter()
            .filter_map(|e| e.sub_property("primary").and_then(Property::as_bool))
            .collect();
        assert_eq!(primaries, vec![true]);
        let kept: Vec<String> = emails
            .elements()
            .iter()
            .filter(|e| {
                e.sub_property("primary")
                    .and_then(Property::as_bool)
                    .unwrap_or(false)
            })
            .filter_map(|e| e.sub_property("value").and_then(Property::as_str).map(String::from))
            .collect();
        assert_eq!(kept, vec!["b@x".to_string()]);
    }

    #[test]
    fn complex_replace_deletes_absent_sub_properties() {
        let mut name = Property::new(user_attr("name"));
        name.add(&json!({"givenName": "Ada", "familyName": "Lovelace"}))
            .unwrap();
        name.replace(&json!({"givenName": "Grace"})).unwrap();
        assert_eq!(name.raw(), json!({"givenName": "Grace"}));
    }

    #[test]
    fn integer_absent_and_zero_do_not_match() {
        let registry = SchemaRegistry::new().unwrap();
        // No integer attribute in the core schemas; exercise through the
        // unassigned check with a synthetic comparison on active (boolean).
        let attr = registry
            .resource_type("User")
            .unwrap()
            .find_attribute("active")
            .unwrap();
        let unassigned = Property::new(Arc::clone(&attr));
        let mut assigned = Property::new(attr);
        assigned.add(&json!(false)).unwrap();
        assert!(!unassigned.matches(&assigned));
    }

    #[test]
    fn datetime_accepts_zoneless_and_rfc3339() {
        let attr = user_attr("meta.created");
        parse_datetime(&attr, "2006-01-02T15:04:05").unwrap();
        parse_datetime(&attr, "2006-01-02T15:04:05Z").unwrap();
        parse_datetime(&attr, "2006-01-02T15:04:05+02:00").unwrap();
        assert!(parse_datetime(&attr, "not-a-date").is_err());
    }

    #[test]
    fn invalid_types_are_rejected() {
        let mut active = Property::new(user_attr("active"));
        assert!(matches!(
            active.add(&json!("yes")),
            Err(ScimError::InvalidValue { .. })
        ));
        let mut user_name = Property::new(user_attr("userName"));
        assert!(matches!(
            user_name.add(&json!(42)),
            Err(ScimError::InvalidValue { .. })
        ));
    }
}
