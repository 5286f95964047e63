//! Annotation-driven event subscribers.
//!
//! Subscribers are attached per-property purely by annotation on the
//! attribute, and are invoked while events bubble up through the enclosing
//! containers. They may append events and tidy the property they are
//! attached to; they never navigate elsewhere in the tree.

use super::event::{Event, EventKind};
use super::property::Property;
use crate::schema::annotations;
use serde_json::Value;
use std::sync::Arc;

/// Run the subscribers of `prop` against the event batch produced below it.
pub fn notify(prop: &mut Property, events: &mut Vec<Event>) {
    if events.is_empty() {
        return;
    }
    if prop.attr().has_annotation(annotations::STATE_SUMMARY) {
        state_summary(prop, events);
    }
    if prop.attr().has_annotation(annotations::SYNC_SCHEMA) {
        sync_schema(prop, events);
    }
}

/// `@StateSummary`: summarize sub-property changes into an event for the
/// complex itself, so observers higher up see the aggregate transition.
fn state_summary(prop: &Property, events: &mut Vec<Event>) {
    let touches_subtree = events.iter().any(|event| *event.attr != **prop.attr());
    if !touches_subtree {
        return;
    }
    let kind = if prop.is_unassigned() {
        EventKind::Unassigned
    } else {
        EventKind::Assigned
    };
    events.push(Event {
        kind,
        attr: Arc::clone(prop.attr()),
        pre_value: Value::Null,
    });
}

/// `@SyncSchema`: keep the `schemas` list aligned with the assignment state
/// of extension containers.
fn sync_schema(prop: &mut Property, events: &[Event]) {
    let transitions: Vec<(EventKind, String)> = events
        .iter()
        .filter(|event| {
            event
                .attr
                .has_annotation(annotations::SCHEMA_EXTENSION_ROOT)
        })
        .map(|event| (event.kind, event.attr.name().to_string()))
        .collect();
    if transitions.is_empty() {
        return;
    }
    let Some(schemas) = prop.sub_property_mut("schemas") else {
        return;
    };
    for (kind, urn) in transitions {
        match kind {
            EventKind::Assigned => {
                // Duplicate URNs are skipped by element matching.
                let _ = schemas.append_element(&Value::String(urn));
            }
            EventKind::Unassigned => {
                schemas
                    .elements_mut()
                    .retain(|elem| elem.as_str() != Some(urn.as_str()));
            }
        }
    }
}
