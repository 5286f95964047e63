//! Retractable cursor over a property tree.
//!
//! The navigator keeps a focus stack starting at a source property.
//! Navigation errors latch: once a step fails, further navigation is a
//! no-op until the error is consumed through [`Navigator::error`].
//! Mutations apply at the current focus and replay the produced events
//! upward so every focused ancestor's subscribers run, with multi-valued
//! ancestors re-compacting and re-establishing primary exclusivity.

use super::event::Event;
use super::property::Property;
use super::subscriber;
use crate::error::{ScimError, ScimResult};
use crate::expr::FilterExpr;
use crate::query::evaluate;
use serde_json::Value;

/// One resolved focus step.
#[derive(Debug, Clone)]
enum NavStep {
    /// Sub-property of a complex, by exact name
    Name(String),
    /// Element of a multi-valued, by index
    Index(usize),
}

/// A cursor over a property tree that mediates mutation and event replay.
pub struct Navigator<'a> {
    source: &'a mut Property,
    steps: Vec<NavStep>,
    err: Option<ScimError>,
}

impl<'a> Navigator<'a> {
    /// Start a navigator at `source`.
    pub fn new(source: &'a mut Property) -> Self {
        Self {
            source,
            steps: Vec::new(),
            err: None,
        }
    }

    /// Focus the named sub-property of the current complex focus.
    pub fn dot(&mut self, name: &str) -> &mut Self {
        if self.err.is_some() {
            return self;
        }
        let found = self
            .focus()
            .and_then(|focus| focus.sub_property(name).map(|sub| sub.attr().name().to_string()));
        match found {
            Some(exact) => self.steps.push(NavStep::Name(exact)),
            None => {
                self.err = Some(ScimError::no_target(format!(
                    "no sub-property named '{name}'"
                )));
            }
        }
        self
    }

    /// Focus the element at `index` of the current multi-valued focus.
    pub fn at(&mut self, index: usize) -> &mut Self {
        if self.err.is_some() {
            return self;
        }
        let in_bounds = self
            .focus()
            .map(|focus| index < focus.elements().len())
            .unwrap_or(false);
        if in_bounds {
            self.steps.push(NavStep::Index(index));
        } else {
            self.err = Some(ScimError::no_target(format!(
                "element index {index} out of bounds"
            )));
        }
        self
    }

    /// Focus the first element of the current multi-valued focus that the
    /// filter accepts.
    pub fn where_matches(&mut self, filter: &FilterExpr) -> &mut Self {
        if self.err.is_some() {
            return self;
        }
        let selected = match self.focus() {
            Some(focus) => {
                let mut selected = None;
                for (index, elem) in focus.elements().iter().enumerate() {
                    match evaluate(filter, elem) {
                        Ok(true) => {
                            selected = Some(Ok(index));
                            break;
                        }
                        Ok(false) => {}
                        Err(err) => {
                            selected = Some(Err(err));
                            break;
                        }
                    }
                }
                selected
            }
            None => None,
        };
        match selected {
            Some(Ok(index)) => self.steps.push(NavStep::Index(index)),
            Some(Err(err)) => self.err = Some(err),
            None => {
                self.err = Some(ScimError::no_target(
                    "no element satisfies the predicate".to_string(),
                ));
            }
        }
        self
    }

    /// Pop the focus stack. The source property cannot be retracted.
    pub fn retract(&mut self) -> &mut Self {
        if self.err.is_some() {
            return self;
        }
        if self.steps.pop().is_none() {
            self.err = Some(ScimError::invalid_path(
                "cannot retract past the source property".to_string(),
            ));
        }
        self
    }

    /// The currently focused property, unless an error is latched.
    pub fn current(&self) -> Option<&Property> {
        if self.err.is_some() {
            return None;
        }
        self.focus()
    }

    /// Consume the latched navigation error, if any.
    pub fn error(&mut self) -> Option<ScimError> {
        self.err.take()
    }

    /// Add `value` at the focus and replay events upward.
    pub fn add(&mut self, value: &Value) -> ScimResult<Vec<Event>> {
        self.mutate(|focus| focus.add(value))
    }

    /// Replace the focus with `value` and replay events upward.
    pub fn replace(&mut self, value: &Value) -> ScimResult<Vec<Event>> {
        self.mutate(|focus| focus.replace(value))
    }

    /// Delete the focus and replay events upward.
    pub fn delete(&mut self) -> ScimResult<Vec<Event>> {
        self.mutate(|focus| focus.delete())
    }

    fn mutate(
        &mut self,
        op: impl FnOnce(&mut Property) -> ScimResult<Vec<Event>>,
    ) -> ScimResult<Vec<Event>> {
        if let Some(err) = self.err.take() {
            return Err(err);
        }
        let mut events = {
            let focus = walk_mut(self.source, &self.steps)?;
            op(focus)?
        };
        // Replay through every focused ancestor, deepest first.
        for depth in (0..self.steps.len()).rev() {
            let touched = match &self.steps[depth] {
                NavStep::Index(index) => Some(*index),
                NavStep::Name(_) => None,
            };
            let ancestor = walk_mut(self.source, &self.steps[..depth])?;
            if ancestor.is_multi() {
                events.extend(ancestor.finalize_multi_mutation(touched));
            }
            subscriber::notify(ancestor, &mut events);
        }
        Ok(events)
    }

    fn focus(&self) -> Option<&Property> {
        let mut current: &Property = self.source;
        for step in &self.steps {
            current = match step {
                NavStep::Name(name) => current.sub_property(name)?,
                NavStep::Index(index) => current.elements().get(*index)?,
            };
        }
        Some(current)
    }
}

fn walk_mut<'p>(source: &'p mut Property, steps: &[NavStep]) -> ScimResult<&'p mut Property> {
    let mut current = source;
    for step in steps {
        current = match step {
            NavStep::Name(name) => current
                .sub_property_mut(name)
                .ok_or_else(|| ScimError::internal("navigator focus out of sync"))?,
            NavStep::Index(index) => current
                .elements_mut()
                .get_mut(*index)
                .ok_or_else(|| ScimError::internal("navigator focus out of sync"))?,
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::compile_filter;
    use crate::schema::SchemaRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn user_root() -> Property {
        let registry = SchemaRegistry::new().unwrap();
        let rt = registry.resource_type("User").unwrap();
        Property::new(Arc::clone(&rt.super_attribute))
    }

    #[test]
    fn dot_and_retract_move_the_focus() {
        let mut root = user_root();
        let mut nav = Navigator::new(&mut root);
        nav.dot("name").dot("givenName");
        assert_eq!(nav.current().unwrap().attr().name(), "givenName");
        nav.retract();
        assert_eq!(nav.current().unwrap().attr().name(), "name");
    }

    #[test]
    fn navigation_error_latches_until_consulted() {
        let mut root = user_root();
        let mut nav = Navigator::new(&mut root);
        nav.dot("nonsense").dot("name");
        assert!(nav.current().is_none());
        assert!(matches!(nav.error(), Some(ScimError::NoTarget { .. })));
        // Consumed; navigation works again.
        nav.dot("name");
        assert_eq!(nav.current().unwrap().attr().name(), "name");
    }

    #[test]
    fn source_cannot_be_retracted() {
        let mut root = user_root();
        let mut nav = Navigator::new(&mut root);
        nav.retract();
        assert!(matches!(nav.error(), Some(ScimError::InvalidPath { .. })));
    }

    #[test]
    fn mutation_through_where_enforces_exclusive_primary() {
        let mut root = user_root();
        {
            let mut nav = Navigator::new(&mut root);
            nav.dot("emails");
            nav.add(&json!([
                {"value": "a@x", "primary": true},
                {"value": "b@x"}
            ]))
            .unwrap();
        }
        let filter = compile_filter(r#"value eq "b@x""#).unwrap();
        {
            let mut nav = Navigator::new(&mut root);
            nav.dot("emails").where_matches(&filter).dot("primary");
            nav.replace(&json!(true)).unwrap();
        }
        let emails = root.sub_property("emails").unwrap();
        let primaries: Vec<(&str, bool)> = emails
            .elements()
            .iter()
            .map(|e| {
                (
                    e.sub_property("value").and_then(Property::as_str).unwrap_or(""),
                    e.sub_property("primary").and_then(Property::as_bool).unwrap_or(false),
                )
            })
            .collect();
        assert!(primaries.contains(&("b@x", true)));
        assert!(!primaries.contains(&("a@x", true)));
    }
}
