//! Path-qualified CRUD over the property tree.
//!
//! Operations address a target through compiled [`Path`] steps. A plain step
//! over a multi-valued property fans out to every element; a filter step
//! selects the elements its embedded filter accepts; a numeric index (used
//! by the navigator) selects one element. After any multi-valued mutation
//! the container compacts itself and re-establishes primary exclusivity.

use super::event::Event;
use super::property::Property;
use super::subscriber;
use crate::error::{ScimError, ScimResult};
use crate::expr::{FilterExpr, Path, Step};
use crate::query::evaluate;
use crate::schema::Attribute;
use serde_json::Value;

/// The three mutation kinds of RFC 7644.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Merge/append semantics
    Add,
    /// Overwrite semantics
    Replace,
    /// Clear semantics
    Delete,
}

/// Raw value at `path`, or `noTarget` when no attribute exists there.
///
/// A path that fans out over a multi-valued property yields an array of the
/// reached values; a unique target yields its raw value (`Null` when
/// unassigned).
pub fn get_at(prop: &Property, path: &Path) -> ScimResult<Value> {
    let (candidates, fanned_out) = resolve_all(prop, &path.steps)?;
    if !fanned_out && candidates.len() == 1 {
        return Ok(candidates[0].raw());
    }
    Ok(Value::Array(
        candidates
            .iter()
            .filter(|candidate| !candidate.is_unassigned())
            .map(|candidate| candidate.raw())
            .collect(),
    ))
}

/// Apply `add` at `path`.
pub fn add_at(prop: &mut Property, path: &Path, value: &Value) -> ScimResult<Vec<Event>> {
    mutate(prop, &path.steps, Op::Add, Some(value))
}

/// Apply `replace` at `path`.
pub fn replace_at(prop: &mut Property, path: &Path, value: &Value) -> ScimResult<Vec<Event>> {
    mutate(prop, &path.steps, Op::Replace, Some(value))
}

/// Apply `remove` at `path`.
pub fn delete_at(prop: &mut Property, path: &Path) -> ScimResult<Vec<Event>> {
    mutate(prop, &path.steps, Op::Delete, None)
}

/// Resolve `steps` against `prop`, fanning out over multi-valued
/// properties. Returns the reached properties and whether fan-out happened.
pub(crate) fn resolve_all<'a>(
    prop: &'a Property,
    steps: &[Step],
) -> ScimResult<(Vec<&'a Property>, bool)> {
    let mut fanned_out = false;
    let candidates = resolve_into(prop, steps, &mut fanned_out)?;
    Ok((candidates, fanned_out))
}

fn resolve_into<'a>(
    prop: &'a Property,
    steps: &[Step],
    fanned_out: &mut bool,
) -> ScimResult<Vec<&'a Property>> {
    let Some((first, rest)) = steps.split_first() else {
        return Ok(vec![prop]);
    };
    match first {
        Step::Attr(word) => {
            if prop.is_multi() {
                // Plain step over a multi-valued property: every element.
                *fanned_out = true;
                let mut out = Vec::new();
                for elem in prop.elements() {
                    out.extend(resolve_into(elem, steps, fanned_out)?);
                }
                Ok(out)
            } else if prop.is_complex() {
                let names = expand_attr_word(prop.attr(), word)
                    .ok_or_else(|| ScimError::no_target(format!("no attribute at '{word}'")))?;
                let mut current = prop;
                for (pos, name) in names.iter().enumerate() {
                    match current.sub_property(name) {
                        Some(sub) => {
                            if sub.is_multi() && pos + 1 < names.len() {
                                // Remaining URN-expanded names become steps.
                                let mut tail: Vec<Step> = names[pos + 1..]
                                    .iter()
                                    .map(|n| Step::Attr(n.clone()))
                                    .collect();
                                tail.extend(rest.iter().cloned());
                                return resolve_into(sub, &tail, fanned_out);
                            }
                            current = sub;
                        }
                        None => {
                            return Err(ScimError::no_target(format!(
                                "no attribute at '{word}'"
                            )));
                        }
                    }
                }
                resolve_into(current, rest, fanned_out)
            } else {
                Err(ScimError::no_target(format!(
                    "'{}' has no sub-attribute '{word}'",
                    prop.attr().path()
                )))
            }
        }
        Step::Filter(filter) => {
            if !prop.is_multi() {
                return Err(ScimError::invalid_path(format!(
                    "filter step on singular attribute '{}'",
                    prop.attr().path()
                )));
            }
            *fanned_out = true;
            let mut out = Vec::new();
            for elem in prop.elements() {
                if evaluate(filter, elem)? {
                    out.extend(resolve_into(elem, rest, fanned_out)?);
                }
            }
            Ok(out)
        }
        Step::Index(index) => {
            let elem = prop.elements().get(*index).ok_or_else(|| {
                ScimError::no_target(format!(
                    "index {index} out of bounds on '{}'",
                    prop.attr().path()
                ))
            })?;
            resolve_into(elem, rest, fanned_out)
        }
    }
}

fn mutate(
    prop: &mut Property,
    steps: &[Step],
    op: Op,
    value: Option<&Value>,
) -> ScimResult<Vec<Event>> {
    let Some((first, rest)) = steps.split_first() else {
        return apply(prop, op, value);
    };
    match first {
        Step::Attr(word) => {
            if prop.is_multi() {
                let len = prop.elements().len();
                if len == 0 && op == Op::Delete {
                    return Ok(Vec::new());
                }
                let mut events = Vec::new();
                for index in 0..len {
                    let elem = &mut prop.elements_mut()[index];
                    events.extend(mutate(elem, steps, op, value)?);
                }
                events.extend(prop.finalize_multi_mutation(None));
                subscriber::notify(prop, &mut events);
                Ok(events)
            } else if prop.is_complex() {
                let names = expand_attr_word(prop.attr(), word)
                    .ok_or_else(|| ScimError::no_target(format!("no attribute at '{word}'")))?;
                let mut tail: Vec<Step> = names[1..].iter().map(|n| Step::Attr(n.clone())).collect();
                tail.extend(rest.iter().cloned());
                let sub = prop.sub_property_mut(&names[0]).ok_or_else(|| {
                    ScimError::no_target(format!("no attribute at '{word}'"))
                })?;
                let mut events = mutate(sub, &tail, op, value)?;
                subscriber::notify(prop, &mut events);
                Ok(events)
            } else {
                Err(ScimError::no_target(format!(
                    "'{}' has no sub-attribute '{word}'",
                    prop.attr().path()
                )))
            }
        }
        Step::Filter(filter) => {
            if !prop.is_multi() {
                return Err(ScimError::invalid_path(format!(
                    "filter step on singular attribute '{}'",
                    prop.attr().path()
                )));
            }
            let matched = matching_indices(prop, filter)?;
            if matched.is_empty() {
                return Err(ScimError::no_target(
                    "filter step selected no elements".to_string(),
                ));
            }
            let mut events = Vec::new();
            let mut touched = None;
            for index in &matched {
                let elem = &mut prop.elements_mut()[*index];
                if rest.is_empty() && op == Op::Delete {
                    // Removing a filtered element removes the element itself.
                    events.extend(elem.delete()?);
                } else {
                    events.extend(mutate(elem, rest, op, value)?);
                }
                touched = Some(*index);
            }
            events.extend(prop.finalize_multi_mutation(touched));
            subscriber::notify(prop, &mut events);
            Ok(events)
        }
        Step::Index(index) => {
            let exists = *index < prop.elements().len();
            if !exists {
                return Err(ScimError::no_target(format!(
                    "index {index} out of bounds on '{}'",
                    prop.attr().path()
                )));
            }
            let elem = &mut prop.elements_mut()[*index];
            let mut events = if rest.is_empty() && op == Op::Delete {
                elem.delete()?
            } else {
                mutate(elem, rest, op, value)?
            };
            events.extend(prop.finalize_multi_mutation(Some(*index)));
            subscriber::notify(prop, &mut events);
            Ok(events)
        }
    }
}

fn apply(prop: &mut Property, op: Op, value: Option<&Value>) -> ScimResult<Vec<Event>> {
    match op {
        Op::Add => {
            let value = value
                .ok_or_else(|| ScimError::invalid_syntax("'add' requires a value"))?;
            prop.add(value)
        }
        Op::Replace => {
            let value = value
                .ok_or_else(|| ScimError::invalid_syntax("'replace' requires a value"))?;
            prop.replace(value)
        }
        Op::Delete => prop.delete(),
    }
}

fn matching_indices(prop: &Property, filter: &FilterExpr) -> ScimResult<Vec<usize>> {
    let mut matched = Vec::new();
    for (index, elem) in prop.elements().iter().enumerate() {
        if evaluate(filter, elem)? {
            matched.push(index);
        }
    }
    Ok(matched)
}

/// Expand a path word into concrete sub-attribute names.
///
/// Plain words expand to themselves. URN-qualified words match either an
/// extension container name exactly, or a container name followed by `:` and
/// a dotted sub-path; only the schema can make that split.
pub(crate) fn expand_attr_word(attr: &Attribute, word: &str) -> Option<Vec<String>> {
    let lowered = word.to_ascii_lowercase();
    if !lowered.starts_with("urn:") {
        return Some(vec![word.to_string()]);
    }
    for sub in attr.sub_attributes() {
        let name = sub.name().to_ascii_lowercase();
        if !name.starts_with("urn:") {
            continue;
        }
        if lowered == name {
            return Some(vec![sub.name().to_string()]);
        }
        if let Some(rest) = lowered.strip_prefix(&name) {
            if let Some(tail) = rest.strip_prefix(':') {
                if !tail.is_empty() {
                    let original_tail = &word[word.len() - tail.len()..];
                    let mut names = vec![sub.name().to_string()];
                    names.extend(original_tail.split('.').map(str::to_string));
                    return Some(names);
                }
            }
        }
    }
    None
}
