//! Evaluation of compiled filters against a property tree.
//!
//! Logical nodes short-circuit. A relational node resolves its left-hand
//! path first; traversing a multi-valued property fans the evaluation out
//! over the elements, and the node is true iff any element satisfies it.
//! `eq` against a multi-valued target therefore means "contains an element
//! equal to".

use crate::error::{ScimError, ScimResult};
use crate::expr::{CompareOp, FilterExpr, Literal};
use crate::property::crud::resolve_all;
use crate::property::property::{Property, PropertyData, parse_datetime};
use std::cmp::Ordering;

/// Evaluate `filter` against `prop` and return the boolean verdict.
pub fn evaluate(filter: &FilterExpr, prop: &Property) -> ScimResult<bool> {
    match filter {
        FilterExpr::And(left, right) => {
            if !evaluate(left, prop)? {
                return Ok(false);
            }
            evaluate(right, prop)
        }
        FilterExpr::Or(left, right) => {
            if evaluate(left, prop)? {
                return Ok(true);
            }
            evaluate(right, prop)
        }
        FilterExpr::Not(inner) => Ok(!evaluate(inner, prop)?),
        FilterExpr::Compare { path, op, literal } => {
            let candidates = match resolve_all(prop, &path.steps) {
                Ok((candidates, _)) => candidates,
                // A filter naming an undefined attribute is a bad filter,
                // not a bad path.
                Err(ScimError::NoTarget { detail }) => {
                    return Err(ScimError::invalid_filter(detail));
                }
                Err(other) => return Err(other),
            };
            for candidate in candidates {
                if compare(candidate, *op, literal.as_ref())? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn compare(prop: &Property, op: CompareOp, literal: Option<&Literal>) -> ScimResult<bool> {
    // Terminal multi-valued target: true iff any element satisfies.
    if prop.is_multi() {
        for elem in prop.elements() {
            if compare(elem, op, literal)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }

    if op == CompareOp::Pr {
        return Ok(is_present(prop));
    }

    if let Some(Literal::Null) = literal {
        return match op {
            CompareOp::Eq => Ok(prop.is_unassigned()),
            CompareOp::Ne => Ok(!prop.is_unassigned()),
            _ => Err(ScimError::invalid_filter(
                "null only supports 'eq' and 'ne'",
            )),
        };
    }

    if prop.is_complex() {
        return Err(ScimError::invalid_filter(format!(
            "cannot compare complex attribute '{}'",
            prop.attr().path()
        )));
    }

    if prop.is_unassigned() {
        return Ok(op == CompareOp::Ne);
    }

    let literal = literal
        .ok_or_else(|| ScimError::invalid_filter("missing comparison literal"))?;

    match prop.data() {
        PropertyData::Str(Some(value)) => {
            let rhs = expect_str_literal(prop, literal)?;
            Ok(string_compare(value, rhs, op, prop.attr().case_exact())?)
        }
        PropertyData::Ref(Some(value)) | PropertyData::Bin(Some(value)) => {
            // References and binary are always case-sensitive.
            let rhs = expect_str_literal(prop, literal)?;
            Ok(string_compare(value, rhs, op, true)?)
        }
        PropertyData::Bool(Some(value)) => {
            let Literal::Bool(rhs) = literal else {
                return Err(type_mismatch(prop, "boolean"));
            };
            match op {
                CompareOp::Eq => Ok(value == rhs),
                CompareOp::Ne => Ok(value != rhs),
                _ => Err(ScimError::invalid_filter(
                    "booleans only support 'eq' and 'ne'",
                )),
            }
        }
        PropertyData::Int(Some(value)) => {
            let rhs = match literal {
                Literal::Int(rhs) => *rhs,
                _ => return Err(type_mismatch(prop, "integer")),
            };
            ordered_compare(value.cmp(&rhs), op, prop)
        }
        PropertyData::Dec(Some(value)) => {
            let rhs = match literal {
                Literal::Dec(rhs) => *rhs,
                Literal::Int(rhs) => *rhs as f64,
                _ => return Err(type_mismatch(prop, "decimal")),
            };
            ordered_compare(
                value.partial_cmp(&rhs).unwrap_or(Ordering::Equal),
                op,
                prop,
            )
        }
        PropertyData::DateTime(Some(value)) => {
            let rhs_text = expect_str_literal(prop, literal)?;
            let rhs = parse_datetime(prop.attr(), rhs_text)
                .map_err(|err| ScimError::invalid_filter(err.to_string()))?;
            ordered_compare(value.cmp(&rhs), op, prop)
        }
        _ => Err(ScimError::internal("assigned property with empty payload")),
    }
}

/// `pr`: non-empty for strings and multi-valued targets, non-null otherwise.
fn is_present(prop: &Property) -> bool {
    match prop.data() {
        PropertyData::Str(Some(value)) => !value.is_empty(),
        _ => !prop.is_unassigned(),
    }
}

fn string_compare(lhs: &str, rhs: &str, op: CompareOp, case_exact: bool) -> ScimResult<bool> {
    let (lhs, rhs) = if case_exact {
        (lhs.to_string(), rhs.to_string())
    } else {
        (lhs.to_lowercase(), rhs.to_lowercase())
    };
    Ok(match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Sw => lhs.starts_with(&rhs),
        CompareOp::Ew => lhs.ends_with(&rhs),
        CompareOp::Co => lhs.contains(&rhs),
        CompareOp::Gt => lhs > rhs,
        CompareOp::Ge => lhs >= rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Le => lhs <= rhs,
        CompareOp::Pr => unreachable!("pr handled before literal comparison"),
    })
}

fn ordered_compare(ordering: Ordering, op: CompareOp, prop: &Property) -> ScimResult<bool> {
    match op {
        CompareOp::Eq => Ok(ordering == Ordering::Equal),
        CompareOp::Ne => Ok(ordering != Ordering::Equal),
        CompareOp::Gt => Ok(ordering == Ordering::Greater),
        CompareOp::Ge => Ok(ordering != Ordering::Less),
        CompareOp::Lt => Ok(ordering == Ordering::Less),
        CompareOp::Le => Ok(ordering != Ordering::Greater),
        _ => Err(ScimError::invalid_filter(format!(
            "operator not supported on '{}'",
            prop.attr().path()
        ))),
    }
}

fn expect_str_literal<'l>(prop: &Property, literal: &'l Literal) -> ScimResult<&'l str> {
    match literal {
        Literal::Str(text) => Ok(text),
        _ => Err(type_mismatch(prop, "string")),
    }
}

fn type_mismatch(prop: &Property, expected: &str) -> ScimError {
    ScimError::invalid_filter(format!(
        "literal for '{}' must be a {expected}",
        prop.attr().path()
    ))
}
