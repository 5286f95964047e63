//! Sorting of query results by attribute path.

use crate::expr::Path;
use crate::property::crud::resolve_all;
use crate::property::{Property, PropertyData, Resource};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort direction for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    /// Smallest first (the default)
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// Comparable key extracted from one resource for one sort path.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Str(String),
    Num(f64),
    Bool(bool),
    Time(i64),
}

/// Compare two resources by the value at `sort_by`, honoring `order`.
/// Resources without a value sort last regardless of direction.
pub fn compare_resources(
    a: &Resource,
    b: &Resource,
    sort_by: &Path,
    order: SortOrder,
) -> Ordering {
    let key_a = sort_key(a, sort_by);
    let key_b = sort_key(b, sort_by);
    match (key_a, key_b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = compare_keys(&a, &b);
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        }
    }
}

fn sort_key(resource: &Resource, path: &Path) -> Option<SortKey> {
    let (candidates, _) = resolve_all(resource.root(), &path.steps).ok()?;
    candidates
        .into_iter()
        .find(|candidate| !candidate.is_unassigned())
        .and_then(key_of)
}

fn key_of(prop: &Property) -> Option<SortKey> {
    match prop.data() {
        PropertyData::Str(Some(value)) => Some(SortKey::Str(if prop.attr().case_exact() {
            value.clone()
        } else {
            value.to_lowercase()
        })),
        PropertyData::Ref(Some(value)) | PropertyData::Bin(Some(value)) => {
            Some(SortKey::Str(value.clone()))
        }
        PropertyData::Int(Some(value)) => Some(SortKey::Num(*value as f64)),
        PropertyData::Dec(Some(value)) => Some(SortKey::Num(*value)),
        PropertyData::Bool(Some(value)) => Some(SortKey::Bool(*value)),
        PropertyData::DateTime(Some(value)) => Some(SortKey::Time(value.timestamp_millis())),
        // Complex targets have no natural key; such sorts rank equal.
        _ => None,
    }
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Str(a), SortKey::Str(b)) => a.cmp(b),
        (SortKey::Num(a), SortKey::Num(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
        (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}
