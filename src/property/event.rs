//! Property mutation events.
//!
//! Every modifying operation on the tree yields events describing what
//! changed. Events bubble up through the enclosing containers, where
//! annotation-driven subscribers may react and append further events.

use crate::schema::Attribute;
use serde_json::Value;
use std::sync::Arc;

/// What happened to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The previous value differed or was absent, and a value is present now.
    Assigned,
    /// A value was present before and is absent now.
    Unassigned,
}

/// One mutation notification.
///
/// Carries the attribute of the source property rather than a reference to
/// the property itself; the tree is a plain ownership arena and events
/// outlive the borrow that produced them.
#[derive(Debug, Clone)]
pub struct Event {
    /// Kind of state transition
    pub kind: EventKind,
    /// Attribute of the property that changed
    pub attr: Arc<Attribute>,
    /// Raw value before the mutation (`Null` when it was unassigned)
    pub pre_value: Value,
}

impl Event {
    /// Construct an assignment event.
    pub fn assigned(attr: Arc<Attribute>, pre_value: Value) -> Self {
        Self {
            kind: EventKind::Assigned,
            attr,
            pre_value,
        }
    }

    /// Construct an unassignment event.
    pub fn unassigned(attr: Arc<Attribute>, pre_value: Value) -> Self {
        Self {
            kind: EventKind::Unassigned,
            attr,
            pre_value,
        }
    }
}
