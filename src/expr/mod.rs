//! SCIM path and filter expressions.
//!
//! The compiler turns path strings (`emails[type eq "work"].value`) and
//! filter strings (`userName eq "u" and not (active eq false)`) into
//! expression trees. Both the patch engine and the query evaluator consume
//! the trees; compiled expressions are cached by source string.

pub mod compiler;
pub mod token;

pub use compiler::{compile_filter, compile_path};

use crate::error::ScimResult;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// One step of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Plain attribute step (`emails`, `value`)
    Attr(String),
    /// Filter step selecting multi-valued elements (`[type eq "work"]`)
    Filter(Arc<FilterExpr>),
    /// Numeric element index; produced by the navigator, never by syntax
    Index(usize),
}

/// A compiled path: a sequence of steps from the resource root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    /// Steps in traversal order
    pub steps: Vec<Step>,
}

impl Path {
    /// Whether the path has no steps (root target).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Relational operators (case-insensitive in source).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// equal
    Eq,
    /// not equal
    Ne,
    /// starts with
    Sw,
    /// ends with
    Ew,
    /// contains
    Co,
    /// present
    Pr,
    /// greater than
    Gt,
    /// greater than or equal
    Ge,
    /// less than
    Lt,
    /// less than or equal
    Le,
}

impl CompareOp {
    /// Parse a relational operator word, case-insensitively.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "sw" => Some(Self::Sw),
            "ew" => Some(Self::Ew),
            "co" => Some(Self::Co),
            "pr" => Some(Self::Pr),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            _ => None,
        }
    }
}

/// A literal on the right-hand side of a relational node.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Quoted string
    Str(String),
    /// Integer token
    Int(i64),
    /// Decimal token
    Dec(f64),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
}

/// A compiled boolean filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Both operands must hold; evaluation short-circuits
    And(Box<FilterExpr>, Box<FilterExpr>),
    /// Either operand must hold; evaluation short-circuits
    Or(Box<FilterExpr>, Box<FilterExpr>),
    /// Negation
    Not(Box<FilterExpr>),
    /// Relational comparison of a path against a literal (`pr` has none)
    Compare {
        /// Left-hand attribute path
        path: Path,
        /// Relational operator
        op: CompareOp,
        /// Right-hand literal, absent for `pr`
        literal: Option<Literal>,
    },
}

fn path_cache() -> &'static RwLock<HashMap<String, Arc<Path>>> {
    static CACHE: OnceLock<RwLock<HashMap<String, Arc<Path>>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

fn filter_cache() -> &'static RwLock<HashMap<String, Arc<FilterExpr>>> {
    static CACHE: OnceLock<RwLock<HashMap<String, Arc<FilterExpr>>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Compile a path, consulting the process-wide cache first.
pub fn compile_path_cached(source: &str) -> ScimResult<Arc<Path>> {
    if let Ok(cache) = path_cache().read() {
        if let Some(hit) = cache.get(source) {
            return Ok(Arc::clone(hit));
        }
    }
    let compiled = Arc::new(compile_path(source)?);
    if let Ok(mut cache) = path_cache().write() {
        cache.insert(source.to_string(), Arc::clone(&compiled));
    }
    Ok(compiled)
}

/// Compile a filter, consulting the process-wide cache first.
pub fn compile_filter_cached(source: &str) -> ScimResult<Arc<FilterExpr>> {
    if let Ok(cache) = filter_cache().read() {
        if let Some(hit) = cache.get(source) {
            return Ok(Arc::clone(hit));
        }
    }
    let compiled = Arc::new(compile_filter(source)?);
    if let Ok(mut cache) = filter_cache().write() {
        cache.insert(source.to_string(), Arc::clone(&compiled));
    }
    Ok(compiled)
}

/// Strip a leading schema URN from a patch path when it namespaces a core
/// attribute (`urn:…:2.0:User:userName` → `userName`). Extension URNs are
/// kept; the property tree addresses extension containers by URN.
pub fn strip_resource_urn<'p>(path: &'p str, schema_urn: &str) -> &'p str {
    let lowered = path.to_ascii_lowercase();
    let prefix = schema_urn.to_ascii_lowercase();
    if let Some(rest) = lowered.strip_prefix(&prefix) {
        if let Some(stripped) = rest.strip_prefix(':') {
            if !stripped.is_empty() {
                return &path[path.len() - stripped.len()..];
            }
        }
    }
    path
}
