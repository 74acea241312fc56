//! Dynamic values flowing through a dispatch.
//!
//! Everything a handler produces, a template captures, or a context stores
//! is a [`ScopeValue`]: either plain JSON data or an invokable handler.
//! Callable values are what make lazy context entries and previous-result
//! handler references work.

use crate::handler::Handler;
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Maximum number of bindings stored inline before heap allocation.
/// Most matches capture four or fewer placeholders.
pub const MAX_INLINE_BINDINGS: usize = 8;

/// Stack-allocated binding list produced by a successful match and merged
/// into the [`Context`](crate::context::Context) before a route runs.
pub type Bindings = SmallVec<[(String, ScopeValue); MAX_INLINE_BINDINGS]>;

/// A dynamically typed value in the dispatch scope.
#[derive(Clone)]
pub enum ScopeValue {
    /// Plain data.
    Json(Value),
    /// An invokable handler. Stored in a context entry it is re-invoked on
    /// every read; produced as a step result it can be referenced (and
    /// member-resolved) by later steps.
    Callable(Arc<dyn Handler>),
}

impl ScopeValue {
    /// JSON null, the initial "no result yet" value of a route run.
    pub fn null() -> Self {
        ScopeValue::Json(Value::Null)
    }

    pub fn callable(handler: Arc<dyn Handler>) -> Self {
        ScopeValue::Callable(handler)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ScopeValue::Json(v) => Some(v),
            ScopeValue::Callable(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    pub fn as_callable(&self) -> Option<&Arc<dyn Handler>> {
        match self {
            ScopeValue::Json(_) => None,
            ScopeValue::Callable(h) => Some(h),
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, ScopeValue::Callable(_))
    }

    /// Resolve one segment of a dotted accessor path.
    ///
    /// JSON objects resolve fields; callables delegate to
    /// [`Handler::member`], the lookup seam an object implements to expose
    /// named members to handler references.
    pub fn member(&self, name: &str) -> Option<ScopeValue> {
        match self {
            ScopeValue::Json(Value::Object(map)) => map.get(name).cloned().map(ScopeValue::Json),
            ScopeValue::Json(_) => None,
            ScopeValue::Callable(h) => h.member(name),
        }
    }
}

impl fmt::Debug for ScopeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeValue::Json(v) => write!(f, "{v:?}"),
            ScopeValue::Callable(h) => write!(f, "<callable {}>", h.name()),
        }
    }
}

/// JSON values compare structurally; callables compare by identity.
impl PartialEq for ScopeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScopeValue::Json(a), ScopeValue::Json(b)) => a == b,
            (ScopeValue::Callable(a), ScopeValue::Callable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for ScopeValue {
    fn from(v: Value) -> Self {
        ScopeValue::Json(v)
    }
}

impl From<&str> for ScopeValue {
    fn from(v: &str) -> Self {
        ScopeValue::Json(Value::from(v))
    }
}

impl From<String> for ScopeValue {
    fn from(v: String) -> Self {
        ScopeValue::Json(Value::from(v))
    }
}

impl From<i64> for ScopeValue {
    fn from(v: i64) -> Self {
        ScopeValue::Json(Value::from(v))
    }
}

impl From<u64> for ScopeValue {
    fn from(v: u64) -> Self {
        ScopeValue::Json(Value::from(v))
    }
}

impl From<f64> for ScopeValue {
    fn from(v: f64) -> Self {
        ScopeValue::Json(Value::from(v))
    }
}

impl From<bool> for ScopeValue {
    fn from(v: bool) -> Self {
        ScopeValue::Json(Value::from(v))
    }
}

impl From<Arc<dyn Handler>> for ScopeValue {
    fn from(h: Arc<dyn Handler>) -> Self {
        ScopeValue::Callable(h)
    }
}
