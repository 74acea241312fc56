use crate::error::Error;
use crate::handler::{CallArgs, Flow, Handler};
use crate::value::{Bindings, ScopeValue};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Implicit key yielding the context itself (as a JSON snapshot of its
/// plain entries). A literally stored `"context"` entry shadows it.
pub const CONTEXT_KEY: &str = "context";

/// Reserved key bound while a step's recovery handlers run. Holds a JSON
/// object with the failing error's `kind`, `message`, and `details`, and
/// is always removed before the next step, matched or not.
pub const ERROR_INFO_KEY: &str = "error_info";

/// A scoped, named-value store that resolves handler signatures and
/// invokes them.
///
/// Callable entries are not memoized: every [`read`](Context::read)
/// re-resolves and re-invokes them, so callers must not assume a stable
/// identity across repeated reads of the same key.
#[derive(Default)]
pub struct Context {
    entries: HashMap<String, ScopeValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a base mapping. Later entries shadow earlier
    /// ones, so adapters can layer request facts over application
    /// defaults.
    pub fn with_entries<I, K, V>(base: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ScopeValue>,
    {
        Self {
            entries: base
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ScopeValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ScopeValue> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Fetch an entry as stored, without invoking callable entries. This
    /// is how handler references pick up a handler stored in the context:
    /// the entry itself is the target, not its invocation result.
    pub fn get(&self, key: &str) -> Option<&ScopeValue> {
        self.entries.get(key)
    }

    /// Merge match bindings into the scope; later writes shadow.
    pub fn merge(&mut self, bindings: Bindings) {
        for (key, value) in bindings {
            self.entries.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A JSON object of the plain (non-callable) entries. This is what a
    /// handler declaring the implicit `context` parameter receives:
    /// handlers take owned values, so the scope is handed over as a
    /// read-only snapshot.
    pub fn snapshot(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.entries {
            if let ScopeValue::Json(v) = value {
                map.insert(key.clone(), v.clone());
            }
        }
        Value::Object(map)
    }

    /// Read a key, resolving callable entries.
    ///
    /// A callable entry is injected (its own declared parameters supplied
    /// from this same context, recursively) on every read. Fails with
    /// [`Error::MissingKey`] if the key is absent and is not the implicit
    /// `context` key.
    pub fn read(&self, key: &str) -> Result<ScopeValue, Error> {
        let entry = match self.entries.get(key) {
            Some(value) => value.clone(),
            None if key == CONTEXT_KEY => return Ok(ScopeValue::Json(self.snapshot())),
            None => return Err(Error::MissingKey(key.to_string())),
        };
        match entry {
            ScopeValue::Callable(handler) => {
                trace!(key, handler = handler.name(), "resolving lazy context entry");
                Ok(self.inject(handler.as_ref())?.into_value())
            }
            value => Ok(value),
        }
    }

    /// Resolve `target`'s declared signature against this context and
    /// invoke it.
    pub fn inject(&self, target: &dyn Handler) -> Result<Flow, Error> {
        self.inject_with(target, &[])
    }

    /// Like [`inject`](Context::inject), with per-call overrides that win
    /// over context entries.
    ///
    /// Required names resolve override → context entry → fail with
    /// [`Error::MissingArgument`]. Optional names resolve override →
    /// context entry if present → declared default. A `MissingKey` raised
    /// while resolving a *nested* lazy value propagates unchanged; only a
    /// top-level absent required name becomes `MissingArgument`.
    pub fn inject_with(
        &self,
        target: &dyn Handler,
        overrides: &[(&str, ScopeValue)],
    ) -> Result<Flow, Error> {
        let signature = target.signature();
        let mut values = Vec::with_capacity(signature.arity());

        let override_for =
            |name: &str| overrides.iter().find(|(n, _)| *n == name).map(|(_, v)| v);

        for name in signature.required_names() {
            let value = if let Some(v) = override_for(name) {
                v.clone()
            } else if name == CONTEXT_KEY || self.contains(name) {
                self.read(name)?
            } else {
                return Err(Error::MissingArgument(name.clone()));
            };
            values.push((name.clone(), value));
        }

        for (name, default) in signature.optional_defaults() {
            let value = if let Some(v) = override_for(name) {
                v.clone()
            } else if name == CONTEXT_KEY || self.contains(name) {
                self.read(name)?
            } else {
                default.clone()
            };
            values.push((name.clone(), value));
        }

        trace!(
            handler = target.name(),
            args = values.len(),
            "injecting handler"
        );
        Ok(target.call(CallArgs::new(values))?)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
