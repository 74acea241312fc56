//! Handler trait and call-signature declaration.
//!
//! Rust has no runtime introspection of arbitrary callables, so every
//! handler declares its parameters up front through a [`Signature`]: an
//! ordered list of required names followed by optional names with
//! defaults. The [`Context`](crate::context::Context) resolves those names
//! into a positional [`CallArgs`] list at injection time.

use crate::value::ScopeValue;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A structured error raised by handler code.
///
/// The `kind` token is what a step's declared recovery kind-sets match
/// against (the moral equivalent of an exception class name). Engine
/// errors ([`Error`](crate::error::Error)) are never recoverable by step
/// recoveries; only `HandlerError`s are.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct HandlerError {
    /// Error-type token used for recovery matching, e.g. `"NotFound"`.
    pub kind: String,
    /// Human-readable description.
    pub message: String,
    /// Optional structured payload carried to recovery handlers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl HandlerError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// Declared call signature: required names in order, then optional names
/// with their default values.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    required: Vec<String>,
    optional: Vec<(String, ScopeValue)>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a signature of only required names.
    pub fn of(names: &[&str]) -> Self {
        Self {
            required: names.iter().map(|n| n.to_string()).collect(),
            optional: Vec::new(),
        }
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn optional(mut self, name: impl Into<String>, default: impl Into<ScopeValue>) -> Self {
        self.optional.push((name.into(), default.into()));
        self
    }

    pub fn required_names(&self) -> &[String] {
        &self.required
    }

    pub fn optional_defaults(&self) -> &[(String, ScopeValue)] {
        &self.optional
    }

    /// Total number of declared parameters.
    pub fn arity(&self) -> usize {
        self.required.len() + self.optional.len()
    }
}

/// Assembled arguments for one invocation, in declared order.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    values: Vec<(String, ScopeValue)>,
}

impl CallArgs {
    pub(crate) fn new(values: Vec<(String, ScopeValue)>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&ScopeValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Fetch a declared argument, raising an `ArgumentError` if the engine
    /// did not supply it (only possible when a handler asks for a name it
    /// never declared).
    pub fn require(&self, name: &str) -> Result<&ScopeValue, HandlerError> {
        self.get(name).ok_or_else(|| {
            HandlerError::new("ArgumentError", format!("undeclared argument {name:?}"))
        })
    }

    pub fn json(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(ScopeValue::as_json)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ScopeValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ScopeValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Step outcome: either a value for the next step, or the early-exit
/// signal that ends the enclosing route.
///
/// The stop variant is explicit control flow, not an error. It never
/// escapes the route that observes it.
#[derive(Debug, Clone)]
pub enum Flow {
    /// Normal completion; the value becomes the step result.
    Continue(ScopeValue),
    /// End the route now. `Some(value)` replaces the route result;
    /// `None` keeps the previous step's result.
    Stop(Option<ScopeValue>),
}

impl Flow {
    /// Continue with a value.
    pub fn next(value: impl Into<ScopeValue>) -> Self {
        Flow::Continue(value.into())
    }

    /// Stop, keeping the previous result.
    pub fn stop() -> Self {
        Flow::Stop(None)
    }

    /// Stop, replacing the route result.
    pub fn stop_with(value: impl Into<ScopeValue>) -> Self {
        Flow::Stop(Some(value.into()))
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Flow::Stop(_))
    }

    /// Collapse to a plain value. Used when a lazily-read context entry
    /// signals a stop outside any route: the carried value wins, an empty
    /// stop reads as null.
    pub(crate) fn into_value(self) -> ScopeValue {
        match self {
            Flow::Continue(v) => v,
            Flow::Stop(Some(v)) => v,
            Flow::Stop(None) => ScopeValue::null(),
        }
    }
}

/// An invokable dispatch target.
///
/// Implementations declare their parameters via [`signature`](Handler::signature)
/// and receive them positionally assembled in [`call`](Handler::call).
/// [`member`](Handler::member) is the optional lookup seam for dotted
/// accessor paths in handler references; objects that expose named
/// sub-handlers override it.
pub trait Handler: Send + Sync {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str {
        "handler"
    }

    /// Declared parameters, resolved by the context at injection time.
    fn signature(&self) -> Signature;

    fn call(&self, args: CallArgs) -> Result<Flow, HandlerError>;

    /// Resolve a named member for accessor-path references.
    fn member(&self, _name: &str) -> Option<ScopeValue> {
        None
    }
}

struct FnHandler<F> {
    name: String,
    signature: Signature,
    func: F,
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(CallArgs) -> Result<Flow, HandlerError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn call(&self, args: CallArgs) -> Result<Flow, HandlerError> {
        (self.func)(args)
    }
}

/// Wrap a closure into a handler with the given name and signature.
pub fn handler_fn<F>(name: impl Into<String>, signature: Signature, func: F) -> Arc<dyn Handler>
where
    F: Fn(CallArgs) -> Result<Flow, HandlerError> + Send + Sync + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        signature,
        func,
    })
}

/// A zero-argument handler returning a fixed value.
pub fn constant(name: impl Into<String>, value: impl Into<ScopeValue>) -> Arc<dyn Handler> {
    let value = value.into();
    handler_fn(name, Signature::new(), move |_| {
        Ok(Flow::Continue(value.clone()))
    })
}
