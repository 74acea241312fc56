use crate::context::{Context, ERROR_INFO_KEY};
use crate::error::Error;
use crate::handler::{Flow, Handler, HandlerError};
use crate::router::Dispatch;
use crate::value::ScopeValue;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// How a step names its invocation target.
pub enum HandlerRef {
    /// A handler supplied at registration time.
    Direct(Arc<dyn Handler>),
    /// The previous step's result, optionally walked through a dotted
    /// accessor path. The walked value must end at a callable.
    Previous(Vec<String>),
    /// A context entry, fetched as stored (callable entries are NOT
    /// lazily invoked here), optionally walked through a dotted accessor
    /// path. Must end at a callable.
    ContextKey(String, Vec<String>),
    /// A nested route, run against the same context.
    Nested(Arc<Route>),
    /// A nested router; reads its dispatch input from the context.
    Router(Arc<dyn Dispatch>),
}

impl HandlerRef {
    /// Refer to the previous step's result.
    pub fn previous() -> Self {
        HandlerRef::Previous(Vec::new())
    }

    /// Refer to a member of the previous step's result, e.g.
    /// `previous_member(&["child", "run"])` for `previous.child.run`.
    pub fn previous_member(path: &[&str]) -> Self {
        HandlerRef::Previous(path.iter().map(|s| s.to_string()).collect())
    }

    /// Refer to a context entry by key.
    pub fn context_key(key: impl Into<String>) -> Self {
        HandlerRef::ContextKey(key.into(), Vec::new())
    }

    /// Refer to a member of a context entry.
    pub fn context_member(key: impl Into<String>, path: &[&str]) -> Self {
        HandlerRef::ContextKey(key.into(), path.iter().map(|s| s.to_string()).collect())
    }

    pub fn router(router: Arc<dyn Dispatch>) -> Self {
        HandlerRef::Router(router)
    }

    fn describe(&self) -> String {
        match self {
            HandlerRef::Direct(h) => h.name().to_string(),
            HandlerRef::Previous(path) if path.is_empty() => "<previous>".to_string(),
            HandlerRef::Previous(path) => format!("<previous>.{}", path.join(".")),
            HandlerRef::ContextKey(key, path) if path.is_empty() => format!("<context:{key}>"),
            HandlerRef::ContextKey(key, path) => {
                format!("<context:{key}>.{}", path.join("."))
            }
            HandlerRef::Nested(_) => "<route>".to_string(),
            HandlerRef::Router(d) => format!("<router:{}>", d.input_key()),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<Arc<dyn Handler>> for HandlerRef {
    fn from(handler: Arc<dyn Handler>) -> Self {
        HandlerRef::Direct(handler)
    }
}

impl From<Route> for HandlerRef {
    fn from(route: Route) -> Self {
        HandlerRef::Nested(Arc::new(route))
    }
}

impl From<Arc<Route>> for HandlerRef {
    fn from(route: Arc<Route>) -> Self {
        HandlerRef::Nested(route)
    }
}

/// A declared recovery: an ordered kind-set and the handler injected when
/// a step fails with a matching [`HandlerError`]. Built only through
/// [`Step::recover`].
struct Recovery {
    kinds: Vec<String>,
    handler: Arc<dyn Handler>,
}

/// One step of a route.
pub struct Step {
    name: Option<String>,
    target: HandlerRef,
    recoveries: Vec<Recovery>,
}

impl Step {
    pub fn new(target: impl Into<HandlerRef>) -> Self {
        Self {
            name: None,
            target: target.into(),
            recoveries: Vec::new(),
        }
    }

    /// Bind the step result into the context under `name`, visible to
    /// later steps and to the caller. Not applied when the step stops the
    /// route.
    pub fn bind(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare a recovery for the given error kinds. Recoveries are
    /// scanned in declaration order; the first kind-set containing the
    /// failing error's kind wins.
    pub fn recover(mut self, kinds: &[&str], handler: Arc<dyn Handler>) -> Self {
        self.recoveries.push(Recovery {
            kinds: kinds.iter().map(|k| k.to_string()).collect(),
            handler,
        });
        self
    }
}

impl From<HandlerRef> for Step {
    fn from(target: HandlerRef) -> Self {
        Step::new(target)
    }
}

impl From<Arc<dyn Handler>> for Step {
    fn from(handler: Arc<dyn Handler>) -> Self {
        Step::new(HandlerRef::Direct(handler))
    }
}

impl From<Route> for Step {
    fn from(route: Route) -> Self {
        Step::new(HandlerRef::from(route))
    }
}

impl From<Arc<Route>> for Step {
    fn from(route: Arc<Route>) -> Self {
        Step::new(HandlerRef::from(route))
    }
}

/// An ordered handler chain with named bindings, per-step recovery, and an
/// early-exit signal.
#[derive(Default)]
pub struct Route {
    steps: Vec<Step>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn add(&mut self, step: impl Into<Step>) -> &mut Self {
        self.steps.push(step.into());
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run the chain against `ctx`.
    ///
    /// Steps execute in declared order, each injected through the context.
    /// A step failing with a [`HandlerError`] is offered to that step's
    /// recoveries; an unmatched error propagates unchanged. A
    /// [`Flow::Stop`] ends the run immediately: the carried value (if any)
    /// replaces the result and the stopping step's binding name is not
    /// applied.
    pub fn run(&self, ctx: &mut Context) -> Result<ScopeValue, Error> {
        let mut result = ScopeValue::null();
        for (idx, step) in self.steps.iter().enumerate() {
            debug!(step = idx, target = %step.target.describe(), "running step");
            let flow = match Self::execute(step, &result, ctx) {
                Ok(flow) => flow,
                Err(Error::Handler(err)) => Self::recover(step, err, ctx)?,
                Err(other) => return Err(other),
            };
            match flow {
                Flow::Stop(replacement) => {
                    debug!(step = idx, "route stopped early");
                    return Ok(replacement.unwrap_or(result));
                }
                Flow::Continue(value) => {
                    result = value;
                    if let Some(name) = &step.name {
                        ctx.insert(name.clone(), result.clone());
                    }
                }
            }
        }
        Ok(result)
    }

    /// Resolve the step's handler reference and invoke it. Nested routes
    /// and routers run recursively against the same context.
    fn execute(step: &Step, previous: &ScopeValue, ctx: &mut Context) -> Result<Flow, Error> {
        match &step.target {
            HandlerRef::Direct(handler) => ctx.inject(handler.as_ref()),
            HandlerRef::Previous(path) => {
                let target = walk(previous.clone(), path, "previous step result")?;
                let handler = require_callable(target, "previous step result")?;
                ctx.inject(handler.as_ref())
            }
            HandlerRef::ContextKey(key, path) => {
                let base = ctx
                    .get(key)
                    .cloned()
                    .ok_or_else(|| Error::MissingKey(key.to_string()))?;
                let target = walk(base, path, &format!("context entry {key:?}"))?;
                let handler = require_callable(target, &format!("context entry {key:?}"))?;
                ctx.inject(handler.as_ref())
            }
            HandlerRef::Nested(route) => route.run(ctx).map(Flow::Continue),
            HandlerRef::Router(router) => router.dispatch_from(ctx).map(Flow::Continue),
        }
    }

    /// Offer a step failure to its declared recoveries. The reserved
    /// error-info entry is bound for the duration of the attempt and
    /// removed before returning, matched or not.
    fn recover(step: &Step, err: HandlerError, ctx: &mut Context) -> Result<Flow, Error> {
        ctx.insert(
            ERROR_INFO_KEY,
            ScopeValue::Json(serde_json::to_value(&err).unwrap_or(Value::Null)),
        );
        let mut outcome: Result<Flow, Error> = Err(Error::Handler(err.clone()));
        for recovery in &step.recoveries {
            if recovery.kinds.iter().any(|kind| err.is(kind)) {
                warn!(
                    kind = %err.kind,
                    handler = recovery.handler.name(),
                    "step failed, running matching recovery handler"
                );
                outcome = ctx.inject(recovery.handler.as_ref());
                break;
            }
        }
        ctx.remove(ERROR_INFO_KEY);
        outcome
    }
}

fn walk(mut value: ScopeValue, path: &[String], what: &str) -> Result<ScopeValue, Error> {
    for segment in path {
        value = value
            .member(segment)
            .ok_or_else(|| Error::NotInvokable(format!("{what} has no member {segment:?}")))?;
    }
    Ok(value)
}

fn require_callable(value: ScopeValue, what: &str) -> Result<Arc<dyn Handler>, Error> {
    value
        .as_callable()
        .cloned()
        .ok_or_else(|| Error::NotInvokable(format!("{what} is not invokable")))
}
