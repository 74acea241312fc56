use crate::context::Context;
use crate::error::Error;
use crate::handler::Handler;
use crate::route::{Route, Step};
use crate::value::{Bindings, ScopeValue};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pluggable matching contract.
///
/// Returning a binding map (possibly empty) signals a match; those entries
/// are merged into the dispatch's context. Returning `None` means "try the
/// next entry".
pub trait MatchSpec: Send + Sync {
    fn matches(&self, input: &str) -> Option<Bindings>;
}

/// A dispatchable tree node. Implemented by the router specializations so
/// routers can nest inside routes: the nested router reads its own input
/// out of the shared context under [`input_key`](Dispatch::input_key).
pub trait Dispatch: Send + Sync {
    /// Context key the dispatch input is read from when this router runs
    /// as a route step.
    fn input_key(&self) -> &str;

    fn dispatch(&self, ctx: &mut Context, input: &str) -> Result<ScopeValue, Error>;

    /// Dispatch with the input read from the context. The entry must hold
    /// a string.
    fn dispatch_from(&self, ctx: &mut Context) -> Result<ScopeValue, Error> {
        let key = self.input_key();
        let value = ctx.read(key)?;
        let input = value
            .as_str()
            .ok_or_else(|| Error::InvalidInput {
                key: key.to_string(),
            })?
            .to_owned();
        self.dispatch(ctx, &input)
    }
}

/// Normalized registration target: anything a router accepts as "the thing
/// to run on a match".
///
/// A bare handler or a list of steps is wrapped in a fresh [`Route`]; an
/// already-built route is stored as-is, identity preserved.
pub struct RouteSpec(pub(crate) Arc<Route>);

impl From<Route> for RouteSpec {
    fn from(route: Route) -> Self {
        RouteSpec(Arc::new(route))
    }
}

impl From<Arc<Route>> for RouteSpec {
    fn from(route: Arc<Route>) -> Self {
        RouteSpec(route)
    }
}

impl From<Arc<dyn Handler>> for RouteSpec {
    fn from(handler: Arc<dyn Handler>) -> Self {
        let mut route = Route::new();
        route.add(handler);
        RouteSpec(Arc::new(route))
    }
}

impl From<Step> for RouteSpec {
    fn from(step: Step) -> Self {
        RouteSpec(Arc::new(Route::from_steps(vec![step])))
    }
}

impl From<Vec<Step>> for RouteSpec {
    fn from(steps: Vec<Step>) -> Self {
        RouteSpec(Arc::new(Route::from_steps(steps)))
    }
}

/// Generic ordered-scan dispatcher over any [`MatchSpec`].
///
/// Immutable after construction; safe for concurrent dispatch against
/// independent contexts.
pub struct Router<M> {
    entries: Vec<(M, Arc<Route>)>,
}

impl<M> Default for Router<M> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<M> Router<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(M, Arc<Route>)] {
        &self.entries
    }
}

impl<M: MatchSpec> Router<M> {
    /// Register an entry. Order is significant: first match wins, no
    /// reordering by specificity.
    pub fn add(&mut self, spec: impl Into<M>, target: impl Into<RouteSpec>) {
        let RouteSpec(route) = target.into();
        debug!(
            entry = self.entries.len(),
            steps = route.len(),
            "route registered"
        );
        self.entries.push((spec.into(), route));
    }

    /// Scan entries in registration order for the first match.
    pub(crate) fn select(&self, input: &str) -> Option<(Bindings, &Arc<Route>)> {
        for (idx, (spec, route)) in self.entries.iter().enumerate() {
            if let Some(bindings) = spec.matches(input) {
                info!(entry = idx, input, bindings = bindings.len(), "route matched");
                return Some((bindings, route));
            }
        }
        None
    }

    /// Match `input`, merge the winning entry's bindings into `ctx`, and
    /// run its route. Fails with [`Error::NoRoute`] when nothing matches.
    pub fn dispatch(&self, ctx: &mut Context, input: &str) -> Result<ScopeValue, Error> {
        debug!(input, entries = self.entries.len(), "dispatch attempt");
        match self.select(input) {
            Some((bindings, route)) => {
                let route = Arc::clone(route);
                ctx.merge(bindings);
                route.run(ctx)
            }
            None => {
                warn!(input, "no route matched");
                Err(Error::NoRoute {
                    input: input.to_string(),
                })
            }
        }
    }
}
