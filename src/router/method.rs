use super::core::{Dispatch, MatchSpec, RouteSpec, Router};
use crate::context::Context;
use crate::error::Error;
use crate::route::{HandlerRef, Step};
use crate::value::{Bindings, ScopeValue};
use std::sync::Arc;
use tracing::warn;

/// A fixed, ordered set of method tokens a registration matches.
pub struct MethodSet(Vec<String>);

impl MethodSet {
    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for MethodSet {
    fn from(token: &str) -> Self {
        MethodSet(vec![token.to_string()])
    }
}

impl From<String> for MethodSet {
    fn from(token: String) -> Self {
        MethodSet(vec![token])
    }
}

impl From<&[&str]> for MethodSet {
    fn from(tokens: &[&str]) -> Self {
        MethodSet(tokens.iter().map(|t| t.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for MethodSet {
    fn from(tokens: [&str; N]) -> Self {
        MethodSet(tokens.iter().map(|t| t.to_string()).collect())
    }
}

impl From<Vec<String>> for MethodSet {
    fn from(tokens: Vec<String>) -> Self {
        MethodSet(tokens)
    }
}

impl MatchSpec for MethodSet {
    /// Membership test; a match contributes no bindings.
    fn matches(&self, input: &str) -> Option<Bindings> {
        if self.0.iter().any(|token| token == input) {
            Some(Bindings::new())
        } else {
            None
        }
    }
}

/// Router specialization matching method tokens.
///
/// On total non-match it fails with [`Error::MethodNotAllowed`] instead of
/// the generic [`Error::NoRoute`], carrying the attempted token and the
/// union of every registered set's tokens — deduplicated, first-appearance
/// order preserved.
#[derive(Default)]
pub struct MethodRouter {
    inner: Router<MethodSet>,
}

impl MethodRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, methods: impl Into<MethodSet>, target: impl Into<RouteSpec>) {
        self.inner.add(methods, target);
    }

    /// The flattened union of every registered specifier's tokens, in
    /// order of first appearance.
    pub fn allowed_methods(&self) -> Vec<String> {
        let mut allowed: Vec<String> = Vec::new();
        for (set, _) in self.inner.entries() {
            for token in set.tokens() {
                if !allowed.iter().any(|t| t == token) {
                    allowed.push(token.clone());
                }
            }
        }
        allowed
    }

    pub fn dispatch(&self, ctx: &mut Context, method: &str) -> Result<ScopeValue, Error> {
        match self.inner.select(method) {
            Some((bindings, route)) => {
                let route = Arc::clone(route);
                ctx.merge(bindings);
                route.run(ctx)
            }
            None => {
                let allowed = self.allowed_methods();
                warn!(method, ?allowed, "method not allowed");
                Err(Error::MethodNotAllowed {
                    method: method.to_string(),
                    allowed,
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Dispatch for MethodRouter {
    fn input_key(&self) -> &str {
        "method"
    }

    fn dispatch(&self, ctx: &mut Context, input: &str) -> Result<ScopeValue, Error> {
        MethodRouter::dispatch(self, ctx, input)
    }
}

impl From<MethodRouter> for HandlerRef {
    fn from(router: MethodRouter) -> Self {
        HandlerRef::Router(Arc::new(router))
    }
}

impl From<MethodRouter> for Step {
    fn from(router: MethodRouter) -> Self {
        Step::new(HandlerRef::from(router))
    }
}

impl From<MethodRouter> for RouteSpec {
    fn from(router: MethodRouter) -> Self {
        RouteSpec::from(Step::from(router))
    }
}
