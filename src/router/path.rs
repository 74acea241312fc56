use super::core::{Dispatch, MatchSpec, RouteSpec, Router};
use crate::context::Context;
use crate::error::Error;
use crate::route::{HandlerRef, Step};
use crate::template::{Template, TemplateError};
use crate::value::{Bindings, ScopeValue};
use std::collections::HashMap;
use std::sync::Arc;

impl MatchSpec for Template {
    fn matches(&self, input: &str) -> Option<Bindings> {
        Template::matches(self, input)
    }
}

/// Router specialization matching paths against compiled templates.
///
/// Registrations may carry a name, enabling reverse path generation with
/// [`reverse`](PathRouter::reverse). Patterns compile at registration
/// time, so a bad pattern fails startup rather than a dispatch.
#[derive(Default)]
pub struct PathRouter {
    inner: Router<Template>,
    names: HashMap<String, Template>,
}

impl PathRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` and register it with the given target.
    pub fn add(
        &mut self,
        pattern: &str,
        target: impl Into<RouteSpec>,
    ) -> Result<(), TemplateError> {
        self.add_template(None, Template::new(pattern)?, target);
        Ok(())
    }

    /// Like [`add`](PathRouter::add), also recording `name` for reverse
    /// lookup.
    pub fn add_named(
        &mut self,
        name: &str,
        pattern: &str,
        target: impl Into<RouteSpec>,
    ) -> Result<(), TemplateError> {
        self.add_template(Some(name), Template::new(pattern)?, target);
        Ok(())
    }

    /// Register a pre-built template (the way in when placeholders need
    /// type converters).
    pub fn add_template(
        &mut self,
        name: Option<&str>,
        template: Template,
        target: impl Into<RouteSpec>,
    ) {
        if let Some(name) = name {
            self.names.insert(name.to_string(), template.clone());
        }
        self.inner.add(template, target);
    }

    /// Generate a concrete path for a named registration.
    pub fn reverse(&self, name: &str, values: &[(&str, &str)]) -> Result<String, Error> {
        let template = self
            .names
            .get(name)
            .ok_or_else(|| Error::UnknownRoute(name.to_string()))?;
        template.fill(values)
    }

    pub fn dispatch(&self, ctx: &mut Context, path: &str) -> Result<ScopeValue, Error> {
        self.inner.dispatch(ctx, path)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Dispatch for PathRouter {
    fn input_key(&self) -> &str {
        "path"
    }

    fn dispatch(&self, ctx: &mut Context, input: &str) -> Result<ScopeValue, Error> {
        PathRouter::dispatch(self, ctx, input)
    }
}

impl From<PathRouter> for HandlerRef {
    fn from(router: PathRouter) -> Self {
        HandlerRef::Router(Arc::new(router))
    }
}

impl From<PathRouter> for Step {
    fn from(router: PathRouter) -> Self {
        Step::new(HandlerRef::from(router))
    }
}

impl From<PathRouter> for RouteSpec {
    fn from(router: PathRouter) -> Self {
        RouteSpec::from(Step::from(router))
    }
}
