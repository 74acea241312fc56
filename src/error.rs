//! Error taxonomy for dispatch, injection, and reverse generation.
//!
//! Compile-time template failures live in
//! [`TemplateError`](crate::template::TemplateError) and surface at
//! registration; everything at dispatch time is an [`Error`]. Handler
//! failures keep their structured form in [`Error::Handler`] so step
//! recoveries can match on the kind token.

use crate::handler::HandlerError;
use crate::template::TemplateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No registered entry matched the dispatched input.
    #[error("no route matched input {input:?}")]
    NoRoute { input: String },

    /// Method-router variant of [`Error::NoRoute`]: carries the attempted
    /// token and the allowed set flattened across every registration.
    /// Callers treating it as a no-route case should use
    /// [`Error::is_no_route`].
    #[error("method {method:?} not allowed (allowed: {allowed:?})")]
    MethodNotAllowed {
        method: String,
        allowed: Vec<String>,
    },

    /// Context read of an absent key.
    #[error("context has no entry {0:?}")]
    MissingKey(String),

    /// A required argument had no override and no context entry.
    #[error("no value supplied for required argument {0:?}")]
    MissingArgument(String),

    /// A handler reference did not resolve to something invokable.
    #[error("{0}")]
    NotInvokable(String),

    /// A router step read its dispatch input from the context and found a
    /// non-string value.
    #[error("context entry {key:?} is not usable as dispatch input")]
    InvalidInput { key: String },

    /// Reverse lookup of a name that was never registered.
    #[error("no route registered under name {0:?}")]
    UnknownRoute(String),

    /// Template fill with a placeholder value absent.
    #[error("no value supplied for placeholder {0:?}")]
    MissingFillValue(String),

    /// Bad pattern surfaced at registration time.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A handler failure that no step recovery matched.
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
}

impl Error {
    /// True for both [`Error::NoRoute`] and [`Error::MethodNotAllowed`];
    /// the latter is a specialization of the former, and callers catching
    /// no-route conditions must catch both.
    pub fn is_no_route(&self) -> bool {
        matches!(
            self,
            Error::NoRoute { .. } | Error::MethodNotAllowed { .. }
        )
    }
}
