//! # Router Module
//!
//! Matching dispatchers. A router is an ordered list of
//! `(match specifier, route)` pairs: dispatch scans the entries in
//! registration order, merges the first match's bindings into the context,
//! and runs that entry's route. Matching is pluggable through
//! [`MatchSpec`]; precedence is strictly registration order, never
//! specificity.
//!
//! Two specializations cover the common tree shape:
//!
//! - [`PathRouter`] matches via compiled
//!   [`Template`](crate::template::Template)s, supports named
//!   registrations, and generates concrete paths back from names
//!   (`reverse`).
//! - [`MethodRouter`] matches method tokens against fixed token sets and
//!   reports the full allowed set on failure.
//!
//! Routers implement [`Dispatch`], so a router can sit inside another
//! router's route as an ordinary step, reading its own input (path,
//! method) from the shared context. That is how hierarchical trees —
//! path, then method, then business handlers — compose without any HTTP
//! awareness in the engine.

mod core;
mod method;
mod path;

pub use core::{Dispatch, MatchSpec, RouteSpec, Router};
pub use method::{MethodRouter, MethodSet};
pub use path::PathRouter;
