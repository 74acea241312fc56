//! # switchyard
//!
//! **switchyard** is a framework-agnostic request-dispatch engine: given an
//! input value (a path, a method token, anything matchable), it selects a
//! registered handler chain and executes it, supplying each handler's
//! declared arguments from a shared, mutable scope.
//!
//! There are no HTTP semantics in the engine. A protocol adapter seeds a
//! [`Context`] with request facts, asks a top-level router to dispatch, and
//! translates the result (or a no-route failure) into whatever its protocol
//! needs.
//!
//! ## Architecture
//!
//! - **[`template`]** — placeholder pattern compiler; one pattern, two
//!   directions (match a string into bindings, fill bindings back into a
//!   string)
//! - **[`context`]** — the per-dispatch argument scope and injection engine
//! - **[`route`]** — ordered handler chains with named bindings, per-step
//!   recovery, and an early-exit signal
//! - **[`router`]** — ordered matching dispatchers, generic over the match
//!   specifier, with path and method specializations
//! - **[`handler`]** — the handler trait, declared signatures, and
//!   structured handler errors
//! - **[`value`]** — the dynamic value type flowing through a dispatch
//!
//! ## Dispatch flow
//!
//! 1. The adapter builds a [`Context`] seeded with request facts
//! 2. A [`PathRouter`] matches the path and merges captured bindings into
//!    the context
//! 3. The matched [`Route`] runs its steps in order, each resolved and
//!    invoked through [`Context::inject`]
//! 4. Nested routers (say, a [`MethodRouter`] inside a path's route) read
//!    their own input from the same context and recurse
//! 5. The final step's result is handed back to the adapter
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use switchyard::{
//!     handler::{handler_fn, Flow, Signature},
//!     Context, PathRouter,
//! };
//!
//! let show_post = handler_fn("show_post", Signature::of(&["slug"]), |args| {
//!     let slug = args.str("slug").unwrap_or_default();
//!     Ok(Flow::next(json!({ "post": slug })))
//! });
//!
//! let mut router = PathRouter::new();
//! router.add_named("post", "/posts/{slug}", show_post).unwrap();
//!
//! let mut ctx = Context::new();
//! let result = router.dispatch(&mut ctx, "/posts/hello").unwrap();
//! assert_eq!(result.as_json().unwrap()["post"], "hello");
//!
//! assert_eq!(
//!     router.reverse("post", &[("slug", "hello")]).unwrap(),
//!     "/posts/hello"
//! );
//! ```
//!
//! ## Concurrency model
//!
//! The engine is purely synchronous: one logical call stack per dispatch,
//! no suspension points, no cancellation. Routes, routers, and templates
//! are build-once and read-only, safe to share across threads; a context
//! belongs to exactly one in-flight dispatch and is never shared.

pub mod context;
pub mod error;
pub mod handler;
pub mod route;
pub mod router;
pub mod template;
pub mod value;

pub use context::Context;
pub use error::Error;
pub use handler::{Flow, Handler, HandlerError, Signature};
pub use route::{HandlerRef, Route, Step};
pub use router::{Dispatch, MatchSpec, MethodRouter, PathRouter, Router};
pub use template::Template;
pub use value::{Bindings, ScopeValue};
