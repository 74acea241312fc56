//! # Context Module
//!
//! The per-dispatch argument scope. A [`Context`] maps names to
//! [`ScopeValue`](crate::value::ScopeValue)s and can resolve a handler's
//! declared signature against itself: that resolution-plus-invocation is
//! *injection*, and it is how every handler in the engine gets called.
//!
//! A context lives for exactly one dispatch. The adapter seeds it with
//! request facts, routers merge match bindings into it, route steps bind
//! results into it, and it is dropped when the dispatch ends. It is never
//! shared between in-flight dispatches.

mod core;

pub use core::{Context, CONTEXT_KEY, ERROR_INFO_KEY};
