//! # Route Module
//!
//! An ordered chain of handler steps executed against one
//! [`Context`](crate::context::Context). Each step names its target
//! through a [`HandlerRef`] (a direct handler, the previous step's result,
//! a context entry, or a nested route/router), may bind its result into
//! the context, and may declare recovery handlers for specific error
//! kinds.
//!
//! Routes are built once and then read-only: a single [`Route`] value can
//! run concurrently against independent contexts.

mod core;

pub use core::{HandlerRef, Route, Step};
