//! # Template Module
//!
//! Bidirectional placeholder pattern compiler. A pattern like
//! `/posts/{slug}` or `/items/{id:\d+}` compiles once into:
//!
//! 1. **Match direction**: an anchored regex with one named capture group
//!    per placeholder, used to extract bindings from an input string.
//! 2. **Fill direction**: a literal/slot part list, used to generate a
//!    concrete string from named values (reverse routing).
//!
//! `{{` escapes a literal `{`. A placeholder body splits on the first `:`
//! into a name and an optional regex clause; without a clause the
//! placeholder matches greedily (`.*`). Braces nest inside the regex
//! clause, so quantifiers like `{id:\d{3}}` are swallowed whole.
//!
//! Per-placeholder [`Converter`]s turn captured strings into typed JSON
//! values before they enter a binding map; a converter rejecting a capture
//! makes the whole match fail, letting a router fall through to its next
//! registration.

mod core;
pub mod convert;

pub use core::{Converter, Template, TemplateError};
