//! Template compilation and the two directions it supports: matching an
//! input string into bindings, and filling named values back into a
//! concrete string.

use crate::error::Error;
use crate::value::{Bindings, ScopeValue};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::debug;

/// Converts a captured string into a typed value. Returning `None` rejects
/// the capture and fails the whole match.
pub type Converter = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Compile-time template failure. Fatal to registration; never produced
/// during dispatch.
#[derive(Debug, ThisError)]
pub enum TemplateError {
    /// A placeholder was opened but never closed.
    #[error("unbalanced braces in pattern {pattern:?}")]
    UnbalancedBraces { pattern: String },

    /// Placeholder names become regex capture-group names and must be
    /// identifiers.
    #[error("invalid placeholder name {name:?} in pattern {pattern:?}")]
    InvalidName { name: String, pattern: String },

    /// The assembled pattern failed to compile, typically a bad regex
    /// clause or a duplicated placeholder name.
    #[error("pattern {pattern:?} is not a valid expression: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
pub(crate) enum Part {
    /// Literal text, `{{` already unescaped to `{`.
    Literal(String),
    /// A named capture slot with its regex clause.
    Placeholder { name: String, regex: String },
}

/// A compiled placeholder pattern. Immutable once built; safe to match and
/// fill concurrently.
#[derive(Clone)]
pub struct Template {
    pattern: String,
    parts: Vec<Part>,
    regex: Regex,
    names: Vec<String>,
    converters: HashMap<String, Converter>,
}

impl Template {
    /// Compile a pattern with no converters; captures bind as strings.
    pub fn new(pattern: &str) -> Result<Self, TemplateError> {
        Self::with_converters(pattern, [])
    }

    /// Compile a pattern with per-placeholder type converters.
    pub fn with_converters(
        pattern: &str,
        converters: impl IntoIterator<Item = (String, Converter)>,
    ) -> Result<Self, TemplateError> {
        let parts = parse(pattern)?;

        let mut src = String::with_capacity(pattern.len() + 8);
        src.push('^');
        let mut names = Vec::new();
        for part in &parts {
            match part {
                Part::Literal(text) => src.push_str(&regex::escape(text)),
                Part::Placeholder { name, regex } => {
                    let _ = write!(src, "(?P<{name}>{regex})");
                    names.push(name.clone());
                }
            }
        }
        src.push('$');

        let regex = Regex::new(&src).map_err(|source| TemplateError::Regex {
            pattern: pattern.to_string(),
            source,
        })?;

        debug!(
            pattern,
            placeholders = names.len(),
            "template compiled"
        );

        Ok(Self {
            pattern: pattern.to_string(),
            parts,
            regex,
            names,
            converters: converters.into_iter().collect(),
        })
    }

    /// The source pattern this template was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Placeholder names in declaration order.
    pub fn placeholder_names(&self) -> &[String] {
        &self.names
    }

    /// Match an input string, producing converted bindings.
    ///
    /// Returns `None` when the anchored pattern does not match, and also
    /// when a converter rejects its capture — a rejected capture is a
    /// non-match, so an enclosing router keeps trying later entries.
    pub fn matches(&self, input: &str) -> Option<Bindings> {
        let caps = self.regex.captures(input)?;
        let mut bindings = Bindings::new();
        for name in &self.names {
            let value = match caps.name(name) {
                Some(m) => {
                    let raw = m.as_str();
                    match self.converters.get(name) {
                        Some(convert) => match convert(raw) {
                            Some(v) => v,
                            None => {
                                debug!(
                                    pattern = %self.pattern,
                                    placeholder = %name,
                                    raw,
                                    "converter rejected capture, treating as non-match"
                                );
                                return None;
                            }
                        },
                        None => Value::from(raw),
                    }
                }
                // The placeholder's regex made the group optional and it
                // did not participate in the match.
                None => Value::Null,
            };
            bindings.push((name.clone(), ScopeValue::Json(value)));
        }
        Some(bindings)
    }

    /// Fill the template with named values, producing a concrete string.
    ///
    /// Every placeholder must be supplied; extra values are ignored.
    pub fn fill(&self, values: &[(&str, &str)]) -> Result<String, Error> {
        let mut out = String::with_capacity(self.pattern.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Placeholder { name, .. } => {
                    let value = values
                        .iter()
                        .find(|(n, _)| n == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| Error::MissingFillValue(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("pattern", &self.pattern)
            .field("placeholders", &self.names)
            .finish()
    }
}

/// Scan the pattern into literal and placeholder parts.
///
/// `{{` is an escaped literal `{` and never opens or deepens a
/// placeholder. An unescaped `{` opens a placeholder whose body runs to
/// the matching `}` at the same depth, so regex quantifier braces inside a
/// clause are swallowed as part of that placeholder. A stray `}` outside
/// any placeholder is literal.
pub(crate) fn parse(pattern: &str) -> Result<Vec<Part>, TemplateError> {
    let bytes = pattern.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if i + 1 < bytes.len() && bytes[i + 1] == b'{' => {
                i += 2;
            }
            b'{' => {
                if depth == 0 {
                    parts.push(Part::Literal(pattern[start..i].replace("{{", "{")));
                    start = i + 1;
                }
                depth += 1;
                i += 1;
            }
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        let body = &pattern[start..i];
                        let (name, regex) = match body.split_once(':') {
                            Some((name, regex)) => (name, regex),
                            None => (body, ".*"),
                        };
                        if !is_identifier(name) {
                            return Err(TemplateError::InvalidName {
                                name: name.to_string(),
                                pattern: pattern.to_string(),
                            });
                        }
                        parts.push(Part::Placeholder {
                            name: name.to_string(),
                            regex: regex.to_string(),
                        });
                        start = i + 1;
                    }
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    if depth > 0 {
        return Err(TemplateError::UnbalancedBraces {
            pattern: pattern.to_string(),
        });
    }
    parts.push(Part::Literal(pattern[start..].replace("{{", "{")));
    Ok(parts)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
