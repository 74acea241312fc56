//! Ready-made capture converters.

use super::Converter;
use serde_json::Value;
use std::sync::Arc;

/// Parse the capture as a signed integer. A failed parse rejects the
/// match, so `{id:\d+}` with this converter never yields a non-numeric
/// binding.
pub fn integer() -> Converter {
    Arc::new(|raw| raw.parse::<i64>().ok().map(Value::from))
}

/// Parse the capture as a float.
pub fn float() -> Converter {
    Arc::new(|raw| raw.parse::<f64>().ok().map(Value::from))
}
