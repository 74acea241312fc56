//! Shared fixtures for the integration tests: small handlers with
//! predictable behavior and a counter for observing invocation counts.

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use switchyard::handler::{handler_fn, Flow, HandlerError, Signature};
use switchyard::Handler;

/// A handler that records how many times it ran and returns the running
/// count. Used to observe lazy context entries being re-invoked per read.
#[allow(dead_code)]
pub fn counting(name: &str) -> (Arc<dyn Handler>, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&counter);
    let handler = handler_fn(name, Signature::new(), move |_| {
        let n = observed.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Flow::next(n as i64))
    });
    (handler, counter)
}

/// A handler that always fails with the given error kind.
#[allow(dead_code)]
pub fn failing(name: &str, kind: &str) -> Arc<dyn Handler> {
    let kind = kind.to_string();
    let label = name.to_string();
    handler_fn(name, Signature::new(), move |_| {
        Err(HandlerError::new(kind.clone(), format!("{label} failed")))
    })
}

/// A handler echoing its single required argument back as
/// `{"echoed": <value>}`.
#[allow(dead_code)]
pub fn echoing(name: &str, arg: &str) -> Arc<dyn Handler> {
    let arg = arg.to_string();
    let signature = Signature::of(&[arg.as_str()]);
    handler_fn(name, signature, move |args| {
        let value = args.json(&arg).cloned().unwrap_or(serde_json::Value::Null);
        Ok(Flow::next(json!({ "echoed": value })))
    })
}
