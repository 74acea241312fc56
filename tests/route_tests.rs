mod common;

use common::{counting, echoing, failing};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use switchyard::handler::{constant, handler_fn, Flow, HandlerError, Signature};
use switchyard::{Context, Error, HandlerRef, Route, ScopeValue, Step};
use tracing_util::TestTracing;

#[test]
fn test_empty_route_yields_null() {
    let route = Route::new();
    let mut ctx = Context::new();
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::null());
}

#[test]
fn test_single_step_result_is_route_result() {
    let mut route = Route::new();
    route.add(constant("answer", 42i64));
    let mut ctx = Context::new();
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from(42i64));
}

#[test]
fn test_bound_result_feeds_later_step() {
    let _tracing = TestTracing::init();
    let mut route = Route::new();
    route.add(Step::new(constant("produce", "ping")).bind("word"));
    route.add(echoing("consume", "word"));
    let mut ctx = Context::new();
    let result = route.run(&mut ctx).unwrap();
    assert_eq!(result.as_json().unwrap(), &json!({ "echoed": "ping" }));
    // Bindings persist in the context after the run.
    assert_eq!(ctx.read("word").unwrap(), ScopeValue::from("ping"));
}

#[test]
fn test_unbound_step_result_is_dropped() {
    let mut route = Route::new();
    route.add(constant("silent", "x"));
    route.add(constant("last", "y"));
    let mut ctx = Context::new();
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from("y"));
    assert!(!ctx.contains("silent"));
}

#[test]
fn test_stop_with_value_replaces_result_and_skips_rest() {
    let (never, counter) = counting("never");
    let stopper = handler_fn("stopper", Signature::new(), |_| {
        Ok(Flow::stop_with("STOPPED"))
    });
    let mut route = Route::new();
    route.add(Step::new(constant("first", "r1")).bind("r1"));
    route.add(Step::new(stopper).bind("unapplied"));
    route.add(never);
    let mut ctx = Context::new();
    let result = route.run(&mut ctx).unwrap();
    assert_eq!(result, ScopeValue::from("STOPPED"));
    // The first step's binding landed, the stopping step's did not, and
    // the step after the stop never ran.
    assert_eq!(ctx.read("r1").unwrap(), ScopeValue::from("r1"));
    assert!(!ctx.contains("unapplied"));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_bare_stop_keeps_previous_result() {
    let stopper = handler_fn("stopper", Signature::new(), |_| Ok(Flow::stop()));
    let mut route = Route::new();
    route.add(constant("first", "kept"));
    route.add(stopper);
    let mut ctx = Context::new();
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from("kept"));
}

#[test]
fn test_matching_recovery_replaces_step_result() {
    let rescue = handler_fn("rescue", Signature::new(), |_| Ok(Flow::next("ok")));
    let mut route = Route::new();
    route.add(Step::new(failing("broken", "NotFound")).recover(&["NotFound"], rescue));
    let mut ctx = Context::new();
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from("ok"));
}

#[test]
fn test_recovery_result_is_bound_for_later_steps() {
    let rescue = handler_fn("rescue", Signature::new(), |_| Ok(Flow::next("fallback")));
    let mut route = Route::new();
    route.add(Step::new(failing("broken", "NotFound")).recover(&["NotFound"], rescue).bind("value"));
    route.add(echoing("consume", "value"));
    let mut ctx = Context::new();
    let result = route.run(&mut ctx).unwrap();
    assert_eq!(result.as_json().unwrap(), &json!({ "echoed": "fallback" }));
}

#[test]
fn test_unmatched_error_kind_propagates() {
    let rescue = handler_fn("rescue", Signature::new(), |_| Ok(Flow::next("ok")));
    let mut route = Route::new();
    route.add(Step::new(failing("broken", "Timeout")).recover(&["NotFound"], rescue));
    let mut ctx = Context::new();
    let err = route.run(&mut ctx).unwrap_err();
    assert!(matches!(err, Error::Handler(h) if h.kind == "Timeout"));
}

#[test]
fn test_error_without_recoveries_propagates() {
    let mut route = Route::new();
    route.add(failing("broken", "Boom"));
    let mut ctx = Context::new();
    let err = route.run(&mut ctx).unwrap_err();
    assert!(matches!(err, Error::Handler(h) if h.kind == "Boom"));
}

#[test]
fn test_first_matching_recovery_wins() {
    let first = handler_fn("first", Signature::new(), |_| Ok(Flow::next("first")));
    let second = handler_fn("second", Signature::new(), |_| Ok(Flow::next("second")));
    let mut route = Route::new();
    route.add(
        Step::new(failing("broken", "NotFound"))
            .recover(&["Timeout", "NotFound"], first)
            .recover(&["NotFound"], second),
    );
    let mut ctx = Context::new();
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from("first"));
}

#[test]
fn test_recovery_sees_error_info() {
    let inspect = handler_fn(
        "inspect",
        Signature::of(&["error_info"]),
        |args| {
            Ok(Flow::next(
                args.json("error_info").cloned().unwrap_or(Value::Null),
            ))
        },
    );
    let boom = handler_fn("boom", Signature::new(), |_| {
        Err(HandlerError::new("NotFound", "no such thing").with_details(json!({ "id": 7 })))
    });
    let mut route = Route::new();
    route.add(Step::new(boom).recover(&["NotFound"], inspect));
    let mut ctx = Context::new();
    let result = route.run(&mut ctx).unwrap();
    let info = result.as_json().unwrap();
    assert_eq!(info["kind"], "NotFound");
    assert_eq!(info["message"], "no such thing");
    assert_eq!(info["details"], json!({ "id": 7 }));
    // The reserved entry never outlives the recovery attempt.
    assert!(!ctx.contains("error_info"));
}

#[test]
fn test_error_info_removed_even_when_unmatched() {
    let mut route = Route::new();
    route.add(Step::new(failing("broken", "Boom")).recover(&["Other"], constant("noop", 0i64)));
    let mut ctx = Context::new();
    assert!(route.run(&mut ctx).is_err());
    assert!(!ctx.contains("error_info"));
}

#[test]
fn test_recovery_stop_ends_route() {
    let (never, counter) = counting("never");
    let rescue = handler_fn("rescue", Signature::new(), |_| {
        Ok(Flow::stop_with("recovered"))
    });
    let mut route = Route::new();
    route.add(Step::new(failing("broken", "NotFound")).recover(&["NotFound"], rescue));
    route.add(never);
    let mut ctx = Context::new();
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from("recovered"));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_previous_reference_invokes_returned_handler() {
    let factory = handler_fn("factory", Signature::new(), |_| {
        Ok(Flow::Continue(ScopeValue::callable(constant("inner", "made"))))
    });
    let mut route = Route::new();
    route.add(factory);
    route.add(HandlerRef::previous());
    let mut ctx = Context::new();
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from("made"));
}

#[test]
fn test_previous_member_walks_accessor_path() {
    struct Exposing;
    impl switchyard::Handler for Exposing {
        fn name(&self) -> &str {
            "exposing"
        }
        fn signature(&self) -> Signature {
            Signature::new()
        }
        fn call(&self, _: switchyard::handler::CallArgs) -> Result<Flow, HandlerError> {
            Ok(Flow::next("called directly"))
        }
        fn member(&self, name: &str) -> Option<ScopeValue> {
            (name == "child").then(|| ScopeValue::callable(constant("child", "from child")))
        }
    }
    let factory = handler_fn("factory", Signature::new(), |_| {
        Ok(Flow::Continue(ScopeValue::callable(
            std::sync::Arc::new(Exposing),
        )))
    });
    let mut route = Route::new();
    route.add(factory);
    route.add(HandlerRef::previous_member(&["child"]));
    let mut ctx = Context::new();
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from("from child"));
}

#[test]
fn test_previous_reference_on_plain_value_fails() {
    let mut route = Route::new();
    route.add(constant("plain", 1i64));
    route.add(HandlerRef::previous());
    let mut ctx = Context::new();
    let err = route.run(&mut ctx).unwrap_err();
    assert!(matches!(err, Error::NotInvokable(_)));
}

#[test]
fn test_context_key_reference() {
    let mut route = Route::new();
    route.add(HandlerRef::context_key("service"));
    let mut ctx = Context::new();
    ctx.insert("service", ScopeValue::callable(constant("service", "ran")));
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from("ran"));
}

#[test]
fn test_context_key_reference_invokes_stored_handler_once() {
    // The stored handler is the step target itself: lookup must not
    // lazily invoke it, the step invocation is the only one.
    let (traced, counter) = counting("traced");
    let mut route = Route::new();
    route.add(HandlerRef::context_key("service"));
    let mut ctx = Context::new();
    ctx.insert("service", ScopeValue::callable(traced));
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from(1i64));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_context_key_handler_receives_injected_arguments() {
    let mut route = Route::new();
    route.add(HandlerRef::context_key("echo"));
    let mut ctx = Context::new();
    ctx.insert("echo", ScopeValue::callable(echoing("echo", "word")));
    ctx.insert("word", "ping");
    let result = route.run(&mut ctx).unwrap();
    assert_eq!(result.as_json().unwrap(), &json!({ "echoed": "ping" }));
}

#[test]
fn test_context_member_walks_accessor_path() {
    struct Api;
    impl switchyard::Handler for Api {
        fn name(&self) -> &str {
            "api"
        }
        fn signature(&self) -> Signature {
            Signature::new()
        }
        fn call(&self, _: switchyard::handler::CallArgs) -> Result<Flow, HandlerError> {
            Ok(Flow::next("api itself"))
        }
        fn member(&self, name: &str) -> Option<ScopeValue> {
            (name == "ping").then(|| ScopeValue::callable(constant("ping", "pong")))
        }
    }
    let mut route = Route::new();
    route.add(HandlerRef::context_member("api", &["ping"]));
    let mut ctx = Context::new();
    ctx.insert("api", ScopeValue::callable(std::sync::Arc::new(Api)));
    assert_eq!(route.run(&mut ctx).unwrap(), ScopeValue::from("pong"));
}

#[test]
fn test_context_key_reference_missing_entry_fails() {
    let mut route = Route::new();
    route.add(HandlerRef::context_key("service"));
    let mut ctx = Context::new();
    let err = route.run(&mut ctx).unwrap_err();
    assert!(matches!(err, Error::MissingKey(key) if key == "service"));
}

#[test]
fn test_nested_route_runs_against_same_context() {
    let mut inner = Route::new();
    inner.add(Step::new(constant("inner", "nested result")).bind("inner_result"));
    let mut outer = Route::new();
    outer.add(inner);
    outer.add(echoing("outer", "inner_result"));
    let mut ctx = Context::new();
    let result = outer.run(&mut ctx).unwrap();
    assert_eq!(
        result.as_json().unwrap(),
        &json!({ "echoed": "nested result" })
    );
}

#[test]
fn test_nested_route_result_becomes_step_result() {
    let mut inner = Route::new();
    inner.add(constant("inner", 7i64));
    let mut outer = Route::new();
    outer.add(Step::new(inner).bind("from_inner"));
    let mut ctx = Context::new();
    assert_eq!(outer.run(&mut ctx).unwrap(), ScopeValue::from(7i64));
    assert_eq!(ctx.read("from_inner").unwrap(), ScopeValue::from(7i64));
}
