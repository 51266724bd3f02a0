//! Integration tests for exception translation and try/rescue
//!
//! Tests cover:
//! - rescuing exact and subtype exception matches
//! - propagation of mismatched and checked failures
//! - throw of host-backed exception values
//! - conversion failures for non-throwable values

mod common;

use std::sync::Arc;

use common::*;
use selva_bridge::Bridge;
use selva_core::value::Function;
use selva_core::{RuntimeError, Value};

/// A zero-argument action that calls a static method on `demo.Failing`
fn failing_action(bridge: &Arc<Bridge>, method: &str, message: &str) -> Value {
    let facade = call_global(bridge, "static", vec![Value::str("demo.Failing")]).unwrap();
    let bridge = Arc::clone(bridge);
    let method = method.to_string();
    let message = message.to_string();
    Value::Function(Function::native("action", 0, move |_| {
        call_method(&bridge, &facade, &method, vec![Value::str(&message)])
    }))
}

/// A handler that hands its argument straight back
fn identity_handler() -> Value {
    Value::Function(Function::native("handler", 1, |mut args| Ok(args.remove(0))))
}

#[test]
fn test_try_rescues_matching_exception() {
    let bridge = demo_bridge();
    let action = failing_action(&bridge, "fail", "boom");
    let rescued = call_global(
        &bridge,
        "try",
        vec![action, Value::str("demo.AppError"), identity_handler()],
    )
    .unwrap();

    let class = call_global(&bridge, "klass", vec![rescued.clone()]).unwrap();
    match class {
        Value::Class(class) => assert_eq!(class.name, "demo.AppError"),
        other => panic!("expected class, got {:?}", other),
    }
    assert_eq!(call_global(&bridge, "asString", vec![rescued]).unwrap(), Value::str("boom"));
}

#[test]
fn test_try_matches_exception_subtypes() {
    let bridge = demo_bridge();
    let action = failing_action(&bridge, "fail_io", "disk gone");
    let rescued = call_global(
        &bridge,
        "try",
        vec![action, Value::str("demo.AppError"), identity_handler()],
    )
    .unwrap();
    let class = call_global(&bridge, "klass", vec![rescued]).unwrap();
    match class {
        Value::Class(class) => assert_eq!(class.name, "demo.IoError"),
        other => panic!("expected class, got {:?}", other),
    }
}

#[test]
fn test_try_propagates_mismatched_exceptions() {
    let bridge = demo_bridge();
    // demo.AppError is the supertype; a demo.IoError rescue site must not
    // catch it.
    let action = failing_action(&bridge, "fail", "boom");
    let err = call_global(
        &bridge,
        "try",
        vec![action, Value::str("demo.IoError"), identity_handler()],
    )
    .unwrap_err();
    assert!(matches!(err, RuntimeError::Raised(_)));
}

#[test]
fn test_checked_failures_are_never_rescuable() {
    let bridge = demo_bridge();
    let action = failing_action(&bridge, "fail_checked", "boom");
    let err = call_global(
        &bridge,
        "try",
        vec![action, Value::str("demo.AppError"), identity_handler()],
    )
    .unwrap_err();
    assert!(matches!(err, RuntimeError::Undeclared(_)));
}

#[test]
fn test_successful_action_skips_the_handler() {
    let bridge = demo_bridge();
    let action = Value::Function(Function::native("action", 0, |_| Ok(Value::Number(42.0))));
    let handler = Value::Function(Function::native("handler", 1, |_| {
        panic!("handler must not run")
    }));
    let result = call_global(
        &bridge,
        "try",
        vec![action, Value::str("demo.AppError"), handler],
    )
    .unwrap();
    assert_eq!(result, Value::Number(42.0));
}

#[test]
fn test_throw_and_rescue_preserve_the_thrown_object() {
    let bridge = demo_bridge();
    let err = construct(&bridge, "demo.AppError", vec![Value::str("custom")]);
    let thrower = {
        let bridge = Arc::clone(&bridge);
        Value::Function(Function::native("action", 0, move |_| {
            call_global(&bridge, "throw", vec![err.clone()])
        }))
    };

    let rescued = call_global(
        &bridge,
        "try",
        vec![thrower, Value::str("demo.AppError"), identity_handler()],
    )
    .unwrap();
    assert_eq!(call_global(&bridge, "asString", vec![rescued]).unwrap(), Value::str("custom"));
}

#[test]
fn test_throw_rejects_non_throwable_values() {
    let bridge = demo_bridge();
    let p = point(&bridge, 1.0, 2.0);
    let err = call_global(&bridge, "throw", vec![p]).unwrap_err();
    assert!(matches!(err, RuntimeError::Conversion(_)));

    let err = call_global(&bridge, "throw", vec![Value::Number(1.0)]).unwrap_err();
    assert!(matches!(err, RuntimeError::Conversion(_)));
}
