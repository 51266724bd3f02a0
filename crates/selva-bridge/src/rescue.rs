//! Exception translation and the try/rescue surface
//!
//! Host failures cross the boundary exactly once, here. Standard runtime
//! failures become `Raised` errors carrying the host exception type so a
//! rescue site can match them by assignability; checked failures the bridged
//! call never declared become opaque `Undeclared` errors that no rescue site
//! matches; invoker contract violations surface as access errors.

use std::sync::Arc;

use selva_core::error::{RuntimeError, RuntimeResult};
use selva_core::host::exception::{ExceptionKind, HostException};
use selva_core::host::registry::HostType;
use selva_core::host::value::HostObject;
use selva_core::value::Value;

use crate::marshal;
use crate::Bridge;

/// Translate a host failure into the script error taxonomy
pub fn translate(exc: HostException) -> RuntimeError {
    match exc.kind {
        ExceptionKind::Runtime => RuntimeError::Raised(exc),
        ExceptionKind::Checked => RuntimeError::Undeclared(exc),
        ExceptionKind::Contract => RuntimeError::Access(exc.message),
    }
}

/// Run `action`; when it raises a host exception assignable to `exc_class`,
/// run `handler` with the exception object instead
///
/// Everything else propagates untouched: mismatched exception types, checked
/// failures, conversion errors, and ordinary script errors.
pub fn try_rescue(
    bridge: &Arc<Bridge>,
    action: &Value,
    exc_class: &Value,
    handler: &Value,
) -> RuntimeResult<Value> {
    let target = marshal::to_host_type(bridge, exc_class)?;

    match bridge.interp().call(action, None, vec![]) {
        Err(RuntimeError::Raised(exc)) if matches_target(bridge, &exc, target) => {
            let object = exception_object(bridge, exc);
            let argument = marshal::wrap_object(bridge, object);
            bridge.interp().call(handler, None, vec![argument])
        }
        other => other,
    }
}

/// Raise a script value as a host exception
///
/// The value must unwrap to a host object assignable to the root exception
/// type; anything else is a conversion error, not a raise.
pub fn throw_value(bridge: &Arc<Bridge>, value: &Value) -> RuntimeResult<Value> {
    let object = marshal::to_host_object(bridge, value)?;
    let exception_root = bridge.registry().builtins().exception;
    if !bridge.registry().is_assignable(exception_root, object.ty()) {
        return Err(RuntimeError::Conversion(format!(
            "{} is not a throwable host type",
            bridge.registry().name_of(object.ty())
        )));
    }
    let exc = HostException::runtime(object.ty(), object.describe()).with_payload(object);
    Err(RuntimeError::Raised(exc))
}

fn matches_target(bridge: &Arc<Bridge>, exc: &HostException, target: HostType) -> bool {
    match exc.ty {
        Some(ty) => bridge.registry().is_assignable(target, ty),
        None => false,
    }
}

fn exception_object(bridge: &Arc<Bridge>, exc: HostException) -> HostObject {
    match exc.payload {
        Some(payload) => payload,
        // A payload-free raise is materialized as an object of its own
        // exception type so the handler still sees something typed.
        None => {
            let ty = exc.ty.unwrap_or(bridge.registry().builtins().exception);
            HostObject::data(ty, exc)
        }
    }
}
