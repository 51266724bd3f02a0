//! Value marshalling between the script and host universes
//!
//! Boxing (host to script) is total: every host value has a script rendering.
//! Unboxing (script to host) is directed by the declared target type and
//! fails with a conversion error when no sound rendering exists. The one
//! deliberate lossy case is numeric narrowing: the script's f64 is truncated
//! toward zero when the target is `int`, `long`, or `float`, matching host
//! casting rules rather than rounding.
//!
//! Script values that have no host-native shape (functions, classes, member
//! descriptors, pure instances) cross the boundary inside a `ScriptPayload`
//! so a later unwrap restores the identical value.

use std::fmt;
use std::sync::Arc;

use selva_core::error::{RuntimeError, RuntimeResult};
use selva_core::host::registry::HostType;
use selva_core::host::value::{HostObject, HostValue};
use selva_core::value::{Class, Instance, Value};

use crate::adapter::ClosureAdapter;
use crate::Bridge;

/// A script value riding through the host universe unchanged
pub struct ScriptPayload(pub Value);

impl fmt::Display for ScriptPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Box a host value into the script universe
pub fn box_value(bridge: &Arc<Bridge>, value: HostValue) -> Value {
    match value {
        HostValue::Null => Value::Nil,
        HostValue::Bool(v) => Value::Bool(v),
        HostValue::I32(v) => Value::Number(v as f64),
        HostValue::I64(v) => Value::Number(v as f64),
        HostValue::F32(v) => Value::Number(v as f64),
        HostValue::F64(v) => Value::Number(v),
        HostValue::Str(v) => Value::str(v),
        HostValue::Type(ty) => Value::Class(bridge.class_of(ty)),
        HostValue::Script(v) => v,
        HostValue::Object(obj) => wrap_object(bridge, obj),
    }
}

/// Wrap a host object as a host-backed instance of its cached class
pub fn wrap_object(bridge: &Arc<Bridge>, object: HostObject) -> Value {
    match object.downcast::<ScriptPayload>() {
        Some(payload) => payload.0.clone(),
        None => {
            let class = bridge.class_of(object.ty());
            Value::Instance(Instance::backed(class, object))
        }
    }
}

/// The backing host object of a script value
///
/// Host-backed instances yield their backing directly; everything else is
/// boxed into a freshly typed host object so it can travel through host APIs
/// and come back out intact.
pub fn to_host_object(bridge: &Arc<Bridge>, value: &Value) -> RuntimeResult<HostObject> {
    let b = bridge.registry().builtins();
    match value {
        Value::Nil => Err(RuntimeError::Conversion("cannot wrap nil".to_string())),
        Value::Number(n) => Ok(HostObject::data(b.number, *n)),
        Value::Bool(v) => Ok(HostObject::data(b.bool_class, *v)),
        Value::Str(s) => Ok(HostObject::data(b.string, s.to_string())),
        Value::Function(_) => Ok(HostObject::data(b.function, ScriptPayload(value.clone()))),
        Value::Class(_) => Ok(HostObject::data(b.class_type, ScriptPayload(value.clone()))),
        Value::Member(_) => Ok(HostObject::data(b.member, ScriptPayload(value.clone()))),
        Value::Instance(instance) => match instance.host_object() {
            Some(object) => Ok(object.clone()),
            None => Ok(HostObject::data(b.instance, ScriptPayload(value.clone()))),
        },
    }
}

/// Recover the script rendering of a host-backed instance
pub fn unwrap_to_script(value: &Value) -> RuntimeResult<Value> {
    let instance = match value {
        Value::Instance(instance) => instance,
        other => {
            return Err(RuntimeError::Conversion(format!(
                "cannot unwrap a {}",
                other.type_name()
            )))
        }
    };
    let object = instance.host_object().ok_or_else(|| {
        RuntimeError::Conversion(format!("{} is not host-backed", instance.class().name))
    })?;

    if let Some(payload) = object.downcast::<ScriptPayload>() {
        return Ok(payload.0.clone());
    }
    if let Some(n) = object.downcast::<f64>() {
        return Ok(Value::Number(*n));
    }
    if let Some(v) = object.downcast::<bool>() {
        return Ok(Value::Bool(*v));
    }
    if let Some(s) = object.downcast::<String>() {
        return Ok(Value::str(s));
    }
    // Opaque host data stays behind its instance wrapper.
    Ok(value.clone())
}

/// Unbox a script value toward a declared host parameter type
pub fn unbox_to(bridge: &Arc<Bridge>, value: &Value, target: HostType) -> RuntimeResult<HostValue> {
    let reg = bridge.registry();
    let b = reg.builtins();

    if target == b.any {
        return Ok(HostValue::Script(value.clone()));
    }

    match value {
        Value::Nil => Ok(HostValue::Null),
        Value::Number(n) => {
            if target == b.int {
                Ok(HostValue::I32(*n as i32))
            } else if target == b.long {
                Ok(HostValue::I64(*n as i64))
            } else if target == b.float {
                Ok(HostValue::F32(*n as f32))
            } else if target == b.double || target == b.number {
                Ok(HostValue::F64(*n))
            } else {
                Err(conversion(reg_name(bridge, target), "number"))
            }
        }
        Value::Bool(v) => {
            if target == b.boolean || target == b.bool_class {
                Ok(HostValue::Bool(*v))
            } else {
                Err(conversion(reg_name(bridge, target), "boolean"))
            }
        }
        Value::Str(s) => {
            if target == b.string {
                Ok(HostValue::Str(s.to_string()))
            } else {
                Err(conversion(reg_name(bridge, target), "string"))
            }
        }
        Value::Instance(instance) => match instance.host_object() {
            Some(object) => {
                if reg.is_assignable(target, object.ty()) {
                    Ok(HostValue::Object(object.clone()))
                } else {
                    Err(conversion(reg_name(bridge, target), &reg.name_of(object.ty())))
                }
            }
            None => {
                if target == b.instance {
                    Ok(HostValue::Object(HostObject::data(
                        b.instance,
                        ScriptPayload(value.clone()),
                    )))
                } else {
                    Err(conversion(reg_name(bridge, target), "instance"))
                }
            }
        },
        Value::Function(function) => {
            if reg.is_contract(target) {
                let adapter =
                    ClosureAdapter::new(bridge.clone(), target, function.clone());
                Ok(HostValue::Object(HostObject::contract(Arc::new(adapter))))
            } else if target == b.function {
                Ok(HostValue::Object(HostObject::data(
                    b.function,
                    ScriptPayload(value.clone()),
                )))
            } else {
                Err(conversion(reg_name(bridge, target), "function"))
            }
        }
        Value::Class(class) => match class.host_type() {
            Some(ty) if target == b.class_type => Ok(HostValue::Type(ty)),
            _ => Err(conversion(reg_name(bridge, target), "class")),
        },
        Value::Member(_) => Err(conversion(reg_name(bridge, target), "member")),
    }
}

/// Host-aware string conversion
///
/// Host-backed instances delegate to the host object's own rendering; pure
/// script values use their script rendering.
pub fn as_string(value: &Value) -> String {
    if let Value::Instance(instance) = value {
        if let Some(object) = instance.host_object() {
            return object.describe();
        }
    }
    value.to_string()
}

/// The class object describing a value's runtime type
pub fn klass_of(bridge: &Arc<Bridge>, value: &Value) -> Arc<Class> {
    let b = bridge.registry().builtins();
    match value {
        Value::Instance(instance) => instance.class().clone(),
        Value::Nil => bridge.class_of(b.nil),
        Value::Bool(_) => bridge.class_of(b.bool_class),
        Value::Number(_) => bridge.class_of(b.number),
        Value::Str(_) => bridge.class_of(b.string),
        Value::Function(_) => bridge.class_of(b.function),
        Value::Class(_) => bridge.class_of(b.class_type),
        Value::Member(_) => bridge.class_of(b.member),
    }
}

/// Resolve a script-supplied type designator to a host type
///
/// The documented surface passes a host-backed class object; as a
/// convenience extension a qualified type-name string is accepted too and
/// resolved through the registry.
pub fn to_host_type(bridge: &Arc<Bridge>, value: &Value) -> RuntimeResult<HostType> {
    match value {
        Value::Class(class) => class.host_type().ok_or_else(|| {
            RuntimeError::Conversion(format!("{} is not a host-backed class", class.name))
        }),
        Value::Str(name) => bridge
            .registry()
            .lookup(name)
            .ok_or_else(|| RuntimeError::Lookup(format!("unknown host type '{}'", name))),
        other => Err(RuntimeError::Conversion(format!(
            "expected a class or type name, got {}",
            other.type_name()
        ))),
    }
}

fn reg_name(bridge: &Arc<Bridge>, ty: HostType) -> String {
    bridge.registry().name_of(ty)
}

fn conversion(target: String, got: &str) -> RuntimeError {
    RuntimeError::Conversion(format!("cannot convert {} to {}", got, target))
}
