//! The installed global surface
//!
//! One flat set of native globals is defined on the bridge's evaluator at
//! construction time. Scripts reach every bridge capability through these
//! names; `$bridge` itself is the dispatch target every synthesized member
//! forwarder calls and is not meant to be called by hand.
//!
//! The natives capture the bridge weakly so the bridge, which owns the
//! evaluator these globals live in, is not kept alive by its own surface.

use std::fmt;
use std::fs;
use std::sync::{Arc, Weak};

use selva_core::ast::{Bindings, Stmt};
use selva_core::error::{RuntimeError, RuntimeResult};
use selva_core::host::registry::HostType;
use selva_core::host::value::{HostObject, HostValue, ListData};
use selva_core::resolve;
use selva_core::value::{Function, Instance, Value};

use crate::marshal;
use crate::rescue;
use crate::synth;
use crate::Bridge;

/// Define the bridge globals on the bridge's evaluator
pub fn install(bridge: &Arc<Bridge>) {
    define(bridge, "import", 1, |bridge, args| {
        let name = expect_str(&args[0])?;
        let ty = bridge
            .registry()
            .lookup(name)
            .ok_or_else(|| RuntimeError::Lookup(format!("unknown host type '{}'", name)))?;
        Ok(Value::Class(bridge.class_of(ty)))
    });

    define(bridge, "static", 1, |bridge, args| {
        let ty = marshal::to_host_type(&bridge, &args[0])?;
        Ok(Value::Instance(bridge.static_facade_of(ty)))
    });

    define(bridge, "klass", 1, |bridge, args| {
        Ok(Value::Class(marshal::klass_of(&bridge, &args[0])))
    });

    define(bridge, "wrap", 1, |bridge, args| match &args[0] {
        Value::Nil => Ok(Value::Nil),
        value => {
            let object = marshal::to_host_object(&bridge, value)?;
            let class = bridge.class_of(object.ty());
            Ok(Value::Instance(Instance::backed(class, object)))
        }
    });

    define(bridge, "unwrap", 1, |_bridge, args| marshal::unwrap_to_script(&args[0]));

    define(bridge, "unboxTo", 2, |bridge, args| {
        let target = marshal::to_host_type(&bridge, &args[1])?;
        let host = marshal::unbox_to(&bridge, &args[0], target)?;
        Ok(marshal::box_value(&bridge, host))
    });

    define(bridge, "asString", 1, |_bridge, args| Ok(Value::str(marshal::as_string(&args[0]))));

    define(bridge, "try", 3, |bridge, args| {
        rescue::try_rescue(&bridge, &args[0], &args[1], &args[2])
    });

    define(bridge, "throw", 1, |bridge, args| rescue::throw_value(&bridge, &args[0]));

    define(bridge, "parse", 1, |bridge, args| {
        let path = expect_str(&args[0])?;
        let source = fs::read_to_string(path)
            .map_err(|err| RuntimeError::Lookup(format!("cannot read '{}': {}", path, err)))?;
        let frontend = bridge
            .frontend()
            .ok_or_else(|| RuntimeError::Lookup("no frontend installed".to_string()))?
            .clone();
        let program = frontend.parse(&source)?;
        Ok(wrap_payload(&bridge, bridge.registry().builtins().program, ProgramData(program)))
    });

    define(bridge, "resolve", 1, |bridge, args| {
        let program = expect_payload::<ProgramData>(&args[0], "program")?;
        let bindings = resolve::resolve_stmts(&program.0);
        Ok(wrap_payload(&bridge, bridge.registry().builtins().bindings, BindingsData(bindings)))
    });

    {
        let weak = Arc::downgrade(bridge);
        bridge.interp().define_global(
            "$bridge",
            Value::Function(Function::native_variadic("$bridge", 2, move |args| {
                synth::dispatch(&grab(&weak)?, args)
            })),
        );
    }

    let args: Vec<HostValue> =
        bridge.args().iter().map(|arg| HostValue::Str(arg.clone())).collect();
    let list = wrap_payload(bridge, bridge.registry().builtins().list, ListData(args));
    bridge.interp().define_global(
        "ARGS",
        Value::Function(Function::native("ARGS", 0, move |_| Ok(list.clone()))),
    );
}

/// Opaque parsed-program payload carried by `parse` results
struct ProgramData(Vec<Stmt>);

impl fmt::Display for ProgramData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<program with {} statements>", self.0.len())
    }
}

/// Opaque binding-table payload carried by `resolve` results
struct BindingsData(Bindings);

impl fmt::Display for BindingsData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<bindings for {} expressions>", self.0.len())
    }
}

fn define(
    bridge: &Arc<Bridge>,
    name: &str,
    arity: usize,
    f: impl Fn(Arc<Bridge>, Vec<Value>) -> RuntimeResult<Value> + Send + Sync + 'static,
) {
    let weak = Arc::downgrade(bridge);
    bridge.interp().define_global(
        name,
        Value::Function(Function::native(name, arity, move |args| f(grab(&weak)?, args))),
    );
}

fn grab(weak: &Weak<Bridge>) -> RuntimeResult<Arc<Bridge>> {
    weak.upgrade().ok_or_else(|| RuntimeError::Access("bridge has shut down".to_string()))
}

fn wrap_payload<T: fmt::Display + Send + Sync + 'static>(
    bridge: &Arc<Bridge>,
    ty: HostType,
    payload: T,
) -> Value {
    let class = bridge.class_of(ty);
    Value::Instance(Instance::backed(class, HostObject::data(ty, payload)))
}

fn expect_str(value: &Value) -> RuntimeResult<&str> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::Conversion(format!("expected a string, got {}", other.type_name()))),
    }
}

fn expect_payload<'a, T: 'static>(value: &'a Value, what: &str) -> RuntimeResult<&'a T> {
    let payload = match value {
        Value::Instance(instance) => {
            instance.host_object().and_then(|object| object.downcast::<T>())
        }
        _ => None,
    };
    payload.ok_or_else(|| {
        RuntimeError::Conversion(format!("expected a {}, got {}", what, value.type_name()))
    })
}
