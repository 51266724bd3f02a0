//! Shared demo host registry for bridge integration tests
//!
//! Declares a small host world the tests exercise the bridge against:
//! - `demo.Point` / `demo.Point3`: constructible class with fields, methods,
//!   overloads, hidden members, and statics
//! - `demo.Points`: utility class with Point-typed static helpers
//! - `demo.Greeter` / `demo.Speaker`: a behavioral contract and a host
//!   caller that dispatches through it
//! - `demo.AppError` / `demo.IoError` / `demo.Failing`: an exception
//!   hierarchy and methods that raise into it

#![allow(dead_code)]

use std::fmt;
use std::sync::{Arc, OnceLock};

use selva_bridge::Bridge;
use selva_core::host::{
    invoke_contract, HostException, HostObject, HostType, HostTypeBuilder, HostValue, TypeRegistry,
};
use selva_core::{RuntimeResult, Value};

/// Host-side payload of a `demo.Point` object
pub struct PointData {
    pub x: f64,
    pub y: f64,
}

impl fmt::Display for PointData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

fn point_data(recv: Option<&HostObject>) -> Result<&PointData, HostException> {
    recv.and_then(|obj| obj.downcast::<PointData>())
        .ok_or_else(|| HostException::argument("receiver is not a point"))
}

pub fn demo_registry() -> Arc<TypeRegistry> {
    let reg = TypeRegistry::with_builtins();
    let b = reg.builtins();
    let (any, double, int, string) = (b.any, b.double, b.int, b.string);
    let exception = b.exception;

    let greeter = reg
        .declare(
            HostTypeBuilder::contract("demo.Greeter")
                .abstract_method("greet", &[("name", string)], string),
        )
        .unwrap();

    // The type id is only known after registration; invoker closures run
    // later and read it from the cell.
    let point_cell: Arc<OnceLock<HostType>> = Arc::new(OnceLock::new());
    let ctor_cell = point_cell.clone();
    let scale_cell = point_cell.clone();
    let point = reg
        .declare(
            HostTypeBuilder::class("demo.Point")
                .ctor(&[("x", double), ("y", double)], move |args| {
                    let ty = *ctor_cell.get().ok_or_else(|| HostException::argument("unregistered"))?;
                    Ok(HostObject::data(ty, PointData { x: args[0].as_f64()?, y: args[1].as_f64()? }))
                })
                .deprecated_ctor(&[("x", double)], |_args| {
                    Err(HostException::argument("deprecated constructor"))
                })
                .field("x", double, |recv| Ok(HostValue::F64(point_data(recv)?.x)))
                .field("y", double, |recv| Ok(HostValue::F64(point_data(recv)?.y)))
                .method("len", &[], double, |recv, _| {
                    let p = point_data(recv)?;
                    Ok(HostValue::F64(p.x.hypot(p.y)))
                })
                .method("scale", &[("factor", double)], any, move |recv, args| {
                    let ty = *scale_cell.get().ok_or_else(|| HostException::argument("unregistered"))?;
                    let p = point_data(recv)?;
                    let f = args[0].as_f64()?;
                    Ok(HostValue::Object(HostObject::data(ty, PointData { x: p.x * f, y: p.y * f })))
                })
                .method("shift", &[("d", double)], double, |recv, args| {
                    let p = point_data(recv)?;
                    let d = args[0].as_f64()?;
                    Ok(HostValue::F64((p.x + d).hypot(p.y + d)))
                })
                .method("shift", &[("dx", double), ("dy", double)], double, |recv, args| {
                    let p = point_data(recv)?;
                    Ok(HostValue::F64((p.x + args[0].as_f64()?).hypot(p.y + args[1].as_f64()?)))
                })
                .private_method("internal", &[], double, |_, _| Ok(HostValue::F64(0.0)))
                .deprecated_method("legacy", &[], double, |_, _| Ok(HostValue::F64(0.0)))
                .static_field("dims", int, |_| Ok(HostValue::I32(2)))
                .implements(greeter),
        )
        .unwrap();
    point_cell.set(point).unwrap();

    // A constructor next to an instance method with the reserved name; the
    // constructor must win the "init" slot.
    let widget_cell: Arc<OnceLock<HostType>> = Arc::new(OnceLock::new());
    let widget_ctor = widget_cell.clone();
    let widget = reg
        .declare(
            HostTypeBuilder::class("demo.Widget")
                .method("init", &[], double, |_, _| Ok(HostValue::F64(7.0)))
                .ctor(&[], move |_args| {
                    let ty =
                        *widget_ctor.get().ok_or_else(|| HostException::argument("unregistered"))?;
                    Ok(HostObject::data(ty, "widget".to_string()))
                }),
        )
        .unwrap();
    widget_cell.set(widget).unwrap();

    reg.declare(
        HostTypeBuilder::class("demo.Point3")
            .extends(point)
            .field("z", double, |_recv| Ok(HostValue::F64(0.0))),
    )
    .unwrap();

    reg.declare(
        HostTypeBuilder::class("demo.Points")
            .static_method("origin", &[], any, move |_, _| {
                Ok(HostValue::Object(HostObject::data(point, PointData { x: 0.0, y: 0.0 })))
            })
            .static_method("sum", &[("a", point), ("b", point)], any, move |_, args| {
                let a = args[0].as_object()?.downcast::<PointData>();
                let b = args[1].as_object()?.downcast::<PointData>();
                match (a, b) {
                    (Some(a), Some(b)) => Ok(HostValue::Object(HostObject::data(
                        point,
                        PointData { x: a.x + b.x, y: a.y + b.y },
                    ))),
                    _ => Err(HostException::argument("arguments are not points")),
                }
            }),
    )
    .unwrap();

    reg.declare(
        HostTypeBuilder::class("demo.Speaker").static_method(
            "perform",
            &[("greeter", greeter), ("name", string)],
            string,
            |_, args| {
                let obj = args[0].as_object()?;
                invoke_contract(obj, "greet", vec![args[1].clone()])
            },
        ),
    )
    .unwrap();

    let app_cell: Arc<OnceLock<HostType>> = Arc::new(OnceLock::new());
    let app_ctor = app_cell.clone();
    let app_error = reg
        .declare(HostTypeBuilder::class("demo.AppError").extends(exception).ctor(
            &[("message", string)],
            move |args| {
                let ty = *app_ctor.get().ok_or_else(|| HostException::argument("unregistered"))?;
                Ok(HostObject::data(ty, args[0].as_str()?.to_string()))
            },
        ))
        .unwrap();
    app_cell.set(app_error).unwrap();

    let io_error = reg
        .declare(HostTypeBuilder::class("demo.IoError").extends(app_error))
        .unwrap();

    reg.declare(
        HostTypeBuilder::class("demo.Failing")
            .static_method("fail", &[("message", string)], any, move |_, args| {
                Err(HostException::runtime(app_error, args[0].as_str()?))
            })
            .static_method("fail_io", &[("message", string)], any, move |_, args| {
                Err(HostException::runtime(io_error, args[0].as_str()?))
            })
            .static_method("fail_checked", &[("message", string)], any, move |_, args| {
                Err(HostException::checked(app_error, args[0].as_str()?))
            }),
    )
    .unwrap();

    reg
}

pub fn demo_bridge() -> Arc<Bridge> {
    Bridge::new(demo_registry())
}

/// Read an installed global by name
pub fn global(bridge: &Bridge, name: &str) -> Value {
    bridge.interp().lookup_global(name).unwrap()
}

/// Call an installed global function
pub fn call_global(bridge: &Bridge, name: &str, args: Vec<Value>) -> RuntimeResult<Value> {
    bridge.interp().call(&global(bridge, name), None, args)
}

/// Call a method on an instance the way a script member access would
pub fn call_method(
    bridge: &Bridge,
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
) -> RuntimeResult<Value> {
    let class = match receiver {
        Value::Instance(instance) => instance.class().clone(),
        other => panic!("not an instance: {:?}", other),
    };
    let method = class
        .find_method(name)
        .unwrap_or_else(|| panic!("no method {} on {}", name, class.name));
    bridge.interp().call(&Value::Function(method), Some(receiver.clone()), args)
}

/// Import a host type and construct an instance of it
pub fn construct(bridge: &Bridge, type_name: &str, args: Vec<Value>) -> Value {
    let class = call_global(bridge, "import", vec![Value::str(type_name)]).unwrap();
    bridge.interp().call(&class, None, args).unwrap()
}

/// Build a demo point as a script value
pub fn point(bridge: &Bridge, x: f64, y: f64) -> Value {
    construct(bridge, "demo.Point", vec![Value::Number(x), Value::Number(y)])
}
