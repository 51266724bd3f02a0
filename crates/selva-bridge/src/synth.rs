//! Member bridge synthesizer and dispatcher
//!
//! For every surviving member descriptor the bridge fabricates a tiny script
//! function whose body is `return $bridge(member, this, p0, p1, ...)`: the
//! descriptor itself travels as a literal, the receiver and parameters as
//! ordinary variable references. The fragment is scope-resolved immediately
//! and carries its own binding table, so it behaves exactly like a function
//! the script author had declared.
//!
//! `dispatch` is the other half: the native `$bridge` global unpacks the
//! descriptor, marshals arguments toward the declared parameter types, runs
//! the invoker, and marshals the result back.

use std::sync::Arc;

use selva_core::ast::{Expr, FunctionDecl, Literal, Stmt};
use selva_core::error::{RuntimeError, RuntimeResult};
use selva_core::host::member::{MemberDef, MemberKind};
use selva_core::host::value::{HostObject, HostValue};
use selva_core::resolve;
use selva_core::value::{Function, Value};

use crate::marshal;
use crate::rescue;
use crate::Bridge;

/// Fabricate the forwarder function for one member descriptor
pub fn synthesize(member: &Arc<MemberDef>) -> Arc<Function> {
    let mut args = Vec::with_capacity(member.arity() + 2);
    args.push(Expr::literal(Literal::Member(member.clone())));
    args.push(Expr::this());
    for param in &member.params {
        args.push(Expr::variable(param.name.clone()));
    }
    let body = vec![Stmt::Return(Some(Expr::call(Expr::variable("$bridge"), args)))];

    let decl = Arc::new(FunctionDecl {
        name: member.name.clone(),
        params: member.params.iter().map(|p| p.name.clone()).collect(),
        body,
        is_initializer: member.is_constructor(),
    });
    let bindings = resolve::resolve_function(&decl);
    Function::declared(decl, bindings)
}

/// The native side of a forwarder call
///
/// `args` is `[member, receiver, p0, p1, ...]` as evaluated by the fragment.
pub fn dispatch(bridge: &Arc<Bridge>, mut args: Vec<Value>) -> RuntimeResult<Value> {
    if args.len() < 2 {
        return Err(RuntimeError::Arity { expected: 2, got: args.len() });
    }
    let rest = args.split_off(2);
    let receiver = args.pop().unwrap_or(Value::Nil);
    let member = match args.pop() {
        Some(Value::Member(member)) => member,
        other => {
            return Err(RuntimeError::Access(format!(
                "bridge dispatch needs a member descriptor, got {}",
                other.map(|v| v.type_name()).unwrap_or("nothing")
            )))
        }
    };

    match &member.kind {
        MemberKind::Field(read) => {
            let host_recv = host_receiver(&receiver);
            let value = read(host_recv).map_err(rescue::translate)?;
            Ok(marshal::box_value(bridge, value))
        }
        MemberKind::Method(invoke) => {
            let host_args = unbox_args(bridge, &member, rest)?;
            let host_recv = host_receiver(&receiver);
            let value = invoke(host_recv, &host_args).map_err(rescue::translate)?;
            Ok(marshal::box_value(bridge, value))
        }
        MemberKind::Constructor(construct) => {
            let host_args = unbox_args(bridge, &member, rest)?;
            let object = construct(&host_args).map_err(rescue::translate)?;
            attach(&receiver, object)?;
            Ok(receiver)
        }
    }
}

fn unbox_args(
    bridge: &Arc<Bridge>,
    member: &MemberDef,
    args: Vec<Value>,
) -> RuntimeResult<Vec<HostValue>> {
    if args.len() != member.arity() {
        return Err(RuntimeError::Arity { expected: member.arity(), got: args.len() });
    }
    member
        .params
        .iter()
        .zip(args)
        .map(|(param, arg)| marshal::unbox_to(bridge, &arg, param.ty))
        .collect()
}

fn host_receiver(receiver: &Value) -> Option<&HostObject> {
    match receiver {
        Value::Instance(instance) => instance.host_object(),
        _ => None,
    }
}

fn attach(receiver: &Value, object: HostObject) -> RuntimeResult<()> {
    match receiver {
        Value::Instance(instance) => instance.attach_host(object),
        other => Err(RuntimeError::Access(format!(
            "constructor receiver must be an instance, got {}",
            other.type_name()
        ))),
    }
}
