//! Functional adapter: script closures as host contract objects
//!
//! When a script function is unboxed toward a behavioral contract, it is
//! wrapped in a `ClosureAdapter`. Host code sees an ordinary contract object;
//! every `invoke` marshals the host arguments into the script universe, runs
//! the closure through the bridge's evaluator, and marshals the result back
//! toward the contract method's declared return type.
//!
//! Identity-sensitive host bookkeeping never re-enters the script: string
//! conversion and hashing come from the closure value itself.

use std::sync::Arc;

use selva_core::error::RuntimeError;
use selva_core::host::exception::HostException;
use selva_core::host::registry::HostType;
use selva_core::host::value::{ContractObject, HostValue};
use selva_core::value::{Function, Value};

use crate::marshal;
use crate::Bridge;

/// A script closure standing in for a host contract object
pub struct ClosureAdapter {
    bridge: Arc<Bridge>,
    contract: HostType,
    closure: Arc<Function>,
}

impl ClosureAdapter {
    /// Adapt a closure to a contract type
    pub fn new(bridge: Arc<Bridge>, contract: HostType, closure: Arc<Function>) -> ClosureAdapter {
        ClosureAdapter { bridge, contract, closure }
    }
}

impl ContractObject for ClosureAdapter {
    fn contract(&self) -> HostType {
        self.contract
    }

    fn invoke(&self, method: &str, args: Vec<HostValue>) -> Result<HostValue, HostException> {
        let signature = self.bridge.registry().contract_method(self.contract, method).ok_or_else(
            || {
                HostException::argument(format!(
                    "contract {} has no method {}",
                    self.bridge.registry().name_of(self.contract),
                    method
                ))
            },
        )?;

        let script_args: Vec<Value> =
            args.into_iter().map(|arg| marshal::box_value(&self.bridge, arg)).collect();
        let result = self
            .bridge
            .interp()
            .call(&Value::Function(self.closure.clone()), None, script_args)
            .map_err(to_host)?;

        marshal::unbox_to(&self.bridge, &result, signature.ret).map_err(to_host)
    }

    fn describe(&self) -> String {
        format!("<fn {}>", self.closure.name)
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(&self.closure) as *const () as usize
    }
}

fn to_host(err: RuntimeError) -> HostException {
    match err {
        RuntimeError::Raised(exc) | RuntimeError::Undeclared(exc) => exc,
        other => HostException::argument(other.to_string()),
    }
}
