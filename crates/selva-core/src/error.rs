//! Script-level runtime error taxonomy
//!
//! Every failure in the bridge propagates synchronously up the script call
//! stack as a `RuntimeError`. Only `Raised` carries a host exception that a
//! script-level rescue construct can intercept; the other variants always
//! unwind to the caller.

use crate::host::exception::HostException;

/// Result alias used throughout the runtime
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Script-visible runtime failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// Host type or member could not be found
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// Illegal unwrap / unbox / class-to-type coercion
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// Host runtime failure raised during a marshalled call or by `throw`
    #[error("{0}")]
    Raised(HostException),

    /// Checked host failure that the bridged call did not declare
    #[error("undeclared host failure: {0}")]
    Undeclared(HostException),

    /// Reflective-contract violation (bad receiver, double attach, ...)
    #[error("access violation: {0}")]
    Access(String),

    /// Callable invoked with the wrong number of arguments
    #[error("expected {expected} arguments but got {got}")]
    Arity {
        /// Declared parameter count
        expected: usize,
        /// Arguments actually supplied
        got: usize,
    },

    /// A non-callable value was invoked
    #[error("can only call functions and classes, got {0}")]
    NotCallable(String),

    /// Variable lookup failed in both the binding table and the globals
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
}
