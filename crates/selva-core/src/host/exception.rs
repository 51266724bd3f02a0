//! Host failure representation
//!
//! Host invokers report failure as a `HostException` carrying the host
//! exception type for rescue matching. The kind distinguishes failures the
//! host runtime considers part of its normal runtime-failure hierarchy from
//! checked failures a bridged call never declared, and from violations of the
//! invoker calling contract itself.

use std::fmt;

use crate::host::registry::HostType;
use crate::host::value::HostObject;

/// Classification of a host-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    /// Standard host runtime failure; re-raised as-is and rescuable
    Runtime,
    /// Checked failure the bridged call did not declare; surfaced opaque
    Checked,
    /// Violation of the invoker calling contract (bad receiver or argument)
    Contract,
}

/// A failure raised inside the host universe
#[derive(Debug, Clone)]
pub struct HostException {
    /// Host exception type, when the failure belongs to the host hierarchy
    pub ty: Option<HostType>,
    /// Failure classification
    pub kind: ExceptionKind,
    /// Human-readable message
    pub message: String,
    /// The thrown host object, when one exists
    pub payload: Option<HostObject>,
}

impl HostException {
    /// A standard host runtime failure of the given exception type
    pub fn runtime(ty: HostType, message: impl Into<String>) -> Self {
        HostException { ty: Some(ty), kind: ExceptionKind::Runtime, message: message.into(), payload: None }
    }

    /// A checked failure the bridged call did not declare
    pub fn checked(ty: HostType, message: impl Into<String>) -> Self {
        HostException { ty: Some(ty), kind: ExceptionKind::Checked, message: message.into(), payload: None }
    }

    /// A violation of the invoker calling contract
    pub fn argument(message: impl Into<String>) -> Self {
        HostException { ty: None, kind: ExceptionKind::Contract, message: message.into(), payload: None }
    }

    /// Attach the thrown host object
    pub fn with_payload(mut self, payload: HostObject) -> Self {
        self.payload = Some(payload);
        self
    }
}

impl fmt::Display for HostException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
