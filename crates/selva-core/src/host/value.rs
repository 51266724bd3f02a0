//! Values and objects of the host universe
//!
//! `HostValue` is the tagged union crossing the bridge boundary: primitives
//! are stored inline, opaque host objects and behavioral-contract objects are
//! reference counted, and already-bridged script values pass through under
//! the `Script` tag.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::host::exception::HostException;
use crate::host::registry::HostType;
use crate::value::Value;

/// Backing data of an opaque host object
///
/// Anything `Display + Any + Send + Sync` qualifies via the blanket impl;
/// `describe` feeds the host-side string conversion that `asString`
/// delegates to.
pub trait HostData: Any + Send + Sync {
    /// Downcasting access to the concrete payload
    fn as_any(&self) -> &dyn Any;
    /// Host-side string conversion
    fn describe(&self) -> String;
}

impl<T: Any + Send + Sync + fmt::Display> HostData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

/// A host object satisfying a behavioral contract on behalf of some callable
///
/// One concrete adapter type exists per supported contract shape; the bridge
/// provides one backed by a script closure. Identity-sensitive bookkeeping
/// (string conversion, equality, hash) goes through `describe`/`identity`
/// rather than through `invoke`.
pub trait ContractObject: Send + Sync {
    /// The contract type this object satisfies
    fn contract(&self) -> HostType;

    /// Invoke a contract method with host-universe arguments
    fn invoke(&self, method: &str, args: Vec<HostValue>) -> Result<HostValue, HostException>;

    /// String conversion of the adapter
    fn describe(&self) -> String;

    /// Hash source; stable for the lifetime of the adapter
    fn identity(&self) -> usize;
}

#[derive(Clone)]
enum Repr {
    Data(Arc<dyn HostData>),
    Contract(Arc<dyn ContractObject>),
}

/// An object living in the host universe
#[derive(Clone)]
pub struct HostObject {
    ty: HostType,
    repr: Repr,
}

impl HostObject {
    /// Wrap a concrete payload as a host object of the given type
    pub fn data<T: HostData>(ty: HostType, value: T) -> Self {
        HostObject { ty, repr: Repr::Data(Arc::new(value)) }
    }

    /// Wrap a contract adapter; the object's type is the contract type
    pub fn contract(adapter: Arc<dyn ContractObject>) -> Self {
        HostObject { ty: adapter.contract(), repr: Repr::Contract(adapter) }
    }

    /// The host type of this object
    pub fn ty(&self) -> HostType {
        self.ty
    }

    /// Downcast the payload of a data object
    pub fn downcast<T: Any>(&self) -> Option<&T> {
        match &self.repr {
            Repr::Data(data) => data.as_any().downcast_ref::<T>(),
            Repr::Contract(_) => None,
        }
    }

    /// The contract adapter, when this object is one
    pub fn as_contract(&self) -> Option<&Arc<dyn ContractObject>> {
        match &self.repr {
            Repr::Contract(adapter) => Some(adapter),
            Repr::Data(_) => None,
        }
    }

    /// Host-side string conversion
    pub fn describe(&self) -> String {
        match &self.repr {
            Repr::Data(data) => data.describe(),
            Repr::Contract(adapter) => adapter.describe(),
        }
    }

    /// Hash source for host-side bookkeeping
    pub fn identity(&self) -> usize {
        match &self.repr {
            Repr::Data(data) => Arc::as_ptr(data) as *const () as usize,
            Repr::Contract(adapter) => adapter.identity(),
        }
    }

    /// Reference identity of the underlying payload
    pub fn same_object(&self, other: &HostObject) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Data(a), Repr::Data(b)) => Arc::ptr_eq(a, b),
            (Repr::Contract(a), Repr::Contract(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({:?}, {})", self.ty, self.describe())
    }
}

/// Invoke a contract method on a host object from the host side
pub fn invoke_contract(
    obj: &HostObject,
    method: &str,
    args: Vec<HostValue>,
) -> Result<HostValue, HostException> {
    let adapter = obj
        .as_contract()
        .ok_or_else(|| HostException::argument(format!("{} is not a contract object", obj.describe())))?;
    adapter.invoke(method, args)
}

/// A value of the host universe
#[derive(Debug, Clone)]
pub enum HostValue {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// Text
    Str(String),
    /// Opaque or contract host object
    Object(HostObject),
    /// A host type handle as a first-class value
    Type(HostType),
    /// An already-bridged script value passing through unchanged
    Script(Value),
}

impl HostValue {
    /// Short tag name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "boolean",
            HostValue::I32(_) => "int",
            HostValue::I64(_) => "long",
            HostValue::F32(_) => "float",
            HostValue::F64(_) => "double",
            HostValue::Str(_) => "string",
            HostValue::Object(_) => "object",
            HostValue::Type(_) => "type",
            HostValue::Script(_) => "script value",
        }
    }

    /// Numeric coercion to f64
    pub fn as_f64(&self) -> Result<f64, HostException> {
        match self {
            HostValue::I32(v) => Ok(*v as f64),
            HostValue::I64(v) => Ok(*v as f64),
            HostValue::F32(v) => Ok(*v as f64),
            HostValue::F64(v) => Ok(*v),
            other => Err(HostException::argument(format!("expected a number, got {}", other.type_name()))),
        }
    }

    /// Numeric coercion to i32
    pub fn as_i32(&self) -> Result<i32, HostException> {
        match self {
            HostValue::I32(v) => Ok(*v),
            HostValue::I64(v) => Ok(*v as i32),
            other => Err(HostException::argument(format!("expected an int, got {}", other.type_name()))),
        }
    }

    /// Boolean access
    pub fn as_bool(&self) -> Result<bool, HostException> {
        match self {
            HostValue::Bool(v) => Ok(*v),
            other => Err(HostException::argument(format!("expected a boolean, got {}", other.type_name()))),
        }
    }

    /// Text access
    pub fn as_str(&self) -> Result<&str, HostException> {
        match self {
            HostValue::Str(v) => Ok(v),
            other => Err(HostException::argument(format!("expected a string, got {}", other.type_name()))),
        }
    }

    /// Object access
    pub fn as_object(&self) -> Result<&HostObject, HostException> {
        match self {
            HostValue::Object(v) => Ok(v),
            other => Err(HostException::argument(format!("expected an object, got {}", other.type_name()))),
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "null"),
            HostValue::Bool(v) => write!(f, "{}", v),
            HostValue::I32(v) => write!(f, "{}", v),
            HostValue::I64(v) => write!(f, "{}", v),
            HostValue::F32(v) => write!(f, "{}", v),
            HostValue::F64(v) => write!(f, "{}", v),
            HostValue::Str(v) => write!(f, "{}", v),
            HostValue::Object(v) => write!(f, "{}", v.describe()),
            HostValue::Type(v) => write!(f, "{:?}", v),
            HostValue::Script(v) => write!(f, "{}", v),
        }
    }
}

/// An immutable host-side sequence, used for `ARGS` and similar surfaces
pub struct ListData(pub Vec<HostValue>);

impl fmt::Display for ListData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}
