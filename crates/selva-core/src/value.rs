//! Script value model
//!
//! The script universe has a single numeric representation (f64), text,
//! booleans, nil, and the three bridged object shapes: functions, classes,
//! and instances. Classes carry an explicit origin tag instead of encoding
//! host-backedness in the shape of their name; instances carry an
//! attach-once host backing so a constructor can bind the freshly built host
//! object to the receiver it was invoked on.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ast::{Bindings, FunctionDecl};
use crate::error::{RuntimeError, RuntimeResult};
use crate::host::member::MemberDef;
use crate::host::registry::HostType;
use crate::host::value::HostObject;

/// A script-universe value
#[derive(Clone)]
pub enum Value {
    /// The absent value
    Nil,
    /// Boolean
    Bool(bool),
    /// The single numeric representation
    Number(f64),
    /// Text
    Str(Arc<str>),
    /// A callable function or closure
    Function(Arc<Function>),
    /// A class object
    Class(Arc<Class>),
    /// An instance, pure or host-backed
    Instance(Arc<Instance>),
    /// A member descriptor smuggled through a synthesized fragment
    Member(Arc<MemberDef>),
}

impl Value {
    /// Build a text value
    pub fn str(s: impl AsRef<str>) -> Value {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Short tag name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Member(_) => "member",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Arc::ptr_eq(a, b),
            (Value::Member(a), Value::Member(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                // Integral rendering only inside the exactly-representable
                // integer range; beyond 2^53 the cast would lie.
                if n.is_finite() && *n == n.trunc() && n.abs() < 9_007_199_254_740_992.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Str(s) => write!(f, "{}", s),
            Value::Function(fun) => write!(f, "<fn {}>", fun.name),
            Value::Class(class) => write!(f, "{}", class.name),
            Value::Instance(instance) => write!(f, "{} instance", instance.class().name),
            Value::Member(member) => write!(f, "<member {}>", member.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self, self.type_name())
    }
}

/// Where a class came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassOrigin {
    /// Declared in script source
    Script,
    /// Synthesized from a reflected host type
    Host(HostType),
}

/// A script-visible class object
pub struct Class {
    /// Class name; host-backed classes use the qualified host type name
    pub name: String,
    /// Superclass link; the cached class of the host supertype when
    /// host-backed
    pub parent: Option<Arc<Class>>,
    /// Member name to callable, overloads already disambiguated
    pub methods: FxHashMap<String, Arc<Function>>,
    /// Origin tag deciding whether unwrap/convert operations are legal
    pub origin: ClassOrigin,
}

impl Class {
    /// Find a member, walking the superclass chain
    pub fn find_method(&self, name: &str) -> Option<Arc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.find_method(name))
    }

    /// The backing host type, when host-backed
    pub fn host_type(&self) -> Option<HostType> {
        match self.origin {
            ClassOrigin::Host(ty) => Some(ty),
            ClassOrigin::Script => None,
        }
    }
}

/// A script instance
pub struct Instance {
    class: Arc<Class>,
    fields: Mutex<FxHashMap<String, Value>>,
    host: OnceCell<HostObject>,
}

impl Instance {
    /// Create a pure script instance
    pub fn new(class: Arc<Class>) -> Arc<Instance> {
        Arc::new(Instance { class, fields: Mutex::new(FxHashMap::default()), host: OnceCell::new() })
    }

    /// Create an instance backed by an existing host object
    pub fn backed(class: Arc<Class>, object: HostObject) -> Arc<Instance> {
        Arc::new(Instance {
            class,
            fields: Mutex::new(FxHashMap::default()),
            host: OnceCell::with_value(object),
        })
    }

    /// The owning class
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Read a field
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.lock().get(name).cloned()
    }

    /// Write a field
    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.fields.lock().insert(name.into(), value);
    }

    /// The backing host object, when attached
    pub fn host_object(&self) -> Option<&HostObject> {
        self.host.get()
    }

    /// Attach the backing host object; legal exactly once per instance
    pub fn attach_host(&self, object: HostObject) -> RuntimeResult<()> {
        self.host
            .set(object)
            .map_err(|_| RuntimeError::Access(format!("{} is already host-backed", self.class.name)))
    }
}

/// Native callable signature
pub type NativeFn = Arc<dyn Fn(Vec<Value>) -> RuntimeResult<Value> + Send + Sync>;

/// How a function executes
pub enum FunctionKind {
    /// A callable implemented in the host language
    Native {
        /// Required argument count (minimum when variadic)
        arity: usize,
        /// Accept more arguments than `arity`
        variadic: bool,
        /// The callable itself
        f: NativeFn,
    },
    /// A declared (or synthesized) script function with its resolved
    /// binding table threaded alongside
    Declared {
        /// The declaration
        decl: Arc<FunctionDecl>,
        /// Scope-resolution table for the declaration's expressions
        bindings: Arc<Bindings>,
    },
}

/// A script-callable function value
pub struct Function {
    /// Function name as script code sees it
    pub name: String,
    pub(crate) kind: FunctionKind,
}

impl Function {
    /// Build a native callable with a fixed arity
    pub fn native(
        name: impl Into<String>,
        arity: usize,
        f: impl Fn(Vec<Value>) -> RuntimeResult<Value> + Send + Sync + 'static,
    ) -> Arc<Function> {
        Arc::new(Function {
            name: name.into(),
            kind: FunctionKind::Native { arity, variadic: false, f: Arc::new(f) },
        })
    }

    /// Build a native callable accepting `arity` or more arguments
    pub fn native_variadic(
        name: impl Into<String>,
        arity: usize,
        f: impl Fn(Vec<Value>) -> RuntimeResult<Value> + Send + Sync + 'static,
    ) -> Arc<Function> {
        Arc::new(Function {
            name: name.into(),
            kind: FunctionKind::Native { arity, variadic: true, f: Arc::new(f) },
        })
    }

    /// Build a declared function from a declaration and its binding table
    pub fn declared(decl: Arc<FunctionDecl>, bindings: Bindings) -> Arc<Function> {
        Arc::new(Function {
            name: decl.name.clone(),
            kind: FunctionKind::Declared { decl, bindings: Arc::new(bindings) },
        })
    }

    /// Declared parameter count
    pub fn arity(&self) -> usize {
        match &self.kind {
            FunctionKind::Native { arity, .. } => *arity,
            FunctionKind::Declared { decl, .. } => decl.params.len(),
        }
    }

    /// Whether the function body is a synthesized or frontend declaration
    pub fn is_declared(&self) -> bool {
        matches!(self.kind, FunctionKind::Declared { .. })
    }

    /// Whether this function is a constructor body
    pub fn is_initializer(&self) -> bool {
        match &self.kind {
            FunctionKind::Declared { decl, .. } => decl.is_initializer,
            FunctionKind::Native { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_display_like_script_literals() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(3.5).to_string(), "3.5");
        assert_eq!(Value::Number(-2.0).to_string(), "-2");
    }

    #[test]
    fn huge_integral_numbers_keep_the_float_rendering() {
        assert_eq!(Value::Number(1e300).to_string(), "1e300");
        assert_eq!(Value::Number(-1e300).to_string(), "-1e300");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "inf");
        // The largest exactly-representable integers still render as such.
        assert_eq!(Value::Number(9_007_199_254_740_991.0).to_string(), "9007199254740991");
    }

    #[test]
    fn equality_is_identity_for_reference_shapes() {
        let f = Function::native("id", 1, |mut args| Ok(args.remove(0)));
        assert_eq!(Value::Function(f.clone()), Value::Function(f.clone()));
        let g = Function::native("id", 1, |mut args| Ok(args.remove(0)));
        assert_ne!(Value::Function(f), Value::Function(g));
    }
}
