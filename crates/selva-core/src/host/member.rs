//! Member descriptors
//!
//! One `MemberDef` is produced per registered host member. The descriptor
//! carries everything the bridge needs to resolve overloads, filter
//! visibility, and dispatch: name, declaring type, parameter name/type tags,
//! flags, and the invoker closure.

use std::fmt;
use std::sync::Arc;

use crate::host::exception::HostException;
use crate::host::registry::HostType;
use crate::host::value::{HostObject, HostValue};

/// Field read invoker; static fields ignore the receiver
pub type FieldFn =
    Arc<dyn Fn(Option<&HostObject>) -> Result<HostValue, HostException> + Send + Sync>;

/// Method invoker; static methods ignore the receiver
pub type MethodFn =
    Arc<dyn Fn(Option<&HostObject>, &[HostValue]) -> Result<HostValue, HostException> + Send + Sync>;

/// Constructor invoker
pub type CtorFn = Arc<dyn Fn(&[HostValue]) -> Result<HostObject, HostException> + Send + Sync>;

/// The three member shapes the bridge can synthesize callables for
#[derive(Clone)]
pub enum MemberKind {
    /// A readable field
    Field(FieldFn),
    /// An invocable method
    Method(MethodFn),
    /// An instance constructor
    Constructor(CtorFn),
}

/// Declared visibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Visible everywhere
    Public,
    /// Visible within the declaring namespace
    Package,
    /// Visible to the declaring type only
    Private,
}

/// A named, typed parameter of a method or constructor
#[derive(Debug, Clone)]
pub struct Param {
    /// Host parameter name, reused verbatim as the script identifier
    pub name: String,
    /// Declared parameter type
    pub ty: HostType,
}

/// Descriptor of one reflected host member
#[derive(Clone)]
pub struct MemberDef {
    /// Member name
    pub name: String,
    /// Declaring host type
    pub declared_in: HostType,
    /// Parameter sequence; empty for fields
    pub params: Vec<Param>,
    /// Declared result type (field type for fields, declaring type for
    /// constructors)
    pub ret: HostType,
    /// Static/instance partition
    pub is_static: bool,
    /// Declared visibility
    pub visibility: Visibility,
    /// Deprecated members are excluded from candidacy
    pub deprecated: bool,
    /// Member shape and invoker
    pub kind: MemberKind,
}

impl MemberDef {
    /// Declared parameter count
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether this descriptor names a field
    pub fn is_field(&self) -> bool {
        matches!(self.kind, MemberKind::Field(_))
    }

    /// Whether this descriptor names a constructor
    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, MemberKind::Constructor(_))
    }

    /// Member shape tag for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            MemberKind::Field(_) => "field",
            MemberKind::Method(_) => "method",
            MemberKind::Constructor(_) => "constructor",
        }
    }
}

impl fmt::Debug for MemberDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDef")
            .field("name", &self.name)
            .field("kind", &self.kind_name())
            .field("declared_in", &self.declared_in)
            .field("arity", &self.arity())
            .field("is_static", &self.is_static)
            .finish()
    }
}
