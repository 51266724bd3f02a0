//! Host capability registry
//!
//! The reflected host runtime is reached through an explicit registry rather
//! than live introspection: every host type is declared once at start-up as a
//! table of member descriptors with invoker closures. The bridge treats this
//! module the way the original treats the host runtime's reflective surface:
//! as an opaque "invoke member / construct instance / type-of" collaborator.

pub mod exception;
pub mod member;
pub mod registry;
pub mod value;

pub use exception::{ExceptionKind, HostException};
pub use member::{MemberDef, MemberKind, Param, Visibility};
pub use registry::{Builtins, HostType, HostTypeBuilder, RegistryError, TypeKind, TypeRegistry};
pub use value::{invoke_contract, ContractObject, HostData, HostObject, HostValue, ListData};
