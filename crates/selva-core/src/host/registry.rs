//! The capability registry standing in for host-runtime reflection
//!
//! Host types are declared once, at start-up, as tables of member
//! descriptors with invoker closures. The registry owns the type graph
//! (superclass links, implemented contracts) and answers the assignability
//! questions that overload resolution, marshalling, and rescue matching all
//! depend on.
//!
//! A small set of builtin types under the bridge's own trusted
//! `selva.lang` namespace models the script universe itself (numbers,
//! strings, functions, ...) plus the primitive narrowing targets
//! (`int`, `long`, `float`, `double`, `boolean`).

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::host::exception::HostException;
use crate::host::member::{CtorFn, FieldFn, MemberDef, MemberKind, MethodFn, Param, Visibility};
use crate::host::value::{invoke_contract, HostObject, HostValue, ListData};

/// Namespace prefix of types the bridge itself trusts
pub const TRUSTED_NAMESPACE: &str = "selva.lang.";

/// Opaque handle to a registered host type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostType(u32);

/// Shape of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// An ordinary instantiable type
    Class,
    /// A behavioral contract (single or multi-method interface)
    Contract,
    /// A primitive narrowing target
    Primitive,
}

/// Registration failures
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A type with the same qualified name already exists
    #[error("host type '{0}' is already registered")]
    Duplicate(String),
}

struct TypeDef {
    name: String,
    superclass: Option<HostType>,
    contracts: Vec<HostType>,
    kind: TypeKind,
    public: bool,
    members: Vec<Arc<MemberDef>>,
}

#[derive(Default)]
struct Inner {
    types: Vec<TypeDef>,
    by_name: FxHashMap<String, HostType>,
}

impl Inner {
    fn def(&self, ty: HostType) -> &TypeDef {
        &self.types[ty.0 as usize]
    }

    fn insert(&mut self, builder: HostTypeBuilder) -> HostType {
        let ty = HostType(self.types.len() as u32);
        let members = builder
            .members
            .into_iter()
            .map(|draft| {
                // Constructors produce the declaring type; the id is only
                // known here.
                let ret = if matches!(draft.kind, MemberKind::Constructor(_)) { ty } else { draft.ret };
                Arc::new(MemberDef {
                    name: draft.name,
                    declared_in: ty,
                    params: draft.params,
                    ret,
                    is_static: draft.is_static,
                    visibility: draft.visibility,
                    deprecated: draft.deprecated,
                    kind: draft.kind,
                })
            })
            .collect();
        self.by_name.insert(builder.name.clone(), ty);
        self.types.push(TypeDef {
            name: builder.name,
            superclass: builder.superclass,
            contracts: builder.contracts,
            kind: builder.kind,
            public: builder.public,
            members,
        });
        ty
    }

    fn is_assignable(&self, to: HostType, from: HostType) -> bool {
        if to == from {
            return true;
        }
        let def = self.def(from);
        if let Some(superclass) = def.superclass {
            if self.is_assignable(to, superclass) {
                return true;
            }
        }
        def.contracts.iter().any(|&c| self.is_assignable(to, c))
    }

    fn contract_method(&self, ty: HostType, name: &str) -> Option<Arc<MemberDef>> {
        let def = self.def(ty);
        let found = def
            .members
            .iter()
            .find(|m| m.name == name && matches!(m.kind, MemberKind::Method(_)))
            .cloned();
        found.or_else(|| def.contracts.iter().find_map(|&c| self.contract_method(c, name)))
    }
}

/// Well-known types every registry carries
pub struct Builtins {
    /// Universal supertype; everything is assignable to it
    pub any: HostType,
    /// Absent-result tag for methods returning nothing
    pub void: HostType,
    /// 32-bit integer narrowing target
    pub int: HostType,
    /// 64-bit integer narrowing target
    pub long: HostType,
    /// 32-bit float narrowing target
    pub float: HostType,
    /// 64-bit float target (the script numeric width)
    pub double: HostType,
    /// Boolean primitive target
    pub boolean: HostType,
    /// Host type of script numbers
    pub number: HostType,
    /// Host type of script text
    pub string: HostType,
    /// Host type of script booleans
    pub bool_class: HostType,
    /// Host type of script functions
    pub function: HostType,
    /// Host type of script classes
    pub class_type: HostType,
    /// Host type of the nil value
    pub nil: HostType,
    /// Host type of pure script instances
    pub instance: HostType,
    /// Host type of member descriptors
    pub member: HostType,
    /// Root of the rescuable host exception hierarchy
    pub exception: HostType,
    /// Immutable host-side sequence (`ARGS` and friends)
    pub list: HostType,
    /// Opaque parsed-program payload produced by `parse`
    pub program: HostType,
    /// Opaque binding-table payload produced by `resolve`
    pub bindings: HostType,
}

/// The process-lifetime table of reflected host types
pub struct TypeRegistry {
    inner: RwLock<Inner>,
    builtins: Builtins,
}

impl TypeRegistry {
    /// Create a registry pre-populated with the `selva.lang` builtins
    pub fn with_builtins() -> Arc<TypeRegistry> {
        let mut inner = Inner::default();

        let any = inner.insert(HostTypeBuilder::class("selva.lang.Any"));
        let void = inner.insert(HostTypeBuilder::primitive("void"));
        let int = inner.insert(HostTypeBuilder::primitive("int"));
        let long = inner.insert(HostTypeBuilder::primitive("long"));
        let float = inner.insert(HostTypeBuilder::primitive("float"));
        let double = inner.insert(HostTypeBuilder::primitive("double"));
        let boolean = inner.insert(HostTypeBuilder::primitive("boolean"));

        let number = inner.insert(HostTypeBuilder::class("selva.lang.Number").extends(any));
        let string = inner.insert(HostTypeBuilder::class("selva.lang.String").extends(any));
        let bool_class = inner.insert(HostTypeBuilder::class("selva.lang.Boolean").extends(any));
        let function = inner.insert(HostTypeBuilder::class("selva.lang.Function").extends(any));
        let class_type = inner.insert(HostTypeBuilder::class("selva.lang.Class").extends(any));
        let nil = inner.insert(HostTypeBuilder::class("selva.lang.Nil").extends(any));
        let instance = inner.insert(HostTypeBuilder::class("selva.lang.Instance").extends(any));
        let member = inner.insert(HostTypeBuilder::class("selva.lang.Member").extends(any));
        let exception = inner.insert(HostTypeBuilder::class("selva.lang.Exception").extends(any));

        let list = inner.insert(
            HostTypeBuilder::class("selva.lang.List")
                .extends(any)
                .method("size", &[], int, |recv, _args| {
                    let list = expect_list(recv)?;
                    Ok(HostValue::I32(list.0.len() as i32))
                })
                .method("get", &[("index", int)], any, move |recv, args| {
                    let list = expect_list(recv)?;
                    let index = args[0].as_i32()?;
                    list.0
                        .get(index as usize)
                        .cloned()
                        .ok_or_else(|| HostException::argument(format!("index {} out of bounds", index)))
                }),
        );
        let program = inner.insert(HostTypeBuilder::class("selva.lang.Program").extends(any));
        let bindings = inner.insert(HostTypeBuilder::class("selva.lang.Bindings").extends(any));

        let builtins = Builtins {
            any,
            void,
            int,
            long,
            float,
            double,
            boolean,
            number,
            string,
            bool_class,
            function,
            class_type,
            nil,
            instance,
            member,
            exception,
            list,
            program,
            bindings,
        };
        Arc::new(TypeRegistry { inner: RwLock::new(inner), builtins })
    }

    /// The well-known builtin type handles
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Register a new host type; at-most-once per qualified name
    pub fn declare(&self, builder: HostTypeBuilder) -> Result<HostType, RegistryError> {
        let mut inner = self.inner.write();
        if inner.by_name.contains_key(&builder.name) {
            return Err(RegistryError::Duplicate(builder.name));
        }
        Ok(inner.insert(builder))
    }

    /// Look up a type by qualified name
    pub fn lookup(&self, name: &str) -> Option<HostType> {
        self.inner.read().by_name.get(name).copied()
    }

    /// Qualified name of a type
    pub fn name_of(&self, ty: HostType) -> String {
        self.inner.read().def(ty).name.clone()
    }

    /// Superclass link, if any
    pub fn superclass(&self, ty: HostType) -> Option<HostType> {
        self.inner.read().def(ty).superclass
    }

    /// Contracts the type implements (or extends, for contracts)
    pub fn contracts_of(&self, ty: HostType) -> Vec<HostType> {
        self.inner.read().def(ty).contracts.clone()
    }

    /// Shape of a type
    pub fn kind_of(&self, ty: HostType) -> TypeKind {
        self.inner.read().def(ty).kind
    }

    /// Whether the type is a behavioral contract
    pub fn is_contract(&self, ty: HostType) -> bool {
        self.kind_of(ty) == TypeKind::Contract
    }

    /// Whether the type itself is public
    pub fn is_public(&self, ty: HostType) -> bool {
        self.inner.read().def(ty).public
    }

    /// Whether the type belongs to the bridge's trusted namespace
    pub fn is_trusted(&self, ty: HostType) -> bool {
        self.inner.read().def(ty).name.starts_with(TRUSTED_NAMESPACE)
    }

    /// Members declared directly on the type
    pub fn members_of(&self, ty: HostType) -> Vec<Arc<MemberDef>> {
        self.inner.read().def(ty).members.clone()
    }

    /// Whether a value of type `from` is acceptable where `to` is expected
    pub fn is_assignable(&self, to: HostType, from: HostType) -> bool {
        if to == from || to == self.builtins.any {
            return true;
        }
        self.inner.read().is_assignable(to, from)
    }

    /// Find a contract method signature by name, searching super-contracts
    pub fn contract_method(&self, ty: HostType, name: &str) -> Option<Arc<MemberDef>> {
        self.inner.read().contract_method(ty, name)
    }
}

fn expect_list(recv: Option<&HostObject>) -> Result<&ListData, HostException> {
    recv.and_then(|obj| obj.downcast::<ListData>())
        .ok_or_else(|| HostException::argument("receiver is not a list"))
}

struct MemberDraft {
    name: String,
    params: Vec<Param>,
    ret: HostType,
    is_static: bool,
    visibility: Visibility,
    deprecated: bool,
    kind: MemberKind,
}

/// Fluent declaration of one host type
pub struct HostTypeBuilder {
    name: String,
    superclass: Option<HostType>,
    contracts: Vec<HostType>,
    kind: TypeKind,
    public: bool,
    members: Vec<MemberDraft>,
}

impl HostTypeBuilder {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        HostTypeBuilder {
            name: name.into(),
            superclass: None,
            contracts: Vec::new(),
            kind,
            public: true,
            members: Vec::new(),
        }
    }

    /// Start declaring an ordinary class
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Start declaring a behavioral contract
    pub fn contract(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Contract)
    }

    /// Start declaring a primitive narrowing target
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Primitive)
    }

    /// Set the superclass link
    pub fn extends(mut self, superclass: HostType) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Add an implemented (or extended) contract
    pub fn implements(mut self, contract: HostType) -> Self {
        self.contracts.push(contract);
        self
    }

    /// Mark the type itself as non-public
    pub fn internal(mut self) -> Self {
        self.public = false;
        self
    }

    fn push_member(
        mut self,
        name: &str,
        params: &[(&str, HostType)],
        ret: HostType,
        is_static: bool,
        visibility: Visibility,
        deprecated: bool,
        kind: MemberKind,
    ) -> Self {
        self.members.push(MemberDraft {
            name: name.to_string(),
            params: params
                .iter()
                .map(|(n, ty)| Param { name: (*n).to_string(), ty: *ty })
                .collect(),
            ret,
            is_static,
            visibility,
            deprecated,
            kind,
        });
        self
    }

    /// Declare a public instance field
    pub fn field<F>(self, name: &str, ty: HostType, f: F) -> Self
    where
        F: Fn(Option<&HostObject>) -> Result<HostValue, HostException> + Send + Sync + 'static,
    {
        let f: FieldFn = Arc::new(f);
        self.push_member(name, &[], ty, false, Visibility::Public, false, MemberKind::Field(f))
    }

    /// Declare a public static field
    pub fn static_field<F>(self, name: &str, ty: HostType, f: F) -> Self
    where
        F: Fn(Option<&HostObject>) -> Result<HostValue, HostException> + Send + Sync + 'static,
    {
        let f: FieldFn = Arc::new(f);
        self.push_member(name, &[], ty, true, Visibility::Public, false, MemberKind::Field(f))
    }

    /// Declare a private instance field
    pub fn private_field<F>(self, name: &str, ty: HostType, f: F) -> Self
    where
        F: Fn(Option<&HostObject>) -> Result<HostValue, HostException> + Send + Sync + 'static,
    {
        let f: FieldFn = Arc::new(f);
        self.push_member(name, &[], ty, false, Visibility::Private, false, MemberKind::Field(f))
    }

    /// Declare a public instance method
    pub fn method<F>(self, name: &str, params: &[(&str, HostType)], ret: HostType, f: F) -> Self
    where
        F: Fn(Option<&HostObject>, &[HostValue]) -> Result<HostValue, HostException>
            + Send
            + Sync
            + 'static,
    {
        let f: MethodFn = Arc::new(f);
        self.push_member(name, params, ret, false, Visibility::Public, false, MemberKind::Method(f))
    }

    /// Declare a public static method
    pub fn static_method<F>(self, name: &str, params: &[(&str, HostType)], ret: HostType, f: F) -> Self
    where
        F: Fn(Option<&HostObject>, &[HostValue]) -> Result<HostValue, HostException>
            + Send
            + Sync
            + 'static,
    {
        let f: MethodFn = Arc::new(f);
        self.push_member(name, params, ret, true, Visibility::Public, false, MemberKind::Method(f))
    }

    /// Declare a private instance method
    pub fn private_method<F>(self, name: &str, params: &[(&str, HostType)], ret: HostType, f: F) -> Self
    where
        F: Fn(Option<&HostObject>, &[HostValue]) -> Result<HostValue, HostException>
            + Send
            + Sync
            + 'static,
    {
        let f: MethodFn = Arc::new(f);
        self.push_member(name, params, ret, false, Visibility::Private, false, MemberKind::Method(f))
    }

    /// Declare a deprecated public instance method
    pub fn deprecated_method<F>(
        self,
        name: &str,
        params: &[(&str, HostType)],
        ret: HostType,
        f: F,
    ) -> Self
    where
        F: Fn(Option<&HostObject>, &[HostValue]) -> Result<HostValue, HostException>
            + Send
            + Sync
            + 'static,
    {
        let f: MethodFn = Arc::new(f);
        self.push_member(name, params, ret, false, Visibility::Public, true, MemberKind::Method(f))
    }

    /// Declare a contract method signature; invocation dispatches to the
    /// receiver's contract adapter
    pub fn abstract_method(self, name: &str, params: &[(&str, HostType)], ret: HostType) -> Self {
        let method_name = name.to_string();
        let f: MethodFn = Arc::new(move |recv, args| {
            let obj = recv
                .ok_or_else(|| HostException::argument(format!("abstract method {} needs a receiver", method_name)))?;
            invoke_contract(obj, &method_name, args.to_vec())
        });
        self.push_member(name, params, ret, false, Visibility::Public, false, MemberKind::Method(f))
    }

    /// Declare a public constructor
    pub fn ctor<F>(self, params: &[(&str, HostType)], f: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostObject, HostException> + Send + Sync + 'static,
    {
        let f: CtorFn = Arc::new(f);
        // The result type slot is overwritten with the declaring type at
        // registration.
        let placeholder = HostType(0);
        self.push_member("init", params, placeholder, false, Visibility::Public, false, MemberKind::Constructor(f))
    }

    /// Declare a deprecated public constructor
    pub fn deprecated_ctor<F>(self, params: &[(&str, HostType)], f: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostObject, HostException> + Send + Sync + 'static,
    {
        let f: CtorFn = Arc::new(f);
        let placeholder = HostType(0);
        self.push_member("init", params, placeholder, false, Visibility::Public, true, MemberKind::Constructor(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_trusted_and_public() {
        let registry = TypeRegistry::with_builtins();
        let b = registry.builtins();
        assert!(registry.is_trusted(b.list));
        assert!(registry.is_public(b.list));
        assert!(!registry.is_trusted(b.int));
    }

    #[test]
    fn assignability_walks_superclass_chain_and_contracts() {
        let registry = TypeRegistry::with_builtins();
        let b = registry.builtins();
        let shape = registry.declare(HostTypeBuilder::class("demo.Shape").extends(b.any)).unwrap();
        let printable = registry.declare(HostTypeBuilder::contract("demo.Printable")).unwrap();
        let circle = registry
            .declare(HostTypeBuilder::class("demo.Circle").extends(shape).implements(printable))
            .unwrap();

        assert!(registry.is_assignable(shape, circle));
        assert!(registry.is_assignable(printable, circle));
        assert!(registry.is_assignable(b.any, circle));
        assert!(!registry.is_assignable(circle, shape));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = TypeRegistry::with_builtins();
        registry.declare(HostTypeBuilder::class("demo.Once")).unwrap();
        assert!(registry.declare(HostTypeBuilder::class("demo.Once")).is_err());
    }
}
