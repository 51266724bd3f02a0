//! Type metadata cache
//!
//! Computes, once per host type, the script-visible class descriptor:
//! instance fields, then instance methods, then the most specific
//! constructor under the reserved name `init` (later entries overwrite
//! earlier ones on collision, so a constructor shadows a same-named
//! method). A parallel cache produces the per-type static facade instance.
//!
//! Caching is compute-once, publish-once: no lock is held across the
//! recursive supertype computation, and when two callers race the first
//! published descriptor wins.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use selva_core::host::member::{MemberDef, MemberKind, Visibility};
use selva_core::host::registry::{HostType, TypeRegistry};
use selva_core::value::{Class, ClassOrigin, Function, Instance};

use crate::members;
use crate::synth;
use crate::Bridge;

impl Bridge {
    /// The cached script class for a host type, computing it on first use
    pub fn class_of(&self, ty: HostType) -> Arc<Class> {
        if let Some(class) = self.classes.get(&ty) {
            return class.clone();
        }
        let built = self.build_class(ty);
        self.classes.entry(ty).or_insert(built).clone()
    }

    /// The cached static facade instance for a host type
    ///
    /// Statics are not inherited in this model: the facade's class has no
    /// supertype link and gathers only the type's own static members.
    pub fn static_facade_of(&self, ty: HostType) -> Arc<Instance> {
        if let Some(instance) = self.statics.get(&ty) {
            return instance.clone();
        }
        let mut methods = FxHashMap::default();
        for (name, function) in self.gather_fields(ty, true) {
            methods.insert(name, function);
        }
        for (name, function) in self.gather_methods(ty, true) {
            methods.insert(name, function);
        }
        let class = Arc::new(Class {
            name: format!("{}$static", self.registry().name_of(ty)),
            parent: None,
            methods,
            origin: ClassOrigin::Host(ty),
        });
        let built = Instance::new(class);
        self.statics.entry(ty).or_insert(built).clone()
    }

    fn build_class(&self, ty: HostType) -> Arc<Class> {
        let parent = self.registry().superclass(ty).map(|superclass| self.class_of(superclass));

        let mut methods = FxHashMap::default();
        for (name, function) in self.gather_fields(ty, false) {
            methods.insert(name, function);
        }
        for (name, function) in self.gather_methods(ty, false) {
            methods.insert(name, function);
        }
        if let Some(init) = self.gather_init(ty) {
            methods.insert("init".to_string(), init);
        }

        Arc::new(Class {
            name: self.registry().name_of(ty),
            parent,
            methods,
            origin: ClassOrigin::Host(ty),
        })
    }

    fn gather_fields(&self, ty: HostType, is_static: bool) -> Vec<(String, Arc<Function>)> {
        self.registry()
            .members_of(ty)
            .into_iter()
            .filter(|m| m.is_field() && m.is_static == is_static && visible(self.registry(), m))
            .map(|m| (m.name.clone(), synth::synthesize(&m)))
            .collect()
    }

    fn gather_methods(&self, ty: HostType, is_static: bool) -> Vec<(String, Arc<Function>)> {
        let reg = self.registry();

        let mut candidates: Vec<Arc<MemberDef>> = Vec::new();
        if !is_static {
            // Contract methods come first so a declared override wins the
            // declaring-type comparison during reduction.
            for contract in reg.contracts_of(ty) {
                collect_contract_methods(reg, contract, &mut candidates);
            }
        }
        candidates.extend(reg.members_of(ty));

        let mut groups: FxHashMap<String, FxHashMap<usize, Arc<MemberDef>>> = FxHashMap::default();
        for member in candidates {
            if !matches!(member.kind, MemberKind::Method(_))
                || member.is_static != is_static
                || member.deprecated
                || !visible(reg, &member)
            {
                continue;
            }
            let overloads = groups.entry(member.name.clone()).or_default();
            let arity = member.arity();
            let merged = match overloads.remove(&arity) {
                Some(existing) => members::more_specific(reg, member, existing),
                None => member,
            };
            overloads.insert(arity, merged);
        }

        let mut out = Vec::new();
        for (name, overloads) in groups {
            for (member_name, member) in members::disambiguate(&name, overloads) {
                out.push((member_name, synth::synthesize(&member)));
            }
        }
        out
    }

    fn gather_init(&self, ty: HostType) -> Option<Arc<Function>> {
        let reg = self.registry();
        let ctors: Vec<Arc<MemberDef>> = reg
            .members_of(ty)
            .into_iter()
            .filter(|m| m.is_constructor() && !m.deprecated && visible(reg, m))
            .collect();
        members::select_constructor(reg, ctors).map(|m| synth::synthesize(&m))
    }
}

fn collect_contract_methods(reg: &TypeRegistry, contract: HostType, out: &mut Vec<Arc<MemberDef>>) {
    for inherited in reg.contracts_of(contract) {
        collect_contract_methods(reg, inherited, out);
    }
    out.extend(reg.members_of(contract));
}

/// Best-effort visibility filter; not a trust boundary
fn visible(reg: &TypeRegistry, member: &MemberDef) -> bool {
    (reg.is_public(member.declared_in) && member.visibility == Visibility::Public)
        || (reg.is_trusted(member.declared_in)
            && (member.is_field() || member.visibility != Visibility::Private))
}
