//! Most-specific member selection
//!
//! Overloaded host members sharing a name are reduced pairwise to a single
//! winner per arity with a deterministic total order; surviving arities are
//! then either collapsed to the plain name or suffixed with their arity.
//!
//! The order, applied in sequence:
//! 1. larger parameter count wins outright;
//! 2. equal arity: at the first position where the parameter types differ,
//!    the narrower (subtype) parameter wins; unrelated types fall back to
//!    lexicographic comparison of the type names, a stable if arbitrary
//!    order;
//! 3. identical signatures: the narrower declaring type wins (an override
//!    closer to the concrete type);
//! 4. unrelated declaring types break the tie lexicographically.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use selva_core::host::member::MemberDef;
use selva_core::host::registry::TypeRegistry;

/// Pick the member that wins when both candidates are visible
pub fn more_specific(
    reg: &TypeRegistry,
    candidate: Arc<MemberDef>,
    existing: Arc<MemberDef>,
) -> Arc<MemberDef> {
    if existing.arity() > candidate.arity() {
        return existing;
    }
    if existing.arity() < candidate.arity() {
        return candidate;
    }

    for (cp, ep) in candidate.params.iter().zip(existing.params.iter()) {
        if cp.ty == ep.ty {
            continue;
        }
        if reg.is_assignable(cp.ty, ep.ty) {
            return existing;
        }
        if reg.is_assignable(ep.ty, cp.ty) {
            return candidate;
        }
        return if reg.name_of(cp.ty) > reg.name_of(ep.ty) { candidate } else { existing };
    }

    if candidate.declared_in == existing.declared_in {
        return existing;
    }
    if reg.is_assignable(candidate.declared_in, existing.declared_in) {
        return existing;
    }
    if reg.is_assignable(existing.declared_in, candidate.declared_in) {
        return candidate;
    }
    // Same name and signature from two unrelated declarers; picking either
    // is sound as long as the pick is stable.
    if reg.name_of(candidate.declared_in) > reg.name_of(existing.declared_in) {
        candidate
    } else {
        existing
    }
}

/// Reduce all constructor candidates to the single most specific one
pub fn select_constructor(
    reg: &TypeRegistry,
    ctors: Vec<Arc<MemberDef>>,
) -> Option<Arc<MemberDef>> {
    ctors.into_iter().reduce(|existing, candidate| more_specific(reg, candidate, existing))
}

/// Overload-grouping policy: one arity keeps the plain name, several
/// surviving arities get the arity appended
pub fn disambiguate(
    name: &str,
    overloads: FxHashMap<usize, Arc<MemberDef>>,
) -> Vec<(String, Arc<MemberDef>)> {
    if overloads.len() == 1 {
        overloads.into_values().map(|m| (name.to_string(), m)).collect()
    } else {
        overloads
            .into_iter()
            .map(|(arity, m)| (format!("{}{}", name, arity), m))
            .collect()
    }
}
