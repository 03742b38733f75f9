//! Symbol records and the store that allocates their ids.

use crate::intern::HirTypeId;
use dashmap::DashMap;
use lyra_api::types::SymbolId;
use lyra_common::interner::Atom;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::trace;

/// Global counter for assigning unique instance ids to `SymbolStore`
/// instances. Used for debugging id collisions across stores.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Record of a declared classifier.
#[derive(Clone, Debug)]
pub struct ClassInfo {
    /// Interned qualified name.
    pub name: Atom,
    /// Declared type parameters, in declaration order.
    pub type_params: Vec<SymbolId>,
    /// Declared supertype templates, written in terms of `type_params`.
    pub supertypes: Vec<HirTypeId>,
}

impl ClassInfo {
    pub const fn new(name: Atom) -> Self {
        Self {
            name,
            type_params: Vec::new(),
            supertypes: Vec::new(),
        }
    }

    pub fn with_type_params(mut self, params: Vec<SymbolId>) -> Self {
        self.type_params = params;
        self
    }

    pub fn with_supertypes(mut self, supertypes: Vec<HirTypeId>) -> Self {
        self.supertypes = supertypes;
        self
    }
}

/// Record of a declared type parameter.
#[derive(Clone, Debug)]
pub struct TypeParameterInfo {
    pub name: Atom,
    /// Declared upper-bound templates.
    pub bounds: Vec<HirTypeId>,
}

impl TypeParameterInfo {
    pub const fn new(name: Atom) -> Self {
        Self {
            name,
            bounds: Vec::new(),
        }
    }

    pub fn with_bounds(mut self, bounds: Vec<HirTypeId>) -> Self {
        self.bounds = bounds;
        self
    }
}

#[derive(Clone, Debug)]
pub enum SymbolInfo {
    Class(ClassInfo),
    TypeParameter(TypeParameterInfo),
}

/// Thread-safe storage for symbol records.
///
/// Uses `DashMap` for concurrent access from multiple analysis threads; ids
/// are allocated sequentially per store.
pub struct SymbolStore {
    /// Unique instance id for debugging (tracks which store an id came from).
    instance_id: u64,
    symbols: DashMap<SymbolId, SymbolInfo, rustc_hash::FxBuildHasher>,
    /// Qualified-name index for classifiers.
    by_name: DashMap<Atom, SymbolId, rustc_hash::FxBuildHasher>,
    next_id: AtomicU32,
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolStore {
    pub fn new() -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        trace!(instance_id, "SymbolStore::new");
        Self {
            instance_id,
            symbols: DashMap::default(),
            by_name: DashMap::default(),
            next_id: AtomicU32::new(SymbolId::FIRST_VALID),
        }
    }

    fn allocate(&self) -> SymbolId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        trace!(
            instance_id = self.instance_id,
            allocated = id,
            "SymbolStore::allocate"
        );
        SymbolId(id)
    }

    /// Register a classifier and index it by qualified name.
    pub fn register_class(&self, info: ClassInfo) -> SymbolId {
        let id = self.allocate();
        trace!(
            instance_id = self.instance_id,
            symbol = id.0,
            name = info.name.0,
            "SymbolStore::register_class"
        );
        self.by_name.insert(info.name, id);
        self.symbols.insert(id, SymbolInfo::Class(info));
        id
    }

    pub fn register_type_parameter(&self, info: TypeParameterInfo) -> SymbolId {
        let id = self.allocate();
        trace!(
            instance_id = self.instance_id,
            symbol = id.0,
            "SymbolStore::register_type_parameter"
        );
        self.symbols.insert(id, SymbolInfo::TypeParameter(info));
        id
    }

    /// Replace a classifier's declared supertypes. Declarations register in
    /// two phases because supertype templates may reference classifiers
    /// registered later.
    pub fn set_supertypes(&self, id: SymbolId, supertypes: Vec<HirTypeId>) {
        if let Some(mut entry) = self.symbols.get_mut(&id)
            && let SymbolInfo::Class(info) = entry.value_mut()
        {
            info.supertypes = supertypes;
        }
    }

    /// Replace a type parameter's declared bounds.
    pub fn set_bounds(&self, id: SymbolId, bounds: Vec<HirTypeId>) {
        if let Some(mut entry) = self.symbols.get_mut(&id)
            && let SymbolInfo::TypeParameter(info) = entry.value_mut()
        {
            info.bounds = bounds;
        }
    }

    pub fn get(&self, id: SymbolId) -> Option<SymbolInfo> {
        self.symbols.get(&id).map(|r| r.clone())
    }

    pub fn class_info(&self, id: SymbolId) -> Option<ClassInfo> {
        match self.get(id) {
            Some(SymbolInfo::Class(info)) => Some(info),
            _ => None,
        }
    }

    pub fn type_parameter_info(&self, id: SymbolId) -> Option<TypeParameterInfo> {
        match self.get(id) {
            Some(SymbolInfo::TypeParameter(info)) => Some(info),
            _ => None,
        }
    }

    /// Look up a classifier by its interned qualified name.
    pub fn resolve_name(&self, name: Atom) -> Option<SymbolId> {
        self.by_name.get(&name).map(|r| *r)
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.symbols.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Remove every record. Used by stop-world cleanup in worlds that
    /// rebuild their declarations per analysis epoch.
    pub fn clear(&self) {
        trace!(instance_id = self.instance_id, "SymbolStore::clear");
        self.symbols.clear();
        self.by_name.clear();
    }
}

#[cfg(test)]
#[path = "../tests/symbols_tests.rs"]
mod tests;
