//! Interned type templates.
//!
//! Declared supertypes and type-parameter bounds are stored as immutable
//! templates in the frontend's own compact representation and only lowered
//! to session-stamped [`lyra_api::types::Type`] values on demand. Interning
//! deduplicates structurally equal templates and hands out small copyable
//! ids, so symbol records stay cheap to clone out of the store.

use dashmap::DashMap;
use lyra_api::types::{SymbolId, Variance};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Handle to an interned type template.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HirTypeId(pub u32);

/// Argument slot of a class template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HirProjection {
    Star,
    Argument { ty: HirTypeId, variance: Variance },
}

impl HirProjection {
    pub const fn invariant(ty: HirTypeId) -> Self {
        Self::Argument {
            ty,
            variance: Variance::Invariant,
        }
    }
}

/// Structural payload of one template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HirTypeData {
    Class {
        symbol: SymbolId,
        args: Vec<HirProjection>,
        nullable: bool,
    },
    TypeParameter {
        symbol: SymbolId,
        nullable: bool,
    },
    Dynamic,
}

impl HirTypeData {
    pub const fn class(symbol: SymbolId) -> Self {
        Self::Class {
            symbol,
            args: Vec::new(),
            nullable: false,
        }
    }

    pub const fn class_with_args(symbol: SymbolId, args: Vec<HirProjection>) -> Self {
        Self::Class {
            symbol,
            args,
            nullable: false,
        }
    }

    pub const fn parameter(symbol: SymbolId) -> Self {
        Self::TypeParameter {
            symbol,
            nullable: false,
        }
    }
}

/// Thread-safe append-only template interner: a dedup map over a backing
/// slab, ids stable for the interner's lifetime.
pub struct HirTypeInterner {
    map: DashMap<HirTypeData, HirTypeId, rustc_hash::FxBuildHasher>,
    data: RwLock<Vec<HirTypeData>>,
    next: AtomicU32,
}

impl Default for HirTypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl HirTypeInterner {
    pub fn new() -> Self {
        Self {
            map: DashMap::default(),
            data: RwLock::new(Vec::new()),
            next: AtomicU32::new(0),
        }
    }

    /// Intern a template, returning its stable id.
    pub fn intern(&self, template: HirTypeData) -> HirTypeId {
        if let Some(existing) = self.map.get(&template) {
            return *existing;
        }
        let entry = self.map.entry(template.clone()).or_insert_with(|| {
            let id = self.next.fetch_add(1, Ordering::SeqCst);
            let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
            debug_assert_eq!(data.len(), id as usize);
            data.push(template);
            HirTypeId(id)
        });
        *entry
    }

    /// Retrieve the payload of an interned template.
    pub fn get(&self, id: HirTypeId) -> Option<HirTypeData> {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        data.get(id.0 as usize).cloned()
    }

    /// Number of distinct interned templates.
    pub fn len(&self) -> usize {
        self.next.load(Ordering::SeqCst) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
