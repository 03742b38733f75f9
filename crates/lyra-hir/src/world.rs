//! Shared-state bundle for one hir compilation world.

use crate::cache::HirTypeCache;
use crate::facade::HirTypeFacade;
use crate::intern::{HirProjection, HirTypeData, HirTypeId, HirTypeInterner};
use crate::symbols::{ClassInfo, SymbolStore, TypeParameterInfo};
use lyra_api::types::SymbolId;
use lyra_common::interner::Interner;
use lyra_session::{SessionRegistry, SessionToken, StopWorldCleaner};
use std::sync::Arc;

/// Everything a hir frontend shares across sessions: name and template
/// interners, the symbol store, the type cache, and the session registry.
/// Facades are per-session views over this state.
pub struct HirWorld {
    pub names: Arc<Interner>,
    pub types: Arc<HirTypeInterner>,
    pub store: Arc<SymbolStore>,
    pub cache: Arc<HirTypeCache>,
    pub registry: Arc<SessionRegistry>,
}

impl Default for HirWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl HirWorld {
    pub fn new() -> Self {
        Self {
            names: Arc::new(Interner::new()),
            types: Arc::new(HirTypeInterner::new()),
            store: Arc::new(SymbolStore::new()),
            cache: Arc::new(HirTypeCache::new()),
            registry: Arc::new(SessionRegistry::new()),
        }
    }

    /// Register a classifier with fresh type parameters named `param_names`.
    pub fn declare_class(&self, qualified_name: &str, param_names: &[&str]) -> SymbolId {
        let params = param_names
            .iter()
            .map(|name| {
                self.store
                    .register_type_parameter(TypeParameterInfo::new(self.names.intern(name)))
            })
            .collect();
        self.store.register_class(
            ClassInfo::new(self.names.intern(qualified_name)).with_type_params(params),
        )
    }

    pub fn class_template(&self, symbol: SymbolId, args: Vec<HirProjection>) -> HirTypeId {
        self.types.intern(HirTypeData::class_with_args(symbol, args))
    }

    pub fn parameter_template(&self, symbol: SymbolId) -> HirTypeId {
        self.types.intern(HirTypeData::parameter(symbol))
    }

    /// Open a new session and return its facade.
    pub fn facade(&self) -> HirTypeFacade {
        self.facade_for(self.registry.create_session())
    }

    pub fn facade_for(&self, session: SessionToken) -> HirTypeFacade {
        HirTypeFacade::new(
            session,
            Arc::clone(&self.names),
            Arc::clone(&self.types),
            Arc::clone(&self.store),
            Arc::clone(&self.cache),
        )
    }

    /// Stop-world cleaner wired to this world's cache and sessions.
    pub fn cleaner(&self) -> StopWorldCleaner {
        StopWorldCleaner::new(Arc::clone(&self.cache) as _, Arc::clone(&self.registry))
    }
}
