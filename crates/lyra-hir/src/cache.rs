//! Session-lifetime type caches, wired into stop-world cleanup.

use dashmap::DashMap;
use lyra_api::types::{SymbolId, Type, TypeKind};
use lyra_session::{CacheInvalidator, SessionToken};
use std::sync::Mutex;
use tracing::debug;

/// Caches the per-symbol default instantiation and the session's dynamic
/// type. Entries are stamped with the session that built them, so a cleanup
/// only needs to drop them wholesale; anything missed would fail its own
/// validity check anyway.
#[derive(Default)]
pub struct HirTypeCache {
    defaults: DashMap<SymbolId, Type, rustc_hash::FxBuildHasher>,
    dynamic: Mutex<Option<Type>>,
}

impl HirTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_instantiation(&self, symbol: SymbolId, session: &SessionToken) -> Option<Type> {
        let cached = self.defaults.get(&symbol)?;
        // A cached value from an earlier session is stale even if cleanup
        // has not run yet.
        (cached.session() == session).then(|| cached.clone())
    }

    pub fn insert_default_instantiation(&self, symbol: SymbolId, ty: Type) {
        self.defaults.insert(symbol, ty);
    }

    /// The session's dynamic type, built once per session.
    pub fn dynamic(&self, session: &SessionToken) -> Type {
        let mut slot = self.dynamic.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = slot.as_ref()
            && cached.session() == session
        {
            return cached.clone();
        }
        let ty = Type::new(session.clone(), TypeKind::Dynamic);
        *slot = Some(ty.clone());
        ty
    }

    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }
}

impl CacheInvalidator for HirTypeCache {
    fn invalidate(&self) {
        debug!(entries = self.defaults.len(), "HirTypeCache::invalidate");
        self.defaults.clear();
        let mut slot = self.dynamic.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}
