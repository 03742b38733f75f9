//! Descriptor-tree declaration world.
//!
//! Unlike the hir frontend, nothing here is interned: declarations are
//! `Arc`-shared descriptor nodes that reference each other directly, and
//! supertype/bound templates hold descriptor pointers rather than ids.
//! Descriptors freeze after declaration completes (`OnceLock` slots), so
//! they are safe to share across analysis threads.

use dashmap::DashMap;
use lyra_api::types::{SymbolId, Type, TypeKind, Variance};
use lyra_session::{CacheInvalidator, SessionRegistry, SessionToken};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, trace};

/// Declared type parameter of a classifier.
pub struct TypeParameterDescriptor {
    pub symbol: SymbolId,
    pub name: Arc<str>,
    bounds: OnceLock<Vec<DescTemplate>>,
}

impl TypeParameterDescriptor {
    pub fn bounds(&self) -> &[DescTemplate] {
        self.bounds.get().map_or(&[], Vec::as_slice)
    }

    /// Freeze the declared bounds. A second call is ignored.
    pub fn set_bounds(&self, bounds: Vec<DescTemplate>) {
        let _ = self.bounds.set(bounds);
    }
}

/// Declared classifier.
pub struct ClassDescriptor {
    pub symbol: SymbolId,
    pub class_id: lyra_api::types::ClassId,
    pub type_parameters: Vec<Arc<TypeParameterDescriptor>>,
    supertypes: OnceLock<Vec<DescTemplate>>,
}

impl ClassDescriptor {
    pub fn supertypes(&self) -> &[DescTemplate] {
        self.supertypes.get().map_or(&[], Vec::as_slice)
    }

    /// Freeze the declared supertypes. A second call is ignored.
    pub fn set_supertypes(&self, supertypes: Vec<DescTemplate>) {
        let _ = self.supertypes.set(supertypes);
    }
}

/// Declaration-side type reference, written in terms of descriptors.
#[derive(Clone)]
pub enum DescTemplate {
    Class {
        class: Arc<ClassDescriptor>,
        args: Vec<DescArg>,
        nullable: bool,
    },
    Parameter {
        parameter: Arc<TypeParameterDescriptor>,
        nullable: bool,
    },
}

impl DescTemplate {
    pub fn class(class: &Arc<ClassDescriptor>) -> Self {
        Self::Class {
            class: Arc::clone(class),
            args: Vec::new(),
            nullable: false,
        }
    }

    pub fn class_with_args(class: &Arc<ClassDescriptor>, args: Vec<DescArg>) -> Self {
        Self::Class {
            class: Arc::clone(class),
            args,
            nullable: false,
        }
    }

    pub fn parameter(parameter: &Arc<TypeParameterDescriptor>) -> Self {
        Self::Parameter {
            parameter: Arc::clone(parameter),
            nullable: false,
        }
    }
}

/// Argument slot of a class template.
#[derive(Clone)]
pub enum DescArg {
    Star,
    Arg(DescTemplate, Variance),
}

impl DescArg {
    pub fn invariant(template: DescTemplate) -> Self {
        Self::Arg(template, Variance::Invariant)
    }
}

/// Either kind of symbol the world can hand out.
#[derive(Clone)]
pub enum DescSymbol {
    Class(Arc<ClassDescriptor>),
    Parameter(Arc<TypeParameterDescriptor>),
}

/// Declaration world shared by every session of this frontend.
pub struct DescWorld {
    /// Classifiers keyed by qualified name.
    classes: DashMap<String, Arc<ClassDescriptor>, rustc_hash::FxBuildHasher>,
    by_symbol: DashMap<SymbolId, DescSymbol, rustc_hash::FxBuildHasher>,
    next_id: AtomicU32,
    pub registry: Arc<SessionRegistry>,
    // session-lifetime caches, dropped wholesale by stop-world cleanup
    defaults: DashMap<SymbolId, Type, rustc_hash::FxBuildHasher>,
    dynamic: Mutex<Option<Type>>,
}

impl Default for DescWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl DescWorld {
    pub fn new() -> Self {
        Self {
            classes: DashMap::default(),
            by_symbol: DashMap::default(),
            next_id: AtomicU32::new(SymbolId::FIRST_VALID),
            registry: Arc::new(SessionRegistry::new()),
            defaults: DashMap::default(),
            dynamic: Mutex::new(None),
        }
    }

    fn allocate(&self) -> SymbolId {
        SymbolId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Declare a classifier with fresh type parameters named `param_names`.
    pub fn declare_class(
        self: &Arc<Self>,
        qualified_name: &str,
        param_names: &[&str],
    ) -> Arc<ClassDescriptor> {
        let type_parameters: Vec<Arc<TypeParameterDescriptor>> = param_names
            .iter()
            .map(|name| {
                let parameter = Arc::new(TypeParameterDescriptor {
                    symbol: self.allocate(),
                    name: Arc::from(*name),
                    bounds: OnceLock::new(),
                });
                self.by_symbol
                    .insert(parameter.symbol, DescSymbol::Parameter(Arc::clone(&parameter)));
                parameter
            })
            .collect();

        let class = Arc::new(ClassDescriptor {
            symbol: self.allocate(),
            class_id: lyra_api::types::ClassId::new(qualified_name),
            type_parameters,
            supertypes: OnceLock::new(),
        });
        trace!(
            symbol = class.symbol.0,
            name = qualified_name,
            "DescWorld::declare_class"
        );
        self.by_symbol
            .insert(class.symbol, DescSymbol::Class(Arc::clone(&class)));
        self.classes
            .insert(qualified_name.to_string(), Arc::clone(&class));
        class
    }

    pub fn class_by_name(&self, qualified_name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(qualified_name).map(|r| Arc::clone(&r))
    }

    pub fn symbol(&self, id: SymbolId) -> Option<DescSymbol> {
        self.by_symbol.get(&id).map(|r| r.clone())
    }

    pub fn class(&self, id: SymbolId) -> Option<Arc<ClassDescriptor>> {
        match self.symbol(id) {
            Some(DescSymbol::Class(class)) => Some(class),
            _ => None,
        }
    }

    pub fn parameter(&self, id: SymbolId) -> Option<Arc<TypeParameterDescriptor>> {
        match self.symbol(id) {
            Some(DescSymbol::Parameter(parameter)) => Some(parameter),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    pub(crate) fn cached_default(&self, symbol: SymbolId, session: &SessionToken) -> Option<Type> {
        let cached = self.defaults.get(&symbol)?;
        (cached.session() == session).then(|| cached.clone())
    }

    pub(crate) fn cache_default(&self, symbol: SymbolId, ty: Type) {
        self.defaults.insert(symbol, ty);
    }

    pub(crate) fn dynamic(&self, session: &SessionToken) -> Type {
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
}

impl CacheInvalidator for DescWorld {
    fn invalidate(&self) {
        debug!(entries = self.defaults.len(), "DescWorld::invalidate");
        self.defaults.clear();
        let mut slot = self.dynamic.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

#[cfg(test)]
#[path = "../tests/world_tests.rs"]
mod tests;
