//! Interned hir frontend adapter for the lyra type engine.
//!
//! This frontend keeps its world in compact interned form: qualified names
//! behind `Atom`s, declared supertypes and bounds behind deduplicated type
//! templates, symbol records in a concurrent store. The
//! [`HirTypeFacade`] lowers that representation into the shared
//! session-stamped type model on demand.
//!
//! Of the two frontends, this is the checking one: committing a flexible
//! type verifies `lower <: upper` against the declared supertype graph.

mod cache;
mod facade;
mod intern;
mod symbols;
mod world;

pub use cache::HirTypeCache;
pub use facade::HirTypeFacade;
pub use intern::{HirProjection, HirTypeData, HirTypeId, HirTypeInterner};
pub use symbols::{ClassInfo, SymbolInfo, SymbolStore, TypeParameterInfo};
pub use world::HirWorld;
