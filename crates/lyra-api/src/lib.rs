//! Frontend-agnostic type surface of the lyra analysis engine.
//!
//! This crate defines the stable contract shared by every frontend:
//!
//! - **Type identity model**: the canonical set of immutable type variants
//!   (class, type-parameter, captured, definitely-not-null, flexible,
//!   intersection, dynamic, error-marker) with value semantics, plus
//!   use-site variance projections.
//! - **Request builders**: mutable, session-scoped, single-use builders that
//!   accumulate parameters before one commit step produces a type.
//! - **`TypeFacade`**: the adapter seam. Two independent frontends implement
//!   it and must produce interchangeable results; everything
//!   frontend-specific lives behind it, never in the shared data model.
//! - **Substitution/variance engine**: parameter-to-argument substitution
//!   and the variance-aware receiver approximation used by extension
//!   reference resolution.
//!
//! Unresolved references are data, not failures: a miss produces a
//! well-formed error-marker type that flows through substitution and
//! rendering, so one bad reference never stops processing of the rest of a
//! compilation unit.

mod builders;
mod errors;
mod facade;
mod format;
mod receiver;
mod substitute;
pub mod types;

pub use builders::{
    CapturedTypeBuilder, ClassTypeBuilder, ClassTypeTarget, DefinitelyNotNullTypeBuilder,
    FlexibleTypeBuilder, FunctionTypeBuilder, FunctionValueParameter, IntersectionTypeBuilder,
    TypeParameterTypeBuilder,
};
pub use errors::{EngineError, EngineResult};
pub use facade::{
    ArityOutcome, FUNCTION_BASE_NAME, TypeFacade, apply_arity_policy, commit_captured,
    commit_definitely_not_null, commit_intersection, function_class_id, function_type_arguments,
    unresolved_class_type,
};
pub use receiver::is_possible_receiver;
pub use substitute::{TypeSubstitution, apply_nullability, substitute};
pub use types::{
    CapturedType, ClassId, ClassType, ErrorType, FlexibleType, IntersectionType, Nullability,
    SymbolId, Type, TypeAttribute, TypeErrorKind, TypeKind, TypeParameterType, TypeProjection,
    Variance,
};
