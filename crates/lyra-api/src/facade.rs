//! The adapter seam between the shared type model and a concrete frontend.
//!
//! Two structurally different frontends implement [`TypeFacade`] and must
//! produce interchangeable results from the same builder inputs. The
//! frontend-independent parts of every commit (arity-fallback policy,
//! function class-id synthesis, definitely-not-null idempotence,
//! intersection assembly) live here as free functions so the adapters
//! cannot drift apart on externally observable behavior.

use crate::builders::{
    CapturedTypeBuilder, ClassTypeBuilder, DefinitelyNotNullTypeBuilder, FlexibleTypeBuilder,
    FunctionTypeBuilder, FunctionValueParameter, IntersectionTypeBuilder, TypeParameterTypeBuilder,
};
use crate::errors::{EngineError, EngineResult};
use crate::types::{
    CapturedType, ClassId, ErrorType, IntersectionType, Nullability, SymbolId, Type,
    TypeAttribute, TypeErrorKind, TypeKind, TypeProjection,
};
use indexmap::IndexSet;
use lyra_session::SessionToken;
use tracing::trace;

/// Qualified base name function-type class ids are synthesized from:
/// `core.Function<N>` for a function shape with `N` inputs.
pub const FUNCTION_BASE_NAME: &str = "core.Function";

/// One frontend's implementation of "commit a builder into a concrete type",
/// plus the symbol and subtyping queries the substitution/variance engine
/// needs. Everything frontend-specific lives behind this trait.
pub trait TypeFacade {
    /// The analysis session this facade is scoped to.
    fn session(&self) -> &SessionToken;

    // ---- symbol/resolution provider surface ----

    /// Look up a top-level classifier by fully-qualified name.
    fn resolve_class(&self, class_id: &ClassId) -> Option<SymbolId>;

    /// Qualified name of a class symbol.
    fn class_id_of(&self, symbol: SymbolId) -> Option<ClassId>;

    /// Declared type parameters of a class symbol, in declaration order.
    fn type_parameters(&self, symbol: SymbolId) -> Vec<SymbolId>;

    /// Declared upper bounds of a type-parameter symbol.
    fn type_parameter_bounds(&self, symbol: SymbolId) -> Vec<Type>;

    /// The symbol's default (star-like, unparameterized) instantiation.
    fn default_instantiation(&self, symbol: SymbolId) -> EngineResult<Type>;

    /// Instantiated direct supertypes of a class type, with the type's own
    /// arguments already substituted in.
    fn direct_supertypes(&self, ty: &Type) -> Vec<Type>;

    // ---- subtyping oracle ----

    fn is_subtype_of(&self, sub: &Type, sup: &Type) -> bool;

    // ---- commit entry points, one per builder ----

    fn build_class_type(&self, builder: ClassTypeBuilder) -> EngineResult<Type>;
    fn build_type_parameter_type(&self, builder: TypeParameterTypeBuilder) -> EngineResult<Type>;
    fn build_captured_type(&self, builder: CapturedTypeBuilder) -> EngineResult<Type>;
    fn build_definitely_not_null_type(
        &self,
        builder: DefinitelyNotNullTypeBuilder,
    ) -> EngineResult<Type>;
    fn build_flexible_type(&self, builder: FlexibleTypeBuilder) -> EngineResult<Type>;
    fn build_intersection_type(&self, builder: IntersectionTypeBuilder) -> EngineResult<Type>;
    fn build_function_type(&self, builder: FunctionTypeBuilder) -> EngineResult<Type>;

    /// The session's dynamic type. Nullary; facades cache one instance.
    fn dynamic_type(&self) -> Type;
}

/// Well-formed error-marker type for a failed class lookup. Never thrown:
/// callers of the analysis API must be able to keep processing in the
/// presence of unresolved references.
pub fn unresolved_class_type(session: SessionToken, attempted: ClassId) -> Type {
    trace!(name = %attempted, "class resolution miss; producing error-marker type");
    Type::new(
        session,
        TypeKind::Error(ErrorType {
            kind: TypeErrorKind::UnresolvedClassType,
            attempted_name: attempted,
        }),
    )
}

/// Synthesize the arity-suffixed class id of a function shape,
/// e.g. `core.Function2`.
pub fn function_class_id(base: &ClassId, arity: usize) -> ClassId {
    ClassId::new(&format!("{base}{arity}"))
}

/// Assemble a function type's full argument list:
/// `[contexts..., receiver?, values..., returnType]`, every slot invariant.
/// Value-parameter names ride along as attributes on the parameter types.
pub fn function_type_arguments(
    context_parameters: Vec<Type>,
    receiver: Option<Type>,
    value_parameters: Vec<FunctionValueParameter>,
    return_type: Type,
) -> Vec<TypeProjection> {
    let mut args = Vec::with_capacity(
        context_parameters.len()
            + usize::from(receiver.is_some())
            + value_parameters.len()
            + 1,
    );
    args.extend(context_parameters.into_iter().map(TypeProjection::invariant));
    if let Some(receiver) = receiver {
        args.push(TypeProjection::invariant(receiver));
    }
    for param in value_parameters {
        let ty = match param.name {
            Some(name) => param.ty.with_attr(TypeAttribute::ParameterName(name)),
            None => param.ty,
        };
        args.push(TypeProjection::invariant(ty));
    }
    args.push(TypeProjection::invariant(return_type));
    args
}

/// Frontend-independent part of the class-type commit: decide between a
/// full positional instantiation and the arity-mismatch fallback.
///
/// An argument count that does not match the declared parameter count falls
/// back to the symbol's default instantiation. This is a deliberate leniency
/// policy supporting partial construction during incremental analysis, not
/// an error; the supplied arguments are discarded without a signal.
pub enum ArityOutcome {
    /// Counts match: instantiate positionally with these projections.
    Instantiate(Vec<TypeProjection>),
    /// Counts differ: use the symbol's default instantiation.
    FallbackToDefault,
}

pub fn apply_arity_policy(declared_count: usize, supplied: Vec<TypeProjection>) -> ArityOutcome {
    if supplied.len() == declared_count {
        ArityOutcome::Instantiate(supplied)
    } else {
        trace!(
            declared_count,
            supplied_count = supplied.len(),
            "type-argument arity mismatch; falling back to default instantiation"
        );
        ArityOutcome::FallbackToDefault
    }
}

/// Shared captured-type commit: wraps a single projection, no resolution
/// step, always succeeds.
pub fn commit_captured(
    session: SessionToken,
    projection: TypeProjection,
    nullability: Nullability,
) -> Type {
    Type::new(
        session,
        TypeKind::Captured(CapturedType {
            projection,
            nullability,
        }),
    )
}

/// Shared definitely-not-null commit.
///
/// Wrapping a flexible type is a hard precondition violation: "definitely
/// not null" and "has a bound spread" are semantically incompatible.
/// Wrapping an existing definitely-not-null type is idempotent.
pub fn commit_definitely_not_null(session: SessionToken, original: Type) -> EngineResult<Type> {
    match original.kind()? {
        TypeKind::Flexible(_) => Err(EngineError::Precondition(format!(
            "cannot mark a flexible type as definitely-not-null: {original}"
        ))),
        TypeKind::DefinitelyNotNull(_) => Ok(original),
        _ => Ok(Type::new(session, TypeKind::DefinitelyNotNull(original))),
    }
}

/// Shared intersection commit: deduplicate conjuncts preserving insertion
/// order. Never fails, regardless of conjunct compatibility.
pub fn commit_intersection(session: SessionToken, conjuncts: Vec<Type>) -> Type {
    let set: IndexSet<Type, rustc_hash::FxBuildHasher> = conjuncts.into_iter().collect();
    Type::new(
        session,
        TypeKind::Intersection(IntersectionType {
            conjuncts: set.into_iter().collect(),
        }),
    )
}
