//! The canonical type identity model.
//!
//! Every variant is an immutable value stamped with the `SessionToken` of
//! the analysis session that produced it. Data accessors assert the token
//! before returning anything; a type that outlived its session fails every
//! access with a validity error.
//!
//! The model is wholly frontend-agnostic: symbols appear only as opaque
//! `SymbolId` handles, and every resolution detail lives behind the
//! [`TypeFacade`](crate::TypeFacade) seam.

use crate::errors::EngineResult;
use lyra_session::SessionToken;
use smallvec::SmallVec;
use std::sync::Arc;

/// Opaque frontend symbol handle identifying a class, type parameter, or
/// callable inside the live compilation world.
///
/// The shared model never assumes a concrete representation; each frontend
/// owns an allocation scheme and a store keyed by these ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// Sentinel value for an invalid symbol.
    pub const INVALID: Self = Self(0);

    /// First valid symbol id.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

/// Globally qualified class name, e.g. `collections.List`.
///
/// Self-contained (no interner needed to render), cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(Arc<str>);

impl ClassId {
    pub fn new(qualified_name: &str) -> Self {
        Self(Arc::from(qualified_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the qualified name.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Package prefix, empty for top-level names.
    pub fn package(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Nullability {
    NonNullable,
    Nullable,
}

impl Nullability {
    pub const fn is_nullable(self) -> bool {
        matches!(self, Self::Nullable)
    }

    /// The more permissive of two markers.
    pub const fn union(self, other: Self) -> Self {
        match (self, other) {
            (Self::NonNullable, Self::NonNullable) => Self::NonNullable,
            _ => Self::Nullable,
        }
    }
}

/// Use-site variance of a type argument.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variance {
    Invariant,
    In,
    Out,
}

/// A type argument slot: either "unknown/any" (star) or a concrete type
/// tagged with variance.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeProjection {
    Star,
    Argument { ty: Type, variance: Variance },
}

impl TypeProjection {
    pub fn invariant(ty: Type) -> Self {
        Self::Argument {
            ty,
            variance: Variance::Invariant,
        }
    }

    pub fn covariant(ty: Type) -> Self {
        Self::Argument {
            ty,
            variance: Variance::Out,
        }
    }

    pub fn contravariant(ty: Type) -> Self {
        Self::Argument {
            ty,
            variance: Variance::In,
        }
    }

    pub const fn is_star(&self) -> bool {
        matches!(self, Self::Star)
    }

    pub fn ty(&self) -> Option<&Type> {
        match self {
            Self::Star => None,
            Self::Argument { ty, .. } => Some(ty),
        }
    }
}

/// Annotation-like side channel on a type value.
///
/// Carries metadata that is not part of a type's structural identity role
/// but must survive substitution and round-trip through rendering, such as
/// the declared name of a function-type value parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeAttribute {
    /// Declared name of a function-type value parameter.
    ParameterName(Arc<str>),
}

/// Error kinds a well-formed error-marker type can carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeErrorKind {
    /// A class lookup by qualified name found nothing. Deliberately
    /// recoverable: callers keep processing in the presence of unresolved
    /// references.
    UnresolvedClassType,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub class_id: ClassId,
    /// Resolved symbol; `SymbolId::INVALID` only inside error markers.
    pub symbol: SymbolId,
    pub args: SmallVec<[TypeProjection; 2]>,
    pub nullability: Nullability,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParameterType {
    pub symbol: SymbolId,
    /// Declared name, kept for rendering.
    pub name: Arc<str>,
    pub nullability: Nullability,
}

/// Synthetic stand-in for a projection at a specific use site.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CapturedType {
    pub projection: TypeProjection,
    pub nullability: Nullability,
}

/// A type with a lower and an upper bound, modelling platform/interop types
/// whose exact shape is ambiguous. Invariant: `lower` is a subtype of
/// `upper` (enforced at construction by the hir adapter).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlexibleType {
    pub lower: Type,
    pub upper: Type,
    pub nullability: Nullability,
}

/// Conjunction of types. Construction never fails: an intersection of
/// incompatible types is a valid, if uninhabited, type in this model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IntersectionType {
    /// Set-like: deduplicated, insertion-ordered.
    pub conjuncts: Vec<Type>,
}

/// Well-formed marker for a failed resolution, carrying the attempted name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorType {
    pub kind: TypeErrorKind,
    pub attempted_name: ClassId,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class(ClassType),
    TypeParameter(TypeParameterType),
    Captured(CapturedType),
    /// Invariant: the wrapped type is never flexible; violating this is a
    /// construction error, not a representable state reached here.
    DefinitelyNotNull(Type),
    Flexible(FlexibleType),
    Intersection(IntersectionType),
    /// Nullary; one per session.
    Dynamic,
    Error(ErrorType),
}

/// Immutable, session-stamped type value.
///
/// The variant payload is shared behind an `Arc`, so cloning a type is
/// cheap and two equal types may share storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Type {
    session: SessionToken,
    kind: Arc<TypeKind>,
    attrs: SmallVec<[TypeAttribute; 1]>,
}

impl Type {
    /// Construct a type value. Intended for frontend adapters; library
    /// consumers obtain types through builder commits.
    pub fn new(session: SessionToken, kind: TypeKind) -> Self {
        Self {
            session,
            kind: Arc::new(kind),
            attrs: SmallVec::new(),
        }
    }

    pub fn with_attr(mut self, attr: TypeAttribute) -> Self {
        self.attrs.push(attr);
        self
    }

    /// The validity tag of the owning session.
    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    /// Access the variant, asserting the owning session is still current.
    pub fn kind(&self) -> EngineResult<&TypeKind> {
        self.session.check_valid()?;
        Ok(&self.kind)
    }

    /// Variant access without the validity assertion. Rendering and
    /// diagnostics use this; computation must go through [`Type::kind`].
    pub(crate) fn kind_unchecked(&self) -> &TypeKind {
        &self.kind
    }

    pub fn attrs(&self) -> &[TypeAttribute] {
        &self.attrs
    }

    pub fn parameter_name(&self) -> Option<&str> {
        self.attrs.iter().find_map(|attr| match attr {
            TypeAttribute::ParameterName(name) => Some(name.as_ref()),
        })
    }

    pub fn is_error(&self) -> EngineResult<bool> {
        Ok(matches!(self.kind()?, TypeKind::Error(_)))
    }

    pub fn error_kind(&self) -> EngineResult<Option<TypeErrorKind>> {
        Ok(match self.kind()? {
            TypeKind::Error(err) => Some(err.kind),
            _ => None,
        })
    }

    /// Nullability marker of the outermost variant, where one applies.
    pub fn nullability(&self) -> EngineResult<Nullability> {
        Ok(match self.kind()? {
            TypeKind::Class(class) => class.nullability,
            TypeKind::TypeParameter(param) => param.nullability,
            TypeKind::Captured(captured) => captured.nullability,
            TypeKind::Flexible(flexible) => flexible.nullability,
            // Definitely-not-null is non-null by definition; dynamic,
            // intersection and error markers carry no marker of their own.
            TypeKind::DefinitelyNotNull(_)
            | TypeKind::Intersection(_)
            | TypeKind::Dynamic
            | TypeKind::Error(_) => Nullability::NonNullable,
        })
    }

    /// The class symbol of this type, unwrapping definitely-not-null and
    /// flexible wrappers. `None` for non-class variants and error markers.
    pub fn class_symbol(&self) -> EngineResult<Option<SymbolId>> {
        Ok(match self.kind()? {
            TypeKind::Class(class) => Some(class.symbol),
            TypeKind::DefinitelyNotNull(original) => original.class_symbol()?,
            TypeKind::Flexible(flexible) => flexible.lower.class_symbol()?,
            _ => None,
        })
    }
}

impl std::hash::Hash for Type {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.session.hash(state);
        self.kind.hash(state);
        self.attrs.hash(state);
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
