//! Session-scoped request builders, one per type variant.
//!
//! Builders are mutable, short-lived, and single-use: construction never
//! resolves symbols or performs I/O; only the commit step (owned by a
//! [`TypeFacade`](crate::TypeFacade) implementation) does. Every setter is a
//! pure mutation guarded by a session-validity assertion — operating on a
//! builder whose session ended fails with a validity error, never a silent
//! no-op. Commit consumes the builder; it is the terminal operation of the
//! builder's lifecycle.
//!
//! Builders that seed from an existing value (captured, flexible,
//! intersection) copy list state, so later mutation cannot retroactively
//! affect the seed type.

use crate::errors::{EngineError, EngineResult};
use crate::types::{
    ClassId, Nullability, SymbolId, Type, TypeKind, TypeProjection,
};
use lyra_session::SessionToken;
use std::sync::Arc;

/// Target of a class-type request: a qualified name still to be resolved,
/// or an already-resolved handle. A tagged union, not two optional fields —
/// "both set" and "neither set" are unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassTypeTarget {
    ById(ClassId),
    BySymbol(SymbolId),
}

#[derive(Debug)]
pub struct ClassTypeBuilder {
    session: SessionToken,
    target: ClassTypeTarget,
    nullability: Nullability,
    args: Vec<TypeProjection>,
}

impl ClassTypeBuilder {
    pub fn by_id(session: SessionToken, class_id: ClassId) -> EngineResult<Self> {
        session.check_valid()?;
        Ok(Self {
            session,
            target: ClassTypeTarget::ById(class_id),
            nullability: Nullability::NonNullable,
            args: Vec::new(),
        })
    }

    pub fn by_symbol(session: SessionToken, symbol: SymbolId) -> EngineResult<Self> {
        session.check_valid()?;
        if !symbol.is_valid() {
            return Err(EngineError::Precondition(format!(
                "class type builder requires a valid symbol, got {symbol:?}"
            )));
        }
        Ok(Self {
            session,
            target: ClassTypeTarget::BySymbol(symbol),
            nullability: Nullability::NonNullable,
            args: Vec::new(),
        })
    }

    pub fn nullability(&mut self, nullability: Nullability) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.nullability = nullability;
        Ok(self)
    }

    pub fn argument(&mut self, projection: TypeProjection) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.args.push(projection);
        Ok(self)
    }

    pub fn arguments(
        &mut self,
        projections: impl IntoIterator<Item = TypeProjection>,
    ) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.args.extend(projections);
        Ok(self)
    }

    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    /// Consume the builder at commit time.
    pub fn into_parts(self) -> EngineResult<(ClassTypeTarget, Nullability, Vec<TypeProjection>)> {
        self.session.check_valid()?;
        Ok((self.target, self.nullability, self.args))
    }
}

#[derive(Debug)]
pub struct TypeParameterTypeBuilder {
    session: SessionToken,
    symbol: SymbolId,
    nullability: Nullability,
}

impl TypeParameterTypeBuilder {
    pub fn new(session: SessionToken, symbol: SymbolId) -> EngineResult<Self> {
        session.check_valid()?;
        Ok(Self {
            session,
            symbol,
            nullability: Nullability::NonNullable,
        })
    }

    pub fn nullability(&mut self, nullability: Nullability) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.nullability = nullability;
        Ok(self)
    }

    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    pub fn into_parts(self) -> EngineResult<(SymbolId, Nullability)> {
        self.session.check_valid()?;
        Ok((self.symbol, self.nullability))
    }
}

#[derive(Debug)]
pub struct CapturedTypeBuilder {
    session: SessionToken,
    projection: TypeProjection,
    nullability: Nullability,
}

impl CapturedTypeBuilder {
    /// Seed from a caller-supplied projection.
    pub fn from_projection(session: SessionToken, projection: TypeProjection) -> EngineResult<Self> {
        session.check_valid()?;
        Ok(Self {
            session,
            projection,
            nullability: Nullability::NonNullable,
        })
    }

    /// Seed from an existing captured type's projection and nullability.
    pub fn from_captured(ty: &Type) -> EngineResult<Self> {
        let session = ty.session().clone();
        match ty.kind()? {
            TypeKind::Captured(captured) => Ok(Self {
                session,
                projection: captured.projection.clone(),
                nullability: captured.nullability,
            }),
            other => Err(EngineError::Precondition(format!(
                "captured type builder seeded from a non-captured type: {other:?}"
            ))),
        }
    }

    pub fn nullability(&mut self, nullability: Nullability) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.nullability = nullability;
        Ok(self)
    }

    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    pub fn into_parts(self) -> EngineResult<(TypeProjection, Nullability)> {
        self.session.check_valid()?;
        Ok((self.projection, self.nullability))
    }
}

#[derive(Debug)]
pub struct DefinitelyNotNullTypeBuilder {
    session: SessionToken,
    original: Type,
}

impl DefinitelyNotNullTypeBuilder {
    pub fn new(session: SessionToken, original: Type) -> EngineResult<Self> {
        session.check_valid()?;
        Ok(Self { session, original })
    }

    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    pub fn into_parts(self) -> EngineResult<Type> {
        self.session.check_valid()?;
        Ok(self.original)
    }
}

#[derive(Debug)]
pub struct FlexibleTypeBuilder {
    session: SessionToken,
    lower: Type,
    upper: Type,
    nullability: Nullability,
}

impl FlexibleTypeBuilder {
    /// Seed from caller-supplied bounds.
    pub fn from_bounds(session: SessionToken, lower: Type, upper: Type) -> EngineResult<Self> {
        session.check_valid()?;
        Ok(Self {
            session,
            lower,
            upper,
            nullability: Nullability::NonNullable,
        })
    }

    /// Seed from an existing flexible type's bounds and nullability.
    pub fn from_flexible(ty: &Type) -> EngineResult<Self> {
        let session = ty.session().clone();
        match ty.kind()? {
            TypeKind::Flexible(flexible) => Ok(Self {
                session,
                lower: flexible.lower.clone(),
                upper: flexible.upper.clone(),
                nullability: flexible.nullability,
            }),
            other => Err(EngineError::Precondition(format!(
                "flexible type builder seeded from a non-flexible type: {other:?}"
            ))),
        }
    }

    pub fn nullability(&mut self, nullability: Nullability) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.nullability = nullability;
        Ok(self)
    }

    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    pub fn into_parts(self) -> EngineResult<(Type, Type, Nullability)> {
        self.session.check_valid()?;
        Ok((self.lower, self.upper, self.nullability))
    }
}

#[derive(Debug)]
pub struct IntersectionTypeBuilder {
    session: SessionToken,
    conjuncts: Vec<Type>,
}

impl IntersectionTypeBuilder {
    pub fn new(session: SessionToken) -> EngineResult<Self> {
        session.check_valid()?;
        Ok(Self {
            session,
            conjuncts: Vec::new(),
        })
    }

    /// Seed from an existing intersection type; the conjunct list is copied.
    pub fn from_intersection(ty: &Type) -> EngineResult<Self> {
        let session = ty.session().clone();
        match ty.kind()? {
            TypeKind::Intersection(intersection) => Ok(Self {
                session,
                conjuncts: intersection.conjuncts.clone(),
            }),
            other => Err(EngineError::Precondition(format!(
                "intersection type builder seeded from a non-intersection type: {other:?}"
            ))),
        }
    }

    /// Seed from a caller-supplied conjunct list; the list is copied.
    pub fn from_conjuncts(
        session: SessionToken,
        conjuncts: impl IntoIterator<Item = Type>,
    ) -> EngineResult<Self> {
        session.check_valid()?;
        Ok(Self {
            session,
            conjuncts: conjuncts.into_iter().collect(),
        })
    }

    pub fn conjunct(&mut self, ty: Type) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.conjuncts.push(ty);
        Ok(self)
    }

    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    pub fn into_parts(self) -> EngineResult<Vec<Type>> {
        self.session.check_valid()?;
        Ok(self.conjuncts)
    }
}

/// One declared value parameter of a function type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionValueParameter {
    pub ty: Type,
    pub name: Option<Arc<str>>,
}

impl FunctionValueParameter {
    pub fn unnamed(ty: Type) -> Self {
        Self { ty, name: None }
    }

    pub fn named(name: &str, ty: Type) -> Self {
        Self {
            ty,
            name: Some(Arc::from(name)),
        }
    }
}

#[derive(Debug)]
pub struct FunctionTypeBuilder {
    session: SessionToken,
    /// Base qualified name the arity suffix is appended to.
    base_name: ClassId,
    context_parameters: Vec<Type>,
    receiver: Option<Type>,
    value_parameters: Vec<FunctionValueParameter>,
    return_type: Type,
    nullability: Nullability,
}

impl FunctionTypeBuilder {
    pub fn new(session: SessionToken, return_type: Type) -> EngineResult<Self> {
        session.check_valid()?;
        Ok(Self {
            session,
            base_name: ClassId::new(crate::facade::FUNCTION_BASE_NAME),
            context_parameters: Vec::new(),
            receiver: None,
            value_parameters: Vec::new(),
            return_type,
            nullability: Nullability::NonNullable,
        })
    }

    /// Override the synthesized base name (e.g. a suspend-function shape).
    pub fn base_name(&mut self, base: ClassId) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.base_name = base;
        Ok(self)
    }

    pub fn context_parameter(&mut self, ty: Type) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.context_parameters.push(ty);
        Ok(self)
    }

    pub fn receiver(&mut self, ty: Type) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.receiver = Some(ty);
        Ok(self)
    }

    pub fn value_parameter(&mut self, param: FunctionValueParameter) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.value_parameters.push(param);
        Ok(self)
    }

    pub fn nullability(&mut self, nullability: Nullability) -> EngineResult<&mut Self> {
        self.session.check_valid()?;
        self.nullability = nullability;
        Ok(self)
    }

    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    /// Arity as counted for class-id synthesis:
    /// `contexts + (receiver ? 1 : 0) + value parameters`.
    pub fn arity(&self) -> usize {
        self.context_parameters.len()
            + usize::from(self.receiver.is_some())
            + self.value_parameters.len()
    }

    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> EngineResult<(
        ClassId,
        Vec<Type>,
        Option<Type>,
        Vec<FunctionValueParameter>,
        Type,
        Nullability,
    )> {
        self.session.check_valid()?;
        Ok((
            self.base_name,
            self.context_parameters,
            self.receiver,
            self.value_parameters,
            self.return_type,
            self.nullability,
        ))
    }
}

#[cfg(test)]
#[path = "../tests/builders_tests.rs"]
mod tests;
