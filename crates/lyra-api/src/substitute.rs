//! Parameter-to-argument substitution over the shared type model.
//!
//! Substitution maps type-parameter symbols to concrete types and rewrites a
//! type bottom-up: class-type arguments, flexible bounds, intersection
//! conjuncts, captured projections, and definitely-not-null originals are
//! all traversed. Attributes (parameter names) survive the rewrite.
//!
//! Error-marker types substitute to themselves: they flow through as data.

use crate::errors::EngineResult;
use crate::types::{
    CapturedType, ClassType, FlexibleType, IntersectionType, Nullability, SymbolId, Type,
    TypeKind, TypeProjection,
};
use lyra_common::limits::MAX_SUBSTITUTION_DEPTH;
use rustc_hash::FxHashMap;

/// Mapping from type-parameter symbols to their substituted types.
#[derive(Clone, Debug, Default)]
pub struct TypeSubstitution {
    map: FxHashMap<SymbolId, Type>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair declared parameters with supplied arguments positionally.
    /// Star projections leave their parameter unmapped (free).
    pub fn from_args(params: &[SymbolId], args: &[TypeProjection]) -> Self {
        let mut map = FxHashMap::default();
        for (param, arg) in params.iter().zip(args.iter()) {
            if let TypeProjection::Argument { ty, .. } = arg {
                map.insert(*param, ty.clone());
            }
        }
        Self { map }
    }

    pub fn insert(&mut self, param: SymbolId, ty: Type) {
        self.map.insert(param, ty);
    }

    pub fn get(&self, param: SymbolId) -> Option<&Type> {
        self.map.get(&param)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Re-mark a type with the given nullability where the variant carries one.
///
/// Used when a nullable parameter occurrence is substituted: `T?` with
/// `T := Foo` yields `Foo?`. Dynamic, intersection, and error markers are
/// returned unchanged.
pub fn apply_nullability(ty: &Type, nullability: Nullability) -> EngineResult<Type> {
    let session = ty.session().clone();
    let result = match ty.kind()? {
        TypeKind::Class(class) => {
            let mut class = class.clone();
            class.nullability = nullability;
            Type::new(session, TypeKind::Class(class))
        }
        TypeKind::TypeParameter(param) => {
            let mut param = param.clone();
            param.nullability = nullability;
            Type::new(session, TypeKind::TypeParameter(param))
        }
        TypeKind::Captured(captured) => {
            let mut captured = captured.clone();
            captured.nullability = nullability;
            Type::new(session, TypeKind::Captured(captured))
        }
        TypeKind::Flexible(flexible) => {
            let mut flexible = flexible.clone();
            flexible.nullability = nullability;
            Type::new(session, TypeKind::Flexible(flexible))
        }
        TypeKind::DefinitelyNotNull(_)
        | TypeKind::Intersection(_)
        | TypeKind::Dynamic
        | TypeKind::Error(_) => ty.clone(),
    };
    // Attributes are part of the value; carry them over.
    Ok(ty
        .attrs()
        .iter()
        .cloned()
        .fold(result, |acc, attr| acc.with_attr(attr)))
}

/// Substitute type parameters in `ty` according to `subst`.
pub fn substitute(ty: &Type, subst: &TypeSubstitution) -> EngineResult<Type> {
    substitute_at_depth(ty, subst, 0)
}

fn substitute_at_depth(ty: &Type, subst: &TypeSubstitution, depth: u32) -> EngineResult<Type> {
    if subst.is_empty() || depth > MAX_SUBSTITUTION_DEPTH {
        return Ok(ty.clone());
    }
    let session = ty.session().clone();
    let rewritten = match ty.kind()? {
        TypeKind::TypeParameter(param) => match subst.get(param.symbol) {
            Some(replacement) => {
                // A nullable occurrence keeps the result nullable.
                if param.nullability.is_nullable() {
                    apply_nullability(replacement, Nullability::Nullable)?
                } else {
                    replacement.clone()
                }
            }
            None => ty.clone(),
        },
        TypeKind::Class(class) => {
            let args = class
                .args
                .iter()
                .map(|arg| substitute_projection(arg, subst, depth + 1))
                .collect::<EngineResult<_>>()?;
            Type::new(
                session,
                TypeKind::Class(ClassType {
                    class_id: class.class_id.clone(),
                    symbol: class.symbol,
                    args,
                    nullability: class.nullability,
                }),
            )
        }
        TypeKind::Captured(captured) => Type::new(
            session,
            TypeKind::Captured(CapturedType {
                projection: substitute_projection(&captured.projection, subst, depth + 1)?,
                nullability: captured.nullability,
            }),
        ),
        TypeKind::DefinitelyNotNull(original) => {
            let substituted = substitute_at_depth(original, subst, depth + 1)?;
            Type::new(session, TypeKind::DefinitelyNotNull(substituted))
        }
        TypeKind::Flexible(flexible) => Type::new(
            session,
            TypeKind::Flexible(FlexibleType {
                lower: substitute_at_depth(&flexible.lower, subst, depth + 1)?,
                upper: substitute_at_depth(&flexible.upper, subst, depth + 1)?,
                nullability: flexible.nullability,
            }),
        ),
        TypeKind::Intersection(intersection) => {
            let conjuncts = intersection
                .conjuncts
                .iter()
                .map(|conjunct| substitute_at_depth(conjunct, subst, depth + 1))
                .collect::<EngineResult<Vec<_>>>()?;
            Type::new(session, TypeKind::Intersection(IntersectionType { conjuncts }))
        }
        TypeKind::Dynamic | TypeKind::Error(_) => ty.clone(),
    };
    // Parameter-name attributes must survive substitution.
    Ok(ty
        .attrs()
        .iter()
        .cloned()
        .fold(rewritten, |acc, attr| acc.with_attr(attr)))
}

fn substitute_projection(
    projection: &TypeProjection,
    subst: &TypeSubstitution,
    depth: u32,
) -> EngineResult<TypeProjection> {
    Ok(match projection {
        TypeProjection::Star => TypeProjection::Star,
        TypeProjection::Argument { ty, variance } => TypeProjection::Argument {
            ty: substitute_at_depth(ty, subst, depth)?,
            variance: *variance,
        },
    })
}

#[cfg(test)]
#[path = "../tests/substitute_tests.rs"]
mod tests;
