//! `TypeFacade` implementation over the interned symbol store.

use crate::cache::HirTypeCache;
use crate::intern::{HirProjection, HirTypeData, HirTypeId, HirTypeInterner};
use crate::symbols::SymbolStore;
use lyra_api::{
    ArityOutcome, CapturedTypeBuilder, ClassTypeBuilder, ClassTypeTarget,
    DefinitelyNotNullTypeBuilder, EngineError, EngineResult, FlexibleTypeBuilder,
    FunctionTypeBuilder, IntersectionTypeBuilder, TypeFacade, TypeParameterTypeBuilder,
    TypeSubstitution, apply_arity_policy, apply_nullability, commit_captured,
    commit_definitely_not_null, commit_intersection, function_class_id,
    function_type_arguments, substitute, unresolved_class_type,
};
use lyra_api::types::{
    ClassId, ClassType, FlexibleType, Nullability, SymbolId, Type, TypeKind,
    TypeParameterType, TypeProjection,
};
use lyra_common::interner::Interner;
use lyra_common::limits::{MAX_FUNCTION_ARITY, MAX_SUPERTYPE_WALK_DEPTH};
use lyra_session::SessionToken;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;

/// One session's view of the hir world. Cheap to construct; all heavy state
/// lives in the shared store, interners, and cache.
pub struct HirTypeFacade {
    session: SessionToken,
    names: Arc<Interner>,
    types: Arc<HirTypeInterner>,
    store: Arc<SymbolStore>,
    cache: Arc<HirTypeCache>,
}

impl HirTypeFacade {
    pub fn new(
        session: SessionToken,
        names: Arc<Interner>,
        types: Arc<HirTypeInterner>,
        store: Arc<SymbolStore>,
        cache: Arc<HirTypeCache>,
    ) -> Self {
        Self {
            session,
            names,
            types,
            store,
            cache,
        }
    }

    fn class_id_for(&self, symbol: SymbolId) -> EngineResult<ClassId> {
        let info = self.store.class_info(symbol).ok_or_else(|| {
            EngineError::Precondition(format!("no classifier registered for {symbol:?}"))
        })?;
        Ok(ClassId::new(&self.names.resolve(info.name)))
    }

    /// Lower an interned template to a session-stamped type.
    fn lower(&self, id: HirTypeId) -> EngineResult<Type> {
        let data = self.types.get(id).ok_or_else(|| {
            EngineError::Precondition(format!("unknown type template {id:?}"))
        })?;
        match data {
            HirTypeData::Class {
                symbol,
                args,
                nullable,
            } => {
                let args = args
                    .iter()
                    .map(|arg| self.lower_projection(arg))
                    .collect::<EngineResult<SmallVec<_>>>()?;
                Ok(Type::new(
                    self.session.clone(),
                    TypeKind::Class(ClassType {
                        class_id: self.class_id_for(symbol)?,
                        symbol,
                        args,
                        nullability: if nullable {
                            Nullability::Nullable
                        } else {
                            Nullability::NonNullable
                        },
                    }),
                ))
            }
            HirTypeData::TypeParameter { symbol, nullable } => {
                let info = self.store.type_parameter_info(symbol).ok_or_else(|| {
                    EngineError::Precondition(format!(
                        "no type parameter registered for {symbol:?}"
                    ))
                })?;
                Ok(Type::new(
                    self.session.clone(),
                    TypeKind::TypeParameter(TypeParameterType {
                        symbol,
                        name: Arc::from(self.names.resolve(info.name).as_str()),
                        nullability: if nullable {
                            Nullability::Nullable
                        } else {
                            Nullability::NonNullable
                        },
                    }),
                ))
            }
            HirTypeData::Dynamic => Ok(self.cache.dynamic(&self.session)),
        }
    }

    fn lower_projection(&self, projection: &HirProjection) -> EngineResult<TypeProjection> {
        Ok(match projection {
            HirProjection::Star => TypeProjection::Star,
            HirProjection::Argument { ty, variance } => TypeProjection::Argument {
                ty: self.lower(*ty)?,
                variance: *variance,
            },
        })
    }

    fn commit_class(
        &self,
        symbol: SymbolId,
        nullability: Nullability,
        args: Vec<TypeProjection>,
    ) -> EngineResult<Type> {
        let params = self.type_parameters(symbol);
        match apply_arity_policy(params.len(), args) {
            ArityOutcome::Instantiate(args) => Ok(Type::new(
                self.session.clone(),
                TypeKind::Class(ClassType {
                    class_id: self.class_id_for(symbol)?,
                    symbol,
                    args: args.into_iter().collect(),
                    nullability,
                }),
            )),
            ArityOutcome::FallbackToDefault => {
                let default = self.default_instantiation(symbol)?;
                apply_nullability(&default, nullability)
            }
        }
    }

    /// Classifier reachability over the declared supertype graph.
    fn is_classifier_reachable(&self, from: SymbolId, to: SymbolId) -> bool {
        let mut queue = VecDeque::from([(from, 0u32)]);
        let mut seen = rustc_hash::FxHashSet::default();
        while let Some((current, depth)) = queue.pop_front() {
            if current == to {
                return true;
            }
            if depth > MAX_SUPERTYPE_WALK_DEPTH || !seen.insert(current) {
                continue;
            }
            let Some(info) = self.store.class_info(current) else {
                continue;
            };
            for template in info.supertypes {
                if let Some(HirTypeData::Class { symbol, .. }) = self.types.get(template) {
                    queue.push_back((symbol, depth + 1));
                }
            }
        }
        false
    }
}

impl TypeFacade for HirTypeFacade {
    fn session(&self) -> &SessionToken {
        &self.session
    }

    fn resolve_class(&self, class_id: &ClassId) -> Option<SymbolId> {
        let atom = self.names.get(class_id.as_str())?;
        self.store.resolve_name(atom)
    }

    fn class_id_of(&self, symbol: SymbolId) -> Option<ClassId> {
        let info = self.store.class_info(symbol)?;
        Some(ClassId::new(&self.names.resolve(info.name)))
    }

    fn type_parameters(&self, symbol: SymbolId) -> Vec<SymbolId> {
        self.store
            .class_info(symbol)
            .map(|info| info.type_params)
            .unwrap_or_default()
    }

    fn type_parameter_bounds(&self, symbol: SymbolId) -> Vec<Type> {
        let Some(info) = self.store.type_parameter_info(symbol) else {
            return Vec::new();
        };
        info.bounds
            .iter()
            .filter_map(|template| self.lower(*template).ok())
            .collect()
    }

    fn default_instantiation(&self, symbol: SymbolId) -> EngineResult<Type> {
        if let Some(cached) = self.cache.default_instantiation(symbol, &self.session) {
            return Ok(cached);
        }
        let params = self.type_parameters(symbol);
        let ty = Type::new(
            self.session.clone(),
            TypeKind::Class(ClassType {
                class_id: self.class_id_for(symbol)?,
                symbol,
                args: params.iter().map(|_| TypeProjection::Star).collect(),
                nullability: Nullability::NonNullable,
            }),
        );
        self.cache.insert_default_instantiation(symbol, ty.clone());
        Ok(ty)
    }

    fn direct_supertypes(&self, ty: &Type) -> Vec<Type> {
        let Ok(TypeKind::Class(class)) = ty.kind() else {
            return Vec::new();
        };
        let Some(info) = self.store.class_info(class.symbol) else {
            return Vec::new();
        };
        let subst = TypeSubstitution::from_args(&info.type_params, &class.args);
        info.supertypes
            .iter()
            .filter_map(|template| {
                let lowered = self.lower(*template).ok()?;
                substitute(&lowered, &subst).ok()
            })
            .collect()
    }

    fn is_subtype_of(&self, sub: &Type, sup: &Type) -> bool {
        let (Ok(sub_kind), Ok(sup_kind)) = (sub.kind(), sup.kind()) else {
            return false;
        };
        if matches!(sub_kind, TypeKind::Dynamic) || matches!(sup_kind, TypeKind::Dynamic) {
            return true;
        }
        let (Ok(Some(sub_symbol)), Ok(Some(sup_symbol))) =
            (sub.class_symbol(), sup.class_symbol())
        else {
            return false;
        };
        let (Ok(sub_null), Ok(sup_null)) = (sub.nullability(), sup.nullability()) else {
            return false;
        };
        if sub_null.is_nullable() && !sup_null.is_nullable() {
            return false;
        }
        self.is_classifier_reachable(sub_symbol, sup_symbol)
    }

    fn build_class_type(&self, builder: ClassTypeBuilder) -> EngineResult<Type> {
        let (target, nullability, args) = builder.into_parts()?;
        match target {
            ClassTypeTarget::ById(class_id) => match self.resolve_class(&class_id) {
                Some(symbol) => self.commit_class(symbol, nullability, args),
                None => Ok(unresolved_class_type(self.session.clone(), class_id)),
            },
            ClassTypeTarget::BySymbol(symbol) => self.commit_class(symbol, nullability, args),
        }
    }

    fn build_type_parameter_type(&self, builder: TypeParameterTypeBuilder) -> EngineResult<Type> {
        let (symbol, nullability) = builder.into_parts()?;
        let info = self.store.type_parameter_info(symbol).ok_or_else(|| {
            EngineError::Precondition(format!("no type parameter registered for {symbol:?}"))
        })?;
        Ok(Type::new(
            self.session.clone(),
            TypeKind::TypeParameter(TypeParameterType {
                symbol,
                name: Arc::from(self.names.resolve(info.name).as_str()),
                nullability,
            }),
        ))
    }

    fn build_captured_type(&self, builder: CapturedTypeBuilder) -> EngineResult<Type> {
        let (projection, nullability) = builder.into_parts()?;
        Ok(commit_captured(self.session.clone(), projection, nullability))
    }

    fn build_definitely_not_null_type(
        &self,
        builder: DefinitelyNotNullTypeBuilder,
    ) -> EngineResult<Type> {
        let original = builder.into_parts()?;
        commit_definitely_not_null(self.session.clone(), original)
    }

    fn build_flexible_type(&self, builder: FlexibleTypeBuilder) -> EngineResult<Type> {
        let (lower, upper, nullability) = builder.into_parts()?;
        if !self.is_subtype_of(&lower, &upper) {
            return Err(EngineError::Precondition(format!(
                "flexible bounds out of order: {lower} is not a subtype of {upper}"
            )));
        }
        Ok(Type::new(
            self.session.clone(),
            TypeKind::Flexible(FlexibleType {
                lower,
                upper,
                nullability,
            }),
        ))
    }

    fn build_intersection_type(&self, builder: IntersectionTypeBuilder) -> EngineResult<Type> {
        let conjuncts = builder.into_parts()?;
        Ok(commit_intersection(self.session.clone(), conjuncts))
    }

    fn build_function_type(&self, builder: FunctionTypeBuilder) -> EngineResult<Type> {
        let arity = builder.arity();
        if arity > MAX_FUNCTION_ARITY {
            return Err(EngineError::Precondition(format!(
                "function arity {arity} exceeds the maximum of {MAX_FUNCTION_ARITY}"
            )));
        }
        let (base_name, contexts, receiver, values, return_type, nullability) =
            builder.into_parts()?;
        let class_id = function_class_id(&base_name, arity);
        let Some(symbol) = self.resolve_class(&class_id) else {
            return Ok(unresolved_class_type(self.session.clone(), class_id));
        };
        let args = function_type_arguments(contexts, receiver, values, return_type);
        Ok(Type::new(
            self.session.clone(),
            TypeKind::Class(ClassType {
                class_id,
                symbol,
                args: args.into_iter().collect(),
                nullability,
            }),
        ))
    }

    fn dynamic_type(&self) -> Type {
        self.cache.dynamic(&self.session)
    }
}

#[cfg(test)]
#[path = "../tests/facade_tests.rs"]
mod tests;
