//! `TypeFacade` implementation over the descriptor tree.

use crate::world::{DescArg, DescTemplate, DescWorld};
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
use lyra_common::limits::{MAX_FUNCTION_ARITY, MAX_SUPERTYPE_WALK_DEPTH};
use lyra_session::{SessionToken, StopWorldCleaner};
use std::collections::VecDeque;
use std::sync::Arc;

/// One session's view of the descriptor world.
pub struct DescTypeFacade {
    session: SessionToken,
    world: Arc<DescWorld>,
}

impl DescTypeFacade {
    pub fn new(session: SessionToken, world: Arc<DescWorld>) -> Self {
        Self { session, world }
    }

    /// Open a new session on `world` and return its facade.
    pub fn for_new_session(world: &Arc<DescWorld>) -> Self {
        Self::new(world.registry.create_session(), Arc::clone(world))
    }

    /// Stop-world cleaner wired to `world`'s caches and sessions.
    pub fn cleaner(world: &Arc<DescWorld>) -> StopWorldCleaner {
        StopWorldCleaner::new(Arc::clone(world) as _, Arc::clone(&world.registry))
    }

    fn lower(&self, template: &DescTemplate) -> Type {
        match template {
            DescTemplate::Class {
                class,
                args,
                nullable,
            } => Type::new(
                self.session.clone(),
                TypeKind::Class(ClassType {
                    class_id: class.class_id.clone(),
                    symbol: class.symbol,
                    args: args.iter().map(|arg| self.lower_arg(arg)).collect(),
                    nullability: if *nullable {
                        Nullability::Nullable
                    } else {
                        Nullability::NonNullable
                    },
                }),
            ),
            DescTemplate::Parameter {
                parameter,
                nullable,
            } => Type::new(
                self.session.clone(),
                TypeKind::TypeParameter(TypeParameterType {
                    symbol: parameter.symbol,
                    name: Arc::clone(&parameter.name),
                    nullability: if *nullable {
                        Nullability::Nullable
                    } else {
                        Nullability::NonNullable
                    },
                }),
            ),
        }
    }

    fn lower_arg(&self, arg: &DescArg) -> TypeProjection {
        match arg {
            DescArg::Star => TypeProjection::Star,
            DescArg::Arg(template, variance) => TypeProjection::Argument {
                ty: self.lower(template),
                variance: *variance,
            },
        }
    }

    fn commit_class(
        &self,
        symbol: SymbolId,
        nullability: Nullability,
        args: Vec<TypeProjection>,
    ) -> EngineResult<Type> {
        let class = self.world.class(symbol).ok_or_else(|| {
            EngineError::Precondition(format!("no classifier declared for {symbol:?}"))
        })?;
        match apply_arity_policy(class.type_parameters.len(), args) {
            ArityOutcome::Instantiate(args) => Ok(Type::new(
                self.session.clone(),
                TypeKind::Class(ClassType {
                    class_id: class.class_id.clone(),
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

    /// Classifier reachability over the descriptor supertype graph.
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
            let Some(class) = self.world.class(current) else {
                continue;
            };
            for template in class.supertypes() {
                if let DescTemplate::Class { class, .. } = template {
                    queue.push_back((class.symbol, depth + 1));
                }
            }
        }
        false
    }
}

impl TypeFacade for DescTypeFacade {
    fn session(&self) -> &SessionToken {
        &self.session
    }

    fn resolve_class(&self, class_id: &ClassId) -> Option<SymbolId> {
        self.world
            .class_by_name(class_id.as_str())
            .map(|class| class.symbol)
    }

    fn class_id_of(&self, symbol: SymbolId) -> Option<ClassId> {
        self.world.class(symbol).map(|class| class.class_id.clone())
    }

    fn type_parameters(&self, symbol: SymbolId) -> Vec<SymbolId> {
        self.world
            .class(symbol)
            .map(|class| {
                class
                    .type_parameters
                    .iter()
                    .map(|parameter| parameter.symbol)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn type_parameter_bounds(&self, symbol: SymbolId) -> Vec<Type> {
        self.world
            .parameter(symbol)
            .map(|parameter| {
                parameter
                    .bounds()
                    .iter()
                    .map(|template| self.lower(template))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn default_instantiation(&self, symbol: SymbolId) -> EngineResult<Type> {
        if let Some(cached) = self.world.cached_default(symbol, &self.session) {
            return Ok(cached);
        }
        let class = self.world.class(symbol).ok_or_else(|| {
            EngineError::Precondition(format!("no classifier declared for {symbol:?}"))
        })?;
        let ty = Type::new(
            self.session.clone(),
            TypeKind::Class(ClassType {
                class_id: class.class_id.clone(),
                symbol,
                args: class
                    .type_parameters
                    .iter()
                    .map(|_| TypeProjection::Star)
                    .collect(),
                nullability: Nullability::NonNullable,
            }),
        );
        self.world.cache_default(symbol, ty.clone());
        Ok(ty)
    }

    fn direct_supertypes(&self, ty: &Type) -> Vec<Type> {
        let Ok(TypeKind::Class(class_type)) = ty.kind() else {
            return Vec::new();
        };
        let Some(class) = self.world.class(class_type.symbol) else {
            return Vec::new();
        };
        let params: Vec<SymbolId> = class
            .type_parameters
            .iter()
            .map(|parameter| parameter.symbol)
            .collect();
        let subst = TypeSubstitution::from_args(&params, &class_type.args);
        class
            .supertypes()
            .iter()
            .filter_map(|template| substitute(&self.lower(template), &subst).ok())
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
        let parameter = self.world.parameter(symbol).ok_or_else(|| {
            EngineError::Precondition(format!("no type parameter declared for {symbol:?}"))
        })?;
        Ok(Type::new(
            self.session.clone(),
            TypeKind::TypeParameter(TypeParameterType {
                symbol,
                name: Arc::clone(&parameter.name),
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
        // Bounds are taken on trust here; the hir frontend is the checking
        // one.
        let (lower, upper, nullability) = builder.into_parts()?;
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
        self.world.dynamic(&self.session)
    }
}

#[cfg(test)]
#[path = "../tests/facade_tests.rs"]
mod tests;
