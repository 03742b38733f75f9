use super::*;
use crate::errors::EngineError;
use lyra_session::{SessionRegistry, SessionToken};
use smallvec::smallvec;
use std::sync::Arc;

fn registry() -> Arc<SessionRegistry> {
    Arc::new(SessionRegistry::new())
}

fn class_type(session: SessionToken, name: &str, nullability: Nullability) -> Type {
    Type::new(
        session,
        TypeKind::Class(ClassType {
            class_id: ClassId::new(name),
            symbol: SymbolId(7),
            args: smallvec![],
            nullability,
        }),
    )
}

#[test]
fn class_id_splits_qualified_names() {
    let id = ClassId::new("collections.immutable.List");
    assert_eq!(id.short_name(), "List");
    assert_eq!(id.package(), "collections.immutable");

    let top_level = ClassId::new("Any");
    assert_eq!(top_level.short_name(), "Any");
    assert_eq!(top_level.package(), "");
}

#[test]
fn nullability_union_is_permissive() {
    use Nullability::*;
    assert_eq!(NonNullable.union(NonNullable), NonNullable);
    assert_eq!(NonNullable.union(Nullable), Nullable);
    assert_eq!(Nullable.union(NonNullable), Nullable);
}

#[test]
fn accessors_assert_session_validity() {
    let registry = registry();
    let session = registry.create_session();
    let ty = class_type(session.clone(), "core.Int", Nullability::NonNullable);

    assert!(ty.kind().is_ok());
    assert_eq!(ty.nullability().unwrap(), Nullability::NonNullable);

    registry.dispose(session.id());
    assert!(matches!(ty.kind(), Err(EngineError::StaleSession(_))));
    assert!(matches!(ty.nullability(), Err(EngineError::StaleSession(_))));
    assert!(matches!(ty.class_symbol(), Err(EngineError::StaleSession(_))));
}

#[test]
fn equal_values_built_separately_compare_equal() {
    let registry = registry();
    let session = registry.create_session();
    let a = class_type(session.clone(), "core.Int", Nullability::Nullable);
    let b = class_type(session, "core.Int", Nullability::Nullable);
    assert_eq!(a, b);
}

#[test]
fn class_symbol_unwraps_definitely_not_null_and_flexible() {
    let registry = registry();
    let session = registry.create_session();
    let inner = class_type(session.clone(), "core.Int", Nullability::NonNullable);

    let dnn = Type::new(session.clone(), TypeKind::DefinitelyNotNull(inner.clone()));
    assert_eq!(dnn.class_symbol().unwrap(), Some(SymbolId(7)));

    let upper = class_type(session.clone(), "core.Int", Nullability::Nullable);
    let flexible = Type::new(
        session,
        TypeKind::Flexible(FlexibleType {
            lower: inner,
            upper,
            nullability: Nullability::NonNullable,
        }),
    );
    assert_eq!(flexible.class_symbol().unwrap(), Some(SymbolId(7)));
}

#[test]
fn parameter_name_attribute_is_observable() {
    let registry = registry();
    let session = registry.create_session();
    let ty = class_type(session, "core.Int", Nullability::NonNullable)
        .with_attr(TypeAttribute::ParameterName(Arc::from("count")));
    assert_eq!(ty.parameter_name(), Some("count"));
}

#[test]
fn error_marker_reports_kind_and_renders_attempted_name() {
    let registry = registry();
    let session = registry.create_session();
    let ty = Type::new(
        session,
        TypeKind::Error(ErrorType {
            kind: TypeErrorKind::UnresolvedClassType,
            attempted_name: ClassId::new("missing.Thing"),
        }),
    );
    assert!(ty.is_error().unwrap());
    assert_eq!(
        ty.error_kind().unwrap(),
        Some(TypeErrorKind::UnresolvedClassType)
    );
    assert_eq!(ty.to_string(), "ERROR(missing.Thing)");
}

#[test]
fn rendering_works_on_stale_types() {
    let registry = registry();
    let session = registry.create_session();
    let ty = class_type(session.clone(), "core.Int", Nullability::Nullable);
    registry.dispose(session.id());
    assert_eq!(ty.to_string(), "core.Int?");
}

#[test]
fn rendering_covers_structured_variants() {
    let registry = registry();
    let session = registry.create_session();
    let int = class_type(session.clone(), "core.Int", Nullability::NonNullable);
    let string = class_type(session.clone(), "core.String", Nullability::NonNullable);

    let list = Type::new(
        session.clone(),
        TypeKind::Class(ClassType {
            class_id: ClassId::new("collections.List"),
            symbol: SymbolId(9),
            args: smallvec![TypeProjection::covariant(int.clone()), TypeProjection::Star],
            nullability: Nullability::Nullable,
        }),
    );
    assert_eq!(list.to_string(), "collections.List<out core.Int, *>?");

    let flexible = Type::new(
        session.clone(),
        TypeKind::Flexible(FlexibleType {
            lower: int.clone(),
            upper: string.clone(),
            nullability: Nullability::NonNullable,
        }),
    );
    assert_eq!(flexible.to_string(), "core.Int..core.String");

    let intersection = Type::new(
        session.clone(),
        TypeKind::Intersection(IntersectionType {
            conjuncts: vec![int.clone(), string],
        }),
    );
    assert_eq!(intersection.to_string(), "core.Int & core.String");

    let dnn = Type::new(session.clone(), TypeKind::DefinitelyNotNull(int));
    assert_eq!(dnn.to_string(), "core.Int & Any");

    let dynamic = Type::new(session, TypeKind::Dynamic);
    assert_eq!(dynamic.to_string(), "dynamic");
}
