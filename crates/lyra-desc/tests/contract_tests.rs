//! Both frontends must be interchangeable behind `TypeFacade`: the same
//! builder inputs produce the same externally observable types, regardless
//! of the internal architecture (interned store vs descriptor tree).

use crate::{DescTemplate, DescTypeFacade, DescWorld};
use lyra_api::types::{ClassId, Nullability, TypeKind, TypeProjection};
use lyra_api::{
    ClassTypeBuilder, DefinitelyNotNullTypeBuilder, EngineError, FlexibleTypeBuilder,
    FunctionTypeBuilder, FunctionValueParameter, IntersectionTypeBuilder, TypeFacade,
};
use lyra_hir::HirWorld;
use std::sync::Arc;

/// The same declarations, loaded into each frontend: `core.Number`,
/// `core.Int <: core.Number`, `collections.List<T>`, `core.Function1<P, R>`.
fn facades() -> (DescTypeFacade, lyra_hir::HirTypeFacade) {
    let desc = Arc::new(DescWorld::new());
    let number = desc.declare_class("core.Number", &[]);
    let int = desc.declare_class("core.Int", &[]);
    int.set_supertypes(vec![DescTemplate::class(&number)]);
    desc.declare_class("collections.List", &["T"]);
    desc.declare_class("core.Function1", &["P", "R"]);

    let hir = HirWorld::new();
    let number = hir.declare_class("core.Number", &[]);
    let int = hir.declare_class("core.Int", &[]);
    hir.store
        .set_supertypes(int, vec![hir.class_template(number, vec![])]);
    hir.declare_class("collections.List", &["T"]);
    hir.declare_class("core.Function1", &["P", "R"]);

    (DescTypeFacade::for_new_session(&desc), hir.facade())
}

fn list_of_int(facade: &dyn TypeFacade) -> lyra_api::types::Type {
    let int = {
        let builder =
            ClassTypeBuilder::by_id(facade.session().clone(), ClassId::new("core.Int")).unwrap();
        facade.build_class_type(builder).unwrap()
    };
    let mut builder =
        ClassTypeBuilder::by_id(facade.session().clone(), ClassId::new("collections.List"))
            .unwrap();
    builder.argument(TypeProjection::invariant(int)).unwrap();
    facade.build_class_type(builder).unwrap()
}

#[test]
fn class_commits_render_identically() {
    let (desc, hir) = facades();
    assert_eq!(
        list_of_int(&desc).to_string(),
        list_of_int(&hir).to_string()
    );
    assert_eq!(list_of_int(&desc).to_string(), "collections.List<core.Int>");
}

#[test]
fn resolution_misses_produce_identical_markers() {
    let (desc, hir) = facades();
    for facade in [&desc as &dyn TypeFacade, &hir] {
        let builder =
            ClassTypeBuilder::by_id(facade.session().clone(), ClassId::new("missing.X")).unwrap();
        let ty = facade.build_class_type(builder).unwrap();
        assert!(ty.is_error().unwrap());
        assert_eq!(ty.to_string(), "ERROR(missing.X)");
    }
}

#[test]
fn arity_fallback_behaves_identically() {
    let (desc, hir) = facades();
    for facade in [&desc as &dyn TypeFacade, &hir] {
        let int = {
            let builder =
                ClassTypeBuilder::by_id(facade.session().clone(), ClassId::new("core.Int"))
                    .unwrap();
            facade.build_class_type(builder).unwrap()
        };
        let mut builder = ClassTypeBuilder::by_id(
            facade.session().clone(),
            ClassId::new("collections.List"),
        )
        .unwrap();
        builder
            .argument(TypeProjection::invariant(int.clone()))
            .unwrap()
            .argument(TypeProjection::invariant(int))
            .unwrap()
            .nullability(Nullability::Nullable)
            .unwrap();
        let ty = facade.build_class_type(builder).unwrap();
        assert_eq!(ty.to_string(), "collections.List<*>?");
    }
}

#[test]
fn function_commits_render_identically() {
    let (desc, hir) = facades();
    let mut rendered = Vec::new();
    for facade in [&desc as &dyn TypeFacade, &hir] {
        let int = {
            let builder =
                ClassTypeBuilder::by_id(facade.session().clone(), ClassId::new("core.Int"))
                    .unwrap();
            facade.build_class_type(builder).unwrap()
        };
        let number = {
            let builder =
                ClassTypeBuilder::by_id(facade.session().clone(), ClassId::new("core.Number"))
                    .unwrap();
            facade.build_class_type(builder).unwrap()
        };
        let mut builder = FunctionTypeBuilder::new(facade.session().clone(), number).unwrap();
        builder
            .value_parameter(FunctionValueParameter::named("x", int))
            .unwrap();
        rendered.push(facade.build_function_type(builder).unwrap().to_string());
    }
    assert_eq!(rendered[0], rendered[1]);
    assert_eq!(rendered[0], "core.Function1<x: core.Int, core.Number>");
}

#[test]
fn shared_commit_semantics_agree_on_wrappers() {
    let (desc, hir) = facades();
    for facade in [&desc as &dyn TypeFacade, &hir] {
        let session = facade.session().clone();
        let int = {
            let builder =
                ClassTypeBuilder::by_id(session.clone(), ClassId::new("core.Int")).unwrap();
            facade.build_class_type(builder).unwrap()
        };
        let number = {
            let builder =
                ClassTypeBuilder::by_id(session.clone(), ClassId::new("core.Number")).unwrap();
            facade.build_class_type(builder).unwrap()
        };

        // intersection: deduplicated, insertion-ordered, never fails
        let mut builder = IntersectionTypeBuilder::new(session.clone()).unwrap();
        builder
            .conjunct(number.clone())
            .unwrap()
            .conjunct(int.clone())
            .unwrap()
            .conjunct(number.clone())
            .unwrap();
        let intersection = facade.build_intersection_type(builder).unwrap();
        assert_eq!(intersection.to_string(), "core.Number & core.Int");

        // definitely-not-null: idempotent, rejects flexible originals
        let once = facade
            .build_definitely_not_null_type(
                DefinitelyNotNullTypeBuilder::new(session.clone(), int.clone()).unwrap(),
            )
            .unwrap();
        let twice = facade
            .build_definitely_not_null_type(
                DefinitelyNotNullTypeBuilder::new(session.clone(), once.clone()).unwrap(),
            )
            .unwrap();
        assert_eq!(once, twice);
        assert!(matches!(once.kind().unwrap(), TypeKind::DefinitelyNotNull(_)));

        let flexible = facade
            .build_flexible_type(
                FlexibleTypeBuilder::from_bounds(session.clone(), int, number).unwrap(),
            )
            .unwrap();
        assert!(matches!(
            facade.build_definitely_not_null_type(
                DefinitelyNotNullTypeBuilder::new(session, flexible).unwrap()
            ),
            Err(EngineError::Precondition(_))
        ));
    }
}
