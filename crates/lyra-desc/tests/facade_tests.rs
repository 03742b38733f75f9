use super::*;
use lyra_session::AnalysisGate;

/// `core.Int` declared as a subclass of `core.Number`.
fn basic_world() -> (Arc<DescWorld>, Arc<crate::world::ClassDescriptor>, Arc<crate::world::ClassDescriptor>) {
    let world = Arc::new(DescWorld::new());
    let number = world.declare_class("core.Number", &[]);
    let int = world.declare_class("core.Int", &[]);
    int.set_supertypes(vec![DescTemplate::class(&number)]);
    (world, int, number)
}

#[test]
fn class_commit_by_id_resolves_against_the_tree() {
    let (world, int, _) = basic_world();
    let facade = DescTypeFacade::for_new_session(&world);

    let builder =
        ClassTypeBuilder::by_id(facade.session().clone(), ClassId::new("core.Int")).unwrap();
    let ty = facade.build_class_type(builder).unwrap();
    assert_eq!(ty.class_symbol().unwrap(), Some(int.symbol));
    assert_eq!(ty.to_string(), "core.Int");
}

#[test]
fn class_commit_miss_produces_an_error_marker() {
    let (world, _, _) = basic_world();
    let facade = DescTypeFacade::for_new_session(&world);

    let builder =
        ClassTypeBuilder::by_id(facade.session().clone(), ClassId::new("missing.Thing"))
            .unwrap();
    let ty = facade.build_class_type(builder).unwrap();
    assert!(ty.is_error().unwrap());
}

#[test]
fn arity_mismatch_falls_back_to_the_default_instantiation() {
    let (world, int, _) = basic_world();
    let list = world.declare_class("collections.List", &["T"]);
    let facade = DescTypeFacade::for_new_session(&world);
    let int_ty = facade.default_instantiation(int.symbol).unwrap();

    let mut builder =
        ClassTypeBuilder::by_symbol(facade.session().clone(), list.symbol).unwrap();
    builder
        .argument(TypeProjection::invariant(int_ty.clone()))
        .unwrap()
        .argument(TypeProjection::invariant(int_ty))
        .unwrap()
        .nullability(Nullability::Nullable)
        .unwrap();

    let ty = facade.build_class_type(builder).unwrap();
    assert_eq!(ty.to_string(), "collections.List<*>?");
}

#[test]
fn flexible_commit_is_unchecked_here() {
    let (world, int, number) = basic_world();
    let facade = DescTypeFacade::for_new_session(&world);
    let int_ty = facade.default_instantiation(int.symbol).unwrap();
    let number_ty = facade.default_instantiation(number.symbol).unwrap();

    // Inverted bounds still construct; this frontend trusts its callers.
    let inverted =
        FlexibleTypeBuilder::from_bounds(facade.session().clone(), number_ty, int_ty).unwrap();
    let ty = facade.build_flexible_type(inverted).unwrap();
    assert_eq!(ty.to_string(), "core.Number..core.Int");
}

#[test]
fn direct_supertypes_substitute_the_instantiation_arguments() {
    let (world, int, _) = basic_world();
    let container = world.declare_class("core.Container", &["U"]);
    let boxed = world.declare_class("core.Box", &["T"]);
    boxed.set_supertypes(vec![DescTemplate::class_with_args(
        &container,
        vec![DescArg::invariant(DescTemplate::parameter(
            &boxed.type_parameters[0],
        ))],
    )]);

    let facade = DescTypeFacade::for_new_session(&world);
    let int_ty = facade.default_instantiation(int.symbol).unwrap();
    let mut builder =
        ClassTypeBuilder::by_symbol(facade.session().clone(), boxed.symbol).unwrap();
    builder
        .argument(TypeProjection::invariant(int_ty))
        .unwrap();
    let box_int = facade.build_class_type(builder).unwrap();

    let supertypes = facade.direct_supertypes(&box_int);
    assert_eq!(supertypes.len(), 1);
    assert_eq!(supertypes[0].to_string(), "core.Container<core.Int>");
}

#[test]
fn subtyping_walks_the_descriptor_graph() {
    let (world, int, number) = basic_world();
    let facade = DescTypeFacade::for_new_session(&world);
    let int_ty = facade.default_instantiation(int.symbol).unwrap();
    let number_ty = facade.default_instantiation(number.symbol).unwrap();

    assert!(facade.is_subtype_of(&int_ty, &number_ty));
    assert!(!facade.is_subtype_of(&number_ty, &int_ty));
    assert!(facade.is_subtype_of(&int_ty, &facade.dynamic_type()));
}

#[test]
fn stop_world_cleanup_invalidates_sessions_and_caches() {
    let (world, int, _) = basic_world();
    let facade = DescTypeFacade::for_new_session(&world);
    let int_ty = facade.default_instantiation(int.symbol).unwrap();

    let cleaner = DescTypeFacade::cleaner(&world);
    cleaner.schedule_cleanup();

    assert!(facade.session().check_valid().is_err());
    assert!(int_ty.kind().is_err());

    let fresh = DescTypeFacade::for_new_session(&world);
    assert!(fresh.default_instantiation(int.symbol).is_ok());
}
