use super::*;
use lyra_api::types::SymbolId;

#[test]
fn interning_deduplicates_structurally_equal_templates() {
    let interner = HirTypeInterner::new();
    let a = interner.intern(HirTypeData::class(SymbolId(1)));
    let b = interner.intern(HirTypeData::class(SymbolId(1)));
    let c = interner.intern(HirTypeData::class(SymbolId(2)));

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.len(), 2);
}

#[test]
fn get_round_trips_the_payload() {
    let interner = HirTypeInterner::new();
    let template = HirTypeData::class_with_args(
        SymbolId(3),
        vec![HirProjection::Star, HirProjection::invariant(HirTypeId(0))],
    );
    let id = interner.intern(template.clone());
    assert_eq!(interner.get(id), Some(template));
}

#[test]
fn unknown_ids_resolve_to_none() {
    let interner = HirTypeInterner::new();
    assert_eq!(interner.get(HirTypeId(42)), None);
    assert!(interner.is_empty());
}
