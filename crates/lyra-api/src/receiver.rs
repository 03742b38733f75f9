//! Candidate-filtering receiver match.
//!
//! Answers "could `actual` possibly be a receiver for an extension declared
//! on `declared`?" for call-candidate filtering. The check is deliberately
//! optimistic: a `true` only means the candidate survives to full overload
//! resolution, so every ambiguous case (unresolved bounds, depth bailout,
//! type-parameter arguments) answers `true`. Two hard refusals: error-marker
//! types never match (and never abort the walk), and a bare type-parameter
//! actual never stands in for a concrete declared receiver.

use crate::errors::EngineResult;
use crate::facade::TypeFacade;
use crate::types::{Type, TypeKind, TypeProjection, Variance};
use lyra_common::limits::{MAX_RECEIVER_MATCH_DEPTH, MAX_SUPERTYPE_WALK_DEPTH};
use std::collections::VecDeque;
use tracing::trace;

/// Whether `actual` is a possible receiver for a candidate declared on
/// `declared`.
pub fn is_possible_receiver<F: TypeFacade + ?Sized>(
    facade: &F,
    declared: &Type,
    actual: &Type,
) -> EngineResult<bool> {
    matches(facade, declared, actual, 0)
}

fn matches<F: TypeFacade + ?Sized>(
    facade: &F,
    declared: &Type,
    actual: &Type,
    depth: u32,
) -> EngineResult<bool> {
    if depth > MAX_RECEIVER_MATCH_DEPTH {
        trace!(depth, "receiver match depth limit hit; answering optimistically");
        return Ok(true);
    }

    // Error markers never match, on either side.
    if actual.is_error()? || declared.is_error()? {
        return Ok(false);
    }

    match actual.kind()? {
        TypeKind::Dynamic => return Ok(true),
        // The upper bound is the most permissive reading of a flexible
        // actual; the optimistic answer uses it.
        TypeKind::Flexible(flexible) => {
            return matches(facade, declared, &flexible.upper, depth + 1);
        }
        TypeKind::DefinitelyNotNull(original) => {
            return matches(facade, declared, original, depth + 1);
        }
        TypeKind::Captured(captured) => {
            return match captured.projection.ty() {
                Some(ty) => matches(facade, declared, ty, depth + 1),
                // A star capture could be anything.
                None => Ok(true),
            };
        }
        TypeKind::Intersection(intersection) => {
            for conjunct in &intersection.conjuncts {
                if matches(facade, declared, conjunct, depth + 1)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        TypeKind::TypeParameter(actual_param) => {
            // A bare parameter never stands in for a concrete receiver; it
            // only matches a declared receiver that is itself a bare
            // parameter, and only when each declared bound overlaps one of
            // its own.
            let TypeKind::TypeParameter(declared_param) = declared.kind()? else {
                return Ok(false);
            };
            if actual_param.symbol == declared_param.symbol {
                return Ok(true);
            }
            let declared_bounds = facade.type_parameter_bounds(declared_param.symbol);
            if declared_bounds.is_empty() {
                return Ok(true);
            }
            let actual_bounds = facade.type_parameter_bounds(actual_param.symbol);
            for wanted in &declared_bounds {
                let mut satisfied = false;
                for bound in &actual_bounds {
                    if matches(facade, wanted, bound, depth + 1)? {
                        satisfied = true;
                        break;
                    }
                }
                if !satisfied {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        TypeKind::Class(_) | TypeKind::Error(_) => {}
    }

    match declared.kind()? {
        TypeKind::Dynamic => Ok(true),
        // The lower bound is the least the declaration demands.
        TypeKind::Flexible(flexible) => matches(facade, &flexible.lower, actual, depth + 1),
        TypeKind::DefinitelyNotNull(original) => {
            // The receiver must be non-null on top of matching the original.
            if actual.nullability()?.is_nullable() {
                return Ok(false);
            }
            matches(facade, original, actual, depth + 1)
        }
        TypeKind::Captured(captured) => match captured.projection.ty() {
            Some(ty) => matches(facade, ty, actual, depth + 1),
            None => Ok(true),
        },
        TypeKind::Intersection(intersection) => {
            for conjunct in &intersection.conjuncts {
                if !matches(facade, conjunct, actual, depth + 1)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        TypeKind::TypeParameter(param) => {
            // Declared on an abstract receiver: the actual must fit every
            // declared bound.
            for bound in facade.type_parameter_bounds(param.symbol) {
                if !matches(facade, &bound, actual, depth + 1)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        TypeKind::Class(declared_class) => {
            let TypeKind::Class(actual_class) = actual.kind()? else {
                return Ok(false);
            };
            if actual_class.nullability.is_nullable()
                && !declared_class.nullability.is_nullable()
            {
                return Ok(false);
            }
            // Same classifier: candidate survives without an argument
            // check; full resolution sorts out instantiations.
            if actual_class.symbol == declared_class.symbol {
                return Ok(true);
            }
            if facade.is_subtype_of(actual, declared) {
                return Ok(true);
            }
            // Walk the instantiated supertype graph up from the actual
            // classifier looking for the declared one.
            let Some(at_declared) = supertype_at_symbol(facade, actual, declared)? else {
                return Ok(false);
            };
            let TypeKind::Class(lifted) = at_declared.kind()?.clone() else {
                return Ok(false);
            };
            for (supplied, wanted) in lifted.args.iter().zip(declared_class.args.iter()) {
                if !argument_matches(facade, wanted, supplied, depth + 1)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        TypeKind::Error(_) => Ok(false),
    }
}

/// Per-argument comparison once both sides are instantiations of the same
/// classifier. Star and type-parameter slots are ambiguous and answer
/// optimistically.
fn argument_matches<F: TypeFacade + ?Sized>(
    facade: &F,
    wanted: &TypeProjection,
    supplied: &TypeProjection,
    depth: u32,
) -> EngineResult<bool> {
    let (TypeProjection::Argument { ty: wanted_ty, variance }, Some(supplied_ty)) =
        (wanted, supplied.ty())
    else {
        return Ok(true);
    };
    let abstract_slot = matches!(wanted_ty.kind()?, TypeKind::TypeParameter(_))
        || matches!(supplied_ty.kind()?, TypeKind::TypeParameter(_));
    if abstract_slot {
        return Ok(true);
    }
    match variance {
        Variance::Invariant => Ok(wanted_ty == supplied_ty),
        Variance::Out => matches(facade, wanted_ty, supplied_ty, depth),
        Variance::In => matches(facade, supplied_ty, wanted_ty, depth),
    }
}

/// Breadth-first walk of the instantiated supertypes of `ty`, returning the
/// instantiation at the classifier of `target` if reachable.
fn supertype_at_symbol<F: TypeFacade + ?Sized>(
    facade: &F,
    ty: &Type,
    target: &Type,
) -> EngineResult<Option<Type>> {
    let Some(target_symbol) = target.class_symbol()? else {
        return Ok(None);
    };
    let mut queue = VecDeque::from([(ty.clone(), 0u32)]);
    let mut seen = rustc_hash::FxHashSet::default();
    while let Some((current, depth)) = queue.pop_front() {
        if depth > MAX_SUPERTYPE_WALK_DEPTH {
            continue;
        }
        if let Some(symbol) = current.class_symbol()? {
            if !seen.insert(symbol) {
                continue;
            }
            if symbol == target_symbol {
                return Ok(Some(current));
            }
        }
        for sup in facade.direct_supertypes(&current) {
            queue.push_back((sup, depth + 1));
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "../tests/receiver_tests.rs"]
mod tests;
