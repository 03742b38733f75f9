//! Human-readable rendering of types and projections.
//!
//! Rendering is a diagnostic surface: it must work on stale types too (a
//! panic message quoting a type cannot itself fail), so it bypasses the
//! session-validity assertion that guards computation.

use crate::types::{Nullability, Type, TypeKind, TypeProjection, Variance};
use std::fmt;

fn nullability_suffix(nullability: Nullability) -> &'static str {
    if nullability.is_nullable() { "?" } else { "" }
}

impl fmt::Display for TypeProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Star => f.write_str("*"),
            Self::Argument { ty, variance } => {
                match variance {
                    Variance::Invariant => {}
                    Variance::In => f.write_str("in ")?,
                    Variance::Out => f.write_str("out ")?,
                }
                ty.fmt(f)
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Value-parameter names render as `name: T`.
        if let Some(name) = self.parameter_name() {
            write!(f, "{name}: ")?;
        }
        match self.kind_unchecked() {
            TypeKind::Class(class) => {
                write!(f, "{}", class.class_id)?;
                if !class.args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in class.args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        arg.fmt(f)?;
                    }
                    f.write_str(">")?;
                }
                f.write_str(nullability_suffix(class.nullability))
            }
            TypeKind::TypeParameter(param) => {
                write!(f, "{}{}", param.name, nullability_suffix(param.nullability))
            }
            TypeKind::Captured(captured) => {
                write!(
                    f,
                    "CAPTURED({}){}",
                    captured.projection,
                    nullability_suffix(captured.nullability)
                )
            }
            TypeKind::DefinitelyNotNull(original) => write!(f, "{original} & Any"),
            TypeKind::Flexible(flexible) => {
                write!(
                    f,
                    "{}..{}{}",
                    flexible.lower,
                    flexible.upper,
                    nullability_suffix(flexible.nullability)
                )
            }
            TypeKind::Intersection(intersection) => {
                for (i, conjunct) in intersection.conjuncts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    conjunct.fmt(f)?;
                }
                Ok(())
            }
            TypeKind::Dynamic => f.write_str("dynamic"),
            TypeKind::Error(err) => write!(f, "ERROR({})", err.attempted_name),
        }
    }
}
