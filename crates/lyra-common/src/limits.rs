//! Centralized limits and thresholds for the analysis engine.
//!
//! Shared constants for recursion depths and polling intervals used across
//! the workspace. Centralizing these values prevents duplicate definitions
//! with inconsistent values and documents the rationale for each limit.

/// Maximum recursion depth for substitution over nested type structures.
///
/// Substitution recurses through class-type arguments, flexible bounds,
/// intersection conjuncts and wrapper types. Hand-written code rarely nests
/// beyond a few dozen levels; generated code can be deeper. At 256 levels
/// substitution stops and returns the input unchanged rather than
/// overflowing the stack.
pub const MAX_SUBSTITUTION_DEPTH: u32 = 256;

/// Maximum recursion depth for the extension-receiver variance walk.
///
/// The receiver matcher recurses per type argument and per type-parameter
/// bound. The walk is an approximation with an optimistic bias, so bailing
/// out reports "compatible" rather than losing a resolvable reference.
pub const MAX_RECEIVER_MATCH_DEPTH: u32 = 64;

/// Maximum supertype-walk depth for nominal subtype queries.
///
/// Bounds traversal of the declared-supertype graph so a cyclic or
/// pathologically deep hierarchy cannot hang a subtype query.
pub const MAX_SUPERTYPE_WALK_DEPTH: u32 = 128;

/// Polling interval, in milliseconds, for threads blocked on a pending
/// stop-world cleanup.
///
/// Blocked entries wake up at this interval to run the caller's cancellation
/// check, so an externally cancelled operation never deadlocks the cleanup
/// waiter.
pub const CLEANUP_WAIT_POLL_MS: u64 = 50;

/// Highest function arity for which an arity-suffixed function class is
/// synthesized. Matches the largest `Function<N>` shape the standard world
/// declares; commits beyond it fail with a precondition error.
pub const MAX_FUNCTION_ARITY: usize = 22;
