//! Session validity and cache invalidation for the lyra analysis engine.
//!
//! Every type and builder produced by the engine is scoped to an analysis
//! session. This crate provides:
//!
//! - **Validity tokens** (`SessionToken`): an arena-generation check attached
//!   to otherwise-plain values. Accessors call `check_valid` before returning
//!   data; a token whose session ended fails loudly, never silently.
//! - **Stop-world cleanup** (`StopWorldCleaner`): coordinates bulk cache
//!   invalidation against concurrently running analyses. Cleanup never runs
//!   while an analysis is in flight; new top-level entries block (with
//!   bounded, cancellable polling) while a cleanup is pending.
//!
//! The cleaner is the only component here with shared-mutable-state locking:
//! a single mutex guards the in-flight counter, the active thread set, and
//! the pending-cleanup flag. Per-thread nesting depth is thread-local and
//! needs no lock.

mod cleaner;
mod token;

pub use cleaner::{
    AnalysisGate, CacheInvalidator, CancelledError, DisabledCleaner, StopWorldCleaner,
    with_analysis,
};
pub use token::{SessionId, SessionRegistry, SessionToken, StaleSessionError};
