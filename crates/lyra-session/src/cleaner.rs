//! Stop-world cache cleanup coordinated against in-flight analyses.
//!
//! State machine per engine instance:
//!
//! - `Idle -> InAnalysis` on entering an analyze block. Re-entrant entry on
//!   the same thread bumps a thread-local depth counter and does not count
//!   toward the global in-flight total.
//! - `InAnalysis -> Idle` on the matching top-level exit.
//! - A cleanup request at zero in-flight runs immediately and synchronously
//!   in the requesting context. Otherwise it is deferred: new top-level
//!   entries block (bounded polling, cancellation-checked) until the last
//!   in-flight analysis exits, which runs the deferred cleanup inside its
//!   own critical section and releases all waiters.
//!
//! Invariants:
//! - At most one cleanup is pending or running at a time; a second request
//!   while one is pending coalesces into a no-op.
//! - The in-flight counter never goes negative; a violation is logged as an
//!   internal-consistency error and clamped so subsequent state stays usable.

use crate::token::SessionRegistry;
use lyra_common::limits::CLEANUP_WAIT_POLL_MS;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::ThreadId;
use std::time::Duration;
use tracing::{error, trace};

/// Global counter for assigning unique instance IDs to cleaners. The
/// thread-local depth map is keyed by instance id so two cleaners on the
/// same thread never observe each other's nesting.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Per-thread analysis nesting depth, keyed by cleaner instance id.
    static ANALYSIS_DEPTH: RefCell<FxHashMap<u64, u32>> = RefCell::new(FxHashMap::default());
}

/// External collaborator actually holding the caches this subsystem triggers
/// invalidation on. Injected, never owned.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self);
}

/// Error returned when a blocked analysis entry observes external
/// cancellation while waiting for a pending cleanup to finish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelledError;

impl std::fmt::Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("analysis entry cancelled while waiting for a pending cleanup")
    }
}

impl std::error::Error for CancelledError {}

/// Three-method contract every caller of "run an analysis block" must
/// bracket its block with.
pub trait AnalysisGate: Send + Sync {
    /// Enter an analysis block. Blocks (cancellably) while a cleanup is
    /// pending, unless this thread is already inside an analysis.
    fn enter_analysis(&self) -> Result<(), CancelledError>;

    /// Exit the innermost analysis block entered on this thread.
    fn exit_analysis(&self);

    /// Request a stop-world cleanup. Runs synchronously if nothing is in
    /// flight, otherwise defers to the last exiting analysis.
    fn schedule_cleanup(&self);

    /// Number of top-level analyses currently in flight.
    fn in_flight(&self) -> usize;

    /// Nesting depth of the current thread's analysis, zero when idle.
    fn depth_on_current_thread(&self) -> u32;
}

struct GateState {
    in_flight: u32,
    active_threads: HashSet<ThreadId, rustc_hash::FxBuildHasher>,
    cleanup_pending: bool,
    cleanup_running: bool,
}

/// Deferred, latch-based stop-world cleaner.
///
/// One mutex-guarded region holds the in-flight counter, the active thread
/// set, and the pending flag; the condvar is the re-armable signal that
/// releases waiters once a deferred cleanup has run. Per-thread nesting uses
/// thread-local state and takes no lock.
pub struct StopWorldCleaner {
    instance_id: u64,
    state: Mutex<GateState>,
    drained: Condvar,
    invalidator: Arc<dyn CacheInvalidator>,
    registry: Arc<SessionRegistry>,
    /// Cooperative cancellation probe evaluated while blocked-waiting.
    cancelled: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
}

impl StopWorldCleaner {
    pub fn new(invalidator: Arc<dyn CacheInvalidator>, registry: Arc<SessionRegistry>) -> Self {
        Self {
            instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst),
            state: Mutex::new(GateState {
                in_flight: 0,
                active_threads: HashSet::default(),
                cleanup_pending: false,
                cleanup_running: false,
            }),
            drained: Condvar::new(),
            invalidator,
            registry,
            cancelled: None,
        }
    }

    /// Install a cancellation probe checked while an entry is blocked on a
    /// pending cleanup.
    pub fn with_cancellation(mut self, probe: Arc<dyn Fn() -> bool + Send + Sync>) -> Self {
        self.cancelled = Some(probe);
        self
    }

    fn current_depth(&self) -> u32 {
        ANALYSIS_DEPTH.with(|d| d.borrow().get(&self.instance_id).copied().unwrap_or(0))
    }

    fn set_current_depth(&self, depth: u32) {
        ANALYSIS_DEPTH.with(|d| {
            let mut map = d.borrow_mut();
            if depth == 0 {
                map.remove(&self.instance_id);
            } else {
                map.insert(self.instance_id, depth);
            }
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run the invalidation inside the caller's critical section.
    ///
    /// Holding the lock here is what makes the decrement-then-cleanup
    /// transition race-free against a concurrently arriving
    /// `schedule_cleanup`.
    fn run_cleanup_locked(&self, state: &mut GateState) {
        if state.cleanup_running {
            // Outside the designed coalescing path. Do not corrupt state:
            // drop the request and force the latch open.
            error!(
                instance_id = self.instance_id,
                "second cleanup attempted while one is running; coalescing forcibly"
            );
            state.cleanup_pending = false;
            return;
        }
        state.cleanup_running = true;
        trace!(instance_id = self.instance_id, "StopWorldCleaner: running cleanup");
        self.invalidator.invalidate();
        // All sessions created before this point are now invalid.
        self.registry.invalidate_all();
        state.cleanup_pending = false;
        state.cleanup_running = false;
    }
}

impl AnalysisGate for StopWorldCleaner {
    fn enter_analysis(&self) -> Result<(), CancelledError> {
        let depth = self.current_depth();
        if depth > 0 {
            // Nested entry: uncounted, never blocks. This is also the
            // liveness safeguard: a thread that already holds an in-flight
            // analysis must not wait on a cleanup that is waiting for it.
            self.set_current_depth(depth + 1);
            return Ok(());
        }

        let mut state = self.lock_state();
        while state.cleanup_pending {
            if let Some(probe) = &self.cancelled
                && probe()
            {
                return Err(CancelledError);
            }
            let (next, _timeout) = self
                .drained
                .wait_timeout(state, Duration::from_millis(CLEANUP_WAIT_POLL_MS))
                .unwrap_or_else(|e| e.into_inner());
            state = next;
        }
        state.in_flight += 1;
        state.active_threads.insert(std::thread::current().id());
        trace!(
            instance_id = self.instance_id,
            in_flight = state.in_flight,
            "StopWorldCleaner: top-level analysis entered"
        );
        drop(state);
        self.set_current_depth(1);
        Ok(())
    }

    fn exit_analysis(&self) {
        let depth = self.current_depth();
        if depth == 0 {
            error!(
                instance_id = self.instance_id,
                "exit_analysis without matching enter_analysis on this thread"
            );
            return;
        }
        if depth > 1 {
            self.set_current_depth(depth - 1);
            return;
        }
        self.set_current_depth(0);

        let mut state = self.lock_state();
        if state.in_flight == 0 {
            // Internal-consistency violation: clamp instead of underflow and
            // force the latch open so waiters cannot hang.
            error!(
                instance_id = self.instance_id,
                "in-flight analysis counter underflow"
            );
            if state.cleanup_pending {
                self.run_cleanup_locked(&mut state);
            }
            drop(state);
            self.drained.notify_all();
            return;
        }
        state.in_flight -= 1;
        state.active_threads.remove(&std::thread::current().id());
        trace!(
            instance_id = self.instance_id,
            in_flight = state.in_flight,
            "StopWorldCleaner: top-level analysis exited"
        );
        if state.in_flight == 0 && state.cleanup_pending {
            self.run_cleanup_locked(&mut state);
            drop(state);
            self.drained.notify_all();
        }
    }

    fn schedule_cleanup(&self) {
        let mut state = self.lock_state();
        if state.cleanup_pending {
            // Coalesced: the pending cleanup will serve this request too.
            trace!(
                instance_id = self.instance_id,
                "StopWorldCleaner: cleanup request coalesced"
            );
            return;
        }
        if state.in_flight == 0 {
            self.run_cleanup_locked(&mut state);
            drop(state);
            self.drained.notify_all();
        } else {
            trace!(
                instance_id = self.instance_id,
                in_flight = state.in_flight,
                "StopWorldCleaner: cleanup deferred"
            );
            state.cleanup_pending = true;
        }
    }

    fn in_flight(&self) -> usize {
        self.lock_state().in_flight as usize
    }

    fn depth_on_current_thread(&self) -> u32 {
        self.current_depth()
    }
}

/// Drop-in substitute used when forceful cleanup is administratively
/// disabled: reports zero in-flight and runs nothing.
pub struct DisabledCleaner;

impl AnalysisGate for DisabledCleaner {
    fn enter_analysis(&self) -> Result<(), CancelledError> {
        Ok(())
    }

    fn exit_analysis(&self) {}

    fn schedule_cleanup(&self) {}

    fn in_flight(&self) -> usize {
        0
    }

    fn depth_on_current_thread(&self) -> u32 {
        0
    }
}

/// Bracket a closure with `enter_analysis` / `exit_analysis`, exiting even
/// if the closure panics.
pub fn with_analysis<R>(
    gate: &dyn AnalysisGate,
    f: impl FnOnce() -> R,
) -> Result<R, CancelledError> {
    struct ExitGuard<'a>(&'a dyn AnalysisGate);
    impl Drop for ExitGuard<'_> {
        fn drop(&mut self) {
            self.0.exit_analysis();
        }
    }

    gate.enter_analysis()?;
    let _guard = ExitGuard(gate);
    Ok(f())
}

#[cfg(test)]
#[path = "../tests/cleaner_tests.rs"]
mod tests;
