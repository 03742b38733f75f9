//! Session identity and validity tokens.
//!
//! A `SessionToken` is a capability carried alongside every type and builder.
//! Validity is an arena-generation check: the registry keeps a monotonically
//! increasing watermark, and completing a stop-world cleanup advances the
//! watermark past every session created before it. A token is valid iff its
//! id is at or above the watermark and the session was not explicitly
//! disposed.

use dashmap::DashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Identifier of one analysis session. Allocated sequentially per registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Sentinel value for an invalid session.
    pub const INVALID: Self = Self(0);

    /// First id a registry hands out.
    pub const FIRST_VALID: u64 = 1;
}

/// Error returned by any operation on a type or builder whose owning session
/// has ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleSessionError {
    pub session: SessionId,
}

impl std::fmt::Display for StaleSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "analysis session {} is no longer valid; types and builders must not outlive their session",
            self.session.0
        )
    }
}

impl std::error::Error for StaleSessionError {}

/// Registry of live analysis sessions.
///
/// The registry owns no session state beyond validity. Sessions become
/// invalid in one of two ways: individually via [`SessionRegistry::dispose`],
/// or in bulk via [`SessionRegistry::invalidate_all`] when a stop-world
/// cleanup completes.
pub struct SessionRegistry {
    next_id: AtomicU64,
    /// Watermark: every session id strictly below this value is invalid.
    invalid_below: AtomicU64,
    disposed: DashSet<SessionId, rustc_hash::FxBuildHasher>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(SessionId::FIRST_VALID),
            invalid_below: AtomicU64::new(SessionId::FIRST_VALID),
            disposed: DashSet::default(),
        }
    }

    /// Open a new session and return its validity token.
    pub fn create_session(self: &Arc<Self>) -> SessionToken {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        trace!(session = id.0, "SessionRegistry::create_session");
        SessionToken {
            id,
            registry: Arc::clone(self),
        }
    }

    /// Invalidate a single session.
    pub fn dispose(&self, id: SessionId) {
        trace!(session = id.0, "SessionRegistry::dispose");
        self.disposed.insert(id);
    }

    /// Invalidate every session created so far. Sessions created after this
    /// call are unaffected. Called when a stop-world cleanup completes.
    pub fn invalidate_all(&self) {
        let watermark = self.next_id.load(Ordering::SeqCst);
        self.invalid_below.store(watermark, Ordering::SeqCst);
        // Disposed entries below the watermark are now redundant.
        self.disposed.retain(|id| id.0 >= watermark);
        trace!(watermark, "SessionRegistry::invalidate_all");
    }

    pub fn is_valid(&self, id: SessionId) -> bool {
        // The watermark starts at FIRST_VALID, so SessionId::INVALID (0) is
        // always below it.
        id.0 >= self.invalid_below.load(Ordering::SeqCst) && !self.disposed.contains(&id)
    }
}

/// Validity tag carried by every type and builder.
///
/// Cloning a token does not extend the session's lifetime; it copies the
/// capability. Equality compares session identity only.
#[derive(Clone)]
pub struct SessionToken {
    id: SessionId,
    registry: Arc<SessionRegistry>,
}

impl SessionToken {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Assert the owning session is still current.
    pub fn check_valid(&self) -> Result<(), StaleSessionError> {
        if self.registry.is_valid(self.id) {
            Ok(())
        } else {
            Err(StaleSessionError { session: self.id })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.registry.is_valid(self.id)
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("id", &self.id.0)
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SessionToken {}

impl std::hash::Hash for SessionToken {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Consistent with PartialEq: session identity only.
        self.id.hash(state);
    }
}

#[cfg(test)]
#[path = "../tests/token_tests.rs"]
mod tests;
