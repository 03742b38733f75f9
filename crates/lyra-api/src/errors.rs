//! Error taxonomy of the type core.
//!
//! Three failure classes exist, and only two of them surface here:
//!
//! - Recoverable resolution misses are encoded as error-marker *types*
//!   (`TypeKind::Error`), never as `Err` values.
//! - Precondition violations (flexible type wrapped as definitely-not-null,
//!   flexible bounds out of order) abort the one construction call.
//! - Validity violations (a type or builder outliving its session) fail
//!   loudly on every access.

use lyra_session::StaleSessionError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The owning analysis session has ended.
    StaleSession(StaleSessionError),
    /// Programmer error on one construction call; descriptive, fatal for
    /// that call only.
    Precondition(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StaleSession(err) => err.fmt(f),
            Self::Precondition(message) => write!(f, "precondition violated: {message}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StaleSession(err) => Some(err),
            Self::Precondition(_) => None,
        }
    }
}

impl From<StaleSessionError> for EngineError {
    fn from(err: StaleSessionError) -> Self {
        Self::StaleSession(err)
    }
}
