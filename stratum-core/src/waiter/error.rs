//! Error types produced by status refreshes and by the waiter itself

use std::time::Duration;

use thiserror::Error;

/// Boxed error used to carry SDK and transport failures through the waiter
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by a single status refresh
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote object is not (yet) visible
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other failure; never retried by the waiter
    #[error(transparent)]
    Other(BoxError),
}

impl FetchError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn other(error: impl Into<BoxError>) -> Self {
        Self::Other(error.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Terminal error of a wait operation
///
/// Timeout, cancellation and remote-reported failure are separate variants so
/// callers can decide whether the remote operation may still be running.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The wait was configured inconsistently (e.g. overlapping status sets)
    #[error("invalid wait configuration: {0}")]
    InvalidConfig(String),

    /// The remote object reported one of the failure statuses
    #[error("{resource}: entered failure state {status}{}", detail_suffix(.detail))]
    Failed {
        resource: String,
        status: String,
        detail: Option<String>,
    },

    /// The total wait budget was spent while the object was still pending
    #[error(
        "{resource}: timeout after {timeout:?} waiting for state to become {expected} (last state: {}, {attempts} attempts){}",
        .last_status.as_deref().unwrap_or("none"),
        detail_suffix(.last_detail)
    )]
    Timeout {
        resource: String,
        timeout: Duration,
        expected: String,
        last_status: Option<String>,
        last_detail: Option<String>,
        attempts: u32,
    },

    /// The caller's cancellation token fired
    #[error("{resource}: wait cancelled (last state: {})", .last_status.as_deref().unwrap_or("none"))]
    Cancelled {
        resource: String,
        last_status: Option<String>,
    },

    /// The object stayed absent after the not-found budget was spent
    #[error("{resource}: couldn't find resource ({checks} retries): {last_error}")]
    NotFound {
        resource: String,
        checks: u32,
        last_error: String,
    },

    /// A status outside every configured set was observed in strict mode
    #[error("{resource}: unexpected state '{status}', wanted target '{}'", .expected.join(", "))]
    UnexpectedState {
        resource: String,
        status: String,
        expected: Vec<String>,
    },

    /// The refresh itself failed
    #[error("{resource}: {source}")]
    Fetch {
        resource: String,
        #[source]
        source: BoxError,
    },
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Last status observed before the wait ended, when one is known
    pub fn last_status(&self) -> Option<&str> {
        match self {
            Self::Failed { status, .. } | Self::UnexpectedState { status, .. } => Some(status),
            Self::Timeout { last_status, .. } | Self::Cancelled { last_status, .. } => {
                last_status.as_deref()
            }
            _ => None,
        }
    }
}

/// A [`WaitError`] together with the last object snapshot the waiter observed
///
/// For a timeout this is the snapshot of the final refresh before the budget
/// ran out; for a failure status it is the failing object itself.
#[derive(Debug)]
pub struct WaitFailure<T> {
    pub error: WaitError,
    pub last_snapshot: Option<T>,
}

impl<T> WaitFailure<T> {
    pub fn new(error: WaitError, last_snapshot: Option<T>) -> Self {
        Self {
            error,
            last_snapshot,
        }
    }

    pub fn into_error(self) -> WaitError {
        self.error
    }
}

impl<T> std::fmt::Display for WaitFailure<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl<T: std::fmt::Debug> std::error::Error for WaitFailure<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

impl<T> From<WaitFailure<T>> for WaitError {
    fn from(failure: WaitFailure<T>) -> Self {
        failure.error
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!(": {}", detail),
        _ => String::new(),
    }
}
