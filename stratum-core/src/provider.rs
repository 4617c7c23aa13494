//! Provider - Trait abstracting resource operations
//!
//! A Provider maps declared resources onto a cloud control plane. It is
//! responsible for issuing the API calls and waiting for them to settle.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::timeouts::{Timeouts, TimeoutsError};
use crate::waiter::{WaitError, WaitFailure};

/// Broad category of a provider failure, kept so the host can tell a timed-out
/// operation (possibly still running remotely) from a definitive failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote object does not exist
    NotFound,
    /// The service reported the operation as failed
    RemoteFailure,
    /// The wait budget ran out; the remote operation may still be in progress
    Timeout,
    /// The operation was cancelled locally
    Cancelled,
    /// The declared configuration is invalid
    InvalidConfig,
    Other,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub kind: ErrorKind,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] {}", id, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Other,
            resource_id: None,
            cause: None,
        }
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }
}

impl From<WaitError> for ProviderError {
    fn from(err: WaitError) -> Self {
        let kind = match &err {
            WaitError::Timeout { .. } => ErrorKind::Timeout,
            WaitError::Cancelled { .. } => ErrorKind::Cancelled,
            WaitError::Failed { .. } | WaitError::UnexpectedState { .. } => ErrorKind::RemoteFailure,
            WaitError::NotFound { .. } => ErrorKind::NotFound,
            WaitError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            WaitError::Fetch { .. } => ErrorKind::Other,
        };
        ProviderError::new(err.to_string())
            .with_kind(kind)
            .with_cause(err)
    }
}

impl<T> From<WaitFailure<T>> for ProviderError {
    fn from(failure: WaitFailure<T>) -> Self {
        failure.error.into()
    }
}

impl From<TimeoutsError> for ProviderError {
    fn from(err: TimeoutsError) -> Self {
        ProviderError::new(err.to_string())
            .with_kind(ErrorKind::InvalidConfig)
            .with_cause(err)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "comprehend.entity_recognizer")
    fn name(&self) -> &'static str;

    /// Default time budget of each operation on this type
    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }
}

/// Main Provider trait
///
/// All operations are async and involve side effects.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "aws")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Get the current state of a resource
    ///
    /// Returns `State::not_found()` if the resource does not exist or no
    /// identifier is known yet.
    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource and wait until it is usable
    ///
    /// Returns State with identifier set to the remote ID (ARN, detector ID, ...)
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource and wait until it is gone
    ///
    /// `state` is the last known state; some resources need it to decide which
    /// locks the deletion must hold.
    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        state: &State,
    ) -> BoxFuture<'_, ProviderResult<()>>;
}
