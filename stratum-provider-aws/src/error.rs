//! AWS error classification
//!
//! SDK errors are classified by their error code (via `ProvideErrorMetadata`)
//! rather than by matching on their Debug output.

use aws_sdk_cloudcontrol::error::{DisplayErrorContext, ProvideErrorMetadata};
use stratum_core::provider::{ErrorKind, ProviderError};
use stratum_core::waiter::FetchError;
use thiserror::Error;

/// AWS error categories relevant to waiting and locking
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (possibly not yet visible)
    #[error("Resource not found: {message}")]
    NotFound { code: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    Throttled(String),

    /// Another operation on the same object is in progress
    #[error("Conflicting operation in progress: {message}")]
    Conflict { code: String, message: String },

    /// Request could not be built from the declared attributes
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// Generic AWS SDK error with code and message
    #[error("AWS error{}: {message}", .code.as_deref().map(|c| format!(" ({})", c)).unwrap_or_default())]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            code: "ResourceNotFoundException".to_string(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "ResourceNotFoundException",
    "RequestTokenNotFoundException",
    "NotFoundException",
    "NoSuchEntity",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
];

/// Known AWS error codes for concurrent modification of one object
const CONFLICT_CODES: &[&str] = &[
    "ResourceInUseException",
    "ConcurrentModificationException",
    "ConcurrentOperationException",
    "ResourceConflictException",
];

/// Classify an AWS error from its code and message
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled(message),
        Some(c) if CONFLICT_CODES.contains(&c) => AwsError::Conflict {
            code: c.to_string(),
            message,
        },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK error (`SdkError<E>` of any service)
///
/// Errors without service metadata (dispatch, timeout, credentials) keep their
/// full context chain as the message.
pub fn classify_sdk_error<E>(err: E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let meta = ProvideErrorMetadata::meta(&err);
    if meta.code().is_none() && meta.message().is_none() {
        return AwsError::Sdk {
            code: None,
            message: DisplayErrorContext(err).to_string(),
        };
    }
    classify_aws_error(meta.code(), meta.message())
}

impl From<AwsError> for FetchError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::NotFound { message, .. } => FetchError::NotFound(message),
            other => FetchError::other(other),
        }
    }
}

impl From<AwsError> for ProviderError {
    fn from(err: AwsError) -> Self {
        let kind = match &err {
            AwsError::NotFound { .. } => ErrorKind::NotFound,
            AwsError::InvalidInput(_) => ErrorKind::InvalidConfig,
            _ => ErrorKind::Other,
        };
        ProviderError::new(err.to_string())
            .with_kind(kind)
            .with_cause(err)
    }
}
