//! Error types for facade operations.
//!
//! Two kinds of failure reach callers:
//!
//! - [`FacadeError::LocalResource`] when a local file cannot be opened for
//!   upload. Raised before any remote call is made.
//! - [`FacadeError::Service`] for anything the storage client reports. The
//!   facade does not classify these; the service error code is carried
//!   verbatim in [`ServiceError::code`] for the caller to inspect.
//!
//! [`FacadeError::NotVisible`] additionally reports an existence poll that
//! ran out of attempts.

use std::fmt;
use std::path::PathBuf;

/// Error code the service returns when an email grantee does not resolve to
/// an account.
pub const UNRESOLVABLE_GRANT_BY_EMAIL: &str = "UnresolvableGrantByEmailAddress";

/// A failure reported by the storage client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// Service error code (e.g. `NoSuchKey`), absent for client-side
    /// failures such as dispatch or timeout errors.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl ServiceError {
    /// Create an error carrying a service error code.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Create an error for a failure that produced no service error code.
    #[must_use]
    pub fn client(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// The service error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Whether the service could not resolve an email grantee to an account.
    #[must_use]
    pub fn is_unresolvable_grantee(&self) -> bool {
        self.code() == Some(UNRESOLVABLE_GRANT_BY_EMAIL)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Error type returned by every facade operation.
#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    /// The local file given as upload source could not be opened.
    #[error("cannot open {} for upload: {source}", path.display())]
    LocalResource {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The storage client reported a failure.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The object did not become visible within the configured attempts.
    #[error("object s3://{bucket}/{key} not visible after {attempts} attempts")]
    NotVisible {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Number of existence checks made.
        attempts: u32,
    },
}

impl FacadeError {
    /// The underlying service error, if this is one.
    #[must_use]
    pub fn as_service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(err) => Some(err),
            Self::LocalResource { .. } | Self::NotVisible { .. } => None,
        }
    }

    /// The service error code, if this is a service error that carries one.
    #[must_use]
    pub fn service_code(&self) -> Option<&str> {
        self.as_service_error().and_then(ServiceError::code)
    }
}

/// Convenience result type for facade operations.
pub type FacadeResult<T> = Result<T, FacadeError>;
