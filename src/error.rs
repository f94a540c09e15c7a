//! Unified error model for the directory connector.
//! The four kinds below are the whole contract with the host: authentication
//! surfaces them verbatim, read-only lookups translate them (see the user adapter).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The remote directory explicitly rejected the username/password pair.
    /// Terminal for the call; safe to show to the end user as a bad login.
    #[error("invalid credentials for user '{username}'")]
    InvalidCredentials { username: String },

    /// Transport, timeout or server-side failure while talking to the remote
    /// directory. Deliberately distinct from [`DirectoryError::InvalidCredentials`]:
    /// reporting an outage as a bad password is a support anti-pattern.
    #[error("directory unavailable: {reason}")]
    Unavailable { reason: String },

    /// No usable directory configuration; operations short-circuit before
    /// attempting any I/O.
    #[error("crowd directory is not configured")]
    NotConfigured,

    /// Read-only lookup miss. Never produced by authentication.
    #[error("user '{username}' not found")]
    UserNotFound { username: String },
}

impl DirectoryError {
    pub fn invalid_credentials<S: Into<String>>(username: S) -> Self {
        DirectoryError::InvalidCredentials { username: username.into() }
    }

    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        DirectoryError::Unavailable { reason: reason.into() }
    }

    pub fn user_not_found<S: Into<String>>(username: S) -> Self {
        DirectoryError::UserNotFound { username: username.into() }
    }

    /// True for failures that indicate the remote service could not be
    /// reached or answered abnormally, as opposed to a definitive verdict.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DirectoryError::Unavailable { .. })
    }

    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, DirectoryError::InvalidCredentials { .. })
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
