//! Console error types.
//!
//! The `Display` text of each variant is the flash message shown to the
//! operator, so wording here is user-facing.

use bucketdesk_storage::StorageError;

/// Failure of a console action.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Login was rejected: a form field was empty or the store could not be
    /// reached with the supplied keys.
    #[error("{0}")]
    Auth(String),

    /// The bucket lives in a different region than the one claimed at login.
    #[error("Region Error: Bucket is in {actual}, not {claimed}")]
    RegionMismatch {
        /// The bucket's verified home region.
        actual: String,
        /// The region supplied in the login form.
        claimed: String,
    },

    /// A storage call failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The action requires a bound session.
    #[error("Not logged in")]
    NotAuthenticated,
}

impl ConsoleError {
    /// The generic login failure. Bad keys and missing buckets are
    /// deliberately indistinguishable.
    #[must_use]
    pub fn connection_failed() -> Self {
        Self::Auth("Connection Failed: Check keys or bucket name.".to_owned())
    }

    /// A required login field was left empty.
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::Auth(format!("Login Error: {field} is required."))
    }
}

/// Convenience result type for console actions.
pub type ConsoleResult<T> = Result<T, ConsoleError>;
