//! Storage error types.

/// Failure of a single storage call.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The remote store rejected the call or could not be reached.
    #[error("{operation} failed: {message}")]
    Service {
        /// The storage operation that failed (e.g. `"PutObject"`).
        operation: &'static str,
        /// Error details reported by the store or transport.
        message: String,
    },

    /// A presigned URL could not be produced.
    #[error("failed to presign URL for {key}: {message}")]
    Presign {
        /// Object key the URL was requested for.
        key: String,
        /// Reason reported by the signer.
        message: String,
    },

    /// The bucket does not exist.
    #[error("The specified bucket does not exist: {0}")]
    NoSuchBucket(String),

    /// The credentials were not accepted.
    #[error("Access Denied for access key {0}")]
    AccessDenied(String),

    /// The request was signed for a region other than the bucket's home region.
    #[error("bucket {bucket} must be addressed in region {actual}, request was signed for {signed}")]
    WrongRegion {
        /// Bucket name.
        bucket: String,
        /// The bucket's home region.
        actual: String,
        /// The region the request was signed for.
        signed: String,
    },
}

/// Convenience result type for storage calls.
pub type StorageResult<T> = Result<T, StorageError>;
