//! Error types for the BucketDesk core.

/// Core error type for BucketDesk infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum BucketDeskError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for BucketDesk infrastructure operations.
pub type BucketDeskResult<T> = Result<T, BucketDeskError>;
