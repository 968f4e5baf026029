//! The storage seam used by the session gateway.

use std::time::Duration;

use async_trait::async_trait;
use bucketdesk_core::{AwsRegion, Credentials};
use bytes::Bytes;

use crate::error::StorageResult;
use crate::model::{ObjectListing, VersionRecord, VersioningState, VersioningStatus};

/// Default validity of issued download URLs.
pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(3600);

/// Logical operations a console session performs against a remote bucket.
///
/// Each method issues exactly one remote call and returns a typed result.
/// Fail-soft policies (an `Unknown` versioning state, an empty history) are
/// the caller's decision, not the client's.
///
/// # Object Safety
///
/// The trait uses `#[async_trait]` so connectors can hand out
/// `Box<dyn ObjectStore>` built from per-session credentials.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Resolve the home region of `bucket`.
    ///
    /// Fails for bad credentials, missing buckets, and network errors alike.
    async fn verify_region(&self, bucket: &str) -> StorageResult<AwsRegion>;

    /// List objects under `prefix` with the flat listing policy
    /// (see [`ObjectListing::from_keys`]).
    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<ObjectListing>;

    /// Write `body` to `key` with the declared content type, replacing any
    /// existing object.
    async fn upload(
        &self,
        bucket: &str,
        body: Bytes,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Issue a credential-less GET URL for `key`, valid for `ttl` from now.
    ///
    /// Existence of the object is not checked.
    async fn download_url(&self, bucket: &str, key: &str, ttl: Duration) -> StorageResult<String>;

    /// Issue a GET URL pinned to one version of `key`.
    async fn version_download_url(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
        ttl: Duration,
    ) -> StorageResult<String>;

    /// Delete the current version pointer of `key`.
    ///
    /// On a versioned bucket the store writes a delete marker and keeps the
    /// prior versions.
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Read the versioning state; `Disabled` when the store reports none.
    async fn versioning_status(&self, bucket: &str) -> StorageResult<VersioningState>;

    /// Write a versioning status. Writing the current status again is a no-op.
    async fn set_versioning_status(
        &self,
        bucket: &str,
        status: VersioningStatus,
    ) -> StorageResult<()>;

    /// List the stored revisions of exactly `key`, newest first as the store
    /// returns them. Delete markers are not included.
    async fn list_versions(&self, bucket: &str, key: &str) -> StorageResult<Vec<VersionRecord>>;
}

/// Builds a fresh [`ObjectStore`] from session-bound credentials.
///
/// Called once per request; implementations must not cache clients across
/// sessions.
pub trait StorageConnector: Send + Sync + 'static {
    /// Create a client signing every call with `credentials`.
    fn connect(&self, credentials: &Credentials) -> Box<dyn ObjectStore>;
}
