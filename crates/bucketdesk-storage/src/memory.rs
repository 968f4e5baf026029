//! In-process [`ObjectStore`] with S3 versioning semantics.
//!
//! [`MemoryStorage`] holds buckets pinned to regions, per-key version chains,
//! and the access keys it accepts. It behaves like S3 where the console can
//! observe the difference:
//!
//! - unversioned writes and deletes replace or erase the single `"null"` version,
//! - versioned deletes push a delete marker and keep prior versions,
//! - suspended buckets overwrite the `"null"` version but keep older ones,
//! - calls signed for a region other than the bucket's are rejected, except
//!   region lookup.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bucketdesk_core::{AwsRegion, Credentials};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::model::{ObjectListing, VersionRecord, VersioningState, VersioningStatus, size_kb};
use crate::store::{ObjectStore, StorageConnector};

/// Characters escaped in key paths of issued URLs (`/` is kept).
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Version id S3 assigns to writes on unversioned or suspended buckets.
const NULL_VERSION: &str = "null";

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: String,
    body: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
    delete_marker: bool,
}

#[derive(Debug)]
struct MemoryBucket {
    region: AwsRegion,
    versioning: VersioningState,
    /// Key -> versions, newest first.
    objects: BTreeMap<String, Vec<StoredVersion>>,
}

impl MemoryBucket {
    fn put(&mut self, key: &str, body: Bytes, content_type: &str) {
        let now = Utc::now();
        let chain = self.objects.entry(key.to_owned()).or_default();
        match self.versioning {
            VersioningState::Enabled => chain.insert(
                0,
                StoredVersion {
                    version_id: uuid::Uuid::new_v4().simple().to_string(),
                    body,
                    content_type: content_type.to_owned(),
                    last_modified: now,
                    delete_marker: false,
                },
            ),
            VersioningState::Suspended => {
                chain.retain(|v| v.version_id != NULL_VERSION);
                chain.insert(0, null_version(body, content_type, now, false));
            }
            VersioningState::Disabled | VersioningState::Unknown => {
                *chain = vec![null_version(body, content_type, now, false)];
            }
        }
    }

    fn delete(&mut self, key: &str) {
        let now = Utc::now();
        match self.versioning {
            VersioningState::Enabled => {
                let chain = self.objects.entry(key.to_owned()).or_default();
                chain.insert(
                    0,
                    StoredVersion {
                        version_id: uuid::Uuid::new_v4().simple().to_string(),
                        body: Bytes::new(),
                        content_type: String::new(),
                        last_modified: now,
                        delete_marker: true,
                    },
                );
            }
            VersioningState::Suspended => {
                let chain = self.objects.entry(key.to_owned()).or_default();
                chain.retain(|v| v.version_id != NULL_VERSION);
                chain.insert(0, null_version(Bytes::new(), "", now, true));
            }
            VersioningState::Disabled | VersioningState::Unknown => {
                self.objects.remove(key);
            }
        }
    }

    fn current(&self, key: &str) -> Option<&StoredVersion> {
        self.objects
            .get(key)
            .and_then(|chain| chain.first())
            .filter(|v| !v.delete_marker)
    }
}

fn null_version(
    body: Bytes,
    content_type: &str,
    now: DateTime<Utc>,
    delete_marker: bool,
) -> StoredVersion {
    StoredVersion {
        version_id: NULL_VERSION.to_owned(),
        body,
        content_type: content_type.to_owned(),
        last_modified: now,
        delete_marker,
    }
}

/// Shared in-process object store.
///
/// Cloning is cheap; clones see the same buckets.
///
/// # Examples
///
/// ```
/// use bucketdesk_core::AwsRegion;
/// use bucketdesk_storage::MemoryStorage;
///
/// let storage = MemoryStorage::new()
///     .with_access_key("AKIDEXAMPLE", "secret")
///     .with_bucket("demo", AwsRegion::new("eu-west-1"));
/// assert!(storage.has_bucket("demo"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    buckets: Arc<DashMap<String, MemoryBucket>>,
    access_keys: Arc<DashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store that accepts no credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the given access key / secret pair.
    #[must_use]
    pub fn with_access_key(
        self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_keys.insert(access_key.into(), secret_key.into());
        self
    }

    /// Create an empty, unversioned bucket homed in `region`.
    #[must_use]
    pub fn with_bucket(self, name: impl Into<String>, region: AwsRegion) -> Self {
        self.buckets.insert(
            name.into(),
            MemoryBucket {
                region,
                versioning: VersioningState::Disabled,
                objects: BTreeMap::new(),
            },
        );
        self
    }

    /// Whether a bucket with this name exists.
    #[must_use]
    pub fn has_bucket(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// Body of the current version of `key`, if it exists and is not deleted.
    #[must_use]
    pub fn object_body(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.buckets
            .get(bucket)
            .and_then(|b| b.current(key).map(|v| v.body.clone()))
    }

    /// Content type of the current version of `key`.
    #[must_use]
    pub fn object_content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.buckets
            .get(bucket)
            .and_then(|b| b.current(key).map(|v| v.content_type.clone()))
    }

    /// Number of entries (versions and delete markers) stored for `key`.
    #[must_use]
    pub fn version_count(&self, bucket: &str, key: &str) -> usize {
        self.buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key).map(Vec::len))
            .unwrap_or(0)
    }
}

impl StorageConnector for MemoryStorage {
    fn connect(&self, credentials: &Credentials) -> Box<dyn ObjectStore> {
        Box::new(MemoryClient {
            storage: self.clone(),
            credentials: credentials.clone(),
        })
    }
}

/// A [`MemoryStorage`] handle bound to one credential set.
#[derive(Debug)]
struct MemoryClient {
    storage: MemoryStorage,
    credentials: Credentials,
}

impl MemoryClient {
    fn authorize(&self) -> StorageResult<()> {
        let accepted = self
            .storage
            .access_keys
            .get(&self.credentials.access_key)
            .is_some_and(|secret| *secret == self.credentials.secret_key);
        if accepted {
            Ok(())
        } else {
            Err(StorageError::AccessDenied(self.credentials.access_key_hint()))
        }
    }

    /// Run `f` against `bucket` after checking credentials and signing region.
    fn with_bucket<T>(
        &self,
        bucket: &str,
        f: impl FnOnce(&mut MemoryBucket) -> T,
    ) -> StorageResult<T> {
        self.authorize()?;
        let mut entry = self
            .storage
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::NoSuchBucket(bucket.to_owned()))?;
        if entry.region != self.credentials.region {
            return Err(StorageError::WrongRegion {
                bucket: bucket.to_owned(),
                actual: entry.region.to_string(),
                signed: self.credentials.region.to_string(),
            });
        }
        Ok(f(&mut entry))
    }

    fn presign(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        ttl: Duration,
    ) -> StorageResult<String> {
        self.authorize()?;
        if ttl.is_zero() {
            return Err(StorageError::Presign {
                key: key.to_owned(),
                message: "expiry must be greater than zero".to_owned(),
            });
        }
        let mut url = format!(
            "memory://{bucket}/{}?X-Amz-Expires={}",
            utf8_percent_encode(key, KEY_ENCODE_SET),
            ttl.as_secs()
        );
        if let Some(id) = version_id {
            url.push_str("&versionId=");
            url.extend(utf8_percent_encode(id, NON_ALPHANUMERIC));
        }
        Ok(url)
    }
}

#[async_trait]
impl ObjectStore for MemoryClient {
    async fn verify_region(&self, bucket: &str) -> StorageResult<AwsRegion> {
        self.authorize()?;
        self.storage
            .buckets
            .get(bucket)
            .map(|b| b.region.clone())
            .ok_or_else(|| StorageError::NoSuchBucket(bucket.to_owned()))
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<ObjectListing> {
        self.with_bucket(bucket, |b| {
            let keys = b
                .objects
                .iter()
                .filter(|(key, chain)| {
                    key.starts_with(prefix) && chain.first().is_some_and(|v| !v.delete_marker)
                })
                .map(|(key, _)| key.clone());
            ObjectListing::from_keys(prefix, keys)
        })
    }

    async fn upload(
        &self,
        bucket: &str,
        body: Bytes,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        self.with_bucket(bucket, |b| b.put(key, body, content_type))?;
        debug!(bucket, key, "stored object in memory");
        Ok(())
    }

    async fn download_url(&self, bucket: &str, key: &str, ttl: Duration) -> StorageResult<String> {
        self.presign(bucket, key, None, ttl)
    }

    async fn version_download_url(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        self.presign(bucket, key, Some(version_id), ttl)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.with_bucket(bucket, |b| b.delete(key))
    }

    async fn versioning_status(&self, bucket: &str) -> StorageResult<VersioningState> {
        self.with_bucket(bucket, |b| b.versioning)
    }

    async fn set_versioning_status(
        &self,
        bucket: &str,
        status: VersioningStatus,
    ) -> StorageResult<()> {
        self.with_bucket(bucket, |b| {
            // S3 never returns a bucket to the Disabled state.
            let stays_disabled = status == VersioningStatus::Suspended
                && b.versioning == VersioningState::Disabled;
            if !stays_disabled {
                b.versioning = status.into();
            }
        })
    }

    async fn list_versions(&self, bucket: &str, key: &str) -> StorageResult<Vec<VersionRecord>> {
        self.with_bucket(bucket, |b| {
            b.objects
                .get(key)
                .map(|chain| {
                    chain
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| !v.delete_marker)
                        .map(|(i, v)| VersionRecord {
                            version_id: v.version_id.clone(),
                            last_modified: v.last_modified,
                            size_kb: size_kb(i64::try_from(v.body.len()).unwrap_or(i64::MAX)),
                            is_latest: i == 0,
                        })
                        .collect()
                })
                .unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> AwsRegion {
        AwsRegion::new("eu-west-1")
    }

    fn storage() -> MemoryStorage {
        MemoryStorage::new()
            .with_access_key("AKID", "secret")
            .with_bucket("demo", region())
    }

    fn client(storage: &MemoryStorage) -> Box<dyn ObjectStore> {
        storage.connect(&Credentials::new("AKID", "secret", region()))
    }

    #[tokio::test]
    async fn test_should_resolve_bucket_region() {
        let storage = storage();
        let client = storage.connect(&Credentials::new("AKID", "secret", AwsRegion::default()));
        let region = client.verify_region("demo").await.expect("region");
        assert_eq!(region.as_str(), "eu-west-1");
    }

    #[tokio::test]
    async fn test_should_reject_unknown_credentials() {
        let storage = storage();
        let client = storage.connect(&Credentials::new("AKID", "wrong", region()));
        let err = client.verify_region("demo").await.unwrap_err();
        assert!(matches!(err, StorageError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn test_should_reject_missing_bucket() {
        let storage = storage();
        let err = client(&storage).verify_region("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NoSuchBucket(_)));
    }

    #[tokio::test]
    async fn test_should_reject_calls_signed_for_wrong_region() {
        let storage = storage();
        let client = storage.connect(&Credentials::new("AKID", "secret", AwsRegion::default()));
        let err = client.list_objects("demo", "").await.unwrap_err();
        assert!(matches!(err, StorageError::WrongRegion { .. }));
    }

    #[tokio::test]
    async fn test_should_upload_and_list_objects() {
        let storage = storage();
        let client = client(&storage);
        client
            .upload("demo", Bytes::from_static(b"png"), "images/a.png", "image/png")
            .await
            .expect("upload");
        client
            .upload("demo", Bytes::new(), "images/", "application/x-directory")
            .await
            .expect("upload marker");

        let listing = client.list_objects("demo", "").await.expect("list");
        assert_eq!(listing.files, vec!["images/a.png"]);
        assert_eq!(
            storage.object_content_type("demo", "images/a.png").as_deref(),
            Some("image/png")
        );
    }

    #[tokio::test]
    async fn test_should_erase_object_on_unversioned_delete() {
        let storage = storage();
        let client = client(&storage);
        client
            .upload("demo", Bytes::from_static(b"x"), "others/a.txt", "text/plain")
            .await
            .expect("upload");
        client.delete_object("demo", "others/a.txt").await.expect("delete");

        assert!(client.list_objects("demo", "").await.expect("list").is_empty());
        assert_eq!(storage.version_count("demo", "others/a.txt"), 0);
    }

    #[tokio::test]
    async fn test_should_keep_versions_behind_delete_marker() {
        let storage = storage();
        let client = client(&storage);
        client
            .set_versioning_status("demo", VersioningStatus::Enabled)
            .await
            .expect("enable");
        for body in [&b"v1"[..], b"v2"] {
            client
                .upload("demo", Bytes::copy_from_slice(body), "a.txt", "text/plain")
                .await
                .expect("upload");
        }
        client.delete_object("demo", "a.txt").await.expect("delete");

        assert!(client.list_objects("demo", "").await.expect("list").is_empty());
        let versions = client.list_versions("demo", "a.txt").await.expect("versions");
        assert_eq!(versions.len(), 2);
        assert!(versions.iter().all(|v| !v.is_latest));
        assert_eq!(storage.version_count("demo", "a.txt"), 3);
    }

    #[tokio::test]
    async fn test_should_list_versions_newest_first() {
        let storage = storage();
        let client = client(&storage);
        client
            .set_versioning_status("demo", VersioningStatus::Enabled)
            .await
            .expect("enable");
        client
            .upload("demo", Bytes::from_static(b"first"), "a.txt", "text/plain")
            .await
            .expect("upload");
        client
            .upload("demo", Bytes::from(vec![0u8; 2048]), "a.txt", "text/plain")
            .await
            .expect("upload");

        let versions = client.list_versions("demo", "a.txt").await.expect("versions");
        assert_eq!(versions.len(), 2);
        assert!(versions[0].is_latest);
        assert!((versions[0].size_kb - 2.0).abs() < f64::EPSILON);
        assert_ne!(versions[0].version_id, versions[1].version_id);
    }

    #[tokio::test]
    async fn test_should_return_no_versions_for_missing_key() {
        let storage = storage();
        let versions = client(&storage)
            .list_versions("demo", "ghost.txt")
            .await
            .expect("versions");
        assert!(versions.is_empty());
    }

    #[tokio::test]
    async fn test_should_overwrite_null_version_when_suspended() {
        let storage = storage();
        let client = client(&storage);
        client
            .set_versioning_status("demo", VersioningStatus::Enabled)
            .await
            .expect("enable");
        client
            .upload("demo", Bytes::from_static(b"v1"), "a.txt", "text/plain")
            .await
            .expect("upload");
        client
            .set_versioning_status("demo", VersioningStatus::Suspended)
            .await
            .expect("suspend");
        for body in [&b"n1"[..], b"n2"] {
            client
                .upload("demo", Bytes::copy_from_slice(body), "a.txt", "text/plain")
                .await
                .expect("upload");
        }

        let versions = client.list_versions("demo", "a.txt").await.expect("versions");
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].version_id, "null");
        assert_eq!(
            storage.object_body("demo", "a.txt").as_deref(),
            Some(&b"n2"[..])
        );
    }

    #[tokio::test]
    async fn test_should_not_suspend_never_versioned_bucket() {
        let storage = storage();
        let client = client(&storage);
        client
            .set_versioning_status("demo", VersioningStatus::Suspended)
            .await
            .expect("suspend");
        assert_eq!(
            client.versioning_status("demo").await.expect("status"),
            VersioningState::Disabled
        );
    }

    #[tokio::test]
    async fn test_should_issue_distinct_version_urls() {
        let storage = storage();
        let client = client(&storage);
        let plain = client
            .download_url("demo", "pdf/My Report.pdf", Duration::from_secs(3600))
            .await
            .expect("url");
        let pinned = client
            .version_download_url("demo", "pdf/My Report.pdf", "abc", Duration::from_secs(3600))
            .await
            .expect("url");
        assert_eq!(plain, "memory://demo/pdf/My%20Report.pdf?X-Amz-Expires=3600");
        assert_eq!(pinned, format!("{plain}&versionId=abc"));
    }
}
