//! [`ObjectStore`] backed by the AWS SDK for S3.
//!
//! A client is built from a single credential set and signs every call for
//! the credential's region. Retries are disabled: a failed call surfaces to
//! the caller exactly once.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketVersioningStatus, ObjectVersion, VersioningConfiguration};
use bucketdesk_core::{AwsRegion, Credentials};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::model::{ObjectListing, VersionRecord, VersioningState, VersioningStatus, size_kb};
use crate::store::{ObjectStore, StorageConnector};

/// Builds one [`S3StorageClient`] per request.
///
/// An optional custom endpoint lets the console manage S3-compatible stores
/// such as MinIO or LocalStack.
#[derive(Debug, Clone, Default)]
pub struct S3Connector {
    endpoint_url: Option<String>,
    force_path_style: bool,
}

impl S3Connector {
    /// Create a connector for AWS S3 or, with `endpoint_url`, a compatible store.
    #[must_use]
    pub fn new(endpoint_url: Option<String>, force_path_style: bool) -> Self {
        Self {
            endpoint_url,
            force_path_style,
        }
    }
}

impl StorageConnector for S3Connector {
    fn connect(&self, credentials: &Credentials) -> Box<dyn ObjectStore> {
        Box::new(S3StorageClient::new(
            credentials,
            self.endpoint_url.as_deref(),
            self.force_path_style,
        ))
    }
}

/// S3 client bound to one credential set.
#[derive(Debug, Clone)]
pub struct S3StorageClient {
    client: Client,
}

impl S3StorageClient {
    /// Build a client signing with `credentials`.
    #[must_use]
    pub fn new(
        credentials: &Credentials,
        endpoint_url: Option<&str>,
        force_path_style: bool,
    ) -> Self {
        let sdk_credentials = aws_sdk_s3::config::Credentials::new(
            credentials.access_key.clone(),
            credentials.secret_key.clone(),
            None,
            None,
            "bucketdesk-session",
        );

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(credentials.region.as_str().to_owned()))
            .credentials_provider(sdk_credentials)
            .retry_config(RetryConfig::disabled())
            .force_path_style(force_path_style);
        if let Some(url) = endpoint_url {
            builder = builder.endpoint_url(url);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        ttl: Duration,
    ) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| StorageError::Presign {
            key: key.to_owned(),
            message: e.to_string(),
        })?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .set_version_id(version_id.map(ToOwned::to_owned))
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign {
                key: key.to_owned(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(request.uri().to_owned())
    }
}

#[async_trait]
impl ObjectStore for S3StorageClient {
    async fn verify_region(&self, bucket: &str) -> StorageResult<AwsRegion> {
        let output = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| sdk_error("GetBucketLocation", &e))?;

        let region = normalize_location(output.location_constraint().map(|c| c.as_str()));
        debug!(bucket, region = %region, "resolved bucket region");
        Ok(region)
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<ObjectListing> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix((!prefix.is_empty()).then(|| prefix.to_owned()))
            .send()
            .await
            .map_err(|e| sdk_error("ListObjectsV2", &e))?;

        let keys = output.contents().iter().filter_map(|o| o.key());
        let listing = ObjectListing::from_keys(prefix, keys);
        debug!(bucket, prefix, files = listing.files.len(), "listed objects");
        Ok(listing)
    }

    async fn upload(
        &self,
        bucket: &str,
        body: Bytes,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| sdk_error("PutObject", &e))?;

        debug!(bucket, key, size, content_type, "uploaded object");
        Ok(())
    }

    async fn download_url(&self, bucket: &str, key: &str, ttl: Duration) -> StorageResult<String> {
        self.presign_get(bucket, key, None, ttl).await
    }

    async fn version_download_url(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        self.presign_get(bucket, key, Some(version_id), ttl).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let output = self
            .client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteObject", &e))?;

        debug!(
            bucket,
            key,
            delete_marker = ?output.delete_marker(),
            "deleted object"
        );
        Ok(())
    }

    async fn versioning_status(&self, bucket: &str) -> StorageResult<VersioningState> {
        let output = self
            .client
            .get_bucket_versioning()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| sdk_error("GetBucketVersioning", &e))?;

        Ok(versioning_state_from_sdk(output.status()))
    }

    async fn set_versioning_status(
        &self,
        bucket: &str,
        status: VersioningStatus,
    ) -> StorageResult<()> {
        let sdk_status = match status {
            VersioningStatus::Enabled => BucketVersioningStatus::Enabled,
            VersioningStatus::Suspended => BucketVersioningStatus::Suspended,
        };

        self.client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(sdk_status)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| sdk_error("PutBucketVersioning", &e))?;

        debug!(bucket, status = %status, "put bucket versioning");
        Ok(())
    }

    async fn list_versions(&self, bucket: &str, key: &str) -> StorageResult<Vec<VersionRecord>> {
        let output = self
            .client
            .list_object_versions()
            .bucket(bucket)
            .prefix(key)
            .send()
            .await
            .map_err(|e| sdk_error("ListObjectVersions", &e))?;

        Ok(output
            .versions()
            .iter()
            .filter(|v| v.key() == Some(key))
            .map(version_record)
            .collect())
    }
}

/// Map an SDK failure to a [`StorageError`], keeping the full error chain.
fn sdk_error(operation: &'static str, err: &(dyn std::error::Error + 'static)) -> StorageError {
    StorageError::Service {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

/// Translate a `GetBucketLocation` constraint into a region.
///
/// S3 reports an empty constraint for `us-east-1` and the legacy value `EU`
/// for `eu-west-1`.
fn normalize_location(constraint: Option<&str>) -> AwsRegion {
    match constraint {
        None | Some("") => AwsRegion::default(),
        Some("EU") => AwsRegion::new("eu-west-1"),
        Some(region) => AwsRegion::new(region),
    }
}

fn versioning_state_from_sdk(status: Option<&BucketVersioningStatus>) -> VersioningState {
    match status {
        None => VersioningState::Disabled,
        Some(BucketVersioningStatus::Enabled) => VersioningState::Enabled,
        Some(BucketVersioningStatus::Suspended) => VersioningState::Suspended,
        Some(_) => VersioningState::Unknown,
    }
}

fn version_record(version: &ObjectVersion) -> VersionRecord {
    let last_modified = version
        .last_modified()
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos()))
        .unwrap_or_default();

    VersionRecord {
        version_id: version.version_id().unwrap_or("null").to_owned(),
        last_modified,
        size_kb: size_kb(version.size().unwrap_or(0)),
        is_latest: version.is_latest().unwrap_or(false),
    }
}
