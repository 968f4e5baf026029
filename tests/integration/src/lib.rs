//! Integration tests for the BucketDesk storage client.
//!
//! These tests require a running S3-compatible server (LocalStack, MinIO) at
//! `localhost:4566`, or wherever `S3_ENDPOINT_URL` points. They are marked
//! `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p bucketdesk-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials as SdkCredentials, Region};
use bucketdesk_core::{AwsRegion, Credentials};
use bucketdesk_storage::{S3Connector, S3StorageClient};

static INIT: Once = Once::new();

/// Access key accepted by the local test server.
pub const ACCESS_KEY: &str = "test";
/// Secret key accepted by the local test server.
pub const SECRET_KEY: &str = "test";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Console credentials for the test server in `region`.
#[must_use]
pub fn credentials(region: &str) -> Credentials {
    Credentials::new(ACCESS_KEY, SECRET_KEY, AwsRegion::new(region))
}

/// A storage client as the console builds it for a logged-in session.
#[must_use]
pub fn storage_client(region: &str) -> S3StorageClient {
    init_tracing();
    S3StorageClient::new(&credentials(region), Some(&endpoint_url()), true)
}

/// A connector pointing at the test server.
#[must_use]
pub fn connector() -> S3Connector {
    init_tracing();
    S3Connector::new(Some(endpoint_url()), true)
}

/// Raw SDK client used for fixture setup and cleanup.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = SdkCredentials::new(ACCESS_KEY, SECRET_KEY, None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(AwsRegion::DEFAULT))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("bucketdesk-{prefix}-{id}")
}

/// Create a bucket in the default region and return its name. Caller is
/// responsible for cleanup.
pub async fn create_test_bucket(client: &aws_sdk_s3::Client, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    client
        .create_bucket()
        .bucket(&name)
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

/// Delete every object version in a bucket, then delete the bucket.
pub async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    if let Ok(resp) = client.list_object_versions().bucket(bucket).send().await {
        let versions = resp
            .versions()
            .iter()
            .map(|v| (v.key(), v.version_id()))
            .chain(
                resp.delete_markers()
                    .iter()
                    .map(|m| (m.key(), m.version_id())),
            );
        for (key, version_id) in versions {
            if let Some(key) = key {
                let _ = client
                    .delete_object()
                    .bucket(bucket)
                    .key(key)
                    .set_version_id(version_id.map(ToOwned::to_owned))
                    .send()
                    .await;
            }
        }
    }

    if let Ok(resp) = client.list_objects_v2().bucket(bucket).send().await {
        for obj in resp.contents() {
            if let Some(key) = obj.key() {
                let _ = client.delete_object().bucket(bucket).key(key).send().await;
            }
        }
    }

    let _ = client.delete_bucket().bucket(bucket).send().await;
}

mod test_console;
mod test_storage;
