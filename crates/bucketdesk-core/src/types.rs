//! Value types shared by the storage client and the session gateway.

use std::fmt;

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Region S3 reports for buckets without an explicit location constraint.
    pub const DEFAULT: &str = "us-east-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access key pair plus the region every request is signed for.
///
/// Held only for the lifetime of a console session. The secret key never
/// appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Signing region.
    pub region: AwsRegion,
}

impl Credentials {
    /// Create a credential set.
    #[must_use]
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: AwsRegion,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region,
        }
    }

    /// A short access-key prefix that is safe to log.
    #[must_use]
    pub fn access_key_hint(&self) -> String {
        let prefix: String = self.access_key.chars().take(4).collect();
        format!("{prefix}****")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key_hint())
            .field("secret_key", &"...")
            .field("region", &self.region)
            .finish()
    }
}

/// The bucket a session operates on, together with its verified home region.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BucketTarget {
    /// Bucket name.
    pub bucket: String,
    /// Region the bucket lives in.
    pub region: AwsRegion,
}

impl BucketTarget {
    /// Create a bucket target.
    #[must_use]
    pub fn new(bucket: impl Into<String>, region: AwsRegion) -> Self {
        Self {
            bucket: bucket.into(),
            region,
        }
    }
}
