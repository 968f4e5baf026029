//! Console configuration.
//!
//! Provides [`ConsoleConfig`] for configuring the BucketDesk server. Values are
//! loaded from environment variables; nothing here is ever written back to disk.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{BucketDeskError, BucketDeskResult};

/// Longest lifetime S3 accepts for a SigV4 presigned URL (7 days).
const MAX_PRESIGN_TTL_SECS: u64 = 604_800;

/// BucketDesk server configuration.
///
/// # Examples
///
/// ```
/// use bucketdesk_core::ConsoleConfig;
///
/// let config = ConsoleConfig::default();
/// assert_eq!(config.listen, "0.0.0.0:8080");
/// assert_eq!(config.presign_ttl_secs, 3600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    /// Bind address for the console (e.g. `"0.0.0.0:8080"`).
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Idle lifetime of a console session, in seconds.
    #[builder(default = 2_592_000)]
    pub session_ttl_secs: u64,

    /// Validity of issued download URLs, in seconds.
    #[builder(default = 3600)]
    pub presign_ttl_secs: u64,

    /// Largest accepted request body (uploads included), in bytes.
    #[builder(default = 104_857_600)]
    pub max_upload_bytes: usize,

    /// Whether the session cookie carries the `Secure` attribute.
    #[builder(default = false)]
    pub cookie_secure: bool,

    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack).
    #[builder(default)]
    pub s3_endpoint_url: Option<String>,

    /// Whether to use path-style bucket addressing.
    #[builder(default = false)]
    pub s3_force_path_style: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            listen: String::from("0.0.0.0:8080"),
            log_level: String::from("info"),
            session_ttl_secs: 2_592_000,
            presign_ttl_secs: 3600,
            max_upload_bytes: 104_857_600,
            cookie_secure: false,
            s3_endpoint_url: None,
            s3_force_path_style: false,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `CONSOLE_LISTEN` | `0.0.0.0:8080` |
    /// | `LOG_LEVEL` | `info` |
    /// | `SESSION_TTL_SECS` | `2592000` |
    /// | `PRESIGN_TTL_SECS` | `3600` |
    /// | `MAX_UPLOAD_BYTES` | `104857600` |
    /// | `COOKIE_SECURE` | `false` |
    /// | `S3_ENDPOINT_URL` | *(unset)* |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    ///
    /// Unparseable numeric values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("CONSOLE_LISTEN") {
            config.listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("SESSION_TTL_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                config.session_ttl_secs = n;
            }
        }
        if let Ok(v) = std::env::var("PRESIGN_TTL_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                config.presign_ttl_secs = n;
            }
        }
        if let Ok(v) = std::env::var("MAX_UPLOAD_BYTES") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_upload_bytes = n;
            }
        }
        if let Ok(v) = std::env::var("COOKIE_SECURE") {
            config.cookie_secure = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("S3_ENDPOINT_URL") {
            if !v.trim().is_empty() {
                config.s3_endpoint_url = Some(v);
            }
        }
        if let Ok(v) = std::env::var("S3_FORCE_PATH_STYLE") {
            config.s3_force_path_style = parse_bool(&v);
        }

        config
    }

    /// Check the configuration for values the console cannot run with.
    pub fn validate(&self) -> BucketDeskResult<()> {
        if self.session_ttl_secs == 0 {
            return Err(BucketDeskError::Config(
                "SESSION_TTL_SECS must be greater than zero".to_owned(),
            ));
        }
        if self.presign_ttl_secs == 0 || self.presign_ttl_secs > MAX_PRESIGN_TTL_SECS {
            return Err(BucketDeskError::Config(format!(
                "PRESIGN_TTL_SECS must be between 1 and {MAX_PRESIGN_TTL_SECS}, got {}",
                self.presign_ttl_secs
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(BucketDeskError::Config(
                "MAX_UPLOAD_BYTES must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
