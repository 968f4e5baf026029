//! Data returned by storage calls.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

/// Path delimiter inside object keys.
pub const DELIMITER: char = '/';

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// A flat listing of a bucket (or of everything under a prefix).
///
/// Produced fresh for every request and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    /// First-level folder prefixes (ending in `/`) that contain listed files.
    pub folders: BTreeSet<String>,
    /// Object keys in store order.
    pub files: Vec<String>,
}

impl ObjectListing {
    /// Build a listing from raw keys using the flat listing policy.
    ///
    /// Keys ending in the delimiter are pseudo-folder markers and are dropped.
    /// Every remaining key is listed with its full path; the first path segment
    /// below `prefix` is recorded in `folders`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucketdesk_storage::ObjectListing;
    ///
    /// let listing = ObjectListing::from_keys("", ["images/", "images/a.png", "notes.txt"]);
    /// assert_eq!(listing.files, vec!["images/a.png", "notes.txt"]);
    /// assert!(listing.folders.contains("images/"));
    /// ```
    #[must_use]
    pub fn from_keys<I, S>(prefix: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut listing = Self::default();
        for key in keys {
            let key = key.into();
            if key.ends_with(DELIMITER) {
                continue;
            }
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            if let Some(pos) = rest.find(DELIMITER) {
                listing.folders.insert(format!("{prefix}{}", &rest[..=pos]));
            }
            listing.files.push(key);
        }
        listing
    }

    /// Whether the listing holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// One stored revision of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRecord {
    /// Store-assigned version identifier (`"null"` for unversioned writes).
    pub version_id: String,
    /// When this revision was written.
    pub last_modified: DateTime<Utc>,
    /// Size in KiB, rounded to two decimals.
    pub size_kb: f64,
    /// Whether this revision is the current one.
    pub is_latest: bool,
}

/// Convert a byte count to KiB rounded to two decimals.
#[must_use]
// Object sizes stay far below 2^52 bytes, so the f64 conversion is exact.
#[allow(clippy::cast_precision_loss)]
pub fn size_kb(bytes: i64) -> f64 {
    (bytes as f64 / 1024.0 * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Versioning state of a bucket as read from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersioningState {
    /// Versioning is on.
    Enabled,
    /// Versioning was on and has been suspended.
    Suspended,
    /// Versioning has never been enabled.
    #[default]
    Disabled,
    /// The state could not be read. Not a real bucket state.
    Unknown,
}

impl VersioningState {
    /// The status a toggle should write: `Suspended` when currently enabled,
    /// `Enabled` otherwise.
    #[must_use]
    pub fn toggled(self) -> VersioningStatus {
        match self {
            Self::Enabled => VersioningStatus::Suspended,
            Self::Suspended | Self::Disabled | Self::Unknown => VersioningStatus::Enabled,
        }
    }

    /// Get the state as a display string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Suspended => "Suspended",
            Self::Disabled => "Disabled",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for VersioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A versioning status that can be written to a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersioningStatus {
    /// Turn versioning on.
    Enabled,
    /// Suspend versioning; existing versions are kept.
    Suspended,
}

impl VersioningStatus {
    /// Get the status as the wire string S3 expects.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for VersioningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<VersioningStatus> for VersioningState {
    fn from(status: VersioningStatus) -> Self {
        match status {
            VersioningStatus::Enabled => Self::Enabled,
            VersioningStatus::Suspended => Self::Suspended,
        }
    }
}
