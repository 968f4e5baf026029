//! What a console action asks the HTTP layer to do next.

use bucketdesk_core::AwsRegion;
use bucketdesk_storage::{ObjectListing, VersionRecord, VersioningState};

/// Result of a console action.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Send the browser elsewhere.
    Redirect(Location),
    /// Render a page. Pending flashes are shown on it.
    Render(View),
}

/// Redirect target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// The bucket listing.
    Index,
    /// The login form.
    Login,
    /// An absolute URL, typically a presigned download link.
    External(String),
}

/// A page to render.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// The login form.
    Login,
    /// The bucket listing with versioning controls.
    Index(IndexView),
    /// Version history of one object.
    History(HistoryView),
}

/// Data for the bucket listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexView {
    /// Bound bucket name.
    pub bucket: String,
    /// Bound bucket region.
    pub region: AwsRegion,
    /// Objects in the bucket.
    pub listing: ObjectListing,
    /// Current versioning state, `Unknown` when it could not be read.
    pub versioning: VersioningState,
}

/// Data for the version history page.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    /// Object key.
    pub key: String,
    /// Stored revisions, newest first.
    pub versions: Vec<VersionRecord>,
}
