//! The session gateway: one operation per console action.

use std::time::Duration;

use bucketdesk_core::{AwsRegion, BucketTarget, Credentials};
use bucketdesk_storage::{
    DEFAULT_PRESIGN_TTL, ObjectListing, ObjectStore, StorageConnector, StorageResult,
    VersioningState,
};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::{ConsoleError, ConsoleResult};
use crate::outcome::{HistoryView, IndexView, Location, Outcome, View};
use crate::session::{BoundSession, Session};
use crate::upload::{DEFAULT_CONTENT_TYPE, upload_key};

/// Fields of the login form.
#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Region the operator claims the bucket lives in.
    pub region: String,
    /// Bucket name.
    pub bucket: String,
}

/// A file received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name supplied by the browser, possibly including a directory path.
    pub filename: String,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub body: Bytes,
}

/// Runs console actions against the storage backend a connector provides.
///
/// Every action receives the caller's session snapshot, may change it (bind,
/// clear, add flashes), and returns an [`Outcome`]. A fresh storage client is
/// built from the session's credentials for each action.
#[derive(Debug)]
pub struct SessionGateway<C> {
    connector: C,
    presign_ttl: Duration,
}

impl<C: StorageConnector> SessionGateway<C> {
    /// Create a gateway issuing download URLs valid for `presign_ttl`.
    #[must_use]
    pub fn new(connector: C, presign_ttl: Duration) -> Self {
        Self {
            connector,
            presign_ttl,
        }
    }

    /// Create a gateway with the default one-hour download URL lifetime.
    #[must_use]
    pub fn with_default_ttl(connector: C) -> Self {
        Self::new(connector, DEFAULT_PRESIGN_TTL)
    }

    fn client(&self, bound: &BoundSession) -> Box<dyn ObjectStore> {
        self.connector.connect(&bound.credentials)
    }

    /// Show the login form, or go to the listing when already logged in.
    #[must_use]
    pub fn login_view(&self, session: &Session) -> Outcome {
        if session.is_authenticated() {
            Outcome::Redirect(Location::Index)
        } else {
            Outcome::Render(View::Login)
        }
    }

    /// Verify the submitted keys and bucket and bind them to the session.
    ///
    /// On failure the error is flashed and the session keeps its previous
    /// state.
    pub async fn login(&self, session: &mut Session, request: LoginRequest) -> Outcome {
        match self.authenticate(request).await {
            Ok(bound) => {
                info!(
                    bucket = %bound.target.bucket,
                    region = %bound.target.region,
                    access_key = %bound.credentials.access_key_hint(),
                    "session bound"
                );
                session.bind(bound);
                Outcome::Redirect(Location::Index)
            }
            Err(e) => {
                warn!(error = %e, "login rejected");
                session.flash_error(e.to_string());
                Outcome::Redirect(Location::Login)
            }
        }
    }

    async fn authenticate(&self, request: LoginRequest) -> ConsoleResult<BoundSession> {
        let LoginRequest {
            access_key,
            secret_key,
            region,
            bucket,
        } = request;
        for (field, value) in [
            ("Access key", &access_key),
            ("Secret key", &secret_key),
            ("Region", &region),
            ("Bucket", &bucket),
        ] {
            if value.trim().is_empty() {
                return Err(ConsoleError::missing_field(field));
            }
        }

        let claimed = AwsRegion::new(region.trim());
        let credentials = Credentials::new(access_key.trim(), secret_key, claimed.clone());
        let bucket = bucket.trim().to_owned();

        let actual = self
            .connector
            .connect(&credentials)
            .verify_region(&bucket)
            .await
            .map_err(|e| {
                debug!(bucket = %bucket, error = %e, "region lookup failed");
                ConsoleError::connection_failed()
            })?;

        if actual != claimed {
            return Err(ConsoleError::RegionMismatch {
                actual: actual.to_string(),
                claimed: claimed.to_string(),
            });
        }

        Ok(BoundSession {
            credentials: Credentials { region: actual.clone(), ..credentials },
            target: BucketTarget::new(bucket, actual),
        })
    }

    /// List the bucket and read its versioning state.
    ///
    /// A listing failure is flashed and an empty listing with an `Unknown`
    /// state is rendered. A versioning read failure alone degrades to
    /// `Unknown`.
    pub async fn index_view(&self, session: &mut Session) -> Outcome {
        let Some(bound) = session.bound().cloned() else {
            return Outcome::Redirect(Location::Login);
        };
        let client = self.client(&bound);
        let bucket = bound.bucket();

        let (listing, versioning) = match client.list_objects(bucket, "").await {
            Ok(listing) => {
                let versioning = client.versioning_status(bucket).await.unwrap_or_else(|e| {
                    warn!(bucket, error = %e, "could not read versioning state");
                    VersioningState::Unknown
                });
                (listing, versioning)
            }
            Err(e) => {
                warn!(bucket, error = %e, "listing failed");
                session.flash_error(format!("AWS Fetch Error: {e}"));
                (ObjectListing::default(), VersioningState::Unknown)
            }
        };

        Outcome::Render(View::Index(IndexView {
            bucket: bucket.to_owned(),
            region: bound.target.region.clone(),
            listing,
            versioning,
        }))
    }

    /// Flip versioning between `Enabled` and `Suspended`.
    ///
    /// Anything other than `Enabled` (including a never-versioned bucket)
    /// toggles to `Enabled`. If the current state cannot be read, nothing is
    /// written.
    pub async fn toggle_versioning(&self, session: &mut Session) -> Outcome {
        let Some(bound) = session.bound().cloned() else {
            return Outcome::Redirect(Location::Login);
        };
        let client = self.client(&bound);
        let bucket = bound.bucket();

        let result = async {
            let current = client.versioning_status(bucket).await?;
            let next = current.toggled();
            client.set_versioning_status(bucket, next).await?;
            Ok::<_, ConsoleError>(next)
        }
        .await;

        match result {
            Ok(next) => {
                info!(bucket, status = %next, "versioning changed");
                session.flash_success(format!("Versioning set to {next}"));
            }
            Err(e) => {
                warn!(bucket, error = %e, "versioning toggle failed");
                session.flash_error(format!("Versioning Error: {e}"));
            }
        }
        Outcome::Redirect(Location::Index)
    }

    /// Render the stored revisions of `key`. Retrieval failures render an
    /// empty history.
    pub async fn history_view(&self, session: &mut Session, key: &str) -> Outcome {
        let Some(bound) = session.bound() else {
            return Outcome::Redirect(Location::Login);
        };
        let bucket = bound.bucket();

        let versions = self
            .client(bound)
            .list_versions(bucket, key)
            .await
            .unwrap_or_else(|e| {
                warn!(bucket, key, error = %e, "could not list versions");
                Vec::new()
            });

        Outcome::Render(View::History(HistoryView {
            key: key.to_owned(),
            versions,
        }))
    }

    /// Redirect to a URL pinned to one version of `key`.
    pub async fn download_version(
        &self,
        session: &mut Session,
        key: &str,
        version_id: &str,
    ) -> Outcome {
        let Some(bound) = session.bound().cloned() else {
            return Outcome::Redirect(Location::Login);
        };
        let result = self
            .client(&bound)
            .version_download_url(bound.bucket(), key, version_id, self.presign_ttl)
            .await;
        redirect_to_download(session, key, result)
    }

    /// Redirect to a time-limited URL for the current version of `key`.
    pub async fn download(&self, session: &mut Session, key: &str) -> Outcome {
        let Some(bound) = session.bound().cloned() else {
            return Outcome::Redirect(Location::Login);
        };
        let result = self
            .client(&bound)
            .download_url(bound.bucket(), key, self.presign_ttl)
            .await;
        redirect_to_download(session, key, result)
    }

    /// Store an uploaded file under its routing folder.
    pub async fn upload(&self, session: &mut Session, file: Option<UploadedFile>) -> Outcome {
        let Some(bound) = session.bound().cloned() else {
            return Outcome::Redirect(Location::Login);
        };
        let Some((file, key)) = file.and_then(|f| upload_key(&f.filename).map(|k| (f, k))) else {
            session.flash_error("No file selected");
            return Outcome::Redirect(Location::Index);
        };

        let content_type = file
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());
        let size = file.body.len();

        match self
            .client(&bound)
            .upload(bound.bucket(), file.body, &key, &content_type)
            .await
        {
            Ok(()) => {
                info!(bucket = bound.bucket(), key = %key, size, "file uploaded");
                session.flash_success(format!("Uploaded to: {key}"));
            }
            Err(e) => {
                warn!(bucket = bound.bucket(), key = %key, error = %e, "upload failed");
                session.flash_error(format!("Upload Failed: {e}"));
            }
        }
        Outcome::Redirect(Location::Index)
    }

    /// Delete the current version of `key`.
    pub async fn delete(&self, session: &mut Session, key: &str) -> Outcome {
        let Some(bound) = session.bound().cloned() else {
            return Outcome::Redirect(Location::Login);
        };

        match self.client(&bound).delete_object(bound.bucket(), key).await {
            Ok(()) => {
                info!(bucket = bound.bucket(), key, "file deleted");
                session.flash_success("File deleted successfully.");
            }
            Err(e) => {
                warn!(bucket = bound.bucket(), key, error = %e, "delete failed");
                session.flash_error(format!("Delete Error: {e}"));
            }
        }
        Outcome::Redirect(Location::Index)
    }

    /// Forget the session's credentials and go back to the login form.
    pub fn logout(&self, session: &mut Session) -> Outcome {
        if let Some(bound) = session.bound() {
            info!(bucket = bound.bucket(), "session cleared");
        }
        session.clear();
        Outcome::Redirect(Location::Login)
    }
}

fn redirect_to_download(
    session: &mut Session,
    key: &str,
    result: StorageResult<String>,
) -> Outcome {
    match result {
        Ok(url) => {
            debug!(key, "issued download url");
            Outcome::Redirect(Location::External(url))
        }
        Err(e) => {
            warn!(key, error = %e, "could not issue download url");
            session.flash_error(format!("Download Error: {e}"));
            Outcome::Redirect(Location::Index)
        }
    }
}
