//! Console action dispatch: the boundary between HTTP and console logic.

use std::future::Future;
use std::pin::Pin;

use bucketdesk_console::{LoginRequest, Outcome, Session, UploadedFile};

/// A console action with its parsed request data.
#[derive(Debug, Clone)]
pub enum ConsoleAction {
    /// Show the login form.
    LoginForm,
    /// Submit credentials.
    Login(LoginRequest),
    /// Show the bucket listing.
    Index,
    /// Flip bucket versioning.
    ToggleVersioning,
    /// Show the version history of a key.
    History {
        /// Object key.
        key: String,
    },
    /// Download one version of a key.
    DownloadVersion {
        /// Object key.
        key: String,
        /// Version to download.
        version_id: String,
    },
    /// Upload a file; `None` when the form carried no file.
    Upload(Option<UploadedFile>),
    /// Download the current version of a key.
    Download {
        /// Object key.
        key: String,
    },
    /// Delete a key.
    Delete {
        /// Object key.
        key: String,
    },
    /// End the session.
    Logout,
}

impl ConsoleAction {
    /// Short action name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginForm => "login_form",
            Self::Login(_) => "login",
            Self::Index => "index",
            Self::ToggleVersioning => "toggle_versioning",
            Self::History { .. } => "history",
            Self::DownloadVersion { .. } => "download_version",
            Self::Upload(_) => "upload",
            Self::Download { .. } => "download",
            Self::Delete { .. } => "delete",
            Self::Logout => "logout",
        }
    }
}

/// Trait the console logic provider must implement.
///
/// The handler receives the caller's session snapshot and returns it, possibly
/// changed, together with the outcome. The HTTP layer saves the returned
/// session and renders the outcome.
///
/// # Object Safety
///
/// The returned future is boxed so the service can hold the handler behind an
/// `Arc` and move the future into a spawned connection task.
pub trait ConsoleHandler: Send + Sync + 'static {
    /// Run one console action.
    fn handle_action(
        &self,
        action: ConsoleAction,
        session: Session,
    ) -> Pin<Box<dyn Future<Output = (Session, Outcome)> + Send>>;
}
