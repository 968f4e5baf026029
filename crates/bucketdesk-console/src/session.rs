//! Per-session console state.

use bucketdesk_core::{BucketTarget, Credentials};

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    /// The action succeeded.
    Success,
    /// The action failed.
    Error,
}

impl FlashLevel {
    /// CSS-friendly name of the level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A one-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    /// Severity.
    pub level: FlashLevel,
    /// Message text.
    pub message: String,
}

/// Credentials and bucket bound to an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSession {
    /// Keys used to sign every storage call of this session.
    pub credentials: Credentials,
    /// The bucket this session operates on.
    pub target: BucketTarget,
}

impl BoundSession {
    /// Name of the bound bucket.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.target.bucket
    }
}

/// Authentication state of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No credentials bound; only login is permitted.
    #[default]
    Anonymous,
    /// Credentials and bucket target bound.
    Authenticated(BoundSession),
}

/// State of one console session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    flashes: Vec<Flash>,
}

impl Session {
    /// Current authentication state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The bound credentials and bucket, if authenticated.
    #[must_use]
    pub fn bound(&self) -> Option<&BoundSession> {
        match &self.state {
            SessionState::Authenticated(bound) => Some(bound),
            SessionState::Anonymous => None,
        }
    }

    /// Whether credentials are bound.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.bound().is_some()
    }

    /// Bind credentials and a bucket target.
    pub fn bind(&mut self, bound: BoundSession) {
        self.state = SessionState::Authenticated(bound);
    }

    /// Drop all session-bound state, pending flashes included.
    pub fn clear(&mut self) {
        self.state = SessionState::Anonymous;
        self.flashes.clear();
    }

    /// Queue a flash message.
    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    /// Queue a success flash.
    pub fn flash_success(&mut self, message: impl Into<String>) {
        self.flash(FlashLevel::Success, message);
    }

    /// Queue an error flash.
    pub fn flash_error(&mut self, message: impl Into<String>) {
        self.flash(FlashLevel::Error, message);
    }

    /// Pending flashes, oldest first.
    #[must_use]
    pub fn flashes(&self) -> &[Flash] {
        &self.flashes
    }

    /// Remove and return the pending flashes.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}
