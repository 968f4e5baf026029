//! Server-side session storage.
//!
//! Provides [`SessionStore`], a thread-safe concurrent map from an opaque
//! [`SessionId`] to per-session state. Only the id travels in the cookie; the
//! state itself (credentials included) stays in process memory and is dropped
//! once the session idles past its TTL.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// Opaque, randomly generated session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    last_seen: DateTime<Utc>,
}

/// Thread-safe session store with idle expiry.
///
/// Readers get a snapshot of the session; writers replace it wholesale with
/// [`update`](Self::update). An update never recreates a removed session, so a
/// request still holding a snapshot from before a logout cannot bring the
/// session back. Entries only come into existence through
/// [`insert`](Self::insert).
///
/// # Examples
///
/// ```
/// use bucketdesk_core::SessionStore;
///
/// let store = SessionStore::<u32>::new(std::time::Duration::from_secs(60));
/// let id = store.insert(7);
/// assert!(store.update(&id, 8));
/// assert_eq!(store.load(&id), Some(8));
///
/// store.remove(&id);
/// assert!(!store.update(&id, 9));
/// assert!(store.is_empty());
/// ```
#[derive(Debug)]
pub struct SessionStore<T: Clone + Send + Sync> {
    inner: DashMap<SessionId, Entry<T>>,
    ttl: Duration,
}

impl<T: Clone + Send + Sync> SessionStore<T> {
    /// Create an empty store whose sessions expire after `ttl` of inactivity.
    #[must_use]
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            inner: DashMap::new(),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
        }
    }

    /// Start a new session holding `value` and return its fresh id.
    #[must_use]
    pub fn insert(&self, value: T) -> SessionId {
        let id = SessionId::generate();
        self.inner.insert(
            id,
            Entry {
                value,
                last_seen: Utc::now(),
            },
        );
        id
    }

    /// Load a snapshot of the session, refreshing its idle timer.
    ///
    /// Returns `None` for unknown or expired ids; expired entries are removed.
    #[must_use]
    pub fn load(&self, id: &SessionId) -> Option<T> {
        self.load_at(id, Utc::now())
    }

    fn load_at(&self, id: &SessionId, now: DateTime<Utc>) -> Option<T> {
        let mut entry = self.inner.get_mut(id)?;
        if now - entry.last_seen > self.ttl {
            drop(entry);
            self.inner.remove(id);
            tracing::debug!(session = %id, "session expired");
            return None;
        }
        entry.last_seen = now;
        Some(entry.value.clone())
    }

    /// Replace the state stored for `id`.
    ///
    /// Returns `false`, storing nothing, when the session no longer exists.
    pub fn update(&self, id: &SessionId, value: T) -> bool {
        match self.inner.get_mut(id) {
            Some(mut entry) => {
                entry.value = value;
                entry.last_seen = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Drop a session entirely.
    pub fn remove(&self, id: &SessionId) -> Option<T> {
        self.inner.remove(id).map(|(_, entry)| entry.value)
    }

    /// Remove every session idle for longer than the TTL, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, entry| now - entry.last_seen <= self.ttl);
        before - self.inner.len()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
