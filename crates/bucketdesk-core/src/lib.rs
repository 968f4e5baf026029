//! Core types, configuration, and session storage for BucketDesk.
//!
//! This crate provides the foundational building blocks shared by the storage
//! client, the session gateway, and the HTTP layer: console configuration,
//! credential and bucket value types, and the concurrent [`SessionStore`].

mod config;
mod error;
mod session;
mod types;

pub use config::ConsoleConfig;
pub use error::{BucketDeskError, BucketDeskResult};
pub use session::{SessionId, SessionStore};
pub use types::{AwsRegion, BucketTarget, Credentials};
