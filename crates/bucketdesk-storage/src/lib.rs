//! Object storage client facade for BucketDesk.
//!
//! Every console action reaches the remote bucket through the [`ObjectStore`]
//! trait. Each method maps to exactly one remote call: no retries, no
//! pagination beyond the store's default page size, and no state retained
//! between calls.
//!
//! - [`s3`]: [`S3StorageClient`](s3::S3StorageClient), backed by `aws-sdk-s3`.
//! - [`memory`]: [`MemoryStorage`](memory::MemoryStorage), a process-local
//!   store with S3 versioning semantics used by tests and local development.
//!
//! Clients are built per request by a [`StorageConnector`] from the
//! credentials bound to the caller's session; nothing is shared across users.

pub mod error;
pub mod memory;
pub mod model;
pub mod s3;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use model::{ObjectListing, VersionRecord, VersioningState, VersioningStatus};
pub use s3::{S3Connector, S3StorageClient};
pub use store::{DEFAULT_PRESIGN_TTL, ObjectStore, StorageConnector};
