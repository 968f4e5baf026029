//! Session gateway for BucketDesk.
//!
//! Each console session is either anonymous or bound to one credential set and
//! one bucket. [`SessionGateway`] implements one operation per user action: it
//! checks the session state, builds a storage client from the session's
//! credentials, performs the call, and maps the result to an [`Outcome`] plus
//! flash messages. No action is fatal; every failure becomes a flash.

pub mod error;
pub mod gateway;
pub mod outcome;
pub mod session;
pub mod upload;

pub use error::{ConsoleError, ConsoleResult};
pub use gateway::{LoginRequest, SessionGateway, UploadedFile};
pub use outcome::{HistoryView, IndexView, Location, Outcome, View};
pub use session::{BoundSession, Flash, FlashLevel, Session, SessionState};
pub use upload::{DEFAULT_CONTENT_TYPE, upload_folder, upload_key};
