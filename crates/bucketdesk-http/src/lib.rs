//! HTTP layer for the BucketDesk console.
//!
//! - **Routing** ([`router`]): maps method and path to a [`Route`].
//! - **Request parsing** ([`form`], [`multipart`]): turns login and upload
//!   bodies into console actions.
//! - **Sessions** ([`cookie`]): reads and issues the session cookie.
//! - **Dispatch** ([`dispatch`]): hands a [`ConsoleAction`] to the
//!   [`ConsoleHandler`] that runs it.
//! - **Rendering** ([`render`]): HTML pages for the views a handler returns.
//! - **Service** ([`service`]): the hyper `Service` tying it together.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> ConsoleHttpService (hyper Service)
//!     -> Health check interception
//!     -> ConsoleRouter (route + method check)
//!     -> Session lookup (cookie -> SessionStore)
//!     -> Body collection (size-limited) and form/multipart parsing
//!     -> ConsoleHandler (one console action)
//!     -> Redirect or rendered page, session saved back
//!     -> Common response headers (x-request-id, Server)
//!   <- HTTP Response
//! ```

pub mod body;
pub mod cookie;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod multipart;
pub mod render;
pub mod router;
pub mod service;

pub use body::ConsoleResponseBody;
pub use dispatch::{ConsoleAction, ConsoleHandler};
pub use error::{HttpError, RouteError};
pub use router::{ConsoleRouter, Route};
pub use service::{ConsoleHttpConfig, ConsoleHttpService};
