//! Console request routing.
//!
//! The [`ConsoleRouter`] maps an HTTP method and path to a [`Route`]. Object
//! keys travel in the path (`/download/images/a.png`), so everything after the
//! route prefix is the key, percent-decoded. For `/download_version` the last
//! path segment is the version id.

use http::Method;
use percent_encoding::percent_decode_str;

use crate::error::RouteError;

/// A resolved console route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /login`
    LoginForm,
    /// `POST /login`
    Login,
    /// `GET /`
    Index,
    /// `GET /toggle_versioning`
    ToggleVersioning,
    /// `GET /history/{key}`
    History {
        /// Object key.
        key: String,
    },
    /// `GET /download_version/{key}/{version_id}`
    DownloadVersion {
        /// Object key.
        key: String,
        /// Version to download.
        version_id: String,
    },
    /// `POST /upload`
    Upload,
    /// `GET /download/{key}`
    Download {
        /// Object key.
        key: String,
    },
    /// `GET /delete/{key}`
    Delete {
        /// Object key.
        key: String,
    },
    /// `GET /logout`
    Logout,
}

impl Route {
    /// Whether the route carries a request body worth reading.
    #[must_use]
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Login | Self::Upload)
    }
}

/// Maps requests to console routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleRouter;

impl ConsoleRouter {
    /// Create a router.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve an HTTP request to a route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NotFound`] for unknown paths and
    /// [`RouteError::MethodNotAllowed`] for known paths hit with the wrong
    /// method.
    pub fn resolve<B>(&self, req: &http::Request<B>) -> Result<Route, RouteError> {
        resolve_path(req.method(), req.uri().path())
    }
}

fn resolve_path(method: &Method, path: &str) -> Result<Route, RouteError> {
    let not_found = || RouteError::NotFound(path.to_owned());

    match path {
        "/login" => {
            return match *method {
                Method::GET => Ok(Route::LoginForm),
                Method::POST => Ok(Route::Login),
                _ => Err(RouteError::MethodNotAllowed { allow: "GET, POST" }),
            };
        }
        "/upload" => {
            return if *method == Method::POST {
                Ok(Route::Upload)
            } else {
                Err(RouteError::MethodNotAllowed { allow: "POST" })
            };
        }
        _ => {}
    }

    let route = match path {
        "/" => Route::Index,
        "/toggle_versioning" => Route::ToggleVersioning,
        "/logout" => Route::Logout,
        _ => {
            if let Some(raw) = path.strip_prefix("/history/") {
                Route::History {
                    key: decode_key(raw).ok_or_else(not_found)?,
                }
            } else if let Some(raw) = path.strip_prefix("/download_version/") {
                let (raw_key, raw_version) = raw.rsplit_once('/').ok_or_else(not_found)?;
                Route::DownloadVersion {
                    key: decode_key(raw_key).ok_or_else(not_found)?,
                    version_id: decode_key(raw_version).ok_or_else(not_found)?,
                }
            } else if let Some(raw) = path.strip_prefix("/download/") {
                Route::Download {
                    key: decode_key(raw).ok_or_else(not_found)?,
                }
            } else if let Some(raw) = path.strip_prefix("/delete/") {
                Route::Delete {
                    key: decode_key(raw).ok_or_else(not_found)?,
                }
            } else {
                return Err(not_found());
            }
        }
    };

    if *method == Method::GET {
        Ok(route)
    } else {
        Err(RouteError::MethodNotAllowed { allow: "GET" })
    }
}

/// Percent-decode a path component; `None` when it is empty or not UTF-8.
fn decode_key(raw: &str) -> Option<String> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?.into_owned();
    (!decoded.is_empty()).then_some(decoded)
}
