//! The console HTTP service implementing hyper's `Service` trait.
//!
//! [`ConsoleHttpService`] processes each request through these steps:
//!
//! 1. Health check interception (`GET /health`)
//! 2. Routing via [`ConsoleRouter`]
//! 3. Session lookup from the session cookie (an unstored default when absent)
//! 4. Size-limited body collection and form or multipart parsing
//! 5. Dispatch to the [`ConsoleHandler`]
//! 6. Redirect or rendered page; a non-empty session is written back
//! 7. Common response headers (`x-request-id`, `Server`, `Cache-Control`)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bucketdesk_console::{Location, Outcome, Session, UploadedFile};
use bucketdesk_core::{ConsoleConfig, SessionId, SessionStore};
use bytes::Bytes;
use http::header::{
    ALLOW, CACHE_CONTROL, CONTENT_TYPE, HeaderValue, LOCATION, SERVER, SET_COOKIE,
};
use http::{HeaderMap, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::body::ConsoleResponseBody;
use crate::cookie::{session_cookie, session_id_from_headers};
use crate::dispatch::{ConsoleAction, ConsoleHandler};
use crate::error::{HttpError, RouteError};
use crate::form::parse_login_form;
use crate::multipart::{extract_boundary, parse_multipart};
use crate::render::{error_page, render_view};
use crate::router::{ConsoleRouter, Route};

/// Name of the multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

/// Configuration for the console HTTP service.
#[derive(Debug, Clone)]
pub struct ConsoleHttpConfig {
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    /// `Max-Age` of the session cookie, in seconds.
    pub session_ttl_secs: u64,
}

impl Default for ConsoleHttpConfig {
    fn default() -> Self {
        Self::from(&ConsoleConfig::default())
    }
}

impl From<&ConsoleConfig> for ConsoleHttpConfig {
    fn from(config: &ConsoleConfig) -> Self {
        Self {
            max_body_bytes: config.max_upload_bytes,
            cookie_secure: config.cookie_secure,
            session_ttl_secs: config.session_ttl_secs,
        }
    }
}

/// The console HTTP service.
///
/// # Type Parameters
///
/// - `H`: The console logic handler implementing [`ConsoleHandler`].
#[derive(Debug)]
pub struct ConsoleHttpService<H: ConsoleHandler> {
    handler: Arc<H>,
    sessions: Arc<SessionStore<Session>>,
    router: ConsoleRouter,
    config: Arc<ConsoleHttpConfig>,
}

impl<H: ConsoleHandler> ConsoleHttpService<H> {
    /// Create a service around `handler`, storing sessions in `sessions`.
    #[must_use]
    pub fn new(
        handler: H,
        sessions: Arc<SessionStore<Session>>,
        config: ConsoleHttpConfig,
    ) -> Self {
        Self::from_shared(Arc::new(handler), sessions, config)
    }

    /// Create a service from an `Arc<H>` handler.
    #[must_use]
    pub fn from_shared(
        handler: Arc<H>,
        sessions: Arc<SessionStore<Session>>,
        config: ConsoleHttpConfig,
    ) -> Self {
        Self {
            handler,
            sessions,
            router: ConsoleRouter::new(),
            config: Arc::new(config),
        }
    }

    /// Process one request into a response. Never fails; errors become pages.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<ConsoleResponseBody>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let request_id = Uuid::new_v4().to_string();
        let response = self.process_request(req, &request_id).await;
        add_common_headers(response, &request_id)
    }

    async fn process_request<B>(
        &self,
        req: http::Request<B>,
        request_id: &str,
    ) -> http::Response<ConsoleResponseBody>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let method = req.method().clone();
        let uri = req.uri().clone();
        debug!(%method, %uri, request_id, "processing console request");

        if is_health_check(&method, uri.path()) {
            return health_check_response();
        }

        let route = match self.router.resolve(&req) {
            Ok(route) => route,
            Err(err) => {
                debug!(%method, %uri, error = %err, request_id, "failed to route request");
                return route_error_response(&err);
            }
        };

        let (parts, body) = req.into_parts();
        let (id, session) = self.load_session(&parts.headers);

        let action = match self.read_action(route, &parts.headers, body).await {
            Ok(action) => action,
            Err(err) => {
                warn!(error = %err, request_id, "rejected request body");
                return error_response(err.status_code(), &err.to_string());
            }
        };

        let action_name = action.name();
        let was_authenticated = session.is_authenticated();
        let (mut session, outcome) = self.handler.handle_action(action, session).await;
        // A fresh id after login so a pre-login cookie cannot be reused.
        let rotate = !was_authenticated && session.is_authenticated();

        let mut response = outcome_response(outcome, &mut session);
        if let Some(issued) = self.store_session(id, session, rotate) {
            self.set_cookie(&mut response, issued);
        }

        info!(
            action = action_name,
            status = response.status().as_u16(),
            request_id,
            "handled console action"
        );
        response
    }

    /// Load the session named by the cookie.
    ///
    /// Requests without a live session get a default session that is not
    /// stored unless the action leaves something in it.
    fn load_session(&self, headers: &HeaderMap) -> (Option<SessionId>, Session) {
        session_id_from_headers(headers)
            .and_then(|id| self.sessions.load(&id).map(|session| (Some(id), session)))
            .unwrap_or_default()
    }

    /// Write the session back after an action.
    ///
    /// Sessions holding neither a login nor pending flashes are removed.
    /// Returns the id of a newly stored session, whose cookie must be sent.
    fn store_session(
        &self,
        id: Option<SessionId>,
        session: Session,
        rotate: bool,
    ) -> Option<SessionId> {
        let keep = session.is_authenticated() || !session.flashes().is_empty();
        match id {
            Some(id) if !rotate => {
                if keep {
                    if !self.sessions.update(&id, session) {
                        debug!(session = %id, "session removed concurrently; write dropped");
                    }
                } else {
                    self.sessions.remove(&id);
                }
                None
            }
            _ => {
                if let Some(id) = id {
                    self.sessions.remove(&id);
                }
                keep.then(|| self.sessions.insert(session))
            }
        }
    }

    async fn read_action<B>(
        &self,
        route: Route,
        headers: &HeaderMap,
        body: B,
    ) -> Result<ConsoleAction, HttpError>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let body = if route.has_body() {
            collect_body(body, self.config.max_body_bytes).await?
        } else {
            Bytes::new()
        };

        let action = match route {
            Route::LoginForm => ConsoleAction::LoginForm,
            Route::Login => ConsoleAction::Login(parse_login_form(&body)),
            Route::Index => ConsoleAction::Index,
            Route::ToggleVersioning => ConsoleAction::ToggleVersioning,
            Route::History { key } => ConsoleAction::History { key },
            Route::DownloadVersion { key, version_id } => {
                ConsoleAction::DownloadVersion { key, version_id }
            }
            Route::Upload => ConsoleAction::Upload(parse_upload(headers, &body)?),
            Route::Download { key } => ConsoleAction::Download { key },
            Route::Delete { key } => ConsoleAction::Delete { key },
            Route::Logout => ConsoleAction::Logout,
        };
        Ok(action)
    }

    fn set_cookie(&self, response: &mut http::Response<ConsoleResponseBody>, id: SessionId) {
        response.headers_mut().append(
            SET_COOKIE,
            session_cookie(id, self.config.session_ttl_secs, self.config.cookie_secure),
        );
    }
}

impl<H: ConsoleHandler> Clone for ConsoleHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            sessions: Arc::clone(&self.sessions),
            router: self.router,
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: ConsoleHandler> Service<http::Request<Incoming>> for ConsoleHttpService<H> {
    type Response = http::Response<ConsoleResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

/// Collect a request body, failing once it grows past `limit` bytes.
async fn collect_body<B>(body: B, limit: usize) -> Result<Bytes, HttpError>
where
    B: http_body::Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(HttpError::BodyTooLarge { limit })
        }
        Err(err) => Err(HttpError::ReadBody(err.to_string())),
    }
}

fn parse_upload(headers: &HeaderMap, body: &[u8]) -> Result<Option<UploadedFile>, HttpError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let boundary = extract_boundary(content_type)?;
    let mut form = parse_multipart(body, &boundary)?;

    Ok(form.take_file(UPLOAD_FIELD).map(|part| UploadedFile {
        filename: part.filename,
        content_type: part.content_type,
        body: part.data,
    }))
}

/// Turn a console outcome into a response. Rendered pages consume the
/// session's pending flashes.
fn outcome_response(
    outcome: Outcome,
    session: &mut Session,
) -> http::Response<ConsoleResponseBody> {
    match outcome {
        Outcome::Redirect(location) => {
            let target = match location {
                Location::Index => "/".to_owned(),
                Location::Login => "/login".to_owned(),
                Location::External(url) => url,
            };
            redirect_response(&target)
        }
        Outcome::Render(view) => {
            let flashes = session.take_flashes();
            html_response(StatusCode::OK, render_view(&view, &flashes))
        }
    }
}

fn redirect_response(target: &str) -> http::Response<ConsoleResponseBody> {
    match HeaderValue::from_str(target) {
        Ok(location) => {
            let mut response = http::Response::new(ConsoleResponseBody::empty());
            *response.status_mut() = StatusCode::SEE_OTHER;
            response.headers_mut().insert(LOCATION, location);
            response
        }
        Err(_) => {
            warn!("redirect target is not a valid header value");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "The download link could not be issued.",
            )
        }
    }
}

fn html_response(status: StatusCode, html: String) -> http::Response<ConsoleResponseBody> {
    let mut response = http::Response::new(ConsoleResponseBody::from_string(html));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

fn error_response(status: StatusCode, detail: &str) -> http::Response<ConsoleResponseBody> {
    html_response(status, error_page(status, detail))
}

fn route_error_response(err: &RouteError) -> http::Response<ConsoleResponseBody> {
    match err {
        RouteError::NotFound(_) => error_response(StatusCode::NOT_FOUND, &err.to_string()),
        RouteError::MethodNotAllowed { allow } => {
            let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, &err.to_string());
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(allow));
            response
        }
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == "/health"
}

/// Produce a health check response.
fn health_check_response() -> http::Response<ConsoleResponseBody> {
    http::Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(ConsoleResponseBody::from_string(
            r#"{"status":"running","service":"bucketdesk"}"#,
        ))
        .expect("static health response should be valid")
}

/// Add common response headers to every console response.
fn add_common_headers(
    mut response: http::Response<ConsoleResponseBody>,
    request_id: &str,
) -> http::Response<ConsoleResponseBody> {
    let headers = response.headers_mut();
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert(SERVER, HeaderValue::from_static("BucketDesk"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
