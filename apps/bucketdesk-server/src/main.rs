//! BucketDesk Server - browser console for a single S3 bucket.
//!
//! Operators log in with an access key pair, a region, and a bucket name, then
//! browse, upload, download, delete, and inspect object versions. Credentials
//! live only in the server-side session store.
//!
//! # Usage
//!
//! ```text
//! CONSOLE_LISTEN=0.0.0.0:8080 bucketdesk-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CONSOLE_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `SESSION_TTL_SECS` | `2592000` | Idle lifetime of a session |
//! | `PRESIGN_TTL_SECS` | `3600` | Validity of download URLs |
//! | `MAX_UPLOAD_BYTES` | `104857600` | Largest accepted request body |
//! | `COOKIE_SECURE` | `false` | Mark the session cookie `Secure` |
//! | `S3_ENDPOINT_URL` | *(unset)* | Custom S3-compatible endpoint |
//! | `S3_FORCE_PATH_STYLE` | `false` | Path-style bucket addressing |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod handler;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bucketdesk_console::{Session, SessionGateway};
use bucketdesk_core::{ConsoleConfig, SessionStore};
use bucketdesk_http::service::{ConsoleHttpConfig, ConsoleHttpService};
use bucketdesk_storage::S3Connector;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::handler::GatewayHandler;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often idle sessions are swept from the store.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

type ConsoleService = ConsoleHttpService<GatewayHandler<S3Connector>>;

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the console service from the configuration.
fn build_service(config: &ConsoleConfig, sessions: Arc<SessionStore<Session>>) -> ConsoleService {
    let connector = S3Connector::new(config.s3_endpoint_url.clone(), config.s3_force_path_style);
    let gateway = SessionGateway::new(connector, Duration::from_secs(config.presign_ttl_secs));
    ConsoleHttpService::new(
        GatewayHandler::new(gateway),
        sessions,
        ConsoleHttpConfig::from(config),
    )
}

/// Periodically drop sessions that idled past their TTL.
fn spawn_session_sweeper(sessions: Arc<SessionStore<Session>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = sessions.len(), "swept expired sessions");
            }
        }
    });
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: ConsoleService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the console and requesting `/health`.
///
/// Succeeds if the response is 200 OK and reports the service as running.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_healthy_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

fn is_healthy_response(response: &str) -> bool {
    response.starts_with("HTTP/1.1 200") && response.contains("\"running\"")
}

/// Address the health probe connects to for a given bind address.
fn probe_addr(listen: &str) -> String {
    listen.replace("0.0.0.0", "127.0.0.1")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConsoleConfig::from_env();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = run_health_check(&probe_addr(&config.listen)).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;
    config.validate().context("invalid console configuration")?;

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let sessions = Arc::new(SessionStore::new(Duration::from_secs(
        config.session_ttl_secs,
    )));
    spawn_session_sweeper(Arc::clone(&sessions));

    let service = build_service(&config, sessions);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        endpoint = config.s3_endpoint_url.as_deref().unwrap_or("aws"),
        path_style = config.s3_force_path_style,
        cookie_secure = config.cookie_secure,
        version = VERSION,
        "starting BucketDesk Server",
    );

    serve(listener, service).await
}
