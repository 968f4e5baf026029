//! Console action handler backed by a [`SessionGateway`].
//!
//! This module bridges the HTTP layer (`bucketdesk-http`) with the console
//! logic (`bucketdesk-console`) by implementing the [`ConsoleHandler`] trait.
//! Each [`ConsoleAction`] is dispatched to the matching gateway method.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bucketdesk_console::{Outcome, Session, SessionGateway};
use bucketdesk_http::dispatch::{ConsoleAction, ConsoleHandler};
use bucketdesk_storage::StorageConnector;

/// Wrapper that implements [`ConsoleHandler`] by delegating to a shared
/// [`SessionGateway`].
#[derive(Debug)]
pub struct GatewayHandler<C> {
    gateway: Arc<SessionGateway<C>>,
}

impl<C: StorageConnector> GatewayHandler<C> {
    /// Create a handler around `gateway`.
    pub fn new(gateway: SessionGateway<C>) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

impl<C> Clone for GatewayHandler<C> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<C: StorageConnector> ConsoleHandler for GatewayHandler<C> {
    fn handle_action(
        &self,
        action: ConsoleAction,
        mut session: Session,
    ) -> Pin<Box<dyn Future<Output = (Session, Outcome)> + Send>> {
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move {
            let outcome = match action {
                ConsoleAction::LoginForm => gateway.login_view(&session),
                ConsoleAction::Login(request) => gateway.login(&mut session, request).await,
                ConsoleAction::Index => gateway.index_view(&mut session).await,
                ConsoleAction::ToggleVersioning => gateway.toggle_versioning(&mut session).await,
                ConsoleAction::History { key } => gateway.history_view(&mut session, &key).await,
                ConsoleAction::DownloadVersion { key, version_id } => {
                    gateway
                        .download_version(&mut session, &key, &version_id)
                        .await
                }
                ConsoleAction::Upload(file) => gateway.upload(&mut session, file).await,
                ConsoleAction::Download { key } => gateway.download(&mut session, &key).await,
                ConsoleAction::Delete { key } => gateway.delete(&mut session, &key).await,
                ConsoleAction::Logout => gateway.logout(&mut session),
            };
            (session, outcome)
        })
    }
}
