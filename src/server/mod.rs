//! HTTP server for the merge gate.
//!
//! - Accepts webhooks from GitHub, validates signatures and hands parsed
//!   events to a [`Dispatch`] implementation in the background
//! - Provides a health check for liveness probes
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries (returns 202 Accepted)
//! - `GET /health` - Returns 200 if server is running

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::build::BuildTrigger;
use crate::effects::{GitHubInterpreter, GitInterpreter};
use crate::orchestrator::Orchestrator;
use crate::webhooks::GitHubEvent;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{WebhookError, webhook_handler};

/// Receives verified, parsed events.
///
/// The webhook handler spawns one task per delivery and calls `dispatch` in
/// it, so a slow event never delays the HTTP response.
pub trait Dispatch: Clone + Send + Sync + 'static {
    fn dispatch(&self, event: GitHubEvent) -> impl Future<Output = ()> + Send;
}

impl<G, M, B> Dispatch for Orchestrator<G, M, B>
where
    G: GitHubInterpreter + Send + Sync + 'static,
    G::Error: Display,
    M: GitInterpreter + Send + Sync + 'static,
    M::Error: Display,
    B: BuildTrigger + Send + Sync + 'static,
{
    async fn dispatch(&self, event: GitHubEvent) {
        let disposition = match event {
            GitHubEvent::IssueComment(event) => self.handle_comment(event).await,
            GitHubEvent::PullRequest(event) => self.handle_pull_request(event).await,
        };
        debug!(?disposition, "event handled");
    }
}

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<D> {
    inner: Arc<AppStateInner<D>>,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<D> {
    dispatcher: D,

    /// Shared secret for webhook signature verification.
    webhook_secret: Vec<u8>,
}

impl<D: Dispatch> AppState<D> {
    pub fn new(dispatcher: D, webhook_secret: impl Into<Vec<u8>>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                dispatcher,
                webhook_secret: webhook_secret.into(),
            }),
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.inner.dispatcher
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<D: Dispatch>(app_state: AppState<D>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<D>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
