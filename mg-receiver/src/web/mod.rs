//! Web server module for handling inbound reply webhooks.
//!
//! This module provides a thin web server that:
//! - Receives Mailgun webhooks
//! - Runs them through the ingestion pipeline
//! - Answers before any Mailgun API call is made

pub mod handlers;
pub mod signature;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::pipeline::AppContext;

pub use handlers::{health, mailgun_webhook, HealthResponse, MailgunForm};
pub use signature::{is_timestamp_fresh, verify_signature};

/// Path Mailgun posts reply events to.
pub const WEBHOOK_PATH: &str = "/mg/hook";

/// Largest webhook body accepted; Mailgun messages with attachments top out at 25 MB.
pub const WEBHOOK_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// Build the application router.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(WEBHOOK_PATH, post(mailgun_webhook))
        .layer(DefaultBodyLimit::max(WEBHOOK_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
