//! Request pipeline: verify, parse, dedup, dispatch.
//!
//! ```text
//! Received → Verified | Unauthorized(401)
//!          → Parsed   | Skipped(200)
//!          → Accepted(200) | Duplicate(406)
//! ```
//!
//! Nothing in here knows about HTTP framing; [`crate::web`] maps the
//! resulting [`WebhookOutcome`] onto a response.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use crate::dispatch::{Dispatcher, ReplyEvent};
use crate::headers::{extract_addresses, parse_message_headers};
use crate::store::{DedupRecord, DedupStore, InsertOutcome};
use crate::web::signature::{is_timestamp_fresh, verify_signature};
use crate::{Config, Error, Recipients};

/// Everything a request needs, passed explicitly instead of held in globals.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub recipients: Arc<Recipients>,
    pub store: DedupStore,
    pub dispatcher: Dispatcher,
}

impl AppContext {
    pub fn new(
        config: Config,
        recipients: Arc<Recipients>,
        store: DedupStore,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config: Arc::new(config),
            recipients,
            store,
            dispatcher,
        }
    }
}

/// The webhook fields the pipeline consumes.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub token: String,
    pub timestamp: String,
    pub signature: String,
    /// JSON-encoded array of `[name, value]` pairs
    pub message_headers: String,
}

/// Why an authenticated event was accepted without any processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingField(&'static str),
    MalformedHeaders,
}

/// Terminal state of a webhook request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Unauthorized,
    Skipped(SkipReason),
    Duplicate,
    Accepted,
    /// The dedup store failed; nothing was recorded or enqueued.
    StoreError,
}

impl WebhookOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookOutcome::Unauthorized => 401,
            WebhookOutcome::Skipped(_) | WebhookOutcome::Accepted => 200,
            WebhookOutcome::Duplicate => 406,
            WebhookOutcome::StoreError => 500,
        }
    }
}

/// Run one webhook request through the pipeline.
pub async fn handle_webhook(ctx: &AppContext, request: WebhookRequest) -> WebhookOutcome {
    if !is_authentic(&ctx.config, &request) {
        warn!(timestamp = %request.timestamp, "webhook_signature_invalid");
        return WebhookOutcome::Unauthorized;
    }

    let Some(headers) = parse_message_headers(&request.message_headers) else {
        info!(reason = "malformed_headers", "webhook_skipped");
        return WebhookOutcome::Skipped(SkipReason::MalformedHeaders);
    };

    let addresses = match extract_addresses(&headers) {
        Ok(addresses) => addresses,
        Err(Error::MissingField(field)) => {
            info!(reason = "missing_field", field = field, "webhook_skipped");
            return WebhookOutcome::Skipped(SkipReason::MissingField(field));
        }
        Err(e) => {
            // extract_addresses only reports missing fields
            error!(error = %e, "webhook_header_extract_failed");
            return WebhookOutcome::Skipped(SkipReason::MalformedHeaders);
        }
    };

    let record = DedupRecord {
        to: addresses.to.clone(),
        from: addresses.from.clone(),
        headers: headers.clone(),
    };

    match ctx.store.try_insert(&addresses.reply_to, &record).await {
        Ok(InsertOutcome::Inserted) => {}
        Ok(InsertOutcome::AlreadyExists) => {
            warn!(reply_to = %addresses.reply_to, "webhook_duplicate");
            return WebhookOutcome::Duplicate;
        }
        Err(e) => {
            error!(reply_to = %addresses.reply_to, error = %e, "dedup_store_insert_failed");
            return WebhookOutcome::StoreError;
        }
    }

    let reply_to = addresses.reply_to.clone();
    let to = addresses.to.clone();

    // The record is already durable, so a closed queue still answers Accepted.
    match ctx.dispatcher.dispatch(ReplyEvent { addresses, headers }) {
        Ok(()) => info!(reply_to = %reply_to, to = %to, dispatched = true, "webhook_accepted"),
        Err(e) => warn!(
            reply_to = %reply_to,
            to = %to,
            dispatched = false,
            error = %e,
            "webhook_accepted"
        ),
    }

    WebhookOutcome::Accepted
}

fn is_authentic(config: &Config, request: &WebhookRequest) -> bool {
    if !verify_signature(
        &config.api_key,
        &request.timestamp,
        &request.token,
        &request.signature,
    ) {
        return false;
    }

    if config.replay_window_enabled() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        return is_timestamp_fresh(&request.timestamp, config.signature_max_age, now);
    }

    true
}
