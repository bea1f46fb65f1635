//! mg-receiver - Mailgun reply webhook receiver.
//!
//! Verifies reply webhooks, records each reply-to address once, and fans the
//! event out to two workers: one sends an acknowledgement, the other
//! subscribes the replier to a mailing list.
//!
//! ## Architecture
//!
//! ```text
//! Webhook → verify → extract headers → dedup store → Dispatcher ─┬→ SenderWorker
//!                                                                 └→ SubscriberWorker
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod headers;
pub mod mailgun;
pub mod pipeline;
pub mod recipients;
pub mod store;
pub mod web;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{Dispatcher, ReplyEvent, WorkQueues};
pub use error::{Error, Result};
pub use headers::{extract_addresses, ParsedAddresses};
pub use mailgun::MailgunClient;
pub use pipeline::{handle_webhook, AppContext, SkipReason, WebhookOutcome, WebhookRequest};
pub use recipients::Recipients;
pub use store::{DedupRecord, DedupStore, InsertOutcome};
pub use worker::{SenderWorker, SubscriberWorker};
