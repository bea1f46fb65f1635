//! Mailing list subscriber.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use super::DeliveryStatus;
use crate::dispatch::{ReplyEvent, SUBSCRIBER_QUEUE};
use crate::mailgun::MailgunClient;
use crate::recipients::Recipients;

/// Adds repliers to the mailing list configured for the address they wrote to.
pub struct SubscriberWorker {
    client: MailgunClient,
    recipients: Arc<Recipients>,
    queue: UnboundedReceiver<ReplyEvent>,
}

impl SubscriberWorker {
    pub fn new(
        client: MailgunClient,
        recipients: Arc<Recipients>,
        queue: UnboundedReceiver<ReplyEvent>,
    ) -> Self {
        Self {
            client,
            recipients,
            queue,
        }
    }

    /// Drain the queue until every producer is gone.
    pub async fn run(mut self) {
        info!(queue = SUBSCRIBER_QUEUE, "worker_started");

        while let Some(event) = self.queue.recv().await {
            self.handle(&event).await;
        }

        info!(queue = SUBSCRIBER_QUEUE, "worker_stopped");
    }

    pub async fn handle(&self, event: &ReplyEvent) -> DeliveryStatus {
        let to = &event.addresses.to;
        let reply_to = &event.addresses.reply_to;

        let Some(list) = self.recipients.subscriber(to) else {
            warn!(to = %to, reply_to = %reply_to, "subscriber_unknown_recipient");
            return DeliveryStatus::UnknownRecipient;
        };

        info!(reply_to = %reply_to, list = %list.alias, "subscriber_subscribing");

        match self.client.subscribe(&list.alias, reply_to).await {
            Ok(_) => DeliveryStatus::Delivered,
            Err(e) => {
                warn!(
                    reply_to = %reply_to,
                    list = %list.alias,
                    error = %e,
                    "subscriber_update_failed"
                );
                DeliveryStatus::Failed
            }
        }
    }
}
