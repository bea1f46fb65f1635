//! Acknowledgement sender.
//!
//! Replies to whoever wrote in using the template configured for the address
//! they wrote to.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use super::DeliveryStatus;
use crate::dispatch::{ReplyEvent, SENDER_QUEUE};
use crate::mailgun::{MailgunClient, OutboundMessage};
use crate::recipients::Recipients;

pub struct SenderWorker {
    client: MailgunClient,
    recipients: Arc<Recipients>,
    queue: UnboundedReceiver<ReplyEvent>,
}

impl SenderWorker {
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
        info!(queue = SENDER_QUEUE, "worker_started");

        while let Some(event) = self.queue.recv().await {
            self.handle(&event).await;
        }

        info!(queue = SENDER_QUEUE, "worker_stopped");
    }

    /// Send the acknowledgement for one event.
    pub async fn handle(&self, event: &ReplyEvent) -> DeliveryStatus {
        let to = &event.addresses.to;
        let reply_to = &event.addresses.reply_to;

        let Some(template) = self.recipients.sender(to) else {
            warn!(to = %to, reply_to = %reply_to, "sender_unknown_recipient");
            return DeliveryStatus::UnknownRecipient;
        };

        info!(to = %to, reply_to = %reply_to, domain = %template.domain, "sender_sending");

        let message = OutboundMessage {
            to: vec![reply_to.clone()],
            from: template.from.clone(),
            subject: template.subject.clone(),
            text: template.text.clone(),
        };

        match self.client.send_message(&template.domain, &message).await {
            Ok(_) => {
                info!(reply_to = %reply_to, "sender_delivered");
                DeliveryStatus::Delivered
            }
            Err(e) => {
                warn!(reply_to = %reply_to, error = %e, "sender_delivery_failed");
                DeliveryStatus::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::headers::ParsedAddresses;
    use crate::worker::fake_mailgun::FakeMailgun;

    const RECIPIENTS: &str = r#"
senders:
  b@y.com:
    domain: y.com
    from: "Team <team@y.com>"
    subject: "Thanks for writing"
    text: "We got it."
  broken@y.com:
    domain: fail.y.com
    from: team@y.com
    subject: Oops
    text: Oops
"#;

    fn event(to: &str, reply_to: &str) -> ReplyEvent {
        ReplyEvent {
            addresses: ParsedAddresses {
                from: "a@x.com".to_string(),
                to: to.to_string(),
                reply_to: reply_to.to_string(),
            },
            headers: Vec::new(),
        }
    }

    fn worker(base: &str) -> (SenderWorker, mpsc::UnboundedSender<ReplyEvent>) {
        let client = MailgunClient::new(base, "key-123", Duration::from_secs(5)).unwrap();
        let recipients = Arc::new(Recipients::from_yaml_str(RECIPIENTS).unwrap());
        let (tx, rx) = mpsc::unbounded_channel();
        (SenderWorker::new(client, recipients, rx), tx)
    }

    #[tokio::test]
    async fn test_handle_sends_template() {
        let fake = FakeMailgun::start(None).await;
        let (worker, _tx) = worker(&fake.base);

        let status = worker.handle(&event("b@y.com", "c@z.com")).await;

        assert_eq!(status, DeliveryStatus::Delivered);
        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/v3/y.com/messages");
        // base64("api:key-123")
        assert_eq!(
            requests[0].authorization.as_deref(),
            Some("Basic YXBpOmtleS0xMjM=")
        );
        assert!(requests[0].body.contains("to=c%40z.com"));
        assert!(requests[0].body.contains("subject=Thanks+for+writing"));
    }

    #[tokio::test]
    async fn test_handle_unknown_recipient() {
        let fake = FakeMailgun::start(None).await;
        let (worker, _tx) = worker(&fake.base);

        let status = worker.handle(&event("nobody@y.com", "c@z.com")).await;

        assert_eq!(status, DeliveryStatus::UnknownRecipient);
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn test_run_continues_after_failure() {
        let fake = FakeMailgun::start(Some("fail.y.com")).await;
        let (worker, tx) = worker(&fake.base);

        tx.send(event("broken@y.com", "first@z.com")).unwrap();
        tx.send(event("nobody@y.com", "second@z.com")).unwrap();
        tx.send(event("b@y.com", "third@z.com")).unwrap();
        drop(tx);

        worker.run().await;

        let requests = fake.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/v3/fail.y.com/messages");
        assert!(requests[1].body.contains("to=third%40z.com"));
    }
}
