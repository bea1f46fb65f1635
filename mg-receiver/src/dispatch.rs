//! Fan-out of accepted reply events to the two worker queues.
//!
//! ## Architecture
//!
//! ```text
//!                          ┌→ sender queue     → SenderWorker     → Mailgun messages API
//! Webhook → Dispatcher ────┤
//!                          └→ subscriber queue → SubscriberWorker → Mailgun lists API
//! ```

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

use crate::headers::{HeaderList, ParsedAddresses};
use crate::{Error, Result};

/// Queue name for acknowledgement messages.
pub const SENDER_QUEUE: &str = "sender";

/// Queue name for mailing list subscriptions.
pub const SUBSCRIBER_QUEUE: &str = "subscriber";

/// An accepted event handed to the workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEvent {
    pub addresses: ParsedAddresses,
    pub headers: HeaderList,
}

/// Producer side of both worker queues.
#[derive(Clone)]
pub struct Dispatcher {
    sender_tx: UnboundedSender<ReplyEvent>,
    subscriber_tx: UnboundedSender<ReplyEvent>,
}

/// Consumer side of both worker queues.
pub struct WorkQueues {
    pub sender: UnboundedReceiver<ReplyEvent>,
    pub subscriber: UnboundedReceiver<ReplyEvent>,
}

impl Dispatcher {
    /// Create a dispatcher together with the receivers it feeds.
    pub fn new() -> (Self, WorkQueues) {
        let (sender_tx, sender_rx) = mpsc::unbounded_channel();
        let (subscriber_tx, subscriber_rx) = mpsc::unbounded_channel();

        (
            Self {
                sender_tx,
                subscriber_tx,
            },
            WorkQueues {
                sender: sender_rx,
                subscriber: subscriber_rx,
            },
        )
    }

    /// Push `event` onto both queues. Never waits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] if a worker has stopped. The other queue
    /// still receives the event.
    pub fn dispatch(&self, event: ReplyEvent) -> Result<()> {
        let reply_to = event.addresses.reply_to.clone();

        let sender = self.sender_tx.send(event.clone());
        let subscriber = self.subscriber_tx.send(event);

        if sender.is_err() {
            error!(queue = SENDER_QUEUE, reply_to = %reply_to, "queue_closed");
            return Err(Error::QueueClosed(SENDER_QUEUE));
        }
        if subscriber.is_err() {
            error!(queue = SUBSCRIBER_QUEUE, reply_to = %reply_to, "queue_closed");
            return Err(Error::QueueClosed(SUBSCRIBER_QUEUE));
        }

        info!(reply_to = %reply_to, "event_dispatched");
        Ok(())
    }
}
