//! Minimal Mailgun API client for the two outbound calls.

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::info;

use crate::{Error, Result};

/// Outbound acknowledgement message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: Vec<String>,
    pub from: String,
    pub subject: String,
    pub text: String,
}

/// Shared Mailgun client. Cheap to clone.
#[derive(Clone)]
pub struct MailgunClient {
    http: Client,
    api_base: String,
    api_key: String,
}

impl MailgunClient {
    /// Build a client against `api_base` (e.g. `https://api.mailgun.net/v3`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_base: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Endpoint for a mailing list's members.
    pub fn members_url(&self, list_alias: &str) -> String {
        format!("{}/lists/{}/members", self.api_base, list_alias)
    }

    /// Endpoint for sending messages from `domain`.
    pub fn messages_url(&self, domain: &str) -> String {
        format!("{}/{}/messages", self.api_base, domain)
    }

    /// Add `address` to the mailing list `list_alias` as a subscribed member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport failure and [`Error::Downstream`]
    /// when Mailgun answers with a non-success status.
    pub async fn subscribe(&self, list_alias: &str, address: &str) -> Result<String> {
        let resp = self
            .http
            .post(self.members_url(list_alias))
            .basic_auth("api", Some(&self.api_key))
            .form(&[("address", address), ("subscribed", "yes")])
            .send()
            .await?;

        let body = check_status(resp).await?;
        info!(list = %list_alias, address = %address, "mailgun_subscribe_ok");
        Ok(body)
    }

    /// Send `message` through the sending domain `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport failure and [`Error::Downstream`]
    /// when Mailgun answers with a non-success status.
    pub async fn send_message(&self, domain: &str, message: &OutboundMessage) -> Result<String> {
        let mut form: Vec<(&str, &str)> = message.to.iter().map(|to| ("to", to.as_str())).collect();
        form.push(("from", message.from.as_str()));
        form.push(("subject", message.subject.as_str()));
        form.push(("text", message.text.as_str()));

        let resp = self
            .http
            .post(self.messages_url(domain))
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await?;

        let body = check_status(resp).await?;
        info!(domain = %domain, to = ?message.to, "mailgun_send_ok");
        Ok(body)
    }
}

async fn check_status(resp: Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if status.is_success() {
        Ok(body)
    } else {
        Err(Error::Downstream {
            status: status.as_u16(),
            body,
        })
    }
}
