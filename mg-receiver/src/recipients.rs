//! Per-recipient configuration loaded from the YAML recipients file.
//!
//! ```yaml
//! senders:
//!   hello@lists.example.com:
//!     domain: example.com
//!     from: "Example <hello@example.com>"
//!     subject: "Thanks!"
//!     text: "We got your reply."
//! subscribers:
//!   hello@lists.example.com:
//!     alias: news@lists.example.com
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::Result;

/// Acknowledgement template for one recipient address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SenderTemplate {
    /// Mailgun sending domain
    pub domain: String,
    pub from: String,
    pub subject: String,
    pub text: String,
}

/// Mailing list target for one recipient address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriberList {
    /// Mailing list address, e.g. `news@lists.example.com`
    pub alias: String,
}

/// Recipient configuration keyed by the `To` address of the reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Recipients {
    #[serde(default)]
    pub senders: HashMap<String, SenderTemplate>,
    #[serde(default)]
    pub subscribers: HashMap<String, SubscriberList>,
}

impl Recipients {
    /// Parse recipients from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse the recipients file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn sender(&self, to: &str) -> Option<&SenderTemplate> {
        self.senders.get(to)
    }

    pub fn subscriber(&self, to: &str) -> Option<&SubscriberList> {
        self.subscribers.get(to)
    }
}
