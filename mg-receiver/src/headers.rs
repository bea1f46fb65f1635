//! Extraction of reply addresses from Mailgun's `message-headers` field.
//!
//! Mailgun provides headers as a JSON array of [name, value] pairs, e.g.:
//! `[["From", "a@x.com"], ["To", "b@y.com"], ["Reply-To", "c@z.com"], ...]`

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Header pairs in the order they were received.
pub type HeaderList = Vec<(String, String)>;

/// The three addresses the pipeline routes on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddresses {
    pub from: String,
    pub to: String,
    /// Idempotency key for the event
    pub reply_to: String,
}

/// Decode the JSON header array.
///
/// Entries that are not at least a two-element string array are skipped.
/// Returns `None` if the document itself is not a JSON array of arrays.
pub fn parse_message_headers(raw: &str) -> Option<HeaderList> {
    let parsed: std::result::Result<Vec<Vec<serde_json::Value>>, _> = serde_json::from_str(raw);

    match parsed {
        Ok(pairs) => Some(
            pairs
                .into_iter()
                .filter_map(|pair| match (pair.first(), pair.get(1)) {
                    (Some(serde_json::Value::String(name)), Some(serde_json::Value::String(value))) => {
                        Some((name.clone(), value.clone()))
                    }
                    _ => None,
                })
                .collect(),
        ),
        Err(e) => {
            warn!(
                error = %e,
                headers_preview = %raw.chars().take(200).collect::<String>(),
                "message_headers_parse_failed"
            );
            None
        }
    }
}

/// Extract `From`, `To` and `Reply-To` from a header list.
///
/// The first header with a matching name wins. Names compare
/// case-insensitively and must match exactly, so `Reply-To` never
/// stands in for `To`.
pub fn extract_addresses(headers: &[(String, String)]) -> Result<ParsedAddresses> {
    Ok(ParsedAddresses {
        from: find_header(headers, "From")?,
        to: find_header(headers, "To")?,
        reply_to: find_header(headers, "Reply-To")?,
    })
}

fn find_header(headers: &[(String, String)], name: &'static str) -> Result<String> {
    headers
        .iter()
        .find(|(n, _)| n.trim().eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim().to_string())
        .ok_or(Error::MissingField(name))
}
