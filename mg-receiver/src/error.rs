//! Error types for the receiver library.

use thiserror::Error;

/// Errors that can occur while ingesting and fanning out reply events.
#[derive(Debug, Error)]
pub enum Error {
    /// A required header was not present in the event.
    #[error("missing header: {0}")]
    MissingField(&'static str),

    /// The dedup store could not be opened or initialized.
    #[error("dedup store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),

    /// Dedup store query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Recipients file could not be parsed.
    #[error("recipients file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure talking to the Mailgun API.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Mailgun answered with a non-success status.
    #[error("mailgun returned {status}: {body}")]
    Downstream { status: u16, body: String },

    /// A worker queue has no consumer left.
    #[error("{0} queue closed")]
    QueueClosed(&'static str),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
