use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the client.
///
/// Nothing in the request pipeline is swallowed: every variant reaches the
/// immediate caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed before a response was produced.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server asked us to back off and the client is configured to raise
    /// instead of sleeping.
    #[error("rate limited ({status}), retry after {retry_after:?}{}", fmt_detail(.detail))]
    RateLimited {
        status: StatusCode,
        detail: Option<String>,
        retry_after: Duration,
    },

    #[error("HTTP {status}{}", fmt_detail(.detail))]
    Http {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("gave up after {attempts} attempts, last response HTTP {status}{}", fmt_detail(.detail))]
    RetriesExhausted {
        status: StatusCode,
        detail: Option<String>,
        attempts: u32,
    },

    /// Caller misuse, raised before any request is made.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// The payload does not have the shape a record requires.
    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

fn fmt_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(": {}", d),
        _ => String::new(),
    }
}

impl Error {
    /// HTTP status of the response behind this error, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::RateLimited { status, .. }
            | Error::Http { status, .. }
            | Error::RetriesExhausted { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable detail reported by the server, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::RateLimited { detail, .. }
            | Error::Http { detail, .. }
            | Error::RetriesExhausted { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(Box::new(e))
    }
}
