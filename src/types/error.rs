//! Error hierarchy for the query pipeline and its collaborators

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Root error type for all Zenome failures.
#[derive(Error, Debug)]
pub enum ZenomeError {
    /// Credentials rejected by a hosted service (401/403).
    #[error("auth error: {0}")]
    Auth(String),

    /// Transport failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// Service asked us to back off (429).
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// Service answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Response arrived but did not match the expected contract.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Tokenizer could not encode the text.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ZenomeResult<T> = Result<T, ZenomeError>;

/// Flat classification of a [`ZenomeError`], safe to serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    Network,
    RateLimit,
    Upstream,
    Malformed,
    Tokenizer,
    Config,
    Io,
}

impl ZenomeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Network(_) => ErrorKind::Network,
            Self::RateLimit(_) => ErrorKind::RateLimit,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Malformed(_) => ErrorKind::Malformed,
            Self::Tokenizer(_) => ErrorKind::Tokenizer,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Map a non-success HTTP status to the matching variant
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Auth(body),
            429 => Self::RateLimit(body),
            _ => Self::Upstream { status, body },
        }
    }
}

impl From<reqwest::Error> for ZenomeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::from_status(status.as_u16(), e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl ErrorKind {
    /// Short label for terminal output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Network => "network",
            Self::RateLimit => "rate limit",
            Self::Upstream => "upstream",
            Self::Malformed => "malformed response",
            Self::Tokenizer => "tokenizer",
            Self::Config => "config",
            Self::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
