//! A2A Error types.

use thiserror::Error;

/// Coarse classification of an [`A2AError`], for callers deciding whether to
/// retry, alert, or surface a failure to an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection, DNS, TLS or timeout failure.
    Network,
    /// The server answered with a non-2xx status.
    HttpStatus,
    /// Malformed JSON at the envelope or payload level.
    Decode,
    /// A well-formed JSON-RPC error object reported by the agent.
    Protocol,
    /// The response does not belong to the request that was sent.
    IdMismatch,
    /// The agent card failed schema or semantic validation.
    Validation,
    /// The caller cancelled the operation.
    Cancelled,
    /// A URL could not be parsed.
    InvalidUrl,
}

/// Errors that can occur when using the A2A protocol.
#[derive(Debug, Error)]
pub enum A2AError {
    /// HTTP transport error (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server returned a non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },

    /// JSON deserialization error, or a structurally invalid envelope.
    #[error("decode error: {0}")]
    Decode(String),

    /// The remote agent returned a JSON-RPC error.
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The response id does not match the id that was sent.
    #[error("{what} mismatch: expected {expected}, got {actual}")]
    IdMismatch {
        what: &'static str,
        expected: String,
        actual: String,
    },

    /// The agent card is invalid or missing required fields.
    #[error("invalid agent card: {field}: {reason}")]
    InvalidAgentCard { field: String, reason: String },

    /// No agent card is published at the discovery URL.
    #[error("agent card not found (404) at {0}")]
    CardNotFound(String),

    /// The discovery endpoint refused access (401/403).
    #[error("access denied ({status}) to {url}")]
    AccessDenied { status: u16, url: String },

    /// Discovery gave up after the configured number of attempts.
    #[error("failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<A2AError>,
    },

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<serde_json::Error> for A2AError {
    fn from(e: serde_json::Error) -> Self {
        A2AError::Decode(e.to_string())
    }
}

impl A2AError {
    pub(crate) fn invalid_card(field: impl Into<String>, reason: impl Into<String>) -> Self {
        A2AError::InvalidAgentCard {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            A2AError::Transport(e) if e.is_decode() => ErrorKind::Decode,
            A2AError::Transport(_) => ErrorKind::Network,
            A2AError::HttpStatus { .. }
            | A2AError::CardNotFound(_)
            | A2AError::AccessDenied { .. } => ErrorKind::HttpStatus,
            A2AError::Decode(_) => ErrorKind::Decode,
            A2AError::JsonRpc { .. } => ErrorKind::Protocol,
            A2AError::IdMismatch { .. } => ErrorKind::IdMismatch,
            A2AError::InvalidAgentCard { .. } => ErrorKind::Validation,
            A2AError::RetriesExhausted { source, .. } => source.kind(),
            A2AError::Cancelled => ErrorKind::Cancelled,
            A2AError::InvalidUrl(_) => ErrorKind::InvalidUrl,
        }
    }

    /// Whether the failure is transient: network errors and 5xx responses.
    ///
    /// Discovery retries these internally; the task client never does.
    pub fn is_retryable(&self) -> bool {
        match self {
            A2AError::Transport(e) => !e.is_decode() && !e.is_builder(),
            A2AError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            A2AError::HttpStatus { status, .. } | A2AError::AccessDenied { status, .. } => {
                Some(*status)
            }
            A2AError::CardNotFound(_) => Some(404),
            A2AError::Transport(e) => e.status().map(|s| s.as_u16()),
            A2AError::RetriesExhausted { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// A2A Result type alias.
pub type A2AResult<T> = Result<T, A2AError>;
