//! Errors for registry, configuration and credential handling.

use thiserror::Error;

/// Errors raised by `lantern-core`.
#[derive(Debug, Error)]
pub enum LanternError {
    /// No agent is registered under the id.
    #[error("agent not found: {0}")]
    NotFound(String),

    /// The agent record cannot be stored.
    #[error("invalid agent: {0}")]
    InvalidAgent(String),

    /// The registry already holds its maximum number of agents.
    #[error("registry is full ({max} agents)")]
    RegistryFull { max: usize },

    /// Configuration could not be parsed or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Credentials are incomplete or unsupported.
    #[error("authentication error: {0}")]
    Auth(String),

    #[error(transparent)]
    A2A(#[from] a2a_lantern::A2AError),
}

impl From<toml::de::Error> for LanternError {
    fn from(e: toml::de::Error) -> Self {
        LanternError::Config(e.to_string())
    }
}

pub type LanternResult<T> = Result<T, LanternError>;
