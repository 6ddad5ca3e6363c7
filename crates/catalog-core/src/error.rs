use std::fmt;

use thiserror::Error;

/// Which relevance signal failed during a fused search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Semantic,
    Lexical,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Semantic => f.write_str("semantic"),
            Signal::Lexical => f.write_str("lexical"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// No index generation has been published yet.
    #[error("Index not initialized: no generation has been published")]
    NotInitialized,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// One scorer failed; fusion degrades to the remaining signal.
    #[error("Signal unavailable ({signal}): {reason}")]
    SignalUnavailable { signal: Signal, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Error::InvalidRequest(msg.into())
    }

    pub fn signal(signal: Signal, err: &anyhow::Error) -> Self {
        Error::SignalUnavailable { signal, reason: format!("{err:#}") }
    }
}
