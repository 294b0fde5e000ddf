//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for the relaymesh consumer protocol.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no providers paired for endpoint {0}")]
    NoProvidersPaired(String),

    #[error("insufficient providers: wanted {wanted}, available {available}")]
    InsufficientProviders { wanted: usize, available: usize },

    #[error("all providers failed for endpoint {0}")]
    AllProvidersFailed(String),

    #[error("provider call timed out after {0}ms")]
    CallTimeout(u64),

    #[error("invalid relay proof from provider {0}")]
    InvalidRelayProof(String),

    #[error("session {0} is not outstanding")]
    UnknownSession(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}
