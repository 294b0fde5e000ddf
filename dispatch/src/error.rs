use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("endpoint {0} is not registered")]
    UnknownEndpoint(String),

    #[error("no providers available for endpoint {0}")]
    InsufficientProviders(String),

    #[error("all providers failed for endpoint {0}")]
    AllProvidersFailed(String),

    #[error("config error: {0}")]
    Config(String),
}
