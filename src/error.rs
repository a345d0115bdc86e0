use thiserror::Error;

/// Errors surfaced to the code that sets up or decorates functions.
///
/// Calls to a wrapped function never produce these: capture problems are
/// logged and absorbed.
#[derive(Debug, Error)]
pub enum BlackboxError {
    #[error(
        "Blackbox not initialized. Call blackbox::init(config) or blackbox::init_with_sink(sink) first."
    )]
    NotInitialized,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport setup failed: {0}")]
    Transport(#[from] DeliveryError),

    #[error("Could not start delivery worker: {0}")]
    Worker(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Project key must not be empty")]
    MissingProjectKey,

    #[error("API server must not be empty")]
    MissingApiServer,

    #[error("Queue capacity must be greater than 0")]
    ZeroQueueCapacity,

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: String, value: String },

    #[error("Blackbox is already initialized")]
    AlreadyInitialized,
}

/// Arguments could not be mapped onto the declared parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Takes {expected} positional arguments but {got} were given")]
    TooManyPositional { expected: usize, got: usize },

    #[error("Got an unexpected keyword argument '{0}'")]
    UnknownKeyword(String),

    #[error("Got multiple values for argument '{0}'")]
    DuplicateArgument(String),

    #[error("Missing required argument '{0}'")]
    MissingArgument(String),
}

/// A capture could not be handed to its destination.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[cfg(feature = "http")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Delivery queue is full")]
    QueueFull,

    #[error("Delivery queue is closed")]
    QueueClosed,
}
