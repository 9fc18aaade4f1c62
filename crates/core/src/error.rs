/// Failures while talking to the directory store.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory store not configured: {0}")]
    NotConfigured(String),
    #[error("directory store request failed: {0}")]
    Request(reqwest::Error),
    #[error("directory store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode directory store response: {0}")]
    Decode(reqwest::Error),
    #[error("invalid directory store URL: {0}")]
    InvalidUrl(String),
}

pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Failures while forwarding an event to the webhook sink.
///
/// A sink that answers with a non-2xx status is not an error; see `SinkResponse`.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to call webhook sink: {0}")]
    Unreachable(reqwest::Error),
    #[error("failed to read webhook sink response: {0}")]
    Body(reqwest::Error),
}

/// Failures of the start-call operation, one variant per caller-facing outcome.
#[derive(Debug, thiserror::Error)]
pub enum StartCallError {
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

pub type StartCallResult<T> = std::result::Result<T, StartCallError>;

/// Invalid startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
