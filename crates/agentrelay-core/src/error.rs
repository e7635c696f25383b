use thiserror::Error;

/// A convenience `Result` alias using [`RelayError`].
pub type RelayResult<T> = Result<T, RelayError>;

/// Top-level error type for the relay.
///
/// The delivery components themselves report failures as boolean outcomes;
/// this type is used at the sink/encoder seam and in configuration handling.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Invalid or unreadable configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// The delivery channel is closed or broken.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An event could not be turned into a wire payload.
    #[error("Encode error: {0}")]
    Encode(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Returns true for failures of the delivery channel itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, RelayError::Transport(_) | RelayError::Io(_))
    }
}
