use thiserror::Error;

use crate::transport::TransportState;

/// Result type alias for waveslab operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Fetching or decoding an asset failed. The widget stays idle.
    #[error("Failed to load {url}: {reason}")]
    LoadFailure { url: String, reason: String },

    #[error("Decode error: {0}")]
    Decode(String),

    /// Operation attempted in a state that does not allow it.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: TransportState,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Out-of-range construction parameter.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The audio output refused a command.
    #[error("Audio output error: {0}")]
    Output(String),
}

impl Error {
    pub(crate) fn load_failure(url: &str, reason: impl ToString) -> Self {
        Error::LoadFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
