//! Error types for the audio-only session

/// Result type alias for mode controller operations
pub type Result<T> = std::result::Result<T, ModeError>;

/// Errors raised by the mode controller
#[derive(Debug, thiserror::Error)]
pub enum ModeError {
    /// The player region holds no media element to mutate
    #[error("No media element in the player region")]
    MediaElementMissing,

    /// The durable flag store could not be read or written
    #[error("Flag store error: {0}")]
    Store(String),
}

impl ModeError {
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }
}

/// Failure of the audio source pipeline
///
/// Cloneable so that one memoized outcome can be handed to every reader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// The platform answered with a failure status or incomplete data
    #[error("Platform refused resolution: {0}")]
    Api(String),

    /// The request never produced a usable answer
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The background resolution task died before finishing
    #[error("Resolution task aborted: {0}")]
    Aborted(String),
}

impl From<pmobilibili::Error> for ResolutionError {
    fn from(err: pmobilibili::Error) -> Self {
        if err.is_api_failure() {
            Self::Api(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// What a caller observes when issuing a request through the gate
#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    /// The gate vetoed the request; it never reached the network
    #[error("Request rejected by gate: {url}")]
    Rejected { url: String },

    /// The request was forwarded and failed in transport
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl InterceptError {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
