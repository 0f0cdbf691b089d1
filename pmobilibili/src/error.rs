//! Error types for the Bilibili client

/// Result type alias for Bilibili operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while turning a page location into a [`MediaLocator`](crate::MediaLocator)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    /// The location could not be parsed as a URL
    #[error("Invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No path segment carries a media identifier
    #[error("No media identifier in path: {0}")]
    MissingMediaId(String),
}

/// Errors that can occur when using the Bilibili client
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success HTTP status
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The page location holds no usable media identifier
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// API envelope carried a non-zero status code
    #[error("API error {code}: {message}")]
    ApiError { code: i64, message: String },

    /// Envelope reported success but the expected payload is absent
    #[error("Missing data in API response: {0}")]
    MissingData(String),

    /// Requested sub-part does not exist
    #[error("Part {requested} out of range ({available} parts)")]
    PartOutOfRange { requested: u32, available: usize },

    /// The playback manifest lists no audio track
    #[error("No audio track for {media_id} (stream {stream_id})")]
    NoAudioTrack { media_id: String, stream_id: String },

    /// Configuration error (from pmoconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a missing-data error
    pub fn missing_data(what: impl Into<String>) -> Self {
        Self::MissingData(what.into())
    }

    /// Whether the failure came from the platform rather than the transport
    pub fn is_api_failure(&self) -> bool {
        matches!(
            self,
            Self::ApiError { .. }
                | Self::MissingData(_)
                | Self::PartOutOfRange { .. }
                | Self::NoAudioTrack { .. }
        )
    }
}
