/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed channel errors shared across channel helpers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid channel input: {message}")]
    InvalidInput { message: String },

    /// A media file could not be read.
    #[error("media unavailable: {path}: {source}")]
    MediaUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn media_unavailable(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        Self::MediaUnavailable {
            path: path.to_string(),
            source,
        }
    }
}
