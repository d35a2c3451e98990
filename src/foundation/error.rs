/// Result alias used across the crate.
pub type ThumbResult<T> = Result<T, ThumbError>;

/// Errors surfaced by rendering and asset preparation.
///
/// Missing or corrupt catalog assets never reach this type: the resource cache logs them and
/// treats them as absent.
#[derive(thiserror::Error, Debug)]
pub enum ThumbError {
    /// A caller-supplied value cannot be used (e.g. zero-sized canvas).
    #[error("validation error: {0}")]
    Validation(String),

    /// Encoded bytes could not be decoded into an image.
    #[error("decode error: {0}")]
    Decode(String),

    /// A pipeline stage failed; no partial canvas is produced.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else, with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ThumbError {
    /// Build a [`ThumbError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ThumbError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ThumbError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
