/// Convenience result type used across parchment.
pub type ParchmentResult<T> = Result<T, ParchmentError>;

/// Top-level error taxonomy.
///
/// Only setup can fail (config, asset IO, the CLI). Composing a frame and pacing the loop
/// degrade silently instead of erroring.
#[derive(thiserror::Error, Debug)]
pub enum ParchmentError {
    /// Invalid user-provided configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Asset could not be read or decoded.
    #[error("asset error: {0}")]
    Asset(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ParchmentError {
    /// Build a [`ParchmentError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ParchmentError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`ParchmentError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
