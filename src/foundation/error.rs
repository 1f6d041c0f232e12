/// Convenience result type used across bezelkit.
pub type BezelResult<T> = Result<T, BezelError>;

/// Top-level error taxonomy used by the compositing engine.
///
/// Tolerant-skip conditions (malformed catalog rows, zero-area GIF patches) never surface here.
#[derive(thiserror::Error, Debug)]
pub enum BezelError {
    /// The platform cannot perform the requested operation (no capture primitive, no encoder).
    #[error("capability error: {0}")]
    Capability(String),

    /// Invalid input data: empty GIFs, bezels without a transparent screen, bad geometry.
    #[error("data error: {0}")]
    Data(String),

    /// Transient load, playback or recording failure.
    #[error("io error: {0}")]
    Io(String),

    /// The operation was cancelled through its abort signal.
    #[error("operation aborted")]
    Aborted,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BezelError {
    /// Build a [`BezelError::Capability`] value.
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }

    /// Build a [`BezelError::Data`] value.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Build a [`BezelError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`BezelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors the caller may reasonably let the user re-attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Aborted)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
