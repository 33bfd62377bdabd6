/// Convenience result type used across trailfx.
pub type TrailResult<T> = Result<T, TrailError>;

/// Error taxonomy for the edges of the crate.
///
/// The trail core itself never fails: empty image lists and missing render
/// targets degrade to "no visual effect". Errors come from configuration,
/// session parsing, asset decoding and rendering.
#[derive(thiserror::Error, Debug)]
pub enum TrailError {
    /// Invalid user-provided configuration or session data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while compositing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrailError {
    /// Build a [`TrailError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TrailError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

impl From<serde_json::Error> for TrailError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
