//! Render engine errors.

/// Error returned by a [`RenderEngine`](crate::RenderEngine).
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The engine ran but reported a failure. The message is passed through
    /// unchanged.
    #[error("render failed: {0}")]
    RenderFailure(String),

    /// The engine could not be started or talked to.
    #[error("cannot run render command {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
