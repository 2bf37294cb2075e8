//! Error types for snapshot capture

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening a render session or capturing from it
#[derive(Error, Debug)]
pub enum Error {
    /// The render engine could not start or the document could not be loaded
    #[error("Render initialization failed: {0}")]
    RenderInitError(String),

    /// The viewport change was rejected or did not take effect
    #[error("Viewport resize failed: {0}")]
    ResizeError(String),

    /// The engine could not produce a snapshot of the current viewport
    #[error("Snapshot capture failed: {0}")]
    CaptureError(String),

    /// The destination was not writable
    #[error("Failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A resolution, destination list or document reference was rejected
    #[error("Invalid capture job: {0}")]
    InvalidJob(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Re-tag an engine error raised while starting or loading.
    pub(crate) fn into_render_init(self) -> Self {
        match self {
            Error::RenderInitError(_) => self,
            other => Error::RenderInitError(other.to_string()),
        }
    }

    /// Re-tag an engine error raised while changing the viewport.
    pub(crate) fn into_resize(self) -> Self {
        match self {
            Error::ResizeError(_) => self,
            other => Error::ResizeError(other.to_string()),
        }
    }

    pub(crate) fn into_capture(self) -> Self {
        match self {
            Error::CaptureError(_) => self,
            other => Error::CaptureError(other.to_string()),
        }
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}
