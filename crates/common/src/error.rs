//! Error types shared across Poise crates.

use std::path::PathBuf;

/// Top-level error type for Poise operations.
#[derive(Debug, thiserror::Error)]
pub enum PoiseError {
    /// The container cannot be opened or has no readable video structure.
    /// Fatal for an analysis run.
    #[error("Unreadable media: {message}")]
    UnreadableMedia { message: String },

    /// A single frame could not be decoded. The run skips the index.
    #[error("Frame {index} could not be decoded: {message}")]
    FrameDecode { index: u64, message: String },

    /// The emotion classifier failed on a single frame. The run skips the index.
    #[error("Emotion classification failed on frame {index}: {message}")]
    Classification { index: u64, message: String },

    #[error("Annotation track error: {message}")]
    Annotation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The caller abandoned the run before it finished.
    #[error("Analysis cancelled after {indices_visited} sampled frames")]
    Cancelled { indices_visited: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PoiseError.
pub type PoiseResult<T> = Result<T, PoiseError>;

impl PoiseError {
    pub fn unreadable_media(msg: impl Into<String>) -> Self {
        Self::UnreadableMedia {
            message: msg.into(),
        }
    }

    pub fn frame_decode(index: u64, msg: impl Into<String>) -> Self {
        Self::FrameDecode {
            index,
            message: msg.into(),
        }
    }

    pub fn classification(index: u64, msg: impl Into<String>) -> Self {
        Self::Classification {
            index,
            message: msg.into(),
        }
    }

    pub fn annotation(msg: impl Into<String>) -> Self {
        Self::Annotation {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn cancelled(indices_visited: u64) -> Self {
        Self::Cancelled { indices_visited }
    }

    /// Per-frame faults are absorbed by the pipeline; everything else aborts a run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FrameDecode { .. } | Self::Classification { .. }
        )
    }
}
