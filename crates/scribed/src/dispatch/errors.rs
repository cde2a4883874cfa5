//! Error taxonomy for a single task.
//!
//! Every variant is confined to the task that raised it; none of them ends a
//! session. Variants that map to a status code are still answered with a
//! result so the controller learns what went wrong.

use std::io;
use std::path::PathBuf;

use scribe_protocol::StatusCode;
use thiserror::Error;

use crate::backend::BackendError;
use crate::codec::DecodeError;
use crate::transport::FrameError;

/// Errors surfaced while serving one task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The frame could not be read.
    #[error("failed to read request: {source}")]
    Frame {
        /// Underlying framing error.
        #[source]
        source: FrameError,
    },
    /// The frame was not a valid request.
    #[error("invalid request: {source}")]
    Decode {
        /// Correlation id, when one could be recovered.
        id: Option<String>,
        /// Underlying decode error.
        #[source]
        source: DecodeError,
    },
    /// The request named a path that is not a usable directory.
    #[error("source directory '{}' is unusable: {source}", path.display())]
    InvalidTarget {
        /// Correlation id of the request.
        id: String,
        /// Offending path.
        path: PathBuf,
        /// Why the directory cannot be used.
        #[source]
        source: io::Error,
    },
    /// The backend aborted the run.
    #[error("backend failed: {source}")]
    Backend {
        /// Correlation id of the request.
        id: String,
        /// Underlying backend error.
        #[source]
        source: BackendError,
    },
    /// The result could not be serialised.
    #[error("failed to encode result: {source}")]
    Encode {
        /// Correlation id of the request.
        id: String,
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
    /// The result could not be written back.
    #[error("failed to send result: {source}")]
    Send {
        /// Correlation id of the request.
        id: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl From<FrameError> for TaskError {
    fn from(source: FrameError) -> Self {
        Self::Frame { source }
    }
}

impl TaskError {
    /// Status code to answer with, or `None` when no answer should be sent.
    ///
    /// Malformed requests and unusable directories are bad input; backend
    /// aborts are failures. Framing and transport faults get no answer.
    #[must_use]
    pub const fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Decode { .. } | Self::InvalidTarget { .. } => Some(StatusCode::BadInput),
            Self::Backend { .. } => Some(StatusCode::Failure),
            Self::Frame { .. } | Self::Encode { .. } | Self::Send { .. } => None,
        }
    }

    /// Correlation id of the affected task, when known and non-empty.
    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        let id = match self {
            Self::Frame { .. } => None,
            Self::Decode { id, .. } => id.as_deref(),
            Self::InvalidTarget { id, .. }
            | Self::Backend { id, .. }
            | Self::Encode { id, .. }
            | Self::Send { id, .. } => Some(id.as_str()),
        };
        id.filter(|id| !id.is_empty())
    }
}
