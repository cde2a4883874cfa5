//! Wire vocabulary shared by the transcription worker and its controllers.
//!
//! Requests and responses travel as JSON objects. [`envelope`] holds the
//! structures exactly as serialised; [`TaskRequest`] and [`TaskResult`] are
//! the typed values the worker operates on.

pub mod envelope;
mod status;
mod task;

use thiserror::Error;

pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use status::StatusCode;
pub use task::{TaskRequest, TaskResult};

/// Errors raised while converting between envelopes and typed values.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The request did not name a source directory.
    #[error("request {id:?} has a missing or blank audio_dir_path")]
    MissingSourceDir {
        /// Correlation id of the request.
        id: String,
    },
    /// The request payload was not valid base64.
    #[error("request {id:?} carries an invalid base64 payload: {source}")]
    InvalidPayload {
        /// Correlation id of the request.
        id: String,
        /// Underlying base64 failure.
        #[source]
        source: base64::DecodeError,
    },
    /// A response carried a status code outside the known mapping.
    #[error("unknown status code {0}")]
    UnknownStatusCode(i32),
}

impl EnvelopeError {
    /// Correlation id of the offending request, when one was supplied.
    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::MissingSourceDir { id } | Self::InvalidPayload { id, .. } => {
                Some(id.as_str()).filter(|id| !id.is_empty())
            }
            Self::UnknownStatusCode(_) => None,
        }
    }
}
