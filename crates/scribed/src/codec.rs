//! Conversion between raw frames and typed task values.

use std::fs;
use std::io;
use std::path::Path;

use scribe_config::{Config, TransportMode};
use scribe_protocol::{EnvelopeError, RequestEnvelope, ResponseEnvelope, TaskRequest, TaskResult};
use thiserror::Error;

use crate::dispatch::TaskError;

/// Reasons a request frame could not be turned into a [`TaskRequest`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame held nothing but whitespace.
    #[error("request frame is empty")]
    Empty,
    /// The frame was not a well-formed request object.
    #[error("malformed request: {0}")]
    Json(#[from] serde_json::Error),
    /// The request object carried unusable values.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// How encoded results are delimited on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Framing {
    /// Bare JSON; the connection close ends the frame.
    Raw,
    /// `<prefix><json><postfix>\n` so results can be told apart from other
    /// output on the same stream.
    Line {
        /// Marker opening a result.
        prefix: String,
        /// Marker closing a result.
        postfix: String,
    },
}

/// Decodes requests and encodes results for one transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCodec {
    framing: Framing,
}

impl TaskCodec {
    /// Builds a codec with explicit framing.
    #[must_use]
    pub const fn new(framing: Framing) -> Self {
        Self { framing }
    }

    /// Codec matching the configured transport.
    #[must_use]
    pub fn for_transport(config: &Config) -> Self {
        match config.transport {
            TransportMode::Socket => Self::new(Framing::Raw),
            TransportMode::Stdio => Self::new(Framing::Line {
                prefix: config.data_prefix.clone(),
                postfix: config.message_postfix.clone(),
            }),
        }
    }

    /// Parses and validates one request frame.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Decode`] for empty or malformed frames, unknown
    /// fields, a missing path or a bad payload, and
    /// [`TaskError::InvalidTarget`] when the path is not a readable
    /// directory.
    pub fn decode(&self, raw: &[u8]) -> Result<TaskRequest, TaskError> {
        let request = parse_request(raw).map_err(|source| TaskError::Decode {
            id: salvage_id(raw, &source),
            source,
        })?;
        validate_source_dir(&request.source_dir).map_err(|source| TaskError::InvalidTarget {
            id: request.id.clone(),
            path: request.source_dir.clone(),
            source,
        })?;
        Ok(request)
    }

    /// Serialises a result, applying this codec's framing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Encode`] if serialisation fails.
    pub fn encode(&self, result: &TaskResult) -> Result<Vec<u8>, TaskError> {
        let json = serde_json::to_vec(&result.to_envelope()).map_err(|source| {
            TaskError::Encode {
                id: result.id.clone(),
                source,
            }
        })?;
        Ok(match &self.framing {
            Framing::Raw => json,
            Framing::Line { prefix, postfix } => {
                let mut framed =
                    Vec::with_capacity(prefix.len() + json.len() + postfix.len() + 1);
                framed.extend_from_slice(prefix.as_bytes());
                framed.extend_from_slice(&json);
                framed.extend_from_slice(postfix.as_bytes());
                framed.push(b'\n');
                framed
            }
        })
    }

    /// Parses an encoded result, stripping line markers when present.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the frame is not a valid response.
    pub fn decode_result(&self, raw: &[u8]) -> Result<TaskResult, DecodeError> {
        let mut body = raw.trim_ascii();
        if let Framing::Line { prefix, postfix } = &self.framing {
            body = body.strip_prefix(prefix.as_bytes()).unwrap_or(body);
            body = body.strip_suffix(postfix.as_bytes()).unwrap_or(body);
        }
        if body.is_empty() {
            return Err(DecodeError::Empty);
        }
        let envelope: ResponseEnvelope = serde_json::from_slice(body)?;
        Ok(TaskResult::try_from(envelope)?)
    }
}

/// Checks that `path` names an existing, listable directory.
///
/// # Errors
///
/// Returns the IO error describing why the directory is unusable.
pub fn validate_source_dir(path: &Path) -> io::Result<()> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            "source path is not a directory",
        ));
    }
    fs::read_dir(path).map(drop)
}

fn parse_request(raw: &[u8]) -> Result<TaskRequest, DecodeError> {
    let body = raw.trim_ascii();
    if body.is_empty() {
        return Err(DecodeError::Empty);
    }
    let envelope: RequestEnvelope = serde_json::from_slice(body)?;
    Ok(TaskRequest::try_from(envelope)?)
}

/// Recovers the correlation id from a rejected frame so the rejection can
/// still be attributed.
fn salvage_id(raw: &[u8], error: &DecodeError) -> Option<String> {
    if let DecodeError::Envelope(envelope) = error {
        return envelope.task_id().map(str::to_owned);
    }
    let value: serde_json::Value = serde_json::from_slice(raw.trim_ascii()).ok()?;
    value
        .get("id")
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}
