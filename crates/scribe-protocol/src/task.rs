//! Typed task values and their conversions to and from the wire envelopes.

use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::{EnvelopeError, StatusCode};

/// One unit of work: transcribe the contents of `source_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    /// Opaque correlation id; empty when the caller sent none.
    pub id: String,
    /// Directory of source files, also the artefact destination.
    pub source_dir: PathBuf,
    /// Decoded binary payload, empty when absent.
    pub payload: Vec<u8>,
}

impl TaskRequest {
    /// Builds a request without a payload.
    #[must_use]
    pub fn new(id: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            source_dir: source_dir.into(),
            payload: Vec::new(),
        }
    }

    /// Encodes the request as a wire envelope.
    #[must_use]
    pub fn to_envelope(&self) -> RequestEnvelope {
        RequestEnvelope {
            audio_dir_path: self.source_dir.to_string_lossy().into_owned(),
            data: STANDARD.encode(&self.payload),
            id: self.id.clone(),
        }
    }
}

impl TryFrom<RequestEnvelope> for TaskRequest {
    type Error = EnvelopeError;

    fn try_from(envelope: RequestEnvelope) -> Result<Self, Self::Error> {
        if envelope.audio_dir_path.trim().is_empty() {
            return Err(EnvelopeError::MissingSourceDir { id: envelope.id });
        }
        let payload = STANDARD
            .decode(envelope.data.trim())
            .map_err(|source| EnvelopeError::InvalidPayload {
                id: envelope.id.clone(),
                source,
            })?;
        Ok(Self {
            id: envelope.id,
            source_dir: PathBuf::from(envelope.audio_dir_path),
            payload,
        })
    }
}

/// The structured answer to one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Correlation id copied from the request.
    pub id: String,
    /// Task status.
    pub code: StatusCode,
    /// Base names of the artefacts the backend produced.
    pub artifact_names: Vec<String>,
}

impl TaskResult {
    /// Builds a result.
    #[must_use]
    pub fn new(id: impl Into<String>, code: StatusCode, artifact_names: Vec<String>) -> Self {
        Self {
            id: id.into(),
            code,
            artifact_names,
        }
    }

    /// Builds a result that carries no artefacts, used for rejected tasks.
    #[must_use]
    pub fn rejected(id: impl Into<String>, code: StatusCode) -> Self {
        Self::new(id, code, Vec::new())
    }

    /// Encodes the result as a wire envelope. The reserved `data` field is
    /// always empty.
    #[must_use]
    pub fn to_envelope(&self) -> ResponseEnvelope {
        ResponseEnvelope {
            code: self.code.code(),
            fnames: self.artifact_names.clone(),
            data: String::new(),
            id: self.id.clone(),
        }
    }
}

impl TryFrom<ResponseEnvelope> for TaskResult {
    type Error = EnvelopeError;

    fn try_from(envelope: ResponseEnvelope) -> Result<Self, Self::Error> {
        Ok(Self {
            code: StatusCode::try_from(envelope.code)?,
            artifact_names: envelope.fnames,
            id: envelope.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(path: &str, data: &str) -> RequestEnvelope {
        RequestEnvelope {
            audio_dir_path: path.to_owned(),
            data: data.to_owned(),
            id: "t1".to_owned(),
        }
    }

    #[test]
    fn decodes_base64_payload() {
        let request = TaskRequest::try_from(envelope("/tmp/audio", "UklGRg=="))
            .expect("valid envelope");
        assert_eq!(request.payload, b"RIFF");
        assert_eq!(request.source_dir, PathBuf::from("/tmp/audio"));
    }

    #[test]
    fn missing_payload_decodes_to_empty() {
        let request = TaskRequest::try_from(envelope("/tmp/audio", "")).expect("valid envelope");
        assert!(request.payload.is_empty());
    }

    #[test]
    fn blank_path_is_rejected() {
        let error = TaskRequest::try_from(envelope("   ", "")).expect_err("blank path");
        assert!(matches!(error, EnvelopeError::MissingSourceDir { ref id } if id == "t1"));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let error = TaskRequest::try_from(envelope("/tmp/audio", "@@not base64@@"))
            .expect_err("bad payload");
        assert!(matches!(error, EnvelopeError::InvalidPayload { .. }));
    }

    #[test]
    fn result_envelope_always_has_empty_data() {
        let result = TaskResult::new("t9", StatusCode::Success, vec!["a.mid".to_owned()]);
        assert_eq!(result.to_envelope().data, "");
    }

    #[test]
    fn result_survives_envelope_round_trip() {
        let result = TaskResult::new(
            "job-7",
            StatusCode::PartialSuccess,
            vec!["b.mid".to_owned(), "a.mid".to_owned()],
        );
        let json = serde_json::to_string(&result.to_envelope()).expect("serialise");
        let parsed: ResponseEnvelope = serde_json::from_str(&json).expect("parse");
        assert_eq!(TaskResult::try_from(parsed).expect("convert"), result);
    }
}
