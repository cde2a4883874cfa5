//! JSON envelopes exactly as they appear on the wire.

use serde::{Deserialize, Serialize};

/// Request envelope sent by a controller.
///
/// ```json
/// {"audio_dir_path": "/uploads/song", "data": "<base64>", "id": "t1"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestEnvelope {
    /// Directory holding the source audio; artefacts are written next to it.
    pub audio_dir_path: String,
    /// Optional base64 payload.
    #[serde(default)]
    pub data: String,
    /// Caller-supplied correlation id.
    #[serde(default)]
    pub id: String,
}

/// Response envelope returned by the worker.
///
/// Field order is the order controllers have always seen:
///
/// ```json
/// {"code":0,"fnames":["song_basic_pitch.mid"],"data":"","id":"t1"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Integer status code.
    pub code: i32,
    /// Base names of the produced artefacts, in production order.
    pub fnames: Vec<String>,
    /// Reserved for a binary payload; always empty today.
    #[serde(default)]
    pub data: String,
    /// Correlation id copied from the request.
    #[serde(default)]
    pub id: String,
}
