//! Backend selection key.
//!
//! Backends are chosen by an enumerated key rather than by loading code named
//! in configuration. The worker crate maps each key onto a concrete
//! implementation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transcription backends the worker knows how to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Spotify's `basic-pitch` command line tool.
    #[default]
    BasicPitch,
    /// An arbitrary command line described by `backend_command`.
    Command,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BasicPitch => "basic-pitch",
            Self::Command => "command",
        };
        formatter.write_str(label)
    }
}

/// Error returned when parsing a backend kind fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported backend kind: {0}")]
pub struct BackendKindParseError(String);

impl BackendKindParseError {
    /// Creates a parse error describing the unsupported value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the offending value that could not be parsed.
    #[must_use]
    pub fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for BackendKind {
    type Err = BackendKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic-pitch" | "basic_pitch" => Ok(Self::BasicPitch),
            "command" => Ok(Self::Command),
            other => Err(BackendKindParseError::new(other)),
        }
    }
}
