use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Channel the worker receives tasks on.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TransportMode {
    /// TCP listener; one task per accepted connection, with keep-alive markers.
    Socket,
    /// One JSON task per line on stdin, wrapped results on stdout.
    #[default]
    Stdio,
}

/// How a backend should treat the instruments in a recording.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum InstrumentsMode {
    /// The recording holds one instrument.
    Single,
    /// The recording may hold several instruments.
    #[default]
    Many,
}

impl InstrumentsMode {
    /// Numeric form handed to backend command lines.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Many => 2,
        }
    }
}

/// Errors encountered while parsing one of the mode enums from text.
pub type ModeParseError = strum::ParseError;
