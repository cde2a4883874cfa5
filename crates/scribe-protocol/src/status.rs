//! Per-task status codes.

use serde::{Deserialize, Serialize};

use crate::EnvelopeError;

/// Outcome of a single task as reported in the `code` field of a response.
///
/// The integer mapping is part of the wire contract shared with controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum StatusCode {
    /// Every attempted source produced an artefact.
    Success,
    /// Some, but not all, sources produced an artefact.
    PartialSuccess,
    /// No source produced an artefact, or the backend failed.
    Failure,
    /// The request was malformed or named an unusable directory.
    BadInput,
}

impl StatusCode {
    /// Integer carried on the wire.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::PartialSuccess => 1,
            Self::Failure => 2,
            Self::BadInput => 3,
        }
    }

    /// Compares what a backend attempted with what it produced.
    ///
    /// Producing at least as many artefacts as attempted sources is a
    /// success, including the degenerate `0/0` case. Producing nothing for a
    /// non-empty input is a failure; anything in between is partial.
    #[must_use]
    pub const fn from_counts(attempted: usize, produced: usize) -> Self {
        if produced >= attempted {
            Self::Success
        } else if produced == 0 {
            Self::Failure
        } else {
            Self::PartialSuccess
        }
    }

    /// Whether a task with this code counts towards a successful session.
    #[must_use]
    pub const fn is_delivered_success(self) -> bool {
        matches!(self, Self::Success | Self::PartialSuccess)
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for StatusCode {
    type Error = EnvelopeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::PartialSuccess),
            2 => Ok(Self::Failure),
            3 => Ok(Self::BadInput),
            other => Err(EnvelopeError::UnknownStatusCode(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3, 3, StatusCode::Success)]
    #[case(0, 0, StatusCode::Success)]
    #[case(3, 0, StatusCode::Failure)]
    #[case(3, 1, StatusCode::PartialSuccess)]
    #[case(3, 2, StatusCode::PartialSuccess)]
    #[case(1, 2, StatusCode::Success)]
    fn classifies_attempted_against_produced(
        #[case] attempted: usize,
        #[case] produced: usize,
        #[case] expected: StatusCode,
    ) {
        assert_eq!(StatusCode::from_counts(attempted, produced), expected);
    }

    #[test]
    fn exhaustive_small_grid_follows_rule() {
        for attempted in 1..=6_usize {
            for produced in 0..=attempted {
                let code = StatusCode::from_counts(attempted, produced);
                assert_eq!(code == StatusCode::Success, produced == attempted);
                assert_eq!(code == StatusCode::Failure, produced == 0);
            }
        }
    }

    #[test]
    fn serialises_as_integer() {
        let json = serde_json::to_string(&StatusCode::PartialSuccess).expect("serialise");
        assert_eq!(json, "1");
    }

    #[test]
    fn rejects_unknown_integer() {
        let result = serde_json::from_str::<StatusCode>("42");
        assert!(result.is_err());
    }
}
