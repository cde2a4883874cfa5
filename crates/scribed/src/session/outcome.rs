use std::fmt;
use std::process::ExitCode;

/// Aggregate result of a whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every task succeeded.
    Success,
    /// Some tasks succeeded and some failed.
    PartialSuccess,
    /// No task succeeded, or there were no tasks.
    Failure,
}

impl SessionOutcome {
    /// Folds per-task success flags into an outcome.
    #[must_use]
    pub fn from_results(results: &[bool]) -> Self {
        let succeeded = results.iter().filter(|ok| **ok).count();
        if succeeded == 0 {
            Self::Failure
        } else if succeeded == results.len() {
            Self::Success
        } else {
            Self::PartialSuccess
        }
    }

    /// Process exit status for this outcome.
    #[must_use]
    pub const fn exit_status(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::PartialSuccess => 1,
            Self::Failure => 2,
        }
    }

    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess => "partial_success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<SessionOutcome> for ExitCode {
    fn from(outcome: SessionOutcome) -> Self {
        Self::from(outcome.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[true, true], SessionOutcome::Success)]
    #[case(&[true, false], SessionOutcome::PartialSuccess)]
    #[case(&[false, true, false], SessionOutcome::PartialSuccess)]
    #[case(&[false, false], SessionOutcome::Failure)]
    #[case(&[], SessionOutcome::Failure)]
    fn folds_task_results(#[case] results: &[bool], #[case] expected: SessionOutcome) {
        assert_eq!(SessionOutcome::from_results(results), expected);
    }

    #[rstest]
    #[case(SessionOutcome::Success, 0)]
    #[case(SessionOutcome::PartialSuccess, 1)]
    #[case(SessionOutcome::Failure, 2)]
    fn maps_to_exit_status(#[case] outcome: SessionOutcome, #[case] status: u8) {
        assert_eq!(outcome.exit_status(), status);
    }
}
