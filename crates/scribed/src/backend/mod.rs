//! Transcription backends.
//!
//! A backend turns every source file in a directory into an artefact next to
//! it and reports how many sources it attempted and which artefacts it
//! produced. Backends are chosen by [`BackendKind`] through a
//! [`BackendProvider`] and built once per process during bootstrap.

mod command;

use std::io;
use std::path::{Path, PathBuf};

use scribe_config::Config;
use scribe_protocol::StatusCode;
use thiserror::Error;

pub use self::command::{CommandBackend, CommandTemplate, TemplateError};
pub use scribe_config::{BackendKind, BackendKindParseError};

/// Transcribes a directory of source files.
///
/// `run` takes `&mut self`, so one backend never serves two tasks at once.
pub trait Backend: Send {
    /// Transcribes every eligible file in `source_dir`, writing artefacts
    /// into the same directory.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the run cannot proceed at all. Failures
    /// confined to a single file are skipped and only lower the produced
    /// count.
    fn run(&mut self, source_dir: &Path) -> Result<BackendReport, BackendError>;
}

impl<B> Backend for Box<B>
where
    B: Backend + ?Sized,
{
    fn run(&mut self, source_dir: &Path) -> Result<BackendReport, BackendError> {
        (**self).run(source_dir)
    }
}

/// What a backend run achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendReport {
    /// Number of source files the backend tried to transcribe.
    pub attempted: usize,
    /// Base names of the artefacts written, in production order.
    pub produced: Vec<String>,
}

impl BackendReport {
    /// Builds a report.
    #[must_use]
    pub const fn new(attempted: usize, produced: Vec<String>) -> Self {
        Self {
            attempted,
            produced,
        }
    }

    /// Status implied by comparing attempted and produced counts.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_counts(self.attempted, self.produced.len())
    }
}

/// Errors that abort a whole backend run.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The source directory could not be listed.
    #[error("failed to list sources in '{}': {source}", path.display())]
    ListSources {
        /// Directory that was being listed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The transcription program could not be launched.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Errors surfaced when a backend cannot be constructed.
#[derive(Debug, Error)]
#[error("backend {kind} failed to start: {message}")]
pub struct BackendStartupError {
    /// Kind of backend that failed.
    pub kind: BackendKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendStartupError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(kind: BackendKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        kind: BackendKind,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Builds the backend selected by configuration.
pub trait BackendProvider {
    /// Constructs the backend for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendStartupError`] when the backend cannot be built from
    /// the supplied configuration.
    fn build(
        &self,
        kind: BackendKind,
        config: &Config,
    ) -> Result<Box<dyn Backend>, BackendStartupError>;
}

/// Provider backed by external transcription programs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackendProvider;

impl BackendProvider for SystemBackendProvider {
    fn build(
        &self,
        kind: BackendKind,
        config: &Config,
    ) -> Result<Box<dyn Backend>, BackendStartupError> {
        let backend = match kind {
            BackendKind::BasicPitch => CommandBackend::basic_pitch(config),
            BackendKind::Command => CommandBackend::from_config(config),
        }
        .map_err(|error| {
            BackendStartupError::with_source(kind, "invalid command template", error)
        })?;
        Ok(Box::new(backend))
    }
}
