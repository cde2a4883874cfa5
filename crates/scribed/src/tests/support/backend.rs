//! Deterministic backend doubles that never shell out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use scribe_config::Config;

use crate::backend::{
    Backend, BackendError, BackendKind, BackendProvider, BackendReport, BackendStartupError,
};

/// File name that makes [`FakeBackend`] abort the run.
pub const FAILURE_MARKER: &str = "fail";

/// Backend that writes `<stem>.mid` for every `.wav` whose name does not
/// start with `corrupt`.
///
/// A directory holding a [`FAILURE_MARKER`] file makes the run abort with
/// [`BackendError::Launch`].
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    delay: Duration,
    runs: Arc<AtomicUsize>,
}

impl FakeBackend {
    /// Makes every run take at least `delay`.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Number of runs so far, across clones.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Backend for FakeBackend {
    fn run(&mut self, source_dir: &Path) -> Result<BackendReport, BackendError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        if source_dir.join(FAILURE_MARKER).exists() {
            return Err(BackendError::Launch {
                program: "fake-transcriber".to_owned(),
                source: io::Error::other("transcriber crashed"),
            });
        }
        let list_error = |source: io::Error| BackendError::ListSources {
            path: source_dir.to_path_buf(),
            source,
        };
        let mut sources: Vec<PathBuf> = fs::read_dir(source_dir)
            .map_err(list_error)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "wav"))
            .collect();
        sources.sort();
        let mut produced = Vec::new();
        for source in &sources {
            let stem = source
                .file_stem()
                .and_then(|stem| stem.to_str())
                .expect("utf8 stem");
            if stem.starts_with("corrupt") {
                continue;
            }
            let name = format!("{stem}.mid");
            fs::write(source_dir.join(&name), b"MThd").expect("write artefact");
            produced.push(name);
        }
        Ok(BackendReport::new(sources.len(), produced))
    }
}

/// Provider handing out clones of one [`FakeBackend`], or failing on demand.
#[derive(Debug, Clone, Default)]
pub struct FakeBackendProvider {
    backend: FakeBackend,
    fail: bool,
}

impl FakeBackendProvider {
    /// Provider that builds clones of `backend`.
    pub fn new(backend: FakeBackend) -> Self {
        Self {
            backend,
            fail: false,
        }
    }

    /// Provider whose every build fails.
    pub fn failing() -> Self {
        Self {
            backend: FakeBackend::default(),
            fail: true,
        }
    }
}

impl BackendProvider for FakeBackendProvider {
    fn build(
        &self,
        kind: BackendKind,
        _config: &Config,
    ) -> Result<Box<dyn Backend>, BackendStartupError> {
        if self.fail {
            return Err(BackendStartupError::new(kind, "intentional test failure"));
        }
        Ok(Box::new(self.backend.clone()))
    }
}
