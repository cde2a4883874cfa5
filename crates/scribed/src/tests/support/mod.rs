//! Shared doubles and fixtures for the behavioural suites.

mod backend;
mod config_loader;
mod reporter;

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use scribe_protocol::TaskRequest;
use tempfile::TempDir;

pub use self::backend::{FAILURE_MARKER, FakeBackend, FakeBackendProvider};
pub use self::config_loader::FailingConfigLoader;
pub use self::reporter::{HealthEvent, RecordingHealthReporter};

/// In-memory sink that can be inspected while a writer still holds a clone.
#[derive(Debug, Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().expect("capture mutex poisoned").clone()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("capture mutex poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes `good` playable recordings and `corrupt` recordings the fake
/// backend cannot transcribe.
pub fn populate_recordings(dir: &Path, good: usize, corrupt: usize) {
    for index in 0..good {
        fs::write(dir.join(format!("take{index}.wav")), b"RIFF").expect("write recording");
    }
    for index in 0..corrupt {
        fs::write(dir.join(format!("corrupt{index}.wav")), b"junk").expect("write recording");
    }
}

/// Creates a directory with one recording whose transcription aborts.
pub fn crashing_recordings() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    populate_recordings(dir.path(), 1, 0);
    fs::write(dir.path().join(FAILURE_MARKER), b"").expect("write failure marker");
    dir
}

/// Builds a request line for `dir` with the given id.
pub fn request_line(dir: &Path, id: &str) -> String {
    let request = TaskRequest::new(id, dir);
    serde_json::to_string(&request.to_envelope()).expect("serialise request")
}
