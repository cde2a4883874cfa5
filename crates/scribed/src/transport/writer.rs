//! Output sink shared between the heartbeat thread and the result writer.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Cloneable handle to one output channel.
///
/// Every write happens under a single mutex, so a heartbeat marker and a
/// result frame can never interleave on the wire.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedWriter {
    /// Wraps a writer.
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Runs `action` with exclusive access to the channel.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `action`, or reports a poisoned lock
    /// as [`io::ErrorKind::Other`].
    pub fn with_lock<R>(
        &self,
        action: impl FnOnce(&mut dyn Write) -> io::Result<R>,
    ) -> io::Result<R> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("output channel lock poisoned"))?;
        action(guard.as_mut())
    }

    /// Writes `bytes` in full and flushes.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    pub fn write_frame(&self, bytes: &[u8]) -> io::Result<()> {
        self.with_lock(|writer| {
            writer.write_all(bytes)?;
            writer.flush()
        })
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn clones_share_one_channel() {
        let capture = Capture::default();
        let writer = SharedWriter::new(capture.clone());
        let clone = writer.clone();
        writer.write_frame(b"one ").expect("first write");
        clone.write_frame(b"two").expect("second write");
        assert_eq!(capture.0.lock().expect("capture lock").as_slice(), b"one two");
    }
}
