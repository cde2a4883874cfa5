//! Keep-alive markers written while a backend run is in progress.
//!
//! Controllers on the socket channel treat a silent connection as dead. The
//! emitter writes the configured marker immediately and then once per
//! interval until it is stopped. Every write takes the [`SharedWriter`]
//! lock and re-checks the closed flag under it, so once [`HeartbeatEmitter::stop`]
//! has returned no further marker can reach the wire.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use scribe_config::Config;
use thiserror::Error;
use tracing::{debug, warn};

use crate::transport::SharedWriter;

const HEARTBEAT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::heartbeat");
const THREAD_NAME: &str = "scribed-heartbeat";

/// Errors raised while starting or stopping an emitter.
#[derive(Debug, Error)]
pub enum HeartbeatError {
    /// The emitter thread could not be spawned.
    #[error("failed to spawn heartbeat thread: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The emitter thread did not finish within the join timeout.
    #[error("heartbeat thread did not stop within {timeout:?}")]
    StopTimeout {
        /// Time waited before giving up.
        timeout: Duration,
    },
    /// The emitter thread panicked.
    #[error("heartbeat thread panicked")]
    Panicked,
}

/// Marker, cadence and stop budget for an emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatSettings {
    marker: Vec<u8>,
    interval: Duration,
    join_timeout: Duration,
}

impl HeartbeatSettings {
    /// Builds settings from explicit values.
    #[must_use]
    pub fn new(marker: impl Into<Vec<u8>>, interval: Duration, join_timeout: Duration) -> Self {
        Self {
            marker: marker.into(),
            interval,
            join_timeout,
        }
    }

    /// Settings taken from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.keep_alive_marker.as_bytes(),
            config.heartbeat_interval(),
            config.heartbeat_join_timeout(),
        )
    }
}

/// Running keep-alive thread bound to one output channel.
#[derive(Debug)]
pub struct HeartbeatEmitter {
    stop_tx: Option<Sender<()>>,
    done_rx: Receiver<()>,
    closed: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    join_timeout: Duration,
}

impl HeartbeatEmitter {
    /// Spawns the emitter. The first marker is written straight away.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::Spawn`] when the thread cannot be created.
    pub fn start(sink: SharedWriter, settings: HeartbeatSettings) -> Result<Self, HeartbeatError> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let closed = Arc::new(AtomicBool::new(false));
        let thread_closed = Arc::clone(&closed);
        let join_timeout = settings.join_timeout;
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || {
                emit_until_stopped(&sink, &settings, &stop_rx, &thread_closed);
                // The receiver may already be gone after a timed-out stop.
                done_tx.send(()).ok();
            })
            .map_err(|source| HeartbeatError::Spawn { source })?;
        Ok(Self {
            stop_tx: Some(stop_tx),
            done_rx,
            closed,
            handle: Some(handle),
            join_timeout,
        })
    }

    /// Stops the emitter and waits, up to the join timeout, for its thread.
    ///
    /// The closed flag is raised before waiting, so even on timeout no new
    /// marker is written afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::StopTimeout`] if the thread is still busy
    /// when the timeout elapses, and [`HeartbeatError::Panicked`] if it
    /// panicked.
    pub fn stop(mut self) -> Result<(), HeartbeatError> {
        self.signal_stop();
        match self.done_rx.recv_timeout(self.join_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            Err(RecvTimeoutError::Timeout) => {
                return Err(HeartbeatError::StopTimeout {
                    timeout: self.join_timeout,
                });
            }
        }
        match self.handle.take().map(JoinHandle::join) {
            Some(Err(_)) => Err(HeartbeatError::Panicked),
            Some(Ok(())) | None => Ok(()),
        }
    }

    fn signal_stop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(stop_tx) = self.stop_tx.take() {
            stop_tx.send(()).ok();
        }
    }
}

impl Drop for HeartbeatEmitter {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

fn emit_until_stopped(
    sink: &SharedWriter,
    settings: &HeartbeatSettings,
    stop_rx: &Receiver<()>,
    closed: &AtomicBool,
) {
    loop {
        let written = sink.with_lock(|writer| {
            if closed.load(Ordering::SeqCst) {
                return Ok(false);
            }
            writer.write_all(&settings.marker)?;
            writer.flush()?;
            Ok(true)
        });
        match written {
            Ok(true) => debug!(target: HEARTBEAT_TARGET, "keep-alive sent"),
            Ok(false) => return,
            Err(error) => {
                warn!(
                    target: HEARTBEAT_TARGET,
                    error = %error,
                    "keep-alive write failed; stopping heartbeat"
                );
                return;
            }
        }
        match stop_rx.recv_timeout(settings.interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn markers(&self) -> usize {
            let bytes = self.0.lock().expect("capture lock");
            bytes.windows(2).filter(|window| *window == b"KA").count()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn settings(interval_ms: u64) -> HeartbeatSettings {
        HeartbeatSettings::new(
            "KA",
            Duration::from_millis(interval_ms),
            Duration::from_millis(interval_ms + 1_000),
        )
    }

    #[test]
    fn first_marker_is_immediate_and_repeats() {
        let capture = Capture::default();
        let emitter =
            HeartbeatEmitter::start(SharedWriter::new(capture.clone()), settings(20))
                .expect("start");
        thread::sleep(Duration::from_millis(110));
        emitter.stop().expect("stop");
        assert!(capture.markers() >= 2, "only {} markers", capture.markers());
    }

    #[test]
    fn stop_returns_well_within_one_long_interval() {
        let capture = Capture::default();
        let emitter =
            HeartbeatEmitter::start(SharedWriter::new(capture.clone()), settings(10_000))
                .expect("start");
        thread::sleep(Duration::from_millis(20));
        let started = Instant::now();
        emitter.stop().expect("stop");
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(capture.markers(), 1);
    }

    #[test]
    fn nothing_is_written_after_stop() {
        let capture = Capture::default();
        let emitter =
            HeartbeatEmitter::start(SharedWriter::new(capture.clone()), settings(5))
                .expect("start");
        thread::sleep(Duration::from_millis(30));
        emitter.stop().expect("stop");
        let after_stop = capture.markers();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(capture.markers(), after_stop);
    }

    #[test]
    fn write_failure_ends_thread_quietly() {
        let emitter =
            HeartbeatEmitter::start(SharedWriter::new(Broken), settings(5)).expect("start");
        thread::sleep(Duration::from_millis(20));
        emitter.stop().expect("stop after failure");
    }

    #[test]
    fn dropping_emitter_stops_thread() {
        let capture = Capture::default();
        let emitter =
            HeartbeatEmitter::start(SharedWriter::new(capture.clone()), settings(5))
                .expect("start");
        thread::sleep(Duration::from_millis(15));
        drop(emitter);
        thread::sleep(Duration::from_millis(30));
        let after_drop = capture.markers();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(capture.markers(), after_drop);
    }
}
