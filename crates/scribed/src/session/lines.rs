use std::io::{BufRead, Write};

use scribe_config::TransportMode;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::dispatch::TaskError;
use crate::transport::{FrameError, LineFrameReader, SharedWriter};

use super::{SESSION_TARGET, SessionLoop, SessionOutcome};

impl<B> SessionLoop<B>
where
    B: Backend,
{
    /// Serves one task per non-blank input line until end of stream.
    ///
    /// Results are written to `output` wrapped in the codec's line markers.
    /// No keep-alive markers are written on this channel. A read failure on
    /// `input` ends the session after recording the interrupted task.
    pub fn run_lines<R, W>(&mut self, input: R, output: W) -> SessionOutcome
    where
        R: BufRead,
        W: Write + Send + 'static,
    {
        self.reporter.session_started(TransportMode::Stdio);
        info!(target: SESSION_TARGET, "line session started");
        let sink = SharedWriter::new(output);
        let mut reader = LineFrameReader::new(input, self.limits);
        let mut results = Vec::new();
        while let Some(frame) = reader.next_frame() {
            let ordinal = results.len() + 1;
            let outcome = match frame {
                Ok(raw) if raw.trim_ascii().is_empty() => continue,
                Ok(raw) => self.serve_frame(&raw, &sink, false),
                Err(source) => {
                    let fatal = matches!(source, FrameError::Truncated { .. });
                    let outcome = Err(TaskError::from(source));
                    results.push(self.record(ordinal, &outcome));
                    if fatal {
                        warn!(target: SESSION_TARGET, "input unreadable; ending session");
                        break;
                    }
                    continue;
                }
            };
            results.push(self.record(ordinal, &outcome));
        }
        self.finish(&results)
    }
}
