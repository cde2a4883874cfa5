//! Bounded frame readers for the socket and line channels.

use std::io::{self, BufRead, Read};

use scribe_config::Config;

use super::FrameError;

/// Size limits applied to every request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    max_bytes: usize,
    chunk_size: usize,
}

impl FrameLimits {
    /// Builds limits from a frame ceiling and a read size.
    ///
    /// The read size is kept between one byte and one byte past the
    /// ceiling, which is all a single read can ever need.
    #[must_use]
    pub const fn new(max_bytes: usize, chunk_size: usize) -> Self {
        let ceiling = max_bytes.saturating_add(1);
        let chunk_size = if chunk_size == 0 {
            1
        } else if chunk_size > ceiling {
            ceiling
        } else {
            chunk_size
        };
        Self {
            max_bytes,
            chunk_size,
        }
    }

    /// Limits taken from the resolved configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.max_request_bytes, config.chunk_size)
    }
}

/// Reads one frame from a stream that ends when the peer half-closes.
#[derive(Debug, Clone, Copy)]
pub struct SocketFrameReader {
    limits: FrameLimits,
}

impl SocketFrameReader {
    /// Builds a reader with the given limits.
    #[must_use]
    pub const fn new(limits: FrameLimits) -> Self {
        Self { limits }
    }

    /// Reads chunks until end of stream.
    ///
    /// The running total is checked after every chunk, so no more than one
    /// chunk beyond the ceiling is ever buffered.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] once the frame passes the ceiling and
    /// [`FrameError::Truncated`] when a read fails.
    pub fn read<R>(&self, source: &mut R) -> Result<Vec<u8>, FrameError>
    where
        R: Read + ?Sized,
    {
        let mut frame = Vec::new();
        let mut chunk = vec![0_u8; self.limits.chunk_size];
        loop {
            let read = match source.read(&mut chunk) {
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(FrameError::Truncated {
                        received: frame.len(),
                        source,
                    });
                }
            };
            if read == 0 {
                return Ok(frame);
            }
            frame.extend_from_slice(chunk.get(..read).unwrap_or_default());
            if frame.len() > self.limits.max_bytes {
                return Err(FrameError::TooLarge {
                    limit: self.limits.max_bytes,
                });
            }
        }
    }
}

/// Splits a buffered stream into newline-terminated frames.
#[derive(Debug)]
pub struct LineFrameReader<R> {
    input: R,
    limits: FrameLimits,
}

impl<R> LineFrameReader<R>
where
    R: BufRead,
{
    /// Wraps a buffered input.
    pub const fn new(input: R, limits: FrameLimits) -> Self {
        Self { input, limits }
    }

    /// Returns the next line without its terminator, or `None` at end of
    /// stream. A final line with no trailing newline is still a frame.
    ///
    /// An oversized line yields [`FrameError::TooLarge`]; the rest of that
    /// line is consumed without being buffered so the following line reads
    /// normally.
    pub fn next_frame(&mut self) -> Option<Result<Vec<u8>, FrameError>> {
        let mut line = Vec::new();
        let mut overflowed = false;
        let mut seen_any = false;
        loop {
            let (consumed, complete) = {
                let available = match self.input.fill_buf() {
                    Ok(available) => available,
                    Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                    Err(source) => {
                        return Some(Err(FrameError::Truncated {
                            received: line.len(),
                            source,
                        }));
                    }
                };
                if available.is_empty() {
                    return self.finish(line, overflowed, seen_any);
                }
                seen_any = true;
                let (content, consumed, complete) =
                    match available.iter().position(|byte| *byte == b'\n') {
                        Some(end) => (available.get(..end), end + 1, true),
                        None => (Some(available), available.len(), false),
                    };
                let content = content.unwrap_or_default();
                if !overflowed {
                    if line.len() + content.len() > self.limits.max_bytes {
                        overflowed = true;
                        line = Vec::new();
                    } else {
                        line.extend_from_slice(content);
                    }
                }
                (consumed, complete)
            };
            self.input.consume(consumed);
            if complete {
                return self.finish(line, overflowed, true);
            }
        }
    }

    fn finish(
        &self,
        line: Vec<u8>,
        overflowed: bool,
        seen_any: bool,
    ) -> Option<Result<Vec<u8>, FrameError>> {
        if overflowed {
            Some(Err(FrameError::TooLarge {
                limit: self.limits.max_bytes,
            }))
        } else if seen_any {
            Some(Ok(line))
        } else {
            None
        }
    }
}
