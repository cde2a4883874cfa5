//! Byte-level plumbing for the two task channels.
//!
//! The socket channel carries one task per TCP connection, delimited by the
//! client half-closing its write side. The stdio channel carries one task per
//! newline-terminated line. Both feed raw frames to the codec and write
//! results through a [`SharedWriter`] so heartbeats and results never
//! interleave.

mod errors;
mod frame;
mod listener;
mod writer;

pub use self::errors::{FrameError, ListenerError};
pub use self::frame::{FrameLimits, LineFrameReader, SocketFrameReader};
pub use self::listener::{AcceptOutcome, TaskListener};
pub use self::writer::SharedWriter;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
