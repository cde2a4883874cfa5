//! Behavioural suites for the transcription worker.

mod support;
