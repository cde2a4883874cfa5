//! `scribed` worker binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    scribed::run_worker()
}
