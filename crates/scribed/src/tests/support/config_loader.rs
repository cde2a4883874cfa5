//! Configuration loader that exercises the CLI failure path.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use scribe_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader that intentionally fails by passing an unknown transport.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("scribed"),
            OsString::from("--transport"),
            OsString::from("carrier-pigeon"),
        ];
        Config::load_from_iter(args)
    }
}
