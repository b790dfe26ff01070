//! Command handlers for the `gcs` binary.

pub mod cache;
pub mod run;

use anyhow::{Context, Result};
use gcs_runtime::Runtime;

/// Every command resolves config the same way; no `--config` means defaults.
pub fn load_runtime(config_paths: &[String]) -> Result<Runtime> {
    Runtime::load(config_paths).context("failed to load configuration")
}
