//! Command implementations.

mod input;
mod render;
mod run;
mod validate;

pub use render::run_render;
pub use run::run_transcript;
pub use validate::run_validate;

use std::path::Path;

use contracts::TranscriptConfig;

use crate::error::{CliError, Result};

/// Load a configuration file, or the defaults when none is given
fn load_config(path: Option<&Path>) -> Result<TranscriptConfig> {
    let Some(path) = path else {
        return Ok(TranscriptConfig::default());
    };
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    Ok(config_loader::ConfigLoader::load_from_path(path)?)
}
