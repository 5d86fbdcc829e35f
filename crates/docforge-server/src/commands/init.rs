//! `docforge init`: write a default config and create the bucket directories.

use std::path::Path;

use anyhow::{bail, Result};

use docforge_core::config::ServiceConfig;

use crate::output;

/// Write `config` to `config_path` and create the bucket layout it points at.
pub fn run(config_path: &Path, config: &ServiceConfig) -> Result<()> {
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    output::step(1, 2, &format!("Writing {}", config_path.display()));
    config.save(config_path)?;

    output::step(2, 2, "Creating bucket directories");
    for dir in ["templates", "outputs"] {
        std::fs::create_dir_all(config.storage_root.join(dir))?;
    }

    output::success(&format!(
        "Initialized; copy templates to {}/templates/{{key}}.docx and run `docforge serve`",
        config.storage_root.display()
    ));
    Ok(())
}
