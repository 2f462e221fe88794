//! Subcommand implementations.

pub mod classify;
pub mod init;
pub mod list;
pub mod score;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;

use psyscore_core::ScoringEngine;
use psyscore_formulas::{build_engine, load_config_from, PsyscoreConfig};

/// Load configuration, letting `--catalog` override the configured directory.
pub(crate) fn load_config(
    config_path: Option<PathBuf>,
    catalog: Option<PathBuf>,
) -> Result<PsyscoreConfig> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(dir) = catalog {
        config.catalog_dir = dir;
    }
    Ok(config)
}

pub(crate) fn load_engine(
    config_path: Option<PathBuf>,
    catalog: Option<PathBuf>,
) -> Result<ScoringEngine> {
    let config = load_config(config_path, catalog)?;
    tracing::debug!(catalog_dir = %config.catalog_dir.display(), "loading catalog");
    build_engine(&config)
}
