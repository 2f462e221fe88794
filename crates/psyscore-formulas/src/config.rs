//! Engine configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use psyscore_core::{Catalog, EngineConfig, FormulaPlugin, ScoringEngine};

use crate::archetype::ArchetypeFormula;
use crate::blend::WeightedBlend;
use crate::clinical::ClinicalComposite;
use crate::weighted::WeightedMean;

/// Top-level psyscore configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsyscoreConfig {
    /// Directory holding instrument TOML files.
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,
    /// Archetype matches to keep when the caller does not ask for a number.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Treat catalog validation warnings as errors.
    #[serde(default)]
    pub strict: bool,
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from("./instruments")
}
fn default_top_k() -> usize {
    3
}

impl Default for PsyscoreConfig {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
            top_k: default_top_k(),
            strict: false,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + end]).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `psyscore.toml` in the current directory
/// 2. `~/.config/psyscore/config.toml`
///
/// `PSYSCORE_CATALOG_DIR` overrides the catalog directory.
pub fn load_config() -> Result<PsyscoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PsyscoreConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("psyscore.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<PsyscoreConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => PsyscoreConfig::default(),
    };

    if let Ok(dir) = std::env::var("PSYSCORE_CATALOG_DIR") {
        config.catalog_dir = PathBuf::from(dir);
    }
    config.catalog_dir = PathBuf::from(resolve_env_vars(&config.catalog_dir.to_string_lossy()));

    tracing::debug!(
        source = ?config_path,
        catalog_dir = %config.catalog_dir.display(),
        "configuration loaded"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("psyscore"))
}

/// Every formula plugin this crate ships.
pub fn default_plugins() -> Vec<Arc<dyn FormulaPlugin>> {
    vec![
        Arc::new(WeightedBlend),
        Arc::new(ClinicalComposite),
        Arc::new(WeightedMean),
        Arc::new(ArchetypeFormula),
    ]
}

/// Create an engine with the default plugins registered.
pub fn engine_with_catalog(catalog: Catalog, top_k: usize) -> ScoringEngine {
    let mut engine = ScoringEngine::new(Arc::new(catalog), EngineConfig { top_k });
    for plugin in default_plugins() {
        engine.register(plugin);
    }
    engine
}

/// Load the configured catalog and create an engine over it.
pub fn build_engine(config: &PsyscoreConfig) -> Result<ScoringEngine> {
    let catalog = Catalog::from_dir(&config.catalog_dir, config.strict).with_context(|| {
        format!(
            "failed to load instrument catalog from {}",
            config.catalog_dir.display()
        )
    })?;
    Ok(engine_with_catalog(catalog, config.top_k))
}
