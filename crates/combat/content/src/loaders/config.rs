//! Combat configuration loader.

use std::path::Path;

use anyhow::Context;
use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// On-disk encodings understood by [`ConfigLoader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    /// Picks the format from a file extension (`toml` or `ron`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("ron") {
            Some(Self::Ron)
        } else {
            None
        }
    }
}

/// Loader for combat balance tables.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a config file, choosing the parser by extension.
    ///
    /// Missing sections and fields fall back to the built-in defaults.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            anyhow::anyhow!(
                "Unsupported config format for {} (expected .toml or .ron)",
                path.display()
            )
        })?;
        let content = read_file(path)?;

        Self::parse(&content, format)
            .with_context(|| format!("Invalid combat config in {}", path.display()))
    }

    /// Parse and validate config text.
    pub fn parse(content: &str, format: ConfigFormat) -> LoadResult<CombatConfig> {
        let config: CombatConfig = match format {
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?,
            ConfigFormat::Ron => ron::from_str(content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config RON: {}", e))?,
        };

        config.validate()?;
        Ok(config)
    }
}
