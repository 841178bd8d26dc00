use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Framework-wide settings, loadable from a TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FrameworkConfig {
    /// Soft cap on concurrently tracked managed algorithms; the manager
    /// evicts the oldest completed instance once this is reached.
    pub max_managed_algorithms: usize,
    pub paging: PagingSettings,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            max_managed_algorithms: 100,
            paging: PagingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PagingSettings {
    /// Histograms per data block in paged workspaces.
    pub spectra_per_block: usize,
    /// Blocks a paged workspace keeps resident before evicting.
    pub resident_blocks: usize,
    /// Total value count (X + Y + E doubles) above which the factory builds a
    /// paged workspace instead of an in-memory one.
    pub in_memory_value_limit: usize,
    /// Directory for paging scratch files; the system temporary directory
    /// when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            spectra_per_block: 256,
            resident_blocks: 40,
            in_memory_value_limit: 25_000_000,
            scratch_dir: None,
        }
    }
}

impl FrameworkConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let config = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}
