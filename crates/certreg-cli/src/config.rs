//! # CLI Configuration
//!
//! The `certreg.yaml` file read by every subcommand except `init`:
//!
//! ```yaml
//! registry:
//!   admin: "0x00000000000000000000000000000000000000ad"
//!   max_batch_size: 50
//! ledger_path: certreg-ledger.json
//! content_dir: certreg-content
//! ```
//!
//! Relative paths are resolved against the directory holding the file.
//! `CERTREG_ADMIN` and `CERTREG_MAX_BATCH_SIZE` override the registry
//! section.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use certreg_engine::RegistryConfig;
use serde::{Deserialize, Serialize};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "certreg.yaml";

/// Environment variable naming the configuration file.
pub const ENV_CONFIG: &str = "CERTREG_CONFIG";

fn default_ledger_path() -> PathBuf {
    PathBuf::from("certreg-ledger.json")
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("certreg-content")
}

/// Parsed `certreg.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    pub registry: RegistryConfig,
    /// JSON ledger snapshot.
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    /// Directory of content-addressed document blobs.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
}

impl CliConfig {
    pub fn new(registry: RegistryConfig) -> Self {
        Self {
            registry,
            ledger_path: default_ledger_path(),
            content_dir: default_content_dir(),
        }
    }

    /// Load from `path`, apply environment overrides, validate, and
    /// resolve relative paths against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        config.registry = config
            .registry
            .with_env_overrides()
            .with_context(|| format!("invalid registry config in {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.ledger_path = resolve_against(base, &config.ledger_path);
        config.content_dir = resolve_against(base, &config.content_dir);
        tracing::debug!(
            config = %path.display(),
            ledger = %config.ledger_path.display(),
            content = %config.content_dir.display(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Write as YAML to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("failed to serialize config")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, yaml)
            .with_context(|| format!("failed to write config: {}", path.display()))
    }
}

/// `path` unchanged if absolute, else joined onto `base`.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// The configuration file to use: `--config`, then `CERTREG_CONFIG`, then
/// `certreg.yaml` in the working directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use certreg_core::AccountId;

    const ADMIN: &str = "0x00000000000000000000000000000000000000ad";

    #[test]
    fn load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("certreg.yaml");
        std::fs::write(
            &path,
            format!("registry:\n  admin: \"{ADMIN}\"\nledger_path: data/ledger.json\n"),
        )
        .unwrap();
        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.ledger_path, dir.path().join("data/ledger.json"));
        assert_eq!(config.content_dir, dir.path().join("certreg-content"));
        assert_eq!(config.registry.max_batch_size, 50);
    }

    #[test]
    fn absolute_paths_untouched() {
        assert_eq!(
            resolve_against(Path::new("/base"), Path::new("/abs/ledger.json")),
            PathBuf::from("/abs/ledger.json")
        );
        assert_eq!(
            resolve_against(Path::new("/base"), Path::new("rel.json")),
            PathBuf::from("/base/rel.json")
        );
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/certreg.yaml");
        let config = CliConfig::new(RegistryConfig::new(AccountId::parse(ADMIN).unwrap()));
        config.save(&path).unwrap();
        let loaded = CliConfig::load(&path).unwrap();
        assert_eq!(loaded.registry, config.registry);
        assert_eq!(loaded.ledger_path, dir.path().join("nested/certreg-ledger.json"));
    }

    #[test]
    fn load_rejects_zero_admin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("certreg.yaml");
        std::fs::write(
            &path,
            "registry:\n  admin: \"0x0000000000000000000000000000000000000000\"\n",
        )
        .unwrap();
        let err = CliConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("non-zero"), "{err:#}");
    }

    #[test]
    fn missing_file_error_names_path() {
        let err = CliConfig::load(Path::new("/nonexistent/certreg.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/certreg.yaml"));
    }

    #[test]
    fn explicit_config_path_wins() {
        assert_eq!(
            config_path(Some(Path::new("custom.yaml"))),
            PathBuf::from("custom.yaml")
        );
    }
}
