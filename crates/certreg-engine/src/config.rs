//! Registry configuration.
//!
//! The administrative owner is fixed when the registry is constructed and
//! compared by plain equality at the start of every admin-only operation.
//! Configuration is read from YAML and may be overridden from the
//! environment:
//!
//! - `CERTREG_ADMIN`: administrative owner account (`0x` + 40 hex)
//! - `CERTREG_MAX_BATCH_SIZE`: batch issuance ceiling (1..=50, default 50)

use std::path::Path;

use certreg_core::AccountId;
use serde::{Deserialize, Serialize};

/// Hard ceiling on the number of entries in one batch issuance.
pub const MAX_BATCH_SIZE: usize = 50;

/// Environment variable overriding [`RegistryConfig::admin`].
pub const ENV_ADMIN: &str = "CERTREG_ADMIN";

/// Environment variable overriding [`RegistryConfig::max_batch_size`].
pub const ENV_MAX_BATCH_SIZE: &str = "CERTREG_MAX_BATCH_SIZE";

/// Process-wide registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// The single administrative owner identity.
    pub admin: AccountId,
    /// Largest accepted batch issuance. Never above [`MAX_BATCH_SIZE`].
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_max_batch_size() -> usize {
    MAX_BATCH_SIZE
}

impl RegistryConfig {
    /// Configuration with the given administrator and default limits.
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Check the configuration's invariants.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NullAdministrator`] if the admin is the zero account,
    /// [`ConfigError::BatchSizeOutOfRange`] if the batch ceiling is 0 or
    /// above [`MAX_BATCH_SIZE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.is_zero() {
            return Err(ConfigError::NullAdministrator);
        }
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::BatchSizeOutOfRange(self.max_batch_size));
        }
        Ok(())
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Apply `CERTREG_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup, then re-validate.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(ENV_ADMIN) {
            self.admin = AccountId::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
                key: ENV_ADMIN.to_string(),
                reason: e.to_string(),
            })?;
        }
        if let Some(raw) = lookup(ENV_MAX_BATCH_SIZE) {
            self.max_batch_size =
                raw.trim()
                    .parse::<usize>()
                    .map_err(|e| ConfigError::InvalidValue {
                        key: ENV_MAX_BATCH_SIZE.to_string(),
                        reason: e.to_string(),
                    })?;
        }
        self.validate()?;
        Ok(self)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// YAML syntax or shape error.
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An override value did not parse.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The administrative owner was the zero account.
    #[error("administrator must be a non-zero account")]
    NullAdministrator,

    /// Batch ceiling outside `1..=50`.
    #[error("max_batch_size must be in 1..={MAX_BATCH_SIZE}, got {0}")]
    BatchSizeOutOfRange(usize),
}
