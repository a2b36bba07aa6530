//! # certreg-cli: Command-Line Interface for the Certificate Registry
//!
//! Provides the `certreg` binary over a JSON-file ledger and a
//! filesystem document store.
//!
//! ## Subcommands
//!
//! - `certreg init`: write `certreg.yaml` and an empty ledger.
//! - `certreg institution`: register, revoke, update, stats, show.
//! - `certreg cert`: issue, batch, revoke, verify, verify-ref, holder, total.
//! - `certreg content`: put and get document blobs.
//! - `certreg events`: list and verify the audit chain.
//!
//! ```bash
//! certreg init --admin 0x00000000000000000000000000000000000000ad
//! certreg --caller 0x...01 institution register --name "MIT" --email reg@mit.edu
//! certreg --caller 0x...01 cert issue --recipient 0x...09 --recipient-name "Ada" \
//!     --course "Physics" --completion-date 2026-05-30 --document diploma.pdf
//! certreg cert verify 1
//! ```
//!
//! Results are printed to stdout as JSON. Every handler returns the process
//! exit code: 0 on success, 1 for a failed check or a "not found" lookup.

pub mod cert;
pub mod config;
pub mod content;
pub mod events;
pub mod init;
pub mod institution;

use std::path::PathBuf;

use anyhow::{Context, Result};
use certreg_core::AccountId;
use certreg_engine::{CertificateRegistry, FsContentStore, JsonFileBackend};
use serde::Serialize;

use crate::config::CliConfig;

/// Environment variable supplying `--caller`.
pub const ENV_CALLER: &str = "CERTREG_CALLER";

/// Global options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config_path: PathBuf,
    pub caller: Option<AccountId>,
}

impl CliContext {
    pub fn new(config_path: PathBuf, caller: Option<AccountId>) -> Self {
        Self {
            config_path,
            caller,
        }
    }

    pub fn load_config(&self) -> Result<CliConfig> {
        CliConfig::load(&self.config_path)
    }

    /// Open the registry described by the configuration file.
    pub fn open_registry(&self) -> Result<(CertificateRegistry, CliConfig)> {
        let config = self.load_config()?;
        let registry = CertificateRegistry::builder(config.registry.clone())
            .backend(JsonFileBackend::new(&config.ledger_path))
            .build()
            .with_context(|| format!("failed to open ledger {}", config.ledger_path.display()))?;
        Ok((registry, config))
    }

    pub fn content_store(&self, config: &CliConfig) -> FsContentStore {
        FsContentStore::new(&config.content_dir)
    }

    /// The acting account, required by every mutating subcommand.
    pub fn caller(&self) -> Result<AccountId> {
        self.caller.with_context(|| {
            format!("this command needs an acting account: pass --caller or set {ENV_CALLER}")
        })
    }
}

/// Print `value` to stdout as pretty JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{out}");
    Ok(())
}
