//! # Init Subcommand
//!
//! Writes a fresh `certreg.yaml` and an empty ledger snapshot. The
//! administrator chosen here is fixed for the life of the ledger.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;

use certreg_core::AccountId;
use certreg_engine::{JsonFileBackend, LedgerBackend, LedgerState, RegistryConfig, MAX_BATCH_SIZE};

use crate::config::{resolve_against, CliConfig};
use crate::CliContext;

/// Arguments for `certreg init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Administrative owner account.
    #[arg(long)]
    pub admin: AccountId,

    /// Largest accepted batch issuance.
    #[arg(long, default_value_t = MAX_BATCH_SIZE)]
    pub max_batch_size: usize,

    /// Ledger snapshot path, relative to the config file.
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Document blob directory, relative to the config file.
    #[arg(long)]
    pub content_dir: Option<PathBuf>,

    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

/// Execute `certreg init`.
pub fn run_init(args: &InitArgs, ctx: &CliContext) -> Result<u8> {
    if ctx.config_path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            ctx.config_path.display()
        );
    }

    let registry = RegistryConfig {
        admin: args.admin,
        max_batch_size: args.max_batch_size,
    };
    registry.validate()?;

    let mut config = CliConfig::new(registry);
    if let Some(ledger) = &args.ledger {
        config.ledger_path = ledger.clone();
    }
    if let Some(dir) = &args.content_dir {
        config.content_dir = dir.clone();
    }

    let base = ctx.config_path.parent().unwrap_or_else(|| Path::new(""));
    let backend = JsonFileBackend::new(resolve_against(base, &config.ledger_path));
    let existing = backend.load()?;
    if let Some(pinned) = existing.as_ref().and_then(LedgerState::administrator) {
        if pinned != args.admin {
            bail!(
                "{} belongs to administrator {pinned}; it cannot be re-initialized for {}",
                backend.path().display(),
                args.admin
            );
        }
    }
    config.save(&ctx.config_path)?;
    if existing.is_none() {
        backend.write_snapshot(&LedgerState::with_administrator(args.admin))?;
    }

    // Re-load so paths resolve exactly as later commands will see them.
    let resolved = ctx.load_config()?;
    std::fs::create_dir_all(&resolved.content_dir)?;

    tracing::info!(
        config = %ctx.config_path.display(),
        ledger = %resolved.ledger_path.display(),
        "initialized registry"
    );
    println!(
        "OK: initialized registry admin={} config={} ledger={}",
        resolved.registry.admin,
        ctx.config_path.display(),
        resolved.ledger_path.display()
    );
    Ok(0)
}
