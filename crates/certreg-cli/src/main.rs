//! # certreg CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use certreg_core::AccountId;
use certreg_engine::RegistryError;

use certreg_cli::cert::{run_cert, CertArgs};
use certreg_cli::config::config_path;
use certreg_cli::content::{run_content, ContentArgs};
use certreg_cli::events::{run_events, EventsArgs};
use certreg_cli::init::{run_init, InitArgs};
use certreg_cli::institution::{run_institution, InstitutionArgs};
use certreg_cli::{CliContext, ENV_CALLER};

/// Academic certificate registry.
///
/// Institutions authorized by the administrator issue tamper-evident
/// certificates bound to recipient accounts; anyone can verify them by
/// identifier or by document.
#[derive(Parser, Debug)]
#[command(name = "certreg", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: $CERTREG_CONFIG or ./certreg.yaml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Acting account for mutating commands (default: $CERTREG_CALLER).
    #[arg(long, global = true)]
    caller: Option<AccountId>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a configuration file and an empty ledger.
    Init(InitArgs),

    /// Institution directory (register, revoke, update, stats, show).
    Institution(InstitutionArgs),

    /// Certificate issuance, revocation and verification.
    Cert(CertArgs),

    /// Content-addressed document storage (put, get).
    Content(ContentArgs),

    /// Audit log inspection (list, verify).
    Events(EventsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "certreg starting");

    let result = resolve_caller(cli.caller).and_then(|caller| {
        let ctx = CliContext::new(config_path(cli.config.as_deref()), caller);
        tracing::debug!(config = %ctx.config_path.display(), "resolved configuration path");
        match &cli.command {
            Commands::Init(args) => run_init(args, &ctx),
            Commands::Institution(args) => run_institution(args, &ctx),
            Commands::Cert(args) => run_cert(args, &ctx),
            Commands::Content(args) => run_content(args, &ctx),
            Commands::Events(args) => run_events(args, &ctx),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            if let Some(registry_err) = e.downcast_ref::<RegistryError>() {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": registry_err.kind(),
                        "message": registry_err.to_string(),
                    })
                );
            } else {
                eprintln!("error: {e:#}");
            }
            ExitCode::from(1)
        }
    }
}

/// `-v` wins over `RUST_LOG`; with neither, only warnings are shown.
fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_caller(flag: Option<AccountId>) -> anyhow::Result<Option<AccountId>> {
    if flag.is_some() {
        return Ok(flag);
    }
    match std::env::var(ENV_CALLER) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<AccountId>()
            .map(Some)
            .with_context(|| format!("invalid {ENV_CALLER}")),
        _ => Ok(None),
    }
}
