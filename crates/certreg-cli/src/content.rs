//! # Content Subcommand
//!
//! Store and fetch certificate documents by their SHA-256 reference.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use certreg_core::ContentRef;
use certreg_engine::ContentStore;

use crate::CliContext;

/// Arguments for `certreg content`.
#[derive(Args, Debug)]
pub struct ContentArgs {
    #[command(subcommand)]
    pub command: ContentCommand,
}

/// Content subcommands.
#[derive(Subcommand, Debug)]
pub enum ContentCommand {
    /// Store a document and print its content reference.
    Put {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Fetch a document by content reference.
    Get {
        #[arg(value_name = "REF")]
        content_ref: String,
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Execute `certreg content`.
pub fn run_content(args: &ContentArgs, ctx: &CliContext) -> Result<u8> {
    let config = ctx.load_config()?;
    let store = ctx.content_store(&config);

    match &args.command {
        ContentCommand::Put { file } => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("failed to read document: {}", file.display()))?;
            let reference = store.put(&bytes).context("failed to store document")?;
            tracing::info!(content_ref = %reference, bytes = bytes.len(), "stored document");
            println!("{reference}");
            Ok(0)
        }
        ContentCommand::Get { content_ref, out } => {
            let reference = ContentRef::new(content_ref.clone());
            let Some(bytes) = store
                .get(&reference)
                .with_context(|| format!("failed to read blob {reference}"))?
            else {
                println!("NOT FOUND: {reference}");
                return Ok(1);
            };
            match out {
                Some(path) => {
                    std::fs::write(path, &bytes)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("OK: {reference} -> {}", path.display());
                }
                None => {
                    use std::io::Write;
                    std::io::stdout()
                        .write_all(&bytes)
                        .context("failed to write to stdout")?;
                }
            }
            Ok(0)
        }
    }
}
