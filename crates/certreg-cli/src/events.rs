//! # Events Subcommand
//!
//! Inspect the hash-chained audit log.

use anyhow::Result;
use clap::{Args, Subcommand};

use certreg_core::{AccountId, CertificateId};

use crate::{print_json, CliContext};

/// Arguments for `certreg events`.
#[derive(Args, Debug)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

/// Events subcommands.
#[derive(Subcommand, Debug)]
pub enum EventsCommand {
    /// Print event records, optionally filtered.
    List {
        /// Only events about this certificate.
        #[arg(long, conflicts_with_all = ["institution", "holder"])]
        certificate: Option<CertificateId>,
        /// Only events naming this institution.
        #[arg(long, conflicts_with = "holder")]
        institution: Option<AccountId>,
        /// Only issuances to this holder.
        #[arg(long)]
        holder: Option<AccountId>,
    },

    /// Recompute every hash and link. Exits 1 if the chain is broken.
    Verify,
}

/// Execute `certreg events`.
pub fn run_events(args: &EventsArgs, ctx: &CliContext) -> Result<u8> {
    let (registry, _) = ctx.open_registry()?;

    match &args.command {
        EventsCommand::List {
            certificate,
            institution,
            holder,
        } => {
            let records = match (certificate, institution, holder) {
                (Some(id), _, _) => registry.events_for_certificate(*id),
                (None, Some(account), _) => registry.events_for_institution(account),
                (None, None, Some(account)) => registry.events_for_holder(account),
                (None, None, None) => registry.events(),
            };
            print_json(&records)?;
            Ok(0)
        }
        EventsCommand::Verify => {
            let integrity = registry.verify_event_chain();
            if integrity.chain_valid {
                println!("OK: {} events, chain intact", integrity.total_events);
                Ok(0)
            } else {
                tracing::warn!(
                    broken_links = integrity.broken_links,
                    tampered = integrity.tampered_records,
                    "audit chain verification failed"
                );
                print_json(&integrity)?;
                Ok(1)
            }
        }
    }
}
