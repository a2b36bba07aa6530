//! # Institution Subcommand
//!
//! Authorization directory operations. `register` and `update` act on the
//! `--caller` account; `revoke` must be run as the administrator.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use certreg_core::AccountId;

use crate::{print_json, CliContext};

/// Arguments for `certreg institution`.
#[derive(Args, Debug)]
pub struct InstitutionArgs {
    #[command(subcommand)]
    pub command: InstitutionCommand,
}

/// Institution subcommands.
#[derive(Subcommand, Debug)]
pub enum InstitutionCommand {
    /// Register the caller as an authorized issuing institution.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
    },

    /// Clear an institution's authorization (administrator only).
    Revoke {
        #[arg(value_name = "ACCOUNT")]
        institution: AccountId,
    },

    /// Change the caller's display name and contact email.
    Update {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
    },

    /// Name, authorization flag, registration time and issuance count.
    Stats {
        #[arg(value_name = "ACCOUNT")]
        institution: AccountId,
    },

    /// Full directory record, including contact email.
    Show {
        #[arg(value_name = "ACCOUNT")]
        institution: AccountId,
    },
}

/// Execute `certreg institution`.
pub fn run_institution(args: &InstitutionArgs, ctx: &CliContext) -> Result<u8> {
    let (registry, _) = ctx.open_registry()?;

    match &args.command {
        InstitutionCommand::Register { name, email } => {
            let caller = ctx.caller()?;
            registry.register_institution(&caller, name, email)?;
            print_json(&json!({ "registered": caller, "name": name }))?;
            Ok(0)
        }
        InstitutionCommand::Revoke { institution } => {
            let caller = ctx.caller()?;
            registry.revoke_institution(&caller, institution)?;
            print_json(&json!({ "revoked": institution }))?;
            Ok(0)
        }
        InstitutionCommand::Update { name, email } => {
            let caller = ctx.caller()?;
            registry.update_institution_info(&caller, name, email)?;
            print_json(&json!({ "updated": caller, "name": name, "email": email }))?;
            Ok(0)
        }
        InstitutionCommand::Stats { institution } => {
            print_json(&registry.get_institution_stats(institution))?;
            Ok(0)
        }
        InstitutionCommand::Show { institution } => match registry.get_institution(institution) {
            Some(record) => {
                print_json(&record)?;
                Ok(0)
            }
            None => {
                println!("NOT FOUND: institution {institution}");
                Ok(1)
            }
        },
    }
}
