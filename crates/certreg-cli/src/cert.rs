//! # Cert Subcommand
//!
//! Certificate issuance, revocation and verification.
//!
//! A certificate's content reference is either given directly
//! (`--content-ref`) or derived from a document (`--document`), in which
//! case the reference is the document's SHA-256 and the document enters
//! the content store after the certificate is issued.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::json;

use certreg_core::{AccountId, CertificateId, ContentRef, Timestamp};
use certreg_engine::{content_ref_for, BatchIssueRequest, CertificateRequest, ContentStore};

use crate::{print_json, CliContext};

/// Arguments for `certreg cert`.
#[derive(Args, Debug)]
pub struct CertArgs {
    #[command(subcommand)]
    pub command: CertCommand,
}

/// Cert subcommands.
#[derive(Subcommand, Debug)]
pub enum CertCommand {
    /// Issue one certificate as the caller.
    Issue(IssueArgs),

    /// Issue up to 50 certificates atomically from a JSON file.
    ///
    /// The file holds either parallel arrays (`recipients`,
    /// `recipient_names`, `course_names`, `grades`, `content_refs`,
    /// `completion_dates`, `cert_types`) or an array of request objects.
    Batch {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Mark a certificate invalid (issuer or administrator).
    Revoke {
        #[arg(value_name = "ID")]
        id: CertificateId,
    },

    /// Print the full certificate record.
    Verify {
        #[arg(value_name = "ID")]
        id: CertificateId,
    },

    /// Look a certificate up by content reference or by document.
    VerifyRef {
        #[arg(value_name = "REF", required_unless_present = "document")]
        content_ref: Option<String>,
        /// Hash this document and look up its reference.
        #[arg(long, conflicts_with = "content_ref")]
        document: Option<PathBuf>,
    },

    /// Identifiers held by an account, in issuance order.
    Holder {
        #[arg(value_name = "ACCOUNT")]
        holder: AccountId,
    },

    /// Number of identifiers minted so far.
    Total,
}

/// Fields of `certreg cert issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    #[arg(long)]
    pub recipient: AccountId,
    #[arg(long)]
    pub recipient_name: String,
    #[arg(long = "course")]
    pub course_name: String,
    #[arg(long, default_value = "")]
    pub grade: String,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (midnight UTC).
    #[arg(long, value_parser = parse_timestamp)]
    pub completion_date: Timestamp,
    #[arg(long, default_value = "")]
    pub cert_type: String,
    #[arg(long, required_unless_present = "document", conflicts_with = "document")]
    pub content_ref: Option<String>,
    /// Store this document and use its digest as the content reference.
    #[arg(long)]
    pub document: Option<PathBuf>,
}

/// Parse an RFC 3339 timestamp, or a bare date as midnight UTC.
pub fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    let is_bare_date = s.len() == 10 && s.as_bytes().get(4) == Some(&b'-');
    let candidate = if is_bare_date {
        format!("{s}T00:00:00Z")
    } else {
        s.to_string()
    };
    Timestamp::parse_lenient(&candidate).map_err(|e| e.to_string())
}

/// Execute `certreg cert`.
pub fn run_cert(args: &CertArgs, ctx: &CliContext) -> Result<u8> {
    let (registry, config) = ctx.open_registry()?;

    match &args.command {
        CertCommand::Issue(issue) => {
            let caller = ctx.caller()?;
            // The document is stored only once the registry accepts it.
            let (content_ref, document) = match (&issue.content_ref, &issue.document) {
                (Some(r), _) => (ContentRef::new(r.clone()), None),
                (None, Some(doc)) => {
                    let bytes = read_document(doc)?;
                    (content_ref_for(&bytes), Some(bytes))
                }
                (None, None) => bail!("either --content-ref or --document is required"),
            };
            let request = CertificateRequest {
                recipient: issue.recipient,
                recipient_name: issue.recipient_name.clone(),
                course_name: issue.course_name.clone(),
                grade: issue.grade.clone(),
                content_ref: content_ref.clone(),
                completion_date: issue.completion_date,
                cert_type: issue.cert_type.clone(),
            };
            let id = registry.issue_certificate(&caller, request)?;
            if let Some(bytes) = document {
                ctx.content_store(&config).put(&bytes).with_context(|| {
                    format!("certificate {id} was issued but its document could not be stored")
                })?;
            }
            print_json(&json!({ "id": id, "content_ref": content_ref }))?;
            Ok(0)
        }

        CertCommand::Batch { file } => {
            let caller = ctx.caller()?;
            let batch = read_batch(file)?;
            let ids = registry.batch_issue_certificates(&caller, batch)?;
            print_json(&json!({ "ids": ids }))?;
            Ok(0)
        }

        CertCommand::Revoke { id } => {
            let caller = ctx.caller()?;
            registry.revoke_certificate(&caller, *id)?;
            print_json(&json!({ "revoked": id }))?;
            Ok(0)
        }

        CertCommand::Verify { id } => {
            let certificate = registry.verify_certificate(*id)?;
            print_json(&certificate)?;
            Ok(0)
        }

        CertCommand::VerifyRef {
            content_ref,
            document,
        } => {
            let reference = match (content_ref, document) {
                (Some(r), _) => ContentRef::new(r.clone()),
                (None, Some(doc)) => content_ref_for(&read_document(doc)?),
                (None, None) => bail!("either REF or --document is required"),
            };
            let lookup = registry.verify_certificate_by_content_ref(&reference);
            print_json(&lookup)?;
            Ok(if lookup.exists { 0 } else { 1 })
        }

        CertCommand::Holder { holder } => {
            print_json(&registry.get_holder_certificates(holder))?;
            Ok(0)
        }

        CertCommand::Total => {
            print_json(&json!({ "total": registry.get_total_certificates() }))?;
            Ok(0)
        }
    }
}

fn read_document(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read document: {}", path.display()))
}

/// Parse a batch file in either accepted shape.
pub fn read_batch(path: &Path) -> Result<BatchIssueRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse JSON: {}", path.display()))?;
    if value.is_array() {
        let requests: Vec<CertificateRequest> = serde_json::from_value(value)
            .with_context(|| format!("invalid certificate requests in {}", path.display()))?;
        Ok(BatchIssueRequest::from(requests))
    } else {
        serde_json::from_value(value)
            .with_context(|| format!("invalid batch arrays in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::{run_init, InitArgs};
    use crate::institution::{run_institution, InstitutionArgs, InstitutionCommand};
    use certreg_engine::{ErrorKind, RegistryError};

    const ADMIN: &str = "0x00000000000000000000000000000000000000ad";
    const MIT: &str = "0x0000000000000000000000000000000000000001";
    const GRAD: &str = "0x0000000000000000000000000000000000000009";

    fn setup(dir: &Path) -> PathBuf {
        let path = dir.join("certreg.yaml");
        run_init(
            &InitArgs {
                admin: ADMIN.parse().unwrap(),
                max_batch_size: 50,
                ledger: None,
                content_dir: None,
                force: false,
            },
            &CliContext::new(path.clone(), None),
        )
        .unwrap();
        run_institution(
            &InstitutionArgs {
                command: InstitutionCommand::Register {
                    name: "MIT".into(),
                    email: String::new(),
                },
            },
            &CliContext::new(path.clone(), Some(MIT.parse().unwrap())),
        )
        .unwrap();
        path
    }

    fn mit(path: &Path) -> CliContext {
        CliContext::new(path.to_path_buf(), Some(MIT.parse().unwrap()))
    }

    fn issue_args(content_ref: Option<&str>, document: Option<PathBuf>) -> IssueArgs {
        IssueArgs {
            recipient: GRAD.parse().unwrap(),
            recipient_name: "Ada Lovelace".into(),
            course_name: "Analytical Engines".into(),
            grade: "A".into(),
            completion_date: parse_timestamp("2024-06-01").unwrap(),
            cert_type: "diploma".into(),
            content_ref: content_ref.map(str::to_string),
            document,
        }
    }

    fn run(ctx: &CliContext, command: CertCommand) -> Result<u8> {
        run_cert(&CertArgs { command }, ctx)
    }

    #[test]
    fn parse_timestamp_accepts_dates_and_rfc3339() {
        assert_eq!(
            parse_timestamp("2024-06-01").unwrap().to_iso8601(),
            "2024-06-01T00:00:00Z"
        );
        assert_eq!(
            parse_timestamp("2024-06-01T10:00:00+02:00").unwrap().to_iso8601(),
            "2024-06-01T08:00:00Z"
        );
        assert!(parse_timestamp("June 1st").is_err());
    }

    #[test]
    fn issue_with_content_ref_then_verify() {
        let dir = tempfile::tempdir().unwrap();
        let path = setup(dir.path());
        let ctx = mit(&path);
        assert_eq!(run(&ctx, CertCommand::Issue(issue_args(Some("Qm123"), None))).unwrap(), 0);
        assert_eq!(
            run(&ctx, CertCommand::Verify { id: CertificateId::new(1) }).unwrap(),
            0
        );
        assert_eq!(
            run(
                &ctx,
                CertCommand::VerifyRef {
                    content_ref: Some("Qm123".into()),
                    document: None
                }
            )
            .unwrap(),
            0
        );
        assert_eq!(
            run(
                &ctx,
                CertCommand::VerifyRef {
                    content_ref: Some("unknownHash".into()),
                    document: None
                }
            )
            .unwrap(),
            1
        );
    }

    #[test]
    fn issue_with_document_stores_blob() {
        let dir = tempfile::tempdir().unwrap();
        let path = setup(dir.path());
        let doc = dir.path().join("diploma.pdf");
        std::fs::write(&doc, b"%PDF-1.7 diploma for Ada").unwrap();

        let ctx = mit(&path);
        run(&ctx, CertCommand::Issue(issue_args(None, Some(doc.clone())))).unwrap();

        let reference = content_ref_for(b"%PDF-1.7 diploma for Ada");
        let config = ctx.load_config().unwrap();
        assert!(config.content_dir.join(format!("{reference}.bin")).exists());
        let code = run(
            &ctx,
            CertCommand::VerifyRef {
                content_ref: None,
                document: Some(doc),
            },
        )
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn rejected_document_is_not_stored() {
        let dir = tempfile::tempdir().unwrap();
        let path = setup(dir.path());
        let doc = dir.path().join("early.pdf");
        std::fs::write(&doc, b"%PDF-1.7 not yet earned").unwrap();

        let ctx = mit(&path);
        let mut args = issue_args(None, Some(doc));
        args.completion_date = parse_timestamp("2999-01-01").unwrap();
        let err = run(&ctx, CertCommand::Issue(args)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RegistryError>().unwrap().kind(),
            ErrorKind::InvalidInput
        );

        let reference = content_ref_for(b"%PDF-1.7 not yet earned");
        let config = ctx.load_config().unwrap();
        assert!(!config.content_dir.join(format!("{reference}.bin")).exists());
    }

    #[test]
    fn duplicate_reference_surfaces_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = setup(dir.path());
        let ctx = mit(&path);
        run(&ctx, CertCommand::Issue(issue_args(Some("Qm123"), None))).unwrap();
        let err = run(&ctx, CertCommand::Issue(issue_args(Some("Qm123"), None))).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RegistryError>().unwrap().kind(),
            ErrorKind::DuplicateReference
        );
    }

    #[test]
    fn batch_file_in_both_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = setup(dir.path());
        let ctx = mit(&path);

        let objects = dir.path().join("objects.json");
        std::fs::write(
            &objects,
            serde_json::to_vec(&json!([
                {"recipient": GRAD, "recipient_name": "Ada", "course_name": "Math",
                 "content_ref": "Qm-a", "completion_date": "2024-01-01T00:00:00Z"},
                {"recipient": GRAD, "recipient_name": "Ada", "course_name": "Logic",
                 "content_ref": "Qm-b", "completion_date": "2024-01-01T00:00:00Z"}
            ]))
            .unwrap(),
        )
        .unwrap();
        assert_eq!(run(&ctx, CertCommand::Batch { file: objects }).unwrap(), 0);

        let arrays = dir.path().join("arrays.json");
        std::fs::write(
            &arrays,
            serde_json::to_vec(&json!({
                "recipients": [GRAD],
                "recipient_names": ["Ada"],
                "course_names": ["Physics"],
                "grades": ["B"],
                "content_refs": ["Qm-c"],
                "completion_dates": ["2024-01-01T00:00:00Z"],
                "cert_types": ["transcript"]
            }))
            .unwrap(),
        )
        .unwrap();
        assert_eq!(run(&ctx, CertCommand::Batch { file: arrays }).unwrap(), 0);

        let (registry, _) = ctx.open_registry().unwrap();
        assert_eq!(registry.get_total_certificates(), 3);
        assert_eq!(registry.get_holder_certificates(&GRAD.parse().unwrap()).len(), 3);
    }

    #[test]
    fn revoke_then_verify_shows_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = setup(dir.path());
        let ctx = mit(&path);
        run(&ctx, CertCommand::Issue(issue_args(Some("Qm1"), None))).unwrap();
        run(&ctx, CertCommand::Revoke { id: CertificateId::new(1) }).unwrap();
        let (registry, _) = ctx.open_registry().unwrap();
        assert!(!registry.verify_certificate(CertificateId::new(1)).unwrap().valid);
    }

    #[test]
    fn verify_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = setup(dir.path());
        let err = run(
            &CliContext::new(path, None),
            CertCommand::Verify { id: CertificateId::new(7) },
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RegistryError>().unwrap().kind(),
            ErrorKind::NotFound
        );
    }
}
