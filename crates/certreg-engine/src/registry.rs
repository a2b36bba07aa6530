//! # Certificate Registry
//!
//! Issuance and revocation.
//!
//! ## Issuance checks, in order
//!
//! 1. Caller is a currently authorized institution (`NotAuthorized`).
//! 2. Recipient is non-zero (`InvalidInput`).
//! 3. Recipient name, course name and content reference are non-empty
//!    (`InvalidInput`).
//! 4. Content reference was never used, including earlier in the same
//!    batch (`DuplicateReference`).
//! 5. Completion date is not after the issuance instant (`InvalidInput`).
//!
//! Only then is an identifier allocated. Identifiers are therefore never
//! consumed by failed attempts, and a batch that fails at entry `k`
//! discards entries `1..k` along with it.

use certreg_core::{AccountId, CertificateId};

use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::guard::{enforce, Guard, Principal};
use crate::model::{BatchIssueRequest, Certificate, CertificateRequest};
use crate::staged::Staged;

fn validate_request(staged: &Staged<'_>, req: &CertificateRequest) -> Result<(), RegistryError> {
    if req.recipient.is_zero() {
        return Err(RegistryError::invalid("recipient must be a non-zero account"));
    }
    if req.recipient_name.is_empty() {
        return Err(RegistryError::invalid("recipient name must not be empty"));
    }
    if req.course_name.is_empty() {
        return Err(RegistryError::invalid("course name must not be empty"));
    }
    if req.content_ref.is_empty() {
        return Err(RegistryError::invalid("content reference must not be empty"));
    }
    if staged.content_ref_claimed(&req.content_ref) {
        return Err(RegistryError::DuplicateReference(req.content_ref.clone()));
    }
    if req.completion_date > staged.now() {
        return Err(RegistryError::invalid(format!(
            "completion date {} is after issuance time {}",
            req.completion_date,
            staged.now()
        )));
    }
    Ok(())
}

/// Validate and mint one certificate. Assumes the caller already passed
/// the authorization guard.
fn mint(
    staged: &mut Staged<'_>,
    issuer: &AccountId,
    req: CertificateRequest,
) -> Result<CertificateId, RegistryError> {
    validate_request(staged, &req)?;

    let mut institution = staged
        .institution(issuer)
        .cloned()
        .ok_or_else(|| RegistryError::unauthorized(format!("{issuer} has no institution record")))?;

    let id = staged.allocate_id()?;
    let certificate = Certificate {
        id,
        recipient: req.recipient,
        recipient_name: req.recipient_name,
        institution_name: institution.name.clone(),
        course_name: req.course_name,
        grade: req.grade,
        issued_at: staged.now(),
        completion_date: req.completion_date,
        content_ref: req.content_ref,
        valid: true,
        issuer: *issuer,
        cert_type: req.cert_type,
    };

    staged.claim_content_ref(certificate.content_ref.clone(), id);
    staged.bind_owner(id, certificate.recipient)?;
    institution.issued_count += 1;
    staged.put_institution(*issuer, institution);

    let event = RegistryEvent::CertificateIssued {
        id,
        recipient: certificate.recipient,
        issuer: *issuer,
        course_name: certificate.course_name.clone(),
        content_ref: certificate.content_ref.clone(),
    };
    staged.put_certificate(certificate);
    staged.emit(event)?;
    Ok(id)
}

pub(crate) fn issue_certificate(
    staged: &mut Staged<'_>,
    principal: Principal<'_>,
    req: CertificateRequest,
) -> Result<CertificateId, RegistryError> {
    enforce(&[Guard::AuthorizedInstitution], staged, principal)?;
    mint(staged, principal.caller, req)
}

pub(crate) fn batch_issue_certificates(
    staged: &mut Staged<'_>,
    principal: Principal<'_>,
    max_batch_size: usize,
    batch: BatchIssueRequest,
) -> Result<Vec<CertificateId>, RegistryError> {
    enforce(&[Guard::AuthorizedInstitution], staged, principal)?;
    let requests = batch.into_requests()?;
    if requests.len() > max_batch_size {
        return Err(RegistryError::invalid(format!(
            "batch of {} exceeds the limit of {max_batch_size}",
            requests.len()
        )));
    }
    let mut ids = Vec::with_capacity(requests.len());
    for (index, req) in requests.into_iter().enumerate() {
        let id = mint(staged, principal.caller, req).map_err(|e| {
            tracing::debug!(entry = index + 1, error = %e, "batch entry rejected");
            e
        })?;
        ids.push(id);
    }
    Ok(ids)
}

pub(crate) fn revoke_certificate(
    staged: &mut Staged<'_>,
    principal: Principal<'_>,
    id: CertificateId,
) -> Result<(), RegistryError> {
    let mut certificate = staged
        .certificate(id)
        .cloned()
        .ok_or(RegistryError::NotFound(id))?;
    enforce(
        &[Guard::IssuerOrAdministrator(certificate.issuer)],
        staged,
        principal,
    )?;
    certificate.valid = false;
    staged.put_certificate(certificate);
    staged.emit(RegistryEvent::CertificateRevoked {
        id,
        revoked_by: *principal.caller,
    })
}
