//! # Registry Records
//!
//! Institution and certificate records, the issuance request shapes, and
//! the soft-lookup result of content-reference verification.

use certreg_core::{
    sha256_digest, AccountId, CanonicalBytes, CanonicalizationError, CertificateId, ContentDigest,
    ContentRef, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

// ── Institution ─────────────────────────────────────────────────────

/// An issuer account's directory entry.
///
/// Created on registration and never deleted. A revoked institution keeps
/// its record and its issued certificates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    /// Display name, snapshotted into each certificate at issuance.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Cleared only by the administrative owner.
    pub authorized: bool,
    /// Time of the most recent registration.
    pub registered_at: Timestamp,
    /// Certificates issued since the most recent registration.
    pub issued_count: u64,
}

/// Public projection of an [`Institution`]. Zero-valued for accounts that
/// never registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionStats {
    /// Display name.
    pub name: String,
    /// Whether the account may currently issue.
    pub authorized: bool,
    /// Time of the most recent registration.
    pub registered_at: Timestamp,
    /// Certificates issued since the most recent registration.
    pub issued_count: u64,
}

impl From<&Institution> for InstitutionStats {
    fn from(inst: &Institution) -> Self {
        Self {
            name: inst.name.clone(),
            authorized: inst.authorized,
            registered_at: inst.registered_at,
            issued_count: inst.issued_count,
        }
    }
}

// ── Certificate ─────────────────────────────────────────────────────

/// An issued credential record.
///
/// Mutated only by revocation, which can flip `valid` from true to false
/// and never back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Sequential identifier, 1-based.
    pub id: CertificateId,
    /// Recipient identity, bound as holder at mint.
    pub recipient: AccountId,
    /// Recipient display name.
    pub recipient_name: String,
    /// Issuer's display name at issuance time.
    pub institution_name: String,
    /// Course or program name.
    pub course_name: String,
    /// Free-text grade.
    pub grade: String,
    /// Set by the registry at mint.
    pub issued_at: Timestamp,
    /// Supplied by the issuer; never after `issued_at`.
    pub completion_date: Timestamp,
    /// Globally unique reference to the off-ledger document.
    pub content_ref: ContentRef,
    /// Current validity.
    pub valid: bool,
    /// Account that issued the certificate.
    pub issuer: AccountId,
    /// Free-text type label (e.g. "diploma", "transcript").
    pub cert_type: String,
}

impl Certificate {
    /// Content-addressed fingerprint of the record in its current state.
    ///
    /// Two parties holding the same record compute the same digest, so a
    /// verifier can compare a presented copy against the registry's.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&CanonicalBytes::new(self)?))
    }
}

// ── Requests ────────────────────────────────────────────────────────

/// Caller-supplied fields of one issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    /// Recipient identity. Must be non-zero.
    pub recipient: AccountId,
    /// Must be non-empty.
    pub recipient_name: String,
    /// Must be non-empty.
    pub course_name: String,
    /// Free text, may be empty.
    #[serde(default)]
    pub grade: String,
    /// Must be non-empty and never used before.
    pub content_ref: ContentRef,
    /// Must not be later than the issuance instant.
    pub completion_date: Timestamp,
    /// Free text, may be empty.
    #[serde(default)]
    pub cert_type: String,
}

/// Batch issuance as parallel per-field arrays.
///
/// The arrays must all have the same length; entry `i` of each array
/// forms the `i`-th issuance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchIssueRequest {
    pub recipients: Vec<AccountId>,
    pub recipient_names: Vec<String>,
    pub course_names: Vec<String>,
    pub grades: Vec<String>,
    pub content_refs: Vec<ContentRef>,
    pub completion_dates: Vec<Timestamp>,
    pub cert_types: Vec<String>,
}

impl BatchIssueRequest {
    /// Number of recipients, which is the batch length when well-formed.
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    fn lengths(&self) -> [usize; 7] {
        [
            self.recipients.len(),
            self.recipient_names.len(),
            self.course_names.len(),
            self.grades.len(),
            self.content_refs.len(),
            self.completion_dates.len(),
            self.cert_types.len(),
        ]
    }

    /// Zip the arrays into per-certificate requests, in input order.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidInput`] if the arrays differ in length.
    pub fn into_requests(self) -> Result<Vec<CertificateRequest>, RegistryError> {
        let lengths = self.lengths();
        if lengths.iter().any(|&l| l != lengths[0]) {
            return Err(RegistryError::invalid(format!(
                "batch arrays differ in length: {lengths:?}"
            )));
        }
        let mut out = Vec::with_capacity(lengths[0]);
        let mut names = self.recipient_names.into_iter();
        let mut courses = self.course_names.into_iter();
        let mut grades = self.grades.into_iter();
        let mut refs = self.content_refs.into_iter();
        let mut dates = self.completion_dates.into_iter();
        let mut types = self.cert_types.into_iter();
        for recipient in self.recipients {
            match (
                names.next(),
                courses.next(),
                grades.next(),
                refs.next(),
                dates.next(),
                types.next(),
            ) {
                (
                    Some(recipient_name),
                    Some(course_name),
                    Some(grade),
                    Some(content_ref),
                    Some(completion_date),
                    Some(cert_type),
                ) => out.push(CertificateRequest {
                    recipient,
                    recipient_name,
                    course_name,
                    grade,
                    content_ref,
                    completion_date,
                    cert_type,
                }),
                _ => return Err(RegistryError::invalid("batch arrays differ in length")),
            }
        }
        Ok(out)
    }
}

impl From<Vec<CertificateRequest>> for BatchIssueRequest {
    fn from(requests: Vec<CertificateRequest>) -> Self {
        let mut batch = Self::default();
        for r in requests {
            batch.recipients.push(r.recipient);
            batch.recipient_names.push(r.recipient_name);
            batch.course_names.push(r.course_name);
            batch.grades.push(r.grade);
            batch.content_refs.push(r.content_ref);
            batch.completion_dates.push(r.completion_date);
            batch.cert_types.push(r.cert_type);
        }
        batch
    }
}

// ── Lookup result ───────────────────────────────────────────────────

/// Result of verification by content reference.
///
/// An unused reference is not an error: it yields `exists = false`, the
/// zero identifier and a default record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRefLookup {
    pub exists: bool,
    pub id: CertificateId,
    pub certificate: Certificate,
}

impl ContentRefLookup {
    /// The soft "not found" result.
    pub fn not_found() -> Self {
        Self::default()
    }

    pub(crate) fn found(certificate: Certificate) -> Self {
        Self {
            exists: true,
            id: certificate.id,
            certificate,
        }
    }
}
