//! # Event Log: Hash-Chained Audit Trail
//!
//! Every committed mutation appends one [`EventRecord`] per emitted
//! notification. Each record's hash covers its sequence number, its
//! timestamp, the event payload and the previous record's hash, so any
//! edit, deletion or reordering of history is detectable by
//! [`EventLog::verify_chain`].
//!
//! The log is part of the ledger state and is committed atomically with
//! the records it describes. Observers registered on the registry see each
//! record after the commit, never before.

use certreg_core::{sha256_digest, AccountId, CanonicalBytes, CertificateId, ContentRef, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// `previous_hash` of the first record.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

// ---------------------------------------------------------------------------
// RegistryEvent
// ---------------------------------------------------------------------------

/// An observable notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A certificate was minted.
    CertificateIssued {
        id: CertificateId,
        recipient: AccountId,
        issuer: AccountId,
        course_name: String,
        content_ref: ContentRef,
    },
    /// An account registered and became authorized.
    InstitutionAuthorized { institution: AccountId, name: String },
    /// The administrative owner cleared an institution's authorization.
    InstitutionRevoked { institution: AccountId },
    /// A certificate's validity flag was cleared (or re-cleared).
    CertificateRevoked {
        id: CertificateId,
        revoked_by: AccountId,
    },
}

impl RegistryEvent {
    /// Stable event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CertificateIssued { .. } => "certificate_issued",
            Self::InstitutionAuthorized { .. } => "institution_authorized",
            Self::InstitutionRevoked { .. } => "institution_revoked",
            Self::CertificateRevoked { .. } => "certificate_revoked",
        }
    }

    /// The certificate this event concerns, if any.
    pub fn certificate_id(&self) -> Option<CertificateId> {
        match self {
            Self::CertificateIssued { id, .. } | Self::CertificateRevoked { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Recipient of a mint.
    pub fn recipient(&self) -> Option<&AccountId> {
        match self {
            Self::CertificateIssued { recipient, .. } => Some(recipient),
            _ => None,
        }
    }

    /// Whether `account` appears in an institution-side correlation field:
    /// the issuer of a mint, the subject of an authorization change, or the
    /// revoker of a certificate.
    pub fn involves_institution(&self, account: &AccountId) -> bool {
        match self {
            Self::CertificateIssued { issuer, .. } => issuer == account,
            Self::InstitutionAuthorized { institution, .. }
            | Self::InstitutionRevoked { institution } => institution == account,
            Self::CertificateRevoked { revoked_by, .. } => revoked_by == account,
        }
    }
}

impl std::fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EventRecord
// ---------------------------------------------------------------------------

/// One link in the audit chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// 1-based position in the log.
    pub sequence: u64,
    /// Commit instant of the mutation that emitted the event.
    pub recorded_at: Timestamp,
    pub event: RegistryEvent,
    /// `event_hash` of the preceding record, or [`GENESIS_HASH`].
    pub previous_hash: String,
    /// SHA-256 over the canonical form of the four fields above.
    pub event_hash: String,
}

#[derive(Serialize)]
struct HashInput<'a> {
    sequence: u64,
    recorded_at: Timestamp,
    event: &'a RegistryEvent,
    previous_hash: &'a str,
}

impl EventRecord {
    /// Build and hash the record that follows `previous_hash`.
    pub(crate) fn seal(
        sequence: u64,
        recorded_at: Timestamp,
        event: RegistryEvent,
        previous_hash: &str,
    ) -> Result<Self, RegistryError> {
        let event_hash = compute_hash(sequence, recorded_at, &event, previous_hash)?;
        Ok(Self {
            sequence,
            recorded_at,
            event,
            previous_hash: previous_hash.to_string(),
            event_hash,
        })
    }

    /// Recompute the hash from the record's fields.
    pub fn recompute_hash(&self) -> Result<String, RegistryError> {
        compute_hash(
            self.sequence,
            self.recorded_at,
            &self.event,
            &self.previous_hash,
        )
    }
}

fn compute_hash(
    sequence: u64,
    recorded_at: Timestamp,
    event: &RegistryEvent,
    previous_hash: &str,
) -> Result<String, RegistryError> {
    let canonical = CanonicalBytes::new(&HashInput {
        sequence,
        recorded_at,
        event,
        previous_hash,
    })?;
    Ok(sha256_digest(&canonical).to_hex())
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Result of chain integrity verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainIntegrity {
    pub total_events: usize,
    /// Records whose `previous_hash` does not match the preceding record,
    /// or whose sequence number is out of place.
    pub broken_links: usize,
    /// Records whose stored hash does not match their contents.
    pub tampered_records: usize,
    pub chain_valid: bool,
}

/// Append-only sequence of [`EventRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hash the next record must chain to.
    pub fn head_hash(&self) -> &str {
        self.records
            .last()
            .map(|r| r.event_hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    /// Records concerning a certificate, in log order.
    pub fn for_certificate(&self, id: CertificateId) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|r| r.event.certificate_id() == Some(id))
            .cloned()
            .collect()
    }

    /// Records in which `account` acted as or was the subject institution.
    pub fn for_institution(&self, account: &AccountId) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|r| r.event.involves_institution(account))
            .cloned()
            .collect()
    }

    /// Mint records whose recipient is `holder`, in log order.
    pub fn for_recipient(&self, holder: &AccountId) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|r| r.event.recipient() == Some(holder))
            .cloned()
            .collect()
    }

    pub(crate) fn push(&mut self, record: EventRecord) {
        self.records.push(record);
    }

    /// Walk the chain and recompute every hash.
    pub fn verify_chain(&self) -> ChainIntegrity {
        let mut broken_links = 0;
        let mut tampered_records = 0;
        let mut expected_prev = GENESIS_HASH;

        for (idx, record) in self.records.iter().enumerate() {
            if record.previous_hash != expected_prev || record.sequence != idx as u64 + 1 {
                broken_links += 1;
            }
            match record.recompute_hash() {
                Ok(hash) if hash == record.event_hash => {}
                _ => tampered_records += 1,
            }
            expected_prev = record.event_hash.as_str();
        }

        ChainIntegrity {
            total_events: self.records.len(),
            broken_links,
            tampered_records,
            chain_valid: broken_links == 0 && tampered_records == 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

/// Receives each committed event record.
///
/// Called after the registry has released its write lock, so an observer
/// may freely query or even mutate the registry.
pub trait EventObserver: Send + Sync {
    fn on_event(&self, record: &EventRecord);
}

impl<F> EventObserver for F
where
    F: Fn(&EventRecord) + Send + Sync,
{
    fn on_event(&self, record: &EventRecord) {
        self(record)
    }
}
