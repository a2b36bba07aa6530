//! # Ledger State and Write Batches
//!
//! [`LedgerState`] is the complete durable state of the registry: the
//! institution directory, certificate records, the holder index, the
//! content-reference index, ownership bindings, the identifier high-water
//! mark, the event log and the pinned administrator. All of it is updated
//! together through a [`WriteBatch`], so a commit is atomic across every
//! index.

use std::collections::BTreeMap;

use certreg_core::{AccountId, CertificateId, ContentRef};
use serde::{Deserialize, Serialize};

use crate::events::{EventLog, EventRecord};
use crate::model::{Certificate, Institution};
use crate::ownership::OwnershipLedger;

/// Durable registry state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub(crate) institutions: BTreeMap<AccountId, Institution>,
    pub(crate) certificates: BTreeMap<CertificateId, Certificate>,
    pub(crate) holders: BTreeMap<AccountId, Vec<CertificateId>>,
    pub(crate) content_refs: BTreeMap<ContentRef, CertificateId>,
    pub(crate) ownership: OwnershipLedger,
    pub(crate) last_id: CertificateId,
    pub(crate) events: EventLog,
    /// Recorded by the first commit and never changed afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) administrator: Option<AccountId>,
}

impl LedgerState {
    /// Empty ledger already pinned to `administrator`.
    pub fn with_administrator(administrator: AccountId) -> Self {
        Self {
            administrator: Some(administrator),
            ..Self::default()
        }
    }

    /// Administrator this ledger was initialized for, if pinned yet.
    pub fn administrator(&self) -> Option<AccountId> {
        self.administrator
    }

    pub fn institution(&self, account: &AccountId) -> Option<&Institution> {
        self.institutions.get(account)
    }

    pub fn institutions(&self) -> impl Iterator<Item = (&AccountId, &Institution)> {
        self.institutions.iter()
    }

    pub fn certificate(&self, id: CertificateId) -> Option<&Certificate> {
        self.certificates.get(&id)
    }

    /// All certificates in identifier order.
    pub fn certificates(&self) -> impl Iterator<Item = &Certificate> {
        self.certificates.values()
    }

    /// Holder index entry: identifiers in issuance order.
    pub fn holder_certificates(&self, holder: &AccountId) -> &[CertificateId] {
        self.holders.get(holder).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Identifier that claimed `content_ref`, if any.
    pub fn content_ref_owner(&self, content_ref: &ContentRef) -> Option<CertificateId> {
        self.content_refs.get(content_ref).copied()
    }

    pub fn ownership(&self) -> &OwnershipLedger {
        &self.ownership
    }

    /// Highest identifier minted so far.
    pub fn last_id(&self) -> CertificateId {
        self.last_id
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Fold a batch into this state. Every precondition was checked while
    /// staging; applying cannot fail.
    pub fn apply(&mut self, batch: &WriteBatch) {
        for (account, institution) in &batch.institutions {
            self.institutions.insert(*account, institution.clone());
        }
        for (id, certificate) in &batch.certificates {
            self.certificates.insert(*id, certificate.clone());
        }
        for (holder, id) in &batch.holder_appends {
            self.holders.entry(*holder).or_default().push(*id);
        }
        for (content_ref, id) in &batch.content_refs {
            self.content_refs.entry(content_ref.clone()).or_insert(*id);
        }
        for (id, holder) in &batch.bindings {
            self.ownership.bind(*id, *holder);
        }
        if batch.last_id > self.last_id {
            self.last_id = batch.last_id;
        }
        for record in &batch.events {
            self.events.push(record.clone());
        }
        if self.administrator.is_none() {
            self.administrator = batch.administrator;
        }
    }

    /// Cross-check every index against the certificate records.
    ///
    /// Run on state loaded from durable storage before it is trusted.
    ///
    /// # Errors
    ///
    /// A description of the first inconsistency found.
    pub fn verify_indexes(&self) -> Result<(), String> {
        let minted = self.last_id.get();
        if self.certificates.len() as u64 != minted {
            return Err(format!(
                "{} certificate records but high-water mark is {minted}",
                self.certificates.len()
            ));
        }
        if self.content_refs.len() != self.certificates.len() {
            return Err(format!(
                "{} content references indexed for {} certificates",
                self.content_refs.len(),
                self.certificates.len()
            ));
        }
        let mut expected_holders: BTreeMap<AccountId, Vec<CertificateId>> = BTreeMap::new();
        for (expected, (id, cert)) in (1..=minted).zip(&self.certificates) {
            if id.get() != expected || cert.id != *id {
                return Err(format!("certificate identifiers not contiguous at {id}"));
            }
            if self.content_refs.get(&cert.content_ref) != Some(id) {
                return Err(format!(
                    "content reference {} not indexed to certificate {id}",
                    cert.content_ref
                ));
            }
            if self.ownership.owner_of(*id) != Some(cert.recipient) {
                return Err(format!("certificate {id} not bound to its recipient"));
            }
            expected_holders.entry(cert.recipient).or_default().push(*id);
        }
        if self.ownership.len() != self.certificates.len() {
            return Err("ownership bindings exist for unminted identifiers".to_string());
        }
        if expected_holders != self.holders {
            return Err("holder index disagrees with certificate recipients".to_string());
        }
        Ok(())
    }
}

/// The staged effects of one mutating operation.
///
/// Holds final values for touched institution and certificate records plus
/// appends to the holder index, content-reference claims, new ownership
/// bindings and sealed event records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    pub(crate) institutions: BTreeMap<AccountId, Institution>,
    pub(crate) certificates: BTreeMap<CertificateId, Certificate>,
    pub(crate) holder_appends: Vec<(AccountId, CertificateId)>,
    pub(crate) content_refs: BTreeMap<ContentRef, CertificateId>,
    pub(crate) bindings: Vec<(CertificateId, AccountId)>,
    pub(crate) last_id: CertificateId,
    pub(crate) events: Vec<EventRecord>,
    pub(crate) administrator: Option<AccountId>,
}

impl WriteBatch {
    /// True when the batch touches nothing.
    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty()
            && self.certificates.is_empty()
            && self.holder_appends.is_empty()
            && self.content_refs.is_empty()
            && self.bindings.is_empty()
            && self.events.is_empty()
            && self.administrator.is_none()
    }

    /// Event records the batch appends.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Identifiers newly minted by the batch, ascending.
    pub fn minted(&self) -> Vec<CertificateId> {
        self.bindings.iter().map(|(id, _)| *id).collect()
    }

    pub(crate) fn into_events(self) -> Vec<EventRecord> {
        self.events
    }
}
