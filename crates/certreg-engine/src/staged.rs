//! Staging overlay.
//!
//! A [`Staged`] view reads through its pending [`WriteBatch`] to the
//! committed [`LedgerState`] underneath. Operations validate and write
//! against the overlay only, so a batch issuance sees its own earlier
//! entries (a repeated content reference inside one batch is a duplicate)
//! while the committed state stays untouched until the whole batch
//! succeeds.

use certreg_core::{AccountId, CertificateId, ContentRef, Timestamp};

use crate::error::RegistryError;
use crate::events::{EventRecord, RegistryEvent};
use crate::model::{Certificate, Institution};
use crate::state::{LedgerState, WriteBatch};

pub(crate) struct Staged<'a> {
    base: &'a LedgerState,
    now: Timestamp,
    batch: WriteBatch,
}

impl<'a> Staged<'a> {
    pub(crate) fn new(base: &'a LedgerState, now: Timestamp) -> Self {
        let batch = WriteBatch {
            last_id: base.last_id(),
            ..WriteBatch::default()
        };
        Self { base, now, batch }
    }

    /// The single instant every effect of this operation is stamped with.
    pub(crate) fn now(&self) -> Timestamp {
        self.now
    }

    // ---- institutions ----

    pub(crate) fn institution(&self, account: &AccountId) -> Option<&Institution> {
        self.batch
            .institutions
            .get(account)
            .or_else(|| self.base.institution(account))
    }

    pub(crate) fn put_institution(&mut self, account: AccountId, institution: Institution) {
        self.batch.institutions.insert(account, institution);
    }

    // ---- certificates ----

    pub(crate) fn certificate(&self, id: CertificateId) -> Option<&Certificate> {
        self.batch
            .certificates
            .get(&id)
            .or_else(|| self.base.certificate(id))
    }

    pub(crate) fn put_certificate(&mut self, certificate: Certificate) {
        self.batch.certificates.insert(certificate.id, certificate);
    }

    /// Reserve the next sequential identifier.
    pub(crate) fn allocate_id(&mut self) -> Result<CertificateId, RegistryError> {
        let next = self
            .batch
            .last_id
            .next()
            .ok_or_else(|| RegistryError::invalid("certificate identifier space exhausted"))?;
        self.batch.last_id = next;
        Ok(next)
    }

    // ---- content references ----

    pub(crate) fn content_ref_claimed(&self, content_ref: &ContentRef) -> bool {
        self.batch.content_refs.contains_key(content_ref)
            || self.base.content_ref_owner(content_ref).is_some()
    }

    pub(crate) fn claim_content_ref(&mut self, content_ref: ContentRef, id: CertificateId) {
        self.batch.content_refs.insert(content_ref, id);
    }

    // ---- holders and ownership ----

    pub(crate) fn is_bound(&self, id: CertificateId) -> bool {
        self.base.ownership().exists(id) || self.batch.bindings.iter().any(|(b, _)| *b == id)
    }

    pub(crate) fn bind_owner(
        &mut self,
        id: CertificateId,
        holder: AccountId,
    ) -> Result<(), RegistryError> {
        if self.is_bound(id) {
            return Err(RegistryError::invalid(format!(
                "certificate {id} already has a holder"
            )));
        }
        self.batch.bindings.push((id, holder));
        self.batch.holder_appends.push((holder, id));
        Ok(())
    }

    // ---- events ----

    /// Seal `event` onto the chain after the last staged or committed record.
    pub(crate) fn emit(&mut self, event: RegistryEvent) -> Result<(), RegistryError> {
        let sequence = (self.base.events().len() + self.batch.events.len()) as u64 + 1;
        let previous_hash = self
            .batch
            .events
            .last()
            .map(|r| r.event_hash.as_str())
            .unwrap_or_else(|| self.base.events().head_hash());
        let record = EventRecord::seal(sequence, self.now, event, previous_hash)?;
        self.batch.events.push(record);
        Ok(())
    }

    pub(crate) fn into_batch(self) -> WriteBatch {
        self.batch
    }
}
