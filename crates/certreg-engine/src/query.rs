//! # Query and Verification
//!
//! Read-only lookups over a committed [`LedgerState`]. Callers reach these
//! through [`CertificateRegistry`](crate::CertificateRegistry), which takes
//! a shared read lock, so a query sees either all or none of any write.

use certreg_core::{AccountId, CertificateId, ContentRef};

use crate::error::RegistryError;
use crate::model::{Certificate, ContentRefLookup};
use crate::state::LedgerState;

/// Full record for `id`, including its current validity flag.
///
/// Does not reject revoked certificates; the caller checks `valid`.
///
/// # Errors
///
/// [`RegistryError::NotFound`] if `id` has no ownership binding.
pub fn verify_certificate(state: &LedgerState, id: CertificateId) -> Result<Certificate, RegistryError> {
    if !state.ownership().exists(id) {
        return Err(RegistryError::NotFound(id));
    }
    state
        .certificate(id)
        .cloned()
        .ok_or(RegistryError::NotFound(id))
}

/// Look up a certificate by content reference via the direct index.
pub fn verify_by_content_ref(state: &LedgerState, content_ref: &ContentRef) -> ContentRefLookup {
    state
        .content_ref_owner(content_ref)
        .and_then(|id| state.certificate(id))
        .map(|cert| ContentRefLookup::found(cert.clone()))
        .unwrap_or_else(ContentRefLookup::not_found)
}

/// Look up a certificate by content reference by scanning identifiers
/// from 1 upward and comparing references byte for byte.
///
/// Agrees with [`verify_by_content_ref`] on every state that passes
/// [`LedgerState::verify_indexes`].
pub fn scan_by_content_ref(state: &LedgerState, content_ref: &ContentRef) -> ContentRefLookup {
    (1..=state.last_id().get())
        .filter_map(|n| state.certificate(CertificateId::new(n)))
        .find(|cert| cert.content_ref.as_str().as_bytes() == content_ref.as_str().as_bytes())
        .map(|cert| ContentRefLookup::found(cert.clone()))
        .unwrap_or_else(ContentRefLookup::not_found)
}

/// Holder's identifiers in issuance order.
pub fn holder_certificates(state: &LedgerState, holder: &AccountId) -> Vec<CertificateId> {
    state.holder_certificates(holder).to_vec()
}

/// Identifiers minted so far, counting revoked ones.
pub fn total_certificates(state: &LedgerState) -> u64 {
    state.last_id().get()
}
