//! # Ownership Bindings
//!
//! Each minted identifier is bound to exactly one holder at mint time.
//! Bindings are never rebound: certificates are credentials of the
//! recipient, so the ledger exposes no transfer operation, and the holder
//! index can never drift from the bindings.

use std::collections::BTreeMap;

use certreg_core::{AccountId, CertificateId};
use serde::{Deserialize, Serialize};

/// Mint-once map from certificate identifier to holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnershipLedger {
    owners: BTreeMap<CertificateId, AccountId>,
}

impl OwnershipLedger {
    /// Current holder of `id`.
    pub fn owner_of(&self, id: CertificateId) -> Option<AccountId> {
        self.owners.get(&id).copied()
    }

    /// Whether `id` has been minted.
    pub fn exists(&self, id: CertificateId) -> bool {
        self.owners.contains_key(&id)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Identifiers bound to `holder`, ascending.
    pub fn held_by(&self, holder: &AccountId) -> Vec<CertificateId> {
        self.owners
            .iter()
            .filter(|(_, owner)| *owner == holder)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Record a binding. The first binding for an identifier wins; later
    /// calls for the same identifier return `false` and change nothing.
    pub(crate) fn bind(&mut self, id: CertificateId, holder: AccountId) -> bool {
        match self.owners.entry(id) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(holder);
                true
            }
        }
    }
}
