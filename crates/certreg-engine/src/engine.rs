//! # Certificate Registry
//!
//! The public operation surface. [`CertificateRegistry`] owns the ledger
//! state behind a single `parking_lot::RwLock`:
//!
//! - Mutations take the write lock for the whole span of guard checks,
//!   validation, backend commit and in-memory apply. No two mutations
//!   interleave, and none can re-enter the registry while holding the
//!   lock, because the staged operation only ever sees the staging
//!   overlay and never the registry itself.
//! - Queries take the read lock and run concurrently with each other. They
//!   observe the state before or after any write, never a partial one.
//! - Observers run after the write lock is released.
//!
//! Every mutating operation takes the caller identity as its first argument.

use std::sync::Arc;

use certreg_core::{AccountId, CertificateId, ContentRef};
use parking_lot::RwLock;

use crate::backend::{LedgerBackend, MemoryBackend};
use crate::clock::{Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::directory;
use crate::error::{ErrorKind, RegistryError};
use crate::events::{ChainIntegrity, EventObserver, EventRecord};
use crate::guard::Principal;
use crate::model::{
    BatchIssueRequest, Certificate, CertificateRequest, ContentRefLookup, Institution,
    InstitutionStats,
};
use crate::query;
use crate::registry;
use crate::staged::Staged;
use crate::state::LedgerState;

struct Inner {
    config: RegistryConfig,
    state: RwLock<LedgerState>,
    backend: Box<dyn LedgerBackend>,
    clock: Arc<dyn Clock>,
    observers: RwLock<Vec<Arc<dyn EventObserver>>>,
}

/// Shared handle to a registry. Clones refer to the same registry.
#[derive(Clone)]
pub struct CertificateRegistry {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CertificateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("CertificateRegistry")
            .field("config", &self.inner.config)
            .field("total_certificates", &state.last_id().get())
            .field("events", &state.events().len())
            .finish()
    }
}

/// Assembles a [`CertificateRegistry`] from its collaborators.
pub struct RegistryBuilder {
    config: RegistryConfig,
    backend: Box<dyn LedgerBackend>,
    clock: Arc<dyn Clock>,
}

impl RegistryBuilder {
    /// Defaults: [`MemoryBackend`] and [`SystemClock`].
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            backend: Box::new(MemoryBackend::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn backend(mut self, backend: impl LedgerBackend + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Validate the configuration and load any committed state.
    ///
    /// A ledger is pinned to the administrator of its first commit. An
    /// unpinned ledger is pinned to the configured administrator by the
    /// next commit.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidInput`] for an invalid configuration or one
    /// naming a different administrator than the ledger was initialized
    /// for, [`RegistryError::Storage`] if the backend cannot be read.
    pub fn build(self) -> Result<CertificateRegistry, RegistryError> {
        self.config
            .validate()
            .map_err(|e| RegistryError::invalid(e.to_string()))?;
        let state = self.backend.load()?.unwrap_or_default();
        if let Some(pinned) = state.administrator() {
            if pinned != self.config.admin {
                tracing::error!(
                    pinned = %pinned,
                    configured = %self.config.admin,
                    "configured administrator does not own this ledger"
                );
                return Err(RegistryError::invalid(format!(
                    "ledger administrator is {pinned}, configuration names {}",
                    self.config.admin
                )));
            }
        }
        tracing::info!(
            admin = %self.config.admin,
            max_batch_size = self.config.max_batch_size,
            certificates = state.last_id().get(),
            "certificate registry ready"
        );
        Ok(CertificateRegistry {
            inner: Arc::new(Inner {
                config: self.config,
                state: RwLock::new(state),
                backend: self.backend,
                clock: self.clock,
                observers: RwLock::new(Vec::new()),
            }),
        })
    }
}

impl CertificateRegistry {
    pub fn builder(config: RegistryConfig) -> RegistryBuilder {
        RegistryBuilder::new(config)
    }

    /// In-memory registry on the system clock.
    pub fn in_memory(config: RegistryConfig) -> Result<Self, RegistryError> {
        RegistryBuilder::new(config).build()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// The administrative owner.
    pub fn administrator(&self) -> AccountId {
        self.inner.config.admin
    }

    /// Register an observer for committed events.
    pub fn subscribe(&self, observer: Arc<dyn EventObserver>) {
        self.inner.observers.write().push(observer);
    }

    // ── Mutation core ───────────────────────────────────────────────

    fn mutate<R>(
        &self,
        operation: &'static str,
        caller: &AccountId,
        op: impl FnOnce(&mut Staged<'_>, Principal<'_>) -> Result<R, RegistryError>,
    ) -> Result<R, RegistryError> {
        let admin = self.inner.config.admin;
        let principal = Principal {
            caller,
            admin: &admin,
        };

        let (out, events) = {
            let mut state = self.inner.state.write();
            let now = self.inner.clock.now();
            let mut staged = Staged::new(&*state, now);
            let out = match op(&mut staged, principal) {
                Ok(out) => out,
                Err(e) => {
                    log_rejection(operation, caller, &e);
                    return Err(e);
                }
            };
            let mut batch = staged.into_batch();
            if !batch.is_empty() && state.administrator().is_none() {
                batch.administrator = Some(admin);
            }
            if !batch.is_empty() {
                if let Err(e) = self.inner.backend.commit(&state, &batch) {
                    tracing::error!(operation, error = %e, "ledger commit failed");
                    return Err(e.into());
                }
                state.apply(&batch);
            }
            (out, batch.into_events())
        };

        for record in &events {
            tracing::info!(
                operation,
                caller = %caller,
                sequence = record.sequence,
                event = record.event.as_str(),
                certificate = ?record.event.certificate_id().map(|id| id.get()),
                "registry event committed"
            );
        }
        if !events.is_empty() {
            let observers = self.inner.observers.read().clone();
            for record in &events {
                for observer in &observers {
                    observer.on_event(record);
                }
            }
        }
        Ok(out)
    }

    // ── Authorization directory ─────────────────────────────────────

    /// Register `caller` as an authorized institution.
    pub fn register_institution(
        &self,
        caller: &AccountId,
        name: &str,
        email: &str,
    ) -> Result<(), RegistryError> {
        self.mutate("register_institution", caller, |staged, principal| {
            directory::register_institution(staged, principal.caller, name, email)
        })
    }

    /// Clear `institution`'s authorization. Administrator only.
    pub fn revoke_institution(
        &self,
        caller: &AccountId,
        institution: &AccountId,
    ) -> Result<(), RegistryError> {
        self.mutate("revoke_institution", caller, |staged, principal| {
            directory::revoke_institution(staged, principal, institution)
        })
    }

    /// Overwrite the caller's display name and email.
    pub fn update_institution_info(
        &self,
        caller: &AccountId,
        new_name: &str,
        new_email: &str,
    ) -> Result<(), RegistryError> {
        self.mutate("update_institution_info", caller, |staged, principal| {
            directory::update_institution_info(staged, principal, new_name, new_email)
        })
    }

    pub fn get_institution_stats(&self, institution: &AccountId) -> InstitutionStats {
        directory::institution_stats(&self.inner.state.read(), institution)
    }

    /// Full directory entry, including the contact email.
    pub fn get_institution(&self, institution: &AccountId) -> Option<Institution> {
        self.inner.state.read().institution(institution).cloned()
    }

    // ── Certificate registry ────────────────────────────────────────

    /// Mint one certificate and return its identifier.
    pub fn issue_certificate(
        &self,
        caller: &AccountId,
        request: CertificateRequest,
    ) -> Result<CertificateId, RegistryError> {
        self.mutate("issue_certificate", caller, |staged, principal| {
            registry::issue_certificate(staged, principal, request)
        })
    }

    /// Mint every entry of `batch` in order, or none of them.
    pub fn batch_issue_certificates(
        &self,
        caller: &AccountId,
        batch: BatchIssueRequest,
    ) -> Result<Vec<CertificateId>, RegistryError> {
        let max = self.inner.config.max_batch_size;
        self.mutate("batch_issue_certificates", caller, |staged, principal| {
            registry::batch_issue_certificates(staged, principal, max, batch)
        })
    }

    /// Clear a certificate's validity flag. Re-revoking succeeds and
    /// emits the event again.
    pub fn revoke_certificate(
        &self,
        caller: &AccountId,
        id: CertificateId,
    ) -> Result<(), RegistryError> {
        self.mutate("revoke_certificate", caller, |staged, principal| {
            registry::revoke_certificate(staged, principal, id)
        })
    }

    // ── Ownership ───────────────────────────────────────────────────

    pub fn certificate_exists(&self, id: CertificateId) -> bool {
        self.inner.state.read().ownership().exists(id)
    }

    pub fn owner_of(&self, id: CertificateId) -> Option<AccountId> {
        self.inner.state.read().ownership().owner_of(id)
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn verify_certificate(&self, id: CertificateId) -> Result<Certificate, RegistryError> {
        query::verify_certificate(&self.inner.state.read(), id)
    }

    pub fn verify_certificate_by_content_ref(&self, content_ref: &ContentRef) -> ContentRefLookup {
        query::verify_by_content_ref(&self.inner.state.read(), content_ref)
    }

    pub fn get_holder_certificates(&self, holder: &AccountId) -> Vec<CertificateId> {
        query::holder_certificates(&self.inner.state.read(), holder)
    }

    pub fn get_total_certificates(&self) -> u64 {
        query::total_certificates(&self.inner.state.read())
    }

    // ── Audit ───────────────────────────────────────────────────────

    pub fn events(&self) -> Vec<EventRecord> {
        self.inner.state.read().events().records().to_vec()
    }

    pub fn events_for_certificate(&self, id: CertificateId) -> Vec<EventRecord> {
        self.inner.state.read().events().for_certificate(id)
    }

    pub fn events_for_institution(&self, institution: &AccountId) -> Vec<EventRecord> {
        self.inner.state.read().events().for_institution(institution)
    }

    /// Issuance records naming `holder` as recipient.
    pub fn events_for_holder(&self, holder: &AccountId) -> Vec<EventRecord> {
        self.inner.state.read().events().for_recipient(holder)
    }

    pub fn verify_event_chain(&self) -> ChainIntegrity {
        self.inner.state.read().events().verify_chain()
    }

    /// Consistent copy of the whole ledger.
    pub fn snapshot(&self) -> LedgerState {
        self.inner.state.read().clone()
    }
}

fn log_rejection(operation: &'static str, caller: &AccountId, error: &RegistryError) {
    match error.kind() {
        ErrorKind::NotAuthorized => {
            tracing::warn!(operation, caller = %caller, error = %error, "operation rejected")
        }
        ErrorKind::Storage | ErrorKind::Internal => {
            tracing::error!(operation, caller = %caller, error = %error, "operation failed")
        }
        _ => tracing::debug!(operation, caller = %caller, error = %error, "operation rejected"),
    }
}
