//! # certreg-engine: Certificate Registry and Authorization Engine
//!
//! Lets authorized issuing institutions mint uniquely identified,
//! tamper-evident certificate records bound to a recipient, and lets anyone
//! verify a record's authenticity and current validity.
//!
//! ## Components
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`directory`] | Institution registration, profile updates, administrative revocation |
//! | `registry` | Certificate issuance (single and batch), certificate revocation |
//! | [`ownership`] | Mint-once `CertificateId → holder` bindings |
//! | [`query`] | Read-only lookups by identifier, content reference and holder |
//! | [`events`] | Hash-chained audit log and post-commit observers |
//! | [`backend`] | Durable ledger collaborator (in-memory and JSON snapshot) |
//! | [`content`] | Content-addressed document store collaborator |
//!
//! ## Control Flow
//!
//! ```text
//! caller ─▶ guards (admin / authorized institution / issuer)
//!        ─▶ input validation + uniqueness (against staged view)
//!        ─▶ WriteBatch ─▶ LedgerBackend::commit ─▶ in-memory apply
//!        ─▶ observers notified (write lock released)
//! ```
//!
//! Every mutation is all-or-nothing: a failed guard or validation discards
//! the staged batch, so no partial mint, registration or revocation is ever
//! visible. See [`CertificateRegistry`] for the locking discipline.

pub mod backend;
pub mod clock;
pub mod config;
pub mod content;
pub mod directory;
pub mod engine;
pub mod error;
pub mod events;
mod guard;
pub mod model;
pub mod ownership;
pub mod query;
mod registry;
mod staged;
pub mod state;

pub use backend::{JsonFileBackend, LedgerBackend, MemoryBackend, StoreError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, RegistryConfig, MAX_BATCH_SIZE};
pub use content::{
    content_ref_for, ContentStore, ContentStoreError, FsContentStore, MemoryContentStore,
};
pub use engine::{CertificateRegistry, RegistryBuilder};
pub use error::{ErrorKind, RegistryError};
pub use events::{
    ChainIntegrity, EventLog, EventObserver, EventRecord, RegistryEvent, GENESIS_HASH,
};
pub use model::{
    BatchIssueRequest, Certificate, CertificateRequest, ContentRefLookup, Institution,
    InstitutionStats,
};
pub use ownership::OwnershipLedger;
pub use state::{LedgerState, WriteBatch};
