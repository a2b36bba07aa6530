#![deny(missing_docs)]

//! # certreg-core: Foundational Types for the Certificate Registry
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies, only `serde`, `serde_json`,
//! `thiserror`, `chrono`, and `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Accounts, certificate
//!    identifiers and content references are distinct types. You cannot pass
//!    a [`CertificateId`] where an [`AccountId`] is expected.
//!
//! 2. **[`CanonicalBytes`] is the sole path to record digests.** Every
//!    fingerprint of a certificate record or audit event flows through
//!    `CanonicalBytes::new()`, so two equal records always hash the same.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] is UTC, truncated to seconds,
//!    and serializes with a `Z` suffix.
//!
//! 4. **Structured errors.** [`ValidationError`] and
//!    [`CanonicalizationError`] via `thiserror`; no `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_raw, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{AccountId, CertificateId, ContentRef};
pub use temporal::Timestamp;
