//! # Registry Errors
//!
//! Every mutating operation surfaces exactly one typed failure naming the
//! precondition it violated. Nothing is committed when an error is returned.

use certreg_core::{AccountId, CanonicalizationError, CertificateId, ContentRef};
use serde::Serialize;
use thiserror::Error;

use crate::backend::StoreError;

/// Failure of a registry operation.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The caller lacks the role or ownership the action requires.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Malformed or empty required input, mismatched batch arrays, an
    /// oversized batch, or a future-dated completion date.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The content reference is already bound to a certificate.
    #[error("duplicate content reference: {0}")]
    DuplicateReference(ContentRef),

    /// No certificate or ownership binding exists for the identifier.
    #[error("certificate not found: {0}")]
    NotFound(CertificateId),

    /// The caller is already a currently authorized institution.
    #[error("institution already registered: {0}")]
    AlreadyRegistered(AccountId),

    /// The ledger backend rejected the commit or could not be read.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// An event record could not be canonicalized for hashing.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Flat classification of [`RegistryError`], for callers that branch on
/// the failure category or render it on a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`RegistryError::NotAuthorized`].
    NotAuthorized,
    /// See [`RegistryError::InvalidInput`].
    InvalidInput,
    /// See [`RegistryError::DuplicateReference`].
    DuplicateReference,
    /// See [`RegistryError::NotFound`].
    NotFound,
    /// See [`RegistryError::AlreadyRegistered`].
    AlreadyRegistered,
    /// See [`RegistryError::Storage`].
    Storage,
    /// See [`RegistryError::Canonicalization`].
    Internal,
}

impl ErrorKind {
    /// Return the string value for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAuthorized => "not_authorized",
            Self::InvalidInput => "invalid_input",
            Self::DuplicateReference => "duplicate_reference",
            Self::NotFound => "not_found",
            Self::AlreadyRegistered => "already_registered",
            Self::Storage => "storage",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RegistryError {
    /// The category of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthorized(_) => ErrorKind::NotAuthorized,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::DuplicateReference(_) => ErrorKind::DuplicateReference,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Canonicalization(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    pub(crate) fn unauthorized(reason: impl Into<String>) -> Self {
        Self::NotAuthorized(reason.into())
    }
}
