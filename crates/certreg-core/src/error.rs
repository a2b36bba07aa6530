//! # Error Hierarchy
//!
//! Validation and canonicalization errors for the foundational types,
//! built with `thiserror`. Registry-level failures live in
//! `certreg-engine`; these cover malformed primitives only.

use thiserror::Error;

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for domain primitive newtypes.
///
/// Each variant carries the rejected input so operators can diagnose
/// malformed arguments without guesswork.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account address is not 20 bytes of hex.
    #[error("invalid account id: \"{0}\" (expected 0x followed by 40 hex characters)")]
    InvalidAccountId(String),

    /// Certificate identifier is not a decimal integer.
    #[error("invalid certificate id: \"{0}\" (expected a positive integer)")]
    InvalidCertificateId(String),

    /// Digest string is not 64 hex characters.
    #[error("invalid digest: \"{0}\" (expected 64 hex characters)")]
    InvalidDigest(String),

    /// Timestamp string is not valid UTC RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
