//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers the registry deals in.
//! Each identifier is a distinct type: you cannot pass a [`ContentRef`]
//! where an [`AccountId`] is expected.
//!
//! ## Validation
//!
//! [`AccountId`] validates its text form at parse time. [`CertificateId`]
//! is always valid by construction; the registry alone allocates non-zero
//! values. [`ContentRef`] is opaque: emptiness is a registry-level input
//! error, not a construction error, so that issuance reports failures in
//! its documented order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::{decode_hex, encode_hex, ContentDigest};
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// A 20-byte account address identifying a caller, an institution, or a
/// certificate holder.
///
/// Text form is `0x` followed by 40 lowercase hex characters. Parsing
/// accepts upper or lower case and an optional `0x` prefix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AccountId([u8; 20]);

impl AccountId {
    /// The null identity. Never a valid recipient.
    pub const ZERO: AccountId = AccountId([0u8; 20]);

    /// Byte length of an account address.
    pub const LEN: usize = 20;

    /// Create an account identifier from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Access the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Parse an account address from its hex text form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAccountId`] unless the input is
    /// exactly 40 hex characters after an optional `0x` prefix.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if hex.len() != Self::LEN * 2 {
            return Err(ValidationError::InvalidAccountId(s.to_string()));
        }
        let bytes =
            decode_hex(hex).map_err(|_| ValidationError::InvalidAccountId(s.to_string()))?;
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Render as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", encode_hex(&self.0))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_hex())
    }
}

impl FromStr for AccountId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// CertificateId
// ---------------------------------------------------------------------------

/// Sequential certificate identifier.
///
/// Identifiers are 1-based and never reused. [`CertificateId::NONE`] (0)
/// is the "no certificate" value returned by soft not-found lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(u64);

impl CertificateId {
    /// The "no certificate" identifier.
    pub const NONE: CertificateId = CertificateId(0);

    /// The first identifier the registry allocates.
    pub const FIRST: CertificateId = CertificateId(1);

    /// Create an identifier from its integer value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The integer value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Whether this is the "no certificate" identifier.
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// The identifier following this one, or `None` on overflow.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CertificateId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidCertificateId(s.to_string()))
    }
}

impl From<u64> for CertificateId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// ContentRef
// ---------------------------------------------------------------------------

/// Opaque reference to off-registry certificate metadata, typically a
/// content hash.
///
/// Compared byte-for-byte. Globally unique across all certificates once
/// claimed by an issuance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    /// Wrap a reference string. No validation is applied.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Reference derived from a content digest (its lowercase hex form).
    pub fn from_digest(digest: &ContentDigest) -> Self {
        Self(digest.to_hex())
    }

    /// Access the reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the reference is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ContentRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}
