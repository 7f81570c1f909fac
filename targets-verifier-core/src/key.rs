//! Trusted key roster types.
//!
//! The roster is supplied by the caller (typically loaded once at device
//! boot from a provisioned trust store) and outlives every
//! [`crate::context::VerifierContext`] built against it.

/// Length in bytes of a decoded `keyid` hex field.
pub const KEYID_LEN: usize = 32;

/// Length in bytes of a decoded `sig` hex field (raw Ed25519 signature).
pub const SIG_LEN: usize = 64;

/// Length in bytes of a raw Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Signature algorithms the verifier understands.
///
/// A document's `method` field is compared against this set rather than
/// against a bare string, so an unsupported algorithm is a single `None`
/// check instead of scattered string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Ed25519,
}

impl SignatureAlgorithm {
    /// Parse the `method` field's text value. Returns `None` for anything
    /// this build does not support, which the grammar walker treats as
    /// "entry ignored", not a structural error.
    pub fn parse(method: &[u8]) -> Option<Self> {
        match method {
            b"ed25519" => Some(SignatureAlgorithm::Ed25519),
            _ => None,
        }
    }
}

/// One entry in the trusted key roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub keyid: [u8; KEYID_LEN],
    pub algorithm: SignatureAlgorithm,
    pub public_key: [u8; PUBLIC_KEY_LEN],
}

impl Key {
    pub fn new(keyid: [u8; KEYID_LEN], algorithm: SignatureAlgorithm, public_key: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self {
            keyid,
            algorithm,
            public_key,
        }
    }
}
