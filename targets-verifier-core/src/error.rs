//! Result taxonomy and configuration errors.
//!
//! [`Outcome`] is the single closed result of [`crate::context::VerifierContext::process`].
//! It is not a propagating error channel: every branch, successful or not,
//! is a value the caller switches on. [`ContextError`] covers the narrower
//! case of a misconfigured context that should never have been built.

use std::fmt;

/// The fixed-width SHA-512 digest of a matched target image.
pub type Sha512Digest = [u8; 64];

/// Outcome of processing one Targets metadata document.
///
/// Variants are grouped the way [`OutcomeClass`] groups them; see that
/// type for the retry semantics of each class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new image is available for this ECU and its version is strictly
    /// greater than the previously installed one.
    OkUpdate {
        sha512: Sha512Digest,
        length: u32,
        version: u32,
    },
    /// The targets list matched this ECU but the version is unchanged.
    OkNoUpdate { version: u32 },
    /// No target entry in the document names this ECU/hardware pair.
    OkNoImage,
    /// The byte stream did not conform to the fixed grammar.
    JsonError(String),
    /// The `_type` field was present and well-formed but not `"Targets"`.
    WrongType,
    /// `now` is later than the document's `expires` timestamp.
    Expired,
    /// The document's `version` is lower than the previously installed one.
    Downgrade,
    /// Fewer verified signatures were found than the configured threshold.
    SigFail { valid: usize, required: usize },
    /// More than one target entry named this ECU/hardware pair.
    EcuDuplicate,
    /// The matched target entry carried no usable `sha512` hash.
    NoHash,
    /// A verification context could not be allocated for this document.
    NoMemory,
}

impl Outcome {
    /// Broad classification mirroring the error-handling design's five classes.
    pub fn class(&self) -> OutcomeClass {
        match self {
            Outcome::OkUpdate { .. } | Outcome::OkNoUpdate { .. } | Outcome::OkNoImage => {
                OutcomeClass::Success
            }
            Outcome::JsonError(_) => OutcomeClass::Structural,
            Outcome::WrongType
            | Outcome::Expired
            | Outcome::Downgrade
            | Outcome::EcuDuplicate
            | Outcome::NoHash => OutcomeClass::Semantic,
            Outcome::SigFail { .. } => OutcomeClass::Trust,
            Outcome::NoMemory => OutcomeClass::Resource,
        }
    }

    /// `true` for the three outcomes that represent a successfully verified document.
    pub fn is_success(&self) -> bool {
        self.class() == OutcomeClass::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::OkUpdate { version, length, .. } => {
                write!(f, "update available: version {version}, {length} bytes")
            }
            Outcome::OkNoUpdate { version } => write!(f, "already at version {version}"),
            Outcome::OkNoImage => write!(f, "no target names this ECU"),
            Outcome::JsonError(msg) => write!(f, "malformed document: {msg}"),
            Outcome::WrongType => write!(f, "wrong metadata type"),
            Outcome::Expired => write!(f, "document expired"),
            Outcome::Downgrade => write!(f, "version downgrade rejected"),
            Outcome::SigFail { valid, required } => {
                write!(f, "signature threshold not met: {valid}/{required}")
            }
            Outcome::EcuDuplicate => write!(f, "duplicate target entry for this ECU"),
            Outcome::NoHash => write!(f, "matched target carries no sha512 hash"),
            Outcome::NoMemory => write!(f, "no verification context available"),
        }
    }
}

/// The five error classes from the error-handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeClass {
    /// Byte stream did not match the fixed grammar. Terminal; the sender must resend.
    Structural,
    /// Grammatically valid document failed a semantic predicate. Terminal for this document.
    Semantic,
    /// Not enough valid signatures against the trusted roster. Terminal; roster or document is untrusted.
    Trust,
    /// A context or buffer could not be allocated. Caller may retry after freeing resources.
    Resource,
    /// The document was accepted, with or without an update.
    Success,
}

/// Error constructing a [`crate::context::VerifierContext`].
///
/// These are precondition violations in the caller's own configuration,
/// not judgements about a document, so they are kept out of [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("threshold {threshold} is out of range for {num_keys} trusted key(s)")]
    ThresholdOutOfRange { threshold: usize, num_keys: usize },

    #[error("{num_keys} trusted keys exceed this context's MAX_SIGS={max_sigs}")]
    TooManyKeys { num_keys: usize, max_sigs: usize },

    #[error("trusted key roster must not be empty")]
    NoKeys,
}
