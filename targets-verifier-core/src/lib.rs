//! # targets-verifier-core
//!
//! A streaming, constant-memory verifier for Uptane Director Targets
//! metadata.
//!
//! The verifier never buffers a whole document. It walks a fixed JSON
//! grammar one byte at a time from a [`byte_source::ByteSource`],
//! feeding the bytes of the `signed` subobject into live signature
//! contexts as they are consumed, and resolves a single closed
//! [`error::Outcome`] once the document's closing brace is reached.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`byte_source`] | The one-byte-lookahead transport interface |
//! | [`key`] | Trusted key roster and signature algorithm types |
//! | [`context`] | Verifier context, grammar walk, verification pipeline |
//! | [`alloc`] | Heap and fixed-pool context allocation strategies |
//! | [`error`] | The `Outcome` result taxonomy and context construction errors |
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use targets_verifier_core::byte_source::SliceSource;
//! use targets_verifier_core::context::{ContextInit, VerifierContext};
//! use targets_verifier_core::key::{Key, SignatureAlgorithm};
//!
//! let key = Key::new([0u8; 32], SignatureAlgorithm::Ed25519, [0u8; 32]);
//! let keys = [key];
//!
//! let ctx: VerifierContext<_, 4, 64> = VerifierContext::new(ContextInit {
//!     source: SliceSource::new(b"{\"signatures\":[],\"signed\":{}}"),
//!     now: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//!     version_prev: 0,
//!     ecu_id: b"ecu-1",
//!     hardware_id: b"hw-1",
//!     trusted_keys: &keys,
//!     threshold: 1,
//! })
//! .unwrap();
//!
//! // A malformed document (no `_type` field here) yields a structural outcome.
//! assert!(matches!(
//!     ctx.process(),
//!     targets_verifier_core::error::Outcome::JsonError(_)
//! ));
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![deny(unsafe_code)]

pub mod alloc;
pub mod byte_source;
pub mod context;
pub mod error;
pub mod key;

mod parse;
mod tee;

pub use byte_source::ByteSource;
pub use context::{ContextInit, VerifierContext};
pub use error::{ContextError, Outcome, OutcomeClass};
pub use key::{Key, SignatureAlgorithm};
