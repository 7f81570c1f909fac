//! The verifier context: owns one document's worth of state from
//! construction through [`VerifierContext::process`], which runs the
//! grammar walker and the verification pipeline in a single pass.

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, VerifyingKey};

use crate::byte_source::ByteSource;
use crate::error::{ContextError, Outcome};
use crate::key::{Key, SignatureAlgorithm, KEYID_LEN, SIG_LEN};
use crate::parse::{hex, literal, skip_text, text, time, uint, ParseError};
use crate::tee::{SigSlot, TeeReader};

/// A grammar-walk outcome that is not a plain structural failure: either
/// `?` will bubble a [`ParseError`] up as [`GrammarError::Parse`], or one
/// of the named semantic predicates fired and the walk stops early.
enum GrammarError {
    Parse(ParseError),
    WrongType,
    Expired,
    Downgrade,
    EcuDuplicate,
}

impl From<ParseError> for GrammarError {
    fn from(e: ParseError) -> Self {
        GrammarError::Parse(e)
    }
}

struct Success {
    got_image: bool,
    got_hash: bool,
    sha512: [u8; 64],
    length: u32,
    version: u32,
}

/// Inputs needed to build one [`VerifierContext`].
///
/// `trusted_keys`, `ecu_id`, and `hardware_id` are borrowed, not copied:
/// the core never allocates storage to hold a caller's trust roster.
pub struct ContextInit<'a, S> {
    pub source: S,
    pub now: DateTime<Utc>,
    pub version_prev: u32,
    pub ecu_id: &'a [u8],
    pub hardware_id: &'a [u8],
    pub trusted_keys: &'a [Key],
    pub threshold: usize,
}

/// Per-document verifier state.
///
/// `MAX_SIGS` and `BUF_SIZE` are build-time constants: the former bounds
/// both the signature array and the trusted key roster, the latter
/// bounds every text field read out of the document (ECU/hardware
/// identifiers, algorithm names, target paths).
pub struct VerifierContext<'a, S: ByteSource, const MAX_SIGS: usize, const BUF_SIZE: usize> {
    source: S,
    now: DateTime<Utc>,
    version_prev: u32,
    ecu_id: &'a [u8],
    hardware_id: &'a [u8],
    trusted_keys: &'a [Key],
    threshold: usize,
}

impl<'a, S: ByteSource, const MAX_SIGS: usize, const BUF_SIZE: usize> VerifierContext<'a, S, MAX_SIGS, BUF_SIZE> {
    /// Build a context, validating the roster/threshold invariant up front
    /// so a misconfigured caller fails loudly instead of silently
    /// rejecting every document with `SigFail`.
    pub fn new(init: ContextInit<'a, S>) -> Result<Self, ContextError> {
        let num_keys = init.trusted_keys.len();
        if num_keys == 0 {
            return Err(ContextError::NoKeys);
        }
        if num_keys > MAX_SIGS {
            return Err(ContextError::TooManyKeys {
                num_keys,
                max_sigs: MAX_SIGS,
            });
        }
        if init.threshold == 0 || init.threshold > num_keys {
            return Err(ContextError::ThresholdOutOfRange {
                threshold: init.threshold,
                num_keys,
            });
        }
        Ok(Self {
            source: init.source,
            now: init.now,
            version_prev: init.version_prev,
            ecu_id: init.ecu_id,
            hardware_id: init.hardware_id,
            trusted_keys: init.trusted_keys,
            threshold: init.threshold,
        })
    }

    /// Consume the context, reading and verifying exactly one Targets
    /// metadata document from its byte source.
    pub fn process(mut self) -> Outcome {
        let mut slots: [SigSlot; MAX_SIGS] = std::array::from_fn(|_| SigSlot::empty());

        let walk_result = {
            let mut tee = TeeReader::new(&mut self.source, &mut slots);
            self.run_grammar(&mut tee)
        };

        match walk_result {
            Ok(success) => {
                let (valid, required) = self.finalize_signatures(&slots);
                if valid < required {
                    return Outcome::SigFail { valid, required };
                }
                self.classify(success)
            }
            Err(GrammarError::Parse(e)) => Outcome::JsonError(e.message().to_string()),
            Err(GrammarError::WrongType) => Outcome::WrongType,
            Err(GrammarError::Expired) => Outcome::Expired,
            Err(GrammarError::Downgrade) => Outcome::Downgrade,
            Err(GrammarError::EcuDuplicate) => Outcome::EcuDuplicate,
        }
    }

    fn classify(&self, success: Success) -> Outcome {
        if !success.got_image {
            return Outcome::OkNoImage;
        }
        if !success.got_hash {
            return Outcome::NoHash;
        }
        if success.version == self.version_prev {
            Outcome::OkNoUpdate {
                version: success.version,
            }
        } else {
            Outcome::OkUpdate {
                sha512: success.sha512,
                length: success.length,
                version: success.version,
            }
        }
    }

    /// Verifies every present slot against its matching key, with no
    /// early abort on the first success or failure, then compares the
    /// tally against the configured threshold.
    fn finalize_signatures(&self, slots: &[SigSlot; MAX_SIGS]) -> (usize, usize) {
        let mut valid = 0;
        for (slot, key) in slots.iter().zip(self.trusted_keys.iter()) {
            if !slot.present {
                continue;
            }
            let (Some(hasher), Some(sig_bytes)) = (slot.hasher.as_ref(), slot.signature.as_ref()) else {
                continue;
            };
            let Ok(verifying_key) = VerifyingKey::from_bytes(&key.public_key) else {
                continue;
            };
            let signature = Signature::from_bytes(sig_bytes);
            if verifying_key
                .verify_prehashed(hasher.clone(), None, &signature)
                .is_ok()
            {
                valid += 1;
            }
        }
        (valid, self.threshold)
    }

    fn run_grammar(&self, tee: &mut TeeReader<S, MAX_SIGS>) -> Result<Success, GrammarError> {
        literal(tee, b"{\"signatures\":[")?;
        self.parse_signatures(tee)?;
        literal(tee, b",\"signed\":")?;

        tee.enter_signed();
        literal(tee, b"{\"_type\":")?;
        let mut type_buf = [0u8; 8];
        let type_len = text(tee, &mut type_buf)?;
        if &type_buf[..type_len] != b"Targets" {
            return Err(GrammarError::WrongType);
        }

        literal(tee, b",\"expires\":")?;
        let expires = time(tee)?;
        if self.now > expires {
            return Err(GrammarError::Expired);
        }

        literal(tee, b",\"targets\":{")?;
        let (got_image, got_hash, sha512, length, duplicate) = self.parse_targets(tee)?;

        literal(tee, b"},\"version\":")?;
        let version = uint(tee)?;
        if version < self.version_prev {
            return Err(GrammarError::Downgrade);
        }
        if duplicate {
            return Err(GrammarError::EcuDuplicate);
        }

        literal(tee, b"}")?; // closes "signed"
        tee.exit_signed();
        literal(tee, b"}")?; // closes the document

        Ok(Success {
            got_image,
            got_hash,
            sha512,
            length,
            version,
        })
    }

    fn parse_signatures(&self, tee: &mut TeeReader<S, MAX_SIGS>) -> Result<(), GrammarError> {
        let mut count = 0usize;
        let mut first = true;
        loop {
            if tee.peek()? == b']' {
                let mut b = [0u8; 1];
                tee.read(&mut b)?;
                return Ok(());
            }
            if !first {
                literal(tee, b",")?;
            }
            first = false;
            if count >= MAX_SIGS {
                return Err(ParseError::new("too many signature entries").into());
            }

            literal(tee, b"{\"keyid\":")?;
            let mut keyid_buf = [0u8; KEYID_LEN];
            let keyid_len = hex(tee, &mut keyid_buf)?;
            literal(tee, b",\"method\":")?;
            let mut method_buf = [0u8; 24];
            let method_len = text(tee, &mut method_buf)?;
            literal(tee, b",\"sig\":")?;

            let matched_idx = if keyid_len == KEYID_LEN {
                self.trusted_keys.iter().position(|k| k.keyid == keyid_buf)
            } else {
                None
            };
            let matched = matched_idx.filter(|&idx| {
                SignatureAlgorithm::parse(&method_buf[..method_len]) == Some(self.trusted_keys[idx].algorithm)
            });

            if let Some(idx) = matched {
                let mut sig_buf = [0u8; SIG_LEN];
                let sig_len = hex(tee, &mut sig_buf)?;
                if sig_len == SIG_LEN && !tee.slot_present(idx) {
                    tee.activate_slot(idx, sig_buf);
                }
            } else {
                skip_text(tee)?;
            }

            literal(tee, b"}")?;
            count += 1;
        }
    }

    /// Walks every entry of the `targets` object. A second entry matching
    /// this ECU/hardware pair is not raised as [`GrammarError::EcuDuplicate`]
    /// immediately; it is recorded in the returned `duplicate` flag so the
    /// caller can still check `downgrade` first, preserving the predicate
    /// order (downgrade before ECU-duplicate) even though duplicates are
    /// discovered earlier in the document than `version` is.
    #[allow(clippy::type_complexity)]
    fn parse_targets(&self, tee: &mut TeeReader<S, MAX_SIGS>) -> Result<(bool, bool, [u8; 64], u32, bool), GrammarError> {
        let mut got_image = false;
        let mut sha512 = [0u8; 64];
        let mut length = 0u32;
        let mut got_hash = false;
        let mut duplicate = false;
        let mut first = true;

        loop {
            if tee.peek()? == b'}' {
                let mut b = [0u8; 1];
                tee.read(&mut b)?;
                return Ok((got_image, got_hash, sha512, length, duplicate));
            }
            if !first {
                literal(tee, b",")?;
            }
            first = false;

            skip_text(tee)?; // target path, unused
            literal(tee, b":{\"custom\":{\"ecu_identifier\":")?;
            let mut ecu_buf = [0u8; BUF_SIZE];
            let ecu_len = text(tee, &mut ecu_buf)?;
            literal(tee, b",\"hardware_identifier\":")?;
            let mut hw_buf = [0u8; BUF_SIZE];
            let hw_len = text(tee, &mut hw_buf)?;
            literal(tee, b",\"release_counter\":")?;
            let _release_counter = uint(tee)?;
            literal(tee, b"},\"hashes\":{")?;

            let is_match = &ecu_buf[..ecu_len] == self.ecu_id && &hw_buf[..hw_len] == self.hardware_id;

            let mut entry_sha512 = [0u8; 64];
            let mut entry_got_hash = false;
            let mut hfirst = true;
            loop {
                if tee.peek()? == b'}' {
                    let mut b = [0u8; 1];
                    tee.read(&mut b)?;
                    break;
                }
                if !hfirst {
                    literal(tee, b",")?;
                }
                hfirst = false;

                let mut alg_buf = [0u8; 16];
                let alg_len = text(tee, &mut alg_buf)?;
                literal(tee, b":")?;
                if &alg_buf[..alg_len] == b"sha512" {
                    let n = hex(tee, &mut entry_sha512)?;
                    entry_got_hash = n == entry_sha512.len();
                } else {
                    skip_text(tee)?;
                }
            }

            literal(tee, b",\"length\":")?;
            let entry_length = uint(tee)?;
            literal(tee, b"}")?; // closes this target's value object

            if is_match {
                if got_image {
                    duplicate = true;
                } else {
                    got_image = true;
                    got_hash = entry_got_hash;
                    sha512 = entry_sha512;
                    length = entry_length;
                }
            }
        }
    }
}
