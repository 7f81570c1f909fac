//! TOML roster configuration: the trust anchors and per-ECU identity the
//! CLI needs before it can verify anything. Validated up front so a
//! misconfigured roster fails before the first document is touched.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use targets_verifier_core::key::{Key, SignatureAlgorithm, KEYID_LEN, PUBLIC_KEY_LEN};

/// Signature array / trusted roster capacity compiled into this binary.
pub const MAX_SIGS: usize = 16;
/// Maximum length of any text field read out of a document (identifiers,
/// algorithm names, target paths).
pub const BUF_SIZE: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid roster configuration: {}", .reasons.join("; "))]
    Validation { reasons: Vec<String> },
}

#[derive(Debug, Deserialize)]
struct RawRoster {
    ecu_id: String,
    hardware_id: String,
    version_prev: u32,
    threshold: usize,
    now: Option<DateTime<Utc>>,
    keys: Vec<RawKey>,
}

#[derive(Debug, Deserialize)]
struct RawKey {
    keyid: String,
    algorithm: String,
    public_key: String,
}

/// A validated roster: everything [`targets_verifier_cli`](crate) needs to
/// build a [`targets_verifier_core::context::ContextInit`].
pub struct Roster {
    pub ecu_id: String,
    pub hardware_id: String,
    pub version_prev: u32,
    pub threshold: usize,
    pub now: Option<DateTime<Utc>>,
    pub keys: Vec<Key>,
}

fn decode_hex(field: &str, s: &str, expected_len: usize, reasons: &mut Vec<String>) -> Option<Vec<u8>> {
    if s.len() != expected_len * 2 {
        reasons.push(format!(
            "{field} must be {} hex characters, got {}",
            expected_len * 2,
            s.len()
        ));
        return None;
    }
    let mut out = Vec::with_capacity(expected_len);
    for chunk in s.as_bytes().chunks(2) {
        let pair = std::str::from_utf8(chunk).ok()?;
        match u8::from_str_radix(pair, 16) {
            Ok(b) => out.push(b),
            Err(_) => {
                reasons.push(format!("{field} contains non-hex characters"));
                return None;
            }
        }
    }
    Some(out)
}

impl Roster {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.display().to_string();
        let raw_text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path_str.clone(),
            source,
        })?;
        let raw: RawRoster = toml::from_str(&raw_text).map_err(|source| ConfigError::Parse {
            path: path_str,
            source,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawRoster) -> Result<Self, ConfigError> {
        let mut reasons = Vec::new();

        if raw.keys.is_empty() {
            reasons.push("keys list must not be empty".to_string());
        }
        if raw.keys.len() > MAX_SIGS {
            reasons.push(format!(
                "{} keys exceed the compiled-in MAX_SIGS={MAX_SIGS}",
                raw.keys.len()
            ));
        }
        if raw.threshold == 0 || raw.threshold > raw.keys.len().max(1) {
            reasons.push(format!(
                "threshold {} is out of range for {} key(s)",
                raw.threshold,
                raw.keys.len()
            ));
        }
        if raw.ecu_id.len() > BUF_SIZE {
            reasons.push(format!("ecu_id exceeds compiled-in BUF_SIZE={BUF_SIZE}"));
        }
        if raw.hardware_id.len() > BUF_SIZE {
            reasons.push(format!("hardware_id exceeds compiled-in BUF_SIZE={BUF_SIZE}"));
        }

        let mut keys = Vec::with_capacity(raw.keys.len());
        for (i, raw_key) in raw.keys.iter().enumerate() {
            let Some(algorithm) = SignatureAlgorithm::parse(raw_key.algorithm.as_bytes()) else {
                reasons.push(format!("keys[{i}]: unsupported algorithm {:?}", raw_key.algorithm));
                continue;
            };
            let keyid_bytes = decode_hex("keyid", &raw_key.keyid, KEYID_LEN, &mut reasons);
            let pk_bytes = decode_hex("public_key", &raw_key.public_key, PUBLIC_KEY_LEN, &mut reasons);
            if let (Some(keyid_bytes), Some(pk_bytes)) = (keyid_bytes, pk_bytes) {
                let mut keyid = [0u8; KEYID_LEN];
                keyid.copy_from_slice(&keyid_bytes);
                let mut public_key = [0u8; PUBLIC_KEY_LEN];
                public_key.copy_from_slice(&pk_bytes);
                keys.push(Key::new(keyid, algorithm, public_key));
            }
        }

        if !reasons.is_empty() {
            return Err(ConfigError::Validation { reasons });
        }

        Ok(Roster {
            ecu_id: raw.ecu_id,
            hardware_id: raw.hardware_id,
            version_prev: raw.version_prev,
            threshold: raw.threshold,
            now: raw.now,
            keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_toml() -> &'static str {
        r#"
            ecu_id = "ecu-1"
            hardware_id = "hw-1"
            version_prev = 3
            threshold = 1

            [[keys]]
            keyid = "0000000000000000000000000000000000000000000000000000000000000a"
            algorithm = "ed25519"
            public_key = "0000000000000000000000000000000000000000000000000000000000000b"
        "#
    }

    #[test]
    fn rejects_wrong_hex_length() {
        let raw: RawRoster = toml::from_str(sample_toml()).unwrap();
        let err = Roster::from_raw(raw).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn accepts_well_formed_roster() {
        let toml_str = r#"
            ecu_id = "ecu-1"
            hardware_id = "hw-1"
            version_prev = 3
            threshold = 1

            [[keys]]
            keyid = "00000000000000000000000000000000000000000000000000000000000a0a"
            algorithm = "ed25519"
            public_key = "00000000000000000000000000000000000000000000000000000000000b0b"
        "#;
        let raw: RawRoster = toml::from_str(toml_str).unwrap();
        let roster = Roster::from_raw(raw).unwrap();
        assert_eq!(roster.keys.len(), 1);
        assert_eq!(roster.threshold, 1);
    }

    #[test]
    fn rejects_threshold_above_key_count() {
        let toml_str = r#"
            ecu_id = "ecu-1"
            hardware_id = "hw-1"
            version_prev = 0
            threshold = 2

            [[keys]]
            keyid = "00000000000000000000000000000000000000000000000000000000000a0a"
            algorithm = "ed25519"
            public_key = "00000000000000000000000000000000000000000000000000000000000b0b"
        "#;
        let raw: RawRoster = toml::from_str(toml_str).unwrap();
        assert!(Roster::from_raw(raw).is_err());
    }
}
