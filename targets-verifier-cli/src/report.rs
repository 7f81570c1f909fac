//! Renders an [`Outcome`] as both a human-readable summary and a
//! `serde_json::Value`, mirroring the SDK-side `vcp-cli` convention of
//! printing a structured pretty-print alongside a short field summary.

use serde_json::json;
use targets_verifier_core::Outcome;

pub struct Report<'a> {
    pub outcome: &'a Outcome,
}

impl<'a> Report<'a> {
    pub fn new(outcome: &'a Outcome) -> Self {
        Self { outcome }
    }

    /// Process exit code: 0 for success, 1 for a structural/resource
    /// failure, 2 for a semantic or trust rejection of a well-formed
    /// document. Matches the `vcp-cli verify` convention of reserving a
    /// distinct code for "the input was fine, the verdict was no".
    pub fn exit_code(&self) -> i32 {
        match self.outcome.class() {
            targets_verifier_core::OutcomeClass::Success => 0,
            targets_verifier_core::OutcomeClass::Structural | targets_verifier_core::OutcomeClass::Resource => 1,
            targets_verifier_core::OutcomeClass::Semantic | targets_verifier_core::OutcomeClass::Trust => 2,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self.outcome {
            Outcome::OkUpdate { sha512, length, version } => json!({
                "result": "ok_update",
                "version": version,
                "length": length,
                "sha512": hex_encode(sha512),
            }),
            Outcome::OkNoUpdate { version } => json!({
                "result": "ok_no_update",
                "version": version,
            }),
            Outcome::OkNoImage => json!({ "result": "ok_no_image" }),
            Outcome::JsonError(msg) => json!({ "result": "json_error", "message": msg }),
            Outcome::WrongType => json!({ "result": "wrong_type" }),
            Outcome::Expired => json!({ "result": "expired" }),
            Outcome::Downgrade => json!({ "result": "downgrade" }),
            Outcome::SigFail { valid, required } => json!({
                "result": "sig_fail",
                "valid": valid,
                "required": required,
            }),
            Outcome::EcuDuplicate => json!({ "result": "ecu_duplicate" }),
            Outcome::NoHash => json!({ "result": "no_hash" }),
            Outcome::NoMemory => json!({ "result": "no_memory" }),
        }
    }

    pub fn to_human(&self) -> String {
        self.outcome.to_string()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exit_codes_match_outcome_class() {
        assert_eq!(Report::new(&Outcome::OkNoImage).exit_code(), 0);
        assert_eq!(Report::new(&Outcome::JsonError("x".into())).exit_code(), 1);
        assert_eq!(Report::new(&Outcome::NoMemory).exit_code(), 1);
        assert_eq!(Report::new(&Outcome::Expired).exit_code(), 2);
        assert_eq!(
            Report::new(&Outcome::SigFail { valid: 0, required: 1 }).exit_code(),
            2
        );
    }

    #[test]
    fn json_rendering_carries_update_fields() {
        let outcome = Outcome::OkUpdate {
            sha512: [0xab; 64],
            length: 1024,
            version: 7,
        };
        let v = Report::new(&outcome).to_json();
        assert_eq!(v["result"], "ok_update");
        assert_eq!(v["version"], 7);
        assert_eq!(v["length"], 1024);
        assert_eq!(v["sha512"].as_str().unwrap().len(), 128);
    }
}
