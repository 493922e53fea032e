//! Deterministic failure witnesses for law checks.
//!
//! Two runs that observe the same semantic failure produce the same witness
//! id, regardless of message wording:
//!
//! 1. canonical key `{schema, class, lawRef, tokenPath, context}`
//! 2. RFC 8785 (JCS) bytes: sorted keys, no whitespace
//! 3. `witnessId = "w1_" || base32hex_lower(SHA256(key))`

use crate::error::{Law, Violation};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;

const WITNESS_SCHEMA: u32 = 1;

/// Witness id for the canonical key fields. Messages never contribute.
pub fn compute_witness_id(
    class: &str,
    law_ref: &str,
    token_path: Option<&str>,
    context: Option<&Value>,
) -> String {
    let key = json!({
        "schema": WITNESS_SCHEMA,
        "class": class,
        "lawRef": law_ref,
        "tokenPath": token_path,
        "context": context,
    });
    let mut bytes = Vec::new();
    write_canonical(&key, &mut bytes);
    format!("w1_{}", base32hex_lower(&Sha256::digest(&bytes)))
}

/// JCS serialization for the values witness keys contain: integers,
/// strings, booleans, null, arrays and objects.
fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push(b'{');
            for (i, (key, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out);
                out.push(b':');
                write_canonical(v, out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(v, out);
            }
            out.push(b']');
        }
        Value::String(s) => write_string(s, out),
        // null, booleans and integers print canonically already
        other => out.extend_from_slice(other.to_string().as_bytes()),
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(Value::String(s.to_owned()).to_string().as_bytes());
}

/// RFC 4648 base32hex, lowercase, unpadded.
fn base32hex_lower(data: &[u8]) -> String {
    const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    for chunk in data.chunks(5) {
        let mut buf = [0u8; 5];
        buf[..chunk.len()].copy_from_slice(chunk);
        let block = buf.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        let symbols = (chunk.len() * 8).div_ceil(5);
        for i in 0..symbols {
            let idx = (block >> (35 - 5 * i)) & 0x1f;
            out.push(char::from(ALPHABET[idx as usize]));
        }
    }
    out
}

/// One failure, with its deterministic witness id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GateFailure {
    pub witness_id: String,

    /// Failure classification, one of [`failure_class`].
    pub class: String,

    /// Law reference, one of [`law_ref`].
    pub law_ref: String,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Path of the checked value inside the submitted document.
    #[serde(default)]
    pub token_path: Option<String>,
}

impl GateFailure {
    pub fn new(
        class: impl Into<String>,
        law_ref: impl Into<String>,
        message: impl Into<String>,
        token_path: Option<String>,
        context: Option<Value>,
    ) -> Self {
        let class = class.into();
        let law_ref = law_ref.into();
        let witness_id =
            compute_witness_id(&class, &law_ref, token_path.as_deref(), context.as_ref());
        Self {
            witness_id,
            class,
            law_ref,
            message: message.into(),
            context,
            token_path,
        }
    }

    /// A failure for an observed law violation. The violation's level, when
    /// present, becomes the witness context.
    pub fn from_violation(violation: &Violation, token_path: Option<String>) -> Self {
        let (class, law) = classify(violation.law);
        let context = violation.level.map(|level| json!({ "level": level }));
        Self::new(class, law, violation.description.clone(), token_path, context)
    }

    fn sort_key(&self) -> (&str, &str, &str, String, &str) {
        (
            &self.class,
            &self.law_ref,
            self.token_path.as_deref().unwrap_or(""),
            self.context
                .as_ref()
                .map(|c| {
                    let mut bytes = Vec::new();
                    write_canonical(c, &mut bytes);
                    String::from_utf8_lossy(&bytes).into_owned()
                })
                .unwrap_or_default(),
            &self.witness_id,
        )
    }
}

impl PartialOrd for GateFailure {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GateFailure {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Outcome of a law check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// A law check result: the verdict and its sorted failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GateResult {
    pub witness_schema: u32,
    pub profile: String,
    pub result: Verdict,
    pub failures: Vec<GateFailure>,
}

impl GateResult {
    pub fn accepted(profile: impl Into<String>) -> Self {
        Self {
            witness_schema: WITNESS_SCHEMA,
            profile: profile.into(),
            result: Verdict::Accepted,
            failures: Vec::new(),
        }
    }

    /// Failures are sorted by class, law, token path, context, witness id.
    pub fn rejected(profile: impl Into<String>, mut failures: Vec<GateFailure>) -> Self {
        failures.sort();
        Self {
            witness_schema: WITNESS_SCHEMA,
            profile: profile.into(),
            result: Verdict::Rejected,
            failures,
        }
    }

    /// Accepted when `failures` is empty, rejected otherwise.
    pub fn from_failures(profile: impl Into<String>, failures: Vec<GateFailure>) -> Self {
        if failures.is_empty() {
            Self::accepted(profile)
        } else {
            Self::rejected(profile, failures)
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.result == Verdict::Accepted
    }
}

/// `(class, lawRef)` for each tower law.
pub fn classify(law: Law) -> (&'static str, &'static str) {
    match law {
        Law::Compatibility => (failure_class::COMPATIBILITY_FAILURE, law_ref::COMPATIBILITY),
        Law::Cauchy => (failure_class::CAUCHY_FAILURE, law_ref::CAUCHY),
        Law::Homomorphism => (failure_class::HOMOMORPHISM_FAILURE, law_ref::HOMOMORPHISM),
        Law::Bound | Law::DigitStability | Law::Density => {
            (failure_class::DIGIT_FAILURE, law_ref::DIGITS)
        }
        Law::Kernel => (failure_class::KERNEL_FAILURE, law_ref::KERNEL),
        Law::UniversalProperty => (failure_class::UNIVERSAL_FAILURE, law_ref::UNIVERSAL),
    }
}

pub mod failure_class {
    pub const COMPATIBILITY_FAILURE: &str = "compatibility_failure";
    pub const CAUCHY_FAILURE: &str = "cauchy_failure";
    pub const HOMOMORPHISM_FAILURE: &str = "homomorphism_failure";
    pub const DIGIT_FAILURE: &str = "digit_failure";
    pub const KERNEL_FAILURE: &str = "kernel_failure";
    pub const UNIVERSAL_FAILURE: &str = "universal_failure";
}

pub mod law_ref {
    pub const COMPATIBILITY: &str = "TOWER-1";
    pub const CAUCHY: &str = "TOWER-2";
    pub const HOMOMORPHISM: &str = "TOWER-3";
    pub const DIGITS: &str = "TOWER-4";
    pub const KERNEL: &str = "TOWER-5";
    pub const UNIVERSAL: &str = "TOWER-6";
}
