//! Gate test vectors.
//!
//! Each fixture in tests/fixtures/ has:
//! - case.json: prime, family name and law check
//! - expect.json: the expected gate result, including exact witness ids,
//!   or `{"error": ...}` for cases the gate refuses to run

use padic_kernel::{GateCase, KernelError, run_case};
use serde_json::Value;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_json(path: PathBuf) -> Value {
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

fn run_fixture(name: &str) {
    let dir = fixtures_dir().join(name);
    let case: GateCase = serde_json::from_value(read_json(dir.join("case.json")))
        .unwrap_or_else(|e| panic!("{name}: malformed case: {e}"));
    let expected = read_json(dir.join("expect.json"));

    let result = run_case(&case, "padic").unwrap_or_else(|e| panic!("{name}: {e}"));
    let result_json = serde_json::to_value(&result).expect("failed to serialize result");

    assert_eq!(
        result_json,
        expected,
        "\n\nFixture: {name}\n\nGot:\n{}\n\nExpected:\n{}\n",
        serde_json::to_string_pretty(&result_json).unwrap(),
        serde_json::to_string_pretty(&expected).unwrap(),
    );
}

fn run_refused_fixture(name: &str) {
    let dir = fixtures_dir().join(name);
    let case: GateCase = serde_json::from_value(read_json(dir.join("case.json")))
        .unwrap_or_else(|e| panic!("{name}: malformed case: {e}"));
    let expected = read_json(dir.join("expect.json"));

    match run_case(&case, "padic") {
        Ok(result) => panic!("{name}: expected a refusal, got {result:?}"),
        Err(err) => {
            assert!(
                matches!(err, KernelError::PrecisionExceeded { .. }),
                "{name}: {err:?}"
            );
            assert_eq!(Value::String(err.to_string()), expected["error"], "{name}");
        }
    }
}

#[test]
fn golden_reduction_compatibility() {
    run_fixture("golden_reduction_compatibility");
}

#[test]
fn golden_reduction_kernel() {
    run_fixture("golden_reduction_kernel");
}

#[test]
fn golden_appr_universal() {
    run_fixture("golden_appr_universal");
}

#[test]
fn adversarial_drift_compatibility() {
    run_fixture("adversarial_drift_compatibility");
}

#[test]
fn adversarial_drift_cauchy() {
    run_fixture("adversarial_drift_cauchy");
}

#[test]
fn adversarial_square_homomorphism() {
    run_fixture("adversarial_square_homomorphism");
}

#[test]
fn adversarial_square_kernel() {
    run_fixture("adversarial_square_kernel");
}

#[test]
fn adversarial_non_integral_digits() {
    run_fixture("adversarial_non_integral_digits");
}

#[test]
fn adversarial_oversized_digits() {
    run_refused_fixture("adversarial_oversized_digits");
}

#[test]
fn adversarial_oversized_cauchy() {
    run_refused_fixture("adversarial_oversized_cauchy");
}
