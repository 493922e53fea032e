use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "padic-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_padic_in<I, S>(dir: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_padic");
    Command::new(bin)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("padic command should execute")
}

fn run_padic<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tmp = TempDirGuard::new("run");
    run_padic_in(tmp.path(), args)
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn appr_json_reports_digits_and_tower() {
    let output = run_padic(["appr", "11", "--prime", "2", "--precision", "3", "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["kind"], "padic.appr");
    assert_eq!(payload["prime"], 2);
    assert_eq!(payload["digits"], serde_json::json!([1, 1, 0]));
    assert_eq!(payload["tower"], serde_json::json!(["0", "1", "3", "3"]));
}

#[test]
fn appr_text_lists_each_level() {
    let output = run_padic(["appr", "-1", "--prime", "3", "--precision", "2"]);
    assert_success(&output);

    let text = stdout_text(&output);
    assert!(text.contains("padic appr -1 --prime 3 --precision 2"));
    assert!(text.contains("Digits (least significant first): 2 2"));
    assert!(text.contains("appr(x, 2) = 8"));
}

#[test]
fn residue_json_reports_kernel_membership() {
    let output = run_padic(["residue", "18/5", "--prime", "3", "--level", "2", "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["kind"], "padic.residue");
    assert_eq!(payload["residue"], "0");
    assert_eq!(payload["inKernel"], true);
    assert_eq!(payload["inIdeal"], true);
}

#[test]
fn residue_rejects_non_integral_values() {
    let output = run_padic(["residue", "1/3", "--prime", "3", "--level", "2"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("error:"));
}

#[test]
fn residue_level_is_capped_by_working_precision() {
    let output = run_padic(["residue", "1", "--prime", "2", "--level", "40", "--json"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("precision 40 exceeds working precision 32"));
}

#[test]
fn lift_json_reports_digits_and_laws() {
    let output = run_padic([
        "lift",
        "-1/3",
        "--prime",
        "2",
        "--precision",
        "6",
        "--json",
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["kind"], "padic.lift");
    assert_eq!(payload["family"], "rational");
    assert_eq!(payload["digits"], serde_json::json!([1, 0, 1, 0, 1, 0]));
    assert_eq!(payload["approx"], "21");
    assert_eq!(payload["universal"], true);
    assert_eq!(payload["roundTrip"], true);
}

#[test]
fn lift_through_drifting_family_reports_universal_failure() {
    let output = run_padic(["lift", "4", "--prime", "3", "--family", "drift", "--json"]);
    assert_failure(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["universal"], false);
    assert!(payload["universalFailure"].is_string());
    assert!(payload["digits"].is_null());
    assert!(payload["roundTrip"].is_null());
}

#[test]
fn lift_text_reports_universal_failure() {
    let output = run_padic(["lift", "4", "--prime", "3", "--family", "drift"]);
    assert_failure(&output);
    assert!(stdout_text(&output).contains("Universal property: fails"));
}

#[test]
fn lift_rejects_unknown_family() {
    let output = run_padic(["lift", "4", "--prime", "3", "--family", "cube"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("unknown family: cube"));
}

#[test]
fn gate_rejects_drifting_family_with_witness() {
    let tmp = TempDirGuard::new("gate-drift");
    let case_path = tmp.path().join("case.json");
    fs::write(
        &case_path,
        r#"{"prime":3,"family":"drift","check":{"kind":"compatibility","value":"4","upto":3,"tokenPath":"value"}}"#,
    )
    .expect("case should be written");

    let output = run_padic_in(
        tmp.path(),
        [OsStr::new("gate"), case_path.as_os_str(), OsStr::new("--json")],
    );
    assert_failure(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "rejected");
    let failure = &payload["failures"][0];
    assert_eq!(failure["lawRef"], "TOWER-1");
    assert_eq!(failure["class"], "compatibility_failure");
    assert!(
        failure["witnessId"]
            .as_str()
            .is_some_and(|id| id.starts_with("w1_"))
    );
}

#[test]
fn gate_refuses_oversized_precision() {
    let tmp = TempDirGuard::new("gate-oversized");
    let case_path = tmp.path().join("case.json");
    fs::write(
        &case_path,
        r#"{"prime":2,"family":"reduction","check":{"kind":"digits","value":"1","upto":4294967295}}"#,
    )
    .expect("case should be written");

    let output = run_padic_in(tmp.path(), [OsStr::new("gate"), case_path.as_os_str()]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr_text(&output).contains("precision 4294967295 exceeds working precision 64")
    );
}

#[test]
fn gate_accepts_reduction_family() {
    let tmp = TempDirGuard::new("gate-reduction");
    let case_path = tmp.path().join("case.json");
    fs::write(
        &case_path,
        r#"{"prime":5,"family":"reduction","check":{"kind":"cauchy","value":"-2/7","upto":4}}"#,
    )
    .expect("case should be written");

    let output = run_padic_in(tmp.path(), [OsStr::new("gate"), case_path.as_os_str()]);
    assert_success(&output);
    assert!(stdout_text(&output).contains("Result: accepted"));
}

#[test]
fn config_file_supplies_prime_and_precision() {
    let tmp = TempDirGuard::new("config");
    let config_path = tmp.path().join("padic.toml");
    fs::write(&config_path, "prime = 5\nprecision = 3\n").expect("config should be written");

    let output = run_padic_in(
        tmp.path(),
        [
            OsStr::new("appr"),
            OsStr::new("7"),
            OsStr::new("--config"),
            config_path.as_os_str(),
            OsStr::new("--json"),
        ],
    );
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["prime"], 5);
    assert_eq!(payload["digits"], serde_json::json!([2, 1, 0]));
}

#[test]
fn default_config_is_picked_up_from_working_directory() {
    let tmp = TempDirGuard::new("default-config");
    fs::write(tmp.path().join("padic.toml"), "prime = 7\nprecision = 2\n")
        .expect("config should be written");

    let output = run_padic_in(tmp.path(), ["appr", "50", "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["digits"], serde_json::json!([1, 0]));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let output = run_padic(["appr", "7", "--config", "does-not-exist.toml"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("failed to read config"));
}

#[test]
fn composite_prime_is_rejected() {
    let output = run_padic(["appr", "7", "--prime", "4"]);
    assert_failure(&output);
}
