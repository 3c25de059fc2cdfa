//! Integration tests for the steprun binary
//!
//! Each test runs the built binary in a scratch directory or in the crate
//! root, where `steprun.toml` points at the bundled features and data.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Scratch directory with its own config home
struct TestContext {
    dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("xdg")).expect("Failed to create config home");
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the scratch directory
    fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    fn run(&self, args: &[&str]) -> RunOutput {
        run_in(self.path(), &self.path().join("xdg"), args)
    }
}

#[derive(Debug)]
struct RunOutput {
    stdout: String,
    stderr: String,
    code: Option<i32>,
}

fn run_in(cwd: &Path, config_home: &Path, args: &[&str]) -> RunOutput {
    let output = Command::new(env!("CARGO_BIN_EXE_steprun"))
        .args(args)
        .current_dir(cwd)
        .env("XDG_CONFIG_HOME", config_home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run steprun");

    RunOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        code: output.status.code(),
    }
}

fn run_in_crate(args: &[&str]) -> RunOutput {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let scratch = tempfile::tempdir().expect("Failed to create temp dir");
    run_in(root, scratch.path(), args)
}

const ACCOUNT_FEATURE: &str = r#"
Feature: Account
  Scenario: Withdrawal of Money
    Given The account balance is 100
    When The account holder withdraws 30
    Then The account balance remaining should be 70
"#;

// ============== Tests ==============

#[test]
fn test_bundled_suites_pass() {
    let output = run_in_crate(&["run"]);
    assert_eq!(output.code, Some(0), "stdout: {}\nstderr: {}", output.stdout, output.stderr);
    assert!(output.stdout.contains("account::withdrawal_of_money"));
    assert!(output.stdout.contains("passed"));
}

#[test]
fn test_json_report() {
    let output = run_in_crate(&["run", "--json", "-k", "outline"]);
    assert_eq!(output.code, Some(0), "stderr: {}", output.stderr);

    let report: serde_json::Value = serde_json::from_str(&output.stdout).expect("valid JSON");
    let items = report["items"].as_array().expect("items array");
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| item["outcome"] == "passed"));
    assert_eq!(report["summary"]["passed"], 3);
}

#[test]
fn test_collect_lists_node_ids() {
    let output = run_in_crate(&["collect", "--json", "-m", "sets"]);
    assert_eq!(output.code, Some(0), "stderr: {}", output.stderr);

    let ids: Vec<String> = serde_json::from_str(&output.stdout).expect("valid JSON");
    assert!(ids.contains(&"sets::set_length_check".to_string()), "{ids:?}");
    assert!(!ids.iter().any(|id| id.starts_with("outline::")));
}

#[test]
fn test_steps_lists_definitions() {
    let output = run_in_crate(&["steps"]);
    assert_eq!(output.code, Some(0));
    assert!(output.stdout.contains("The account balance is {amount:d}"));
    assert!(output.stdout.contains("-> setup_set"));
}

#[test]
fn test_unknown_step_is_an_error_item() {
    let ctx = TestContext::new();
    ctx.write(
        "features/broken.feature",
        "Feature: Broken\n  Scenario: Nothing matches\n    Given A step nobody wrote\n",
    );
    ctx.write("features/account.feature", ACCOUNT_FEATURE);

    let output = ctx.run(&["run", "-k", "broken"]);
    assert_eq!(output.code, Some(1), "stdout: {}", output.stdout);
    assert!(output.stdout.contains("broken::nothing_matches"));
    assert!(output.stdout.contains("A step nobody wrote"));
}

#[test]
fn test_unparsable_feature_fails_collection() {
    let ctx = TestContext::new();
    ctx.write("features/bad.feature", "Feature: Bad\n  Given outside of a scenario\n");

    let output = ctx.run(&["collect"]);
    assert_eq!(output.code, Some(2), "stderr: {}", output.stderr);
    assert!(output.stderr.contains("bad.feature:2"), "{}", output.stderr);
}

#[test]
fn test_strict_markers_reject_unknown_tags() {
    let ctx = TestContext::new();
    ctx.write("features/account.feature", &format!("@nightly{ACCOUNT_FEATURE}"));
    ctx.write("steprun.toml", "[markers]\nstrict = true\nregistered = [\"markerr\", \"temp_conversion\", \"str_test\"]\n");

    let output = ctx.run(&["collect"]);
    assert_eq!(output.code, Some(2), "stderr: {}", output.stderr);
    assert!(output.stderr.contains("nightly"));
}

#[test]
fn test_empty_selection_exits_with_no_tests() {
    let output = run_in_crate(&["run", "-k", "no_such_test_anywhere"]);
    assert_eq!(output.code, Some(5), "stdout: {}", output.stdout);
}

#[test]
fn test_bad_config_is_a_usage_error() {
    let ctx = TestContext::new();
    let config = ctx.write("custom.toml", "[run\nexit_first = yes\n");

    let output = ctx.run(&["run", "--config", config.to_str().expect("utf-8 path")]);
    assert_eq!(output.code, Some(4), "stderr: {}", output.stderr);
    assert!(output.stderr.contains("Error"));
}
