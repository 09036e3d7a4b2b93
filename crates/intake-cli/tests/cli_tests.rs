//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn intake() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("intake").unwrap()
}

const GOOD_BANK: &str = r#"
[bank]
id = "cli-test-v1"
name = "CLI Test Bank"

[[questions]]
id = "reading-sign"
section = "reading"
prompt = "Which word on the sign means you must not enter?"
kind = "text"
expected = "prohibited"

[[questions]]
id = "numeracy-sum"
section = "numeracy"
prompt = "What is 19 + 23?"
kind = "number"
expected = "42"
"#;

const BAD_BANK: &str = r#"
[bank]
id = "broken-v1"
name = "Broken Bank"

[[questions]]
id = "dupe"
section = "reading"
prompt = "First?"
kind = "text"

[[questions]]
id = "dupe"
section = "reading"
prompt = ""
kind = "single_choice"
options = ["A"]
expected = "B"
"#;

#[test]
fn validate_builtin_bank() {
    intake()
        .arg("validate")
        .assert()
        .success()
        .stderr(predicate::str::contains("22 questions"))
        .stderr(predicate::str::contains("passed validation"));
}

#[test]
fn validate_good_bank_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bank.toml");
    std::fs::write(&path, GOOD_BANK).unwrap();

    intake()
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("cli-test-v1"));
}

#[test]
fn validate_bad_bank_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bank.toml");
    std::fs::write(&path, BAD_BANK).unwrap();

    intake()
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate question id"))
        .stderr(predicate::str::contains("failed validation"));
}

#[test]
fn validate_nonexistent_bank() {
    intake()
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn score_responses_text_output() {
    let dir = TempDir::new().unwrap();
    let bank_path = dir.path().join("bank.toml");
    std::fs::write(&bank_path, GOOD_BANK).unwrap();
    let responses_path = dir.path().join("responses.json");
    std::fs::write(
        &responses_path,
        r#"{"reading-sign": "It said prohibited", "numeracy-sum": "42"}"#,
    )
    .unwrap();

    intake()
        .arg("score")
        .arg("--responses")
        .arg(&responses_path)
        .arg("--bank")
        .arg(&bank_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("100%"))
        .stdout(predicate::str::contains("Excellent"))
        .stdout(predicate::str::contains("eligible to enrol"));
}

#[test]
fn score_responses_json_output() {
    let dir = TempDir::new().unwrap();
    let bank_path = dir.path().join("bank.toml");
    std::fs::write(&bank_path, GOOD_BANK).unwrap();
    let responses_path = dir.path().join("responses.json");
    // One of two correct: 50%, below the eligibility threshold.
    std::fs::write(&responses_path, r#"{"numeracy-sum": "42"}"#).unwrap();

    intake()
        .arg("score")
        .arg("--responses")
        .arg(&responses_path)
        .arg("--bank")
        .arg(&bank_path)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"overall\": 50"))
        .stdout(predicate::str::contains("\"eligible\": false"));
}

#[test]
fn score_unknown_format_fails() {
    let dir = TempDir::new().unwrap();
    let responses_path = dir.path().join("responses.json");
    std::fs::write(&responses_path, "{}").unwrap();

    intake()
        .arg("score")
        .arg("--responses")
        .arg(&responses_path)
        .arg("--format")
        .arg("xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    intake()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("Created intake.toml"))
        .stderr(predicate::str::contains("Created banks/example-bank.toml"));

    assert!(dir.path().join("intake.toml").exists());
    assert!(dir.path().join("banks/example-bank.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    intake().current_dir(dir.path()).arg("init").assert().success();

    intake()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_output_passes_validation() {
    let dir = TempDir::new().unwrap();
    intake().current_dir(dir.path()).arg("init").assert().success();

    intake()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--bank")
        .arg("banks/example-bank.toml")
        .assert()
        .success()
        .stderr(predicate::str::contains("passed validation"));
}

#[test]
fn students_list_with_mock_store_is_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("intake.toml"), "[store]\ntype = \"mock\"\n").unwrap();

    intake()
        .current_dir(dir.path())
        .arg("students")
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("No registered students"));
}

#[test]
fn students_token_requires_secret() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("intake.toml"), "[store]\ntype = \"mock\"\n").unwrap();

    intake()
        .current_dir(dir.path())
        .env_remove("INTAKE_ADMIN_SECRET")
        .arg("students")
        .arg("token")
        .assert()
        .failure()
        .stderr(predicate::str::contains("admin secret"));
}

#[test]
fn students_token_prints_a_verifiable_token() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("intake.toml"),
        "[store]\ntype = \"mock\"\n\n[server]\nadmin_secret = \"cli-secret\"\n",
    )
    .unwrap();

    intake()
        .current_dir(dir.path())
        .arg("students")
        .arg("token")
        .arg("--role")
        .arg("admin")
        .assert()
        .success()
        .stdout(predicate::str::contains(".admin."));
}

#[test]
fn help_output() {
    intake()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Student enrollment wizard and LLN assessment service",
        ));
}

#[test]
fn version_output() {
    intake()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("intake"));
}
