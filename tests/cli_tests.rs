//! CLI integration tests
//!
//! Tests the command-line interface using assert_cmd

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the survey-synth binary
fn synth_cmd() -> Command {
    let mut cmd = Command::cargo_bin("survey-synth").unwrap();
    for var in [
        "SURVEY_SYNTH_CONFIG",
        "SURVEY_SYNTH_SEED",
        "SURVEY_SYNTH_SINK",
        "SURVEY_SYNTH_BASE_URL",
        "SURVEY_SYNTH_LOG_LEVEL",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// A config file in its own temp dir
fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("survey-synth.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

/// Everything after the first line of a dry run (the timing line differs).
fn construct_table(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .skip(1)
        .collect::<Vec<_>>()
        .join("\n")
}

// ─────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    synth_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("synthetic survey"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("summary"))
        .stdout(predicate::str::contains("clear"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    synth_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("survey-synth"));
}

#[test]
fn test_generate_help() {
    synth_cmd()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--seed"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--config"));
}

// ─────────────────────────────────────────────────────────────────
// Generate Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_dry_run_prints_construct_table() {
    let (_dir, path) = write_config("[generation]\nseed = 42\n");

    synth_cmd()
        .args(["--quiet", "generate", "--dry-run", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted 100 of 100 bundles to the memory sink"))
        .stdout(predicate::str::contains("PU-L"))
        .stdout(predicate::str::contains("AI Readiness"))
        .stdout(predicate::str::contains("Failed bundles").not());
}

#[test]
fn test_same_seed_same_output() {
    let (_dir, path) = write_config("");

    let run = |seed: &str| {
        synth_cmd()
            .args(["--quiet", "generate", "--dry-run", "--seed", seed, "--config"])
            .arg(&path)
            .output()
            .unwrap()
    };

    let first = run("2025");
    let second = run("2025");
    let other = run("2026");
    assert!(first.status.success());

    assert_eq!(construct_table(&first.stdout), construct_table(&second.stdout));
    assert_ne!(construct_table(&first.stdout), construct_table(&other.stdout));
}

#[test]
fn test_seed_from_environment() {
    let (_dir, path) = write_config("");

    let flag = synth_cmd()
        .args(["--quiet", "generate", "--dry-run", "--seed", "9", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    let env = synth_cmd()
        .env("SURVEY_SYNTH_SEED", "9")
        .args(["--quiet", "generate", "--dry-run", "--config"])
        .arg(&path)
        .output()
        .unwrap();

    assert_eq!(construct_table(&flag.stdout), construct_table(&env.stdout));
}

#[test]
fn test_unreachable_service_reports_failed_bundles() {
    let (_dir, path) = write_config(
        r#"
[sink]
kind = "rest"
base_url = "http://127.0.0.1:9"
timeout_secs = 2

[submission]
pause_every = 0
"#,
    );

    synth_cmd()
        .args(["--quiet", "generate", "--config"])
        .arg(&path)
        .assert()
        .code(30)
        .stdout(predicate::str::contains("Submitted 0 of 100 bundles to the rest sink"))
        .stdout(predicate::str::contains("Failed bundles (100)"))
        .stdout(predicate::str::contains("(retryable)"));
}

// ─────────────────────────────────────────────────────────────────
// Summary and Clear Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_summary_needs_rest_sink() {
    let (_dir, path) = write_config("[sink]\nkind = \"memory\"\n");

    synth_cmd()
        .args(["summary", "--config"])
        .arg(&path)
        .assert()
        .code(90)
        .stderr(predicate::str::contains("E902"))
        .stderr(predicate::str::contains("--dry-run"));
}

#[test]
fn test_clear_needs_rest_sink() {
    let (_dir, path) = write_config("");

    synth_cmd()
        .args(["clear", "--yes", "--config"])
        .arg(&path)
        .assert()
        .code(90);
}

#[test]
fn test_clear_unreachable_service() {
    let (_dir, path) = write_config(
        "[sink]\nkind = \"rest\"\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n",
    );

    synth_cmd()
        .args(["--quiet", "clear", "--config"])
        .arg(&path)
        .assert()
        .code(30)
        .stderr(predicate::str::contains("E300"));
}

// ─────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_masks_api_key() {
    let (_dir, path) = write_config(
        "[sink]\nkind = \"rest\"\nbase_url = \"https://db.example.org\"\napi_key = \"very-secret\"\n",
    );

    synth_cmd()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[generation]"))
        .stdout(predicate::str::contains("[sink]"))
        .stdout(predicate::str::contains("[submission]"))
        .stdout(predicate::str::contains("very-secret").not());
}

#[test]
fn test_config_init_then_validate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf").join("survey-synth.toml");

    synth_cmd()
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    synth_cmd()
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));

    // Second init without --force refuses
    synth_cmd()
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_pool_override_runs_generation() {
    let (_dir, path) = write_config(
        r#"
[generation.pools.student_majors]
"Civil Engineering" = 40
"#,
    );

    synth_cmd()
        .args(["--quiet", "generate", "--dry-run", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted 100 of 100 bundles to the memory sink"));
}

#[test]
fn test_pool_override_with_wrong_total_exits_40() {
    let (_dir, path) = write_config(
        r#"
[generation.pools.faculty_disciplines]
"Mechanical Engineering" = 20
"#,
    );

    synth_cmd()
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .code(40)
        .stderr(predicate::str::contains("E400"))
        .stderr(predicate::str::contains("disciplines"));
}

#[test]
fn test_config_validate_nonexistent_file() {
    synth_cmd()
        .args(["config", "validate", "--config", "/nonexistent/path/config.toml"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("config init"));
}

// ─────────────────────────────────────────────────────────────────
// Verbosity and Error Handling Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_verbose_logs_to_stderr() {
    let (_dir, path) = write_config("");

    synth_cmd()
        .args(["-v", "generate", "--dry-run", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Generated response bundles"))
        .stdout(predicate::str::contains("Generated response bundles").not());
}

#[test]
fn test_unknown_command() {
    synth_cmd()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_missing_subcommand() {
    synth_cmd().assert().failure();
}
