//! CLI Argument Parsing Tests for bcp
//!
//! These tests verify that command-line arguments are parsed correctly, including the camelCase
//! spellings of the bucket and profile flags. Every invocation ends with `--help` so that nothing
//! is copied and no credentials are needed.

use assert_cmd::Command;

fn bcp() -> Command {
    Command::cargo_bin("bcp").unwrap()
}

#[test]
fn test_help_runs() {
    bcp()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("--src-bucket"))
        .stdout(predicates::str::contains("--workers"));
}

#[test]
fn test_version_runs() {
    bcp()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("bcp"));
}

#[test]
fn test_help_shows_defaults() {
    bcp()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("[default: srcBucket]"))
        .stdout(predicates::str::contains("[default: dstBucket]"))
        .stdout(predicates::str::contains("[default: us-east-1]"))
        .stdout(predicates::str::contains("[default: 20]"));
}

// ============================================================================
// Source & destination
// ============================================================================

#[test]
fn test_kebab_case_flags() {
    bcp()
        .args([
            "--src-profile",
            "prod",
            "--src-bucket",
            "a",
            "--dst-bucket",
            "b",
            "--src-region",
            "eu-west-1",
            "--dst-region",
            "eu-west-2",
            "--help",
        ])
        .assert()
        .success();
}

#[test]
fn test_camel_case_aliases() {
    bcp()
        .args([
            "--srcProfile",
            "prod",
            "--srcBucket",
            "a",
            "--dstBucket",
            "b",
            "--srcRegion",
            "eu-west-1",
            "--dstRegion",
            "eu-west-2",
            "--help",
        ])
        .assert()
        .success();
}

#[test]
fn test_endpoint_flags() {
    bcp()
        .args([
            "--endpoint-url",
            "http://localhost:9000",
            "--force-path-style",
            "--help",
        ])
        .assert()
        .success();
}

#[test]
fn test_unknown_flag_fails() {
    bcp()
        .args(["--dst-profile", "other"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("unexpected argument"));
}

// ============================================================================
// Copy options
// ============================================================================

#[test]
fn test_workers_numeric() {
    bcp().args(["--workers", "64", "--help"]).assert().success();
}

#[test]
fn test_workers_zero_rejected() {
    bcp()
        .args(["--workers", "0", "--help"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("invalid value '0'"));
}

#[test]
fn test_workers_not_a_number_rejected() {
    bcp()
        .args(["--workers", "many", "--help"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("invalid value 'many'"));
}

#[test]
fn test_fail_early_flag() {
    bcp().args(["--fail-early", "--help"]).assert().success();
}

#[test]
fn test_fail_early_short_flag() {
    bcp().args(["-e", "--help"]).assert().success();
}

// ============================================================================
// ProgressType Argument Parsing Tests
// ============================================================================

#[test]
fn test_progress_type_values() {
    for value in [
        "auto",
        "Auto",
        "progress-bar",
        "ProgressBar",
        "text-updates",
        "TextUpdates",
    ] {
        bcp()
            .args(["--progress-type", value, "--help"])
            .assert()
            .success();
    }
}

#[test]
fn test_progress_type_invalid_value() {
    bcp()
        .args(["--progress-type", "invalid-value", "--help"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("invalid value 'invalid-value'"));
}

#[test]
fn test_progress_delay_duration() {
    bcp()
        .args(["--progress-delay", "500ms", "--help"])
        .assert()
        .success();
}

#[test]
fn test_no_progress_conflicts_with_progress_type() {
    bcp()
        .args(["--no-progress", "--progress-type", "auto"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("cannot be used with"));
}

// ============================================================================
// Output flags
// ============================================================================

#[test]
fn test_quiet_flags() {
    bcp().args(["--quiet", "--help"]).assert().success();
    bcp().args(["-q", "--help"]).assert().success();
}

#[test]
fn test_verbose_levels() {
    for flag in ["-v", "-vv", "-vvv"] {
        bcp().args([flag, "--help"]).assert().success();
    }
}

#[test]
fn test_max_workers_numeric() {
    bcp().args(["--max-workers", "4", "--help"]).assert().success();
}
