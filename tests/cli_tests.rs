//! Command-line surface tests. None of these reach AWS: every invocation
//! fails or exits before a client is created.

use std::process::{Command, Output};

fn cloudtrailctl(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cloudtrailctl"))
        .args(args)
        .env_remove("CAD_AWS_CSS_JUMPROLE")
        .env_remove("CAD_AWS_SUPPORT_JUMPROLE")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run cloudtrailctl")
}

#[test]
fn test_help_lists_commands() {
    let output = cloudtrailctl(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("write-history"));
    assert!(stdout.contains("permission-denied-history"));
    assert!(stdout.contains("--cluster-id"));
}

#[test]
fn test_history_flags_in_subcommand_help() {
    let output = cloudtrailctl(&["write-history", "--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--since", "--raw", "--ignore-users", "--toggle-event-ids", "--tagged"] {
        assert!(stdout.contains(flag), "missing {} in help", flag);
    }
}

#[test]
fn test_help_hides_role_arn_values_from_env() {
    let output = Command::new(env!("CARGO_BIN_EXE_cloudtrailctl"))
        .args(["write-history", "--help"])
        .env("CAD_AWS_CSS_JUMPROLE", "arn:aws:iam::999999999999:role/hidden-jump")
        .env("CAD_AWS_SUPPORT_JUMPROLE", "arn:aws:iam::888888888888:role/hidden-support")
        .output()
        .expect("failed to run cloudtrailctl");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CAD_AWS_CSS_JUMPROLE"));
    assert!(!stdout.contains("hidden-jump"));
    assert!(!stdout.contains("hidden-support"));
}

#[test]
fn test_cluster_id_required_without_direct() {
    let output = cloudtrailctl(&["write-history"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cluster-id"), "stderr: {}", stderr);
}

#[test]
fn test_role_arns_required_without_direct() {
    let output = cloudtrailctl(&["permission-denied-history", "-c", "my-cluster"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CAD_AWS_CSS_JUMPROLE"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_since_rejected() {
    let output = cloudtrailctl(&["--direct", "write-history", "--since", "yesterday"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("yesterday"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_ignore_pattern_rejected() {
    let output = cloudtrailctl(&["-d", "write-history", "-i", "alice,[unclosed"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[unclosed"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_tag_rejected() {
    let output = cloudtrailctl(&["-d", "write-history", "--tagged", "no-separator"]);
    assert!(!output.status.success());
}

#[test]
fn test_generate_completion() {
    let output = cloudtrailctl(&["generate-completion", "bash"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cloudtrailctl"));
    assert!(stdout.contains("write-history"));
}
