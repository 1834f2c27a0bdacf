//! Integration tests for the `convergent` CLI binary.
//!
//! Offline commands run against temp files; remote commands run against a
//! wiremock server. No test touches the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `convergent` binary with env isolation.
///
/// Clears all `CONVERGENT_*` env vars and points the config file at
/// `config` so tests never read the user's real configuration.
fn convergent_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("convergent");
    cmd.env("HOME", "/tmp/convergent-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/convergent-test-nonexistent")
        .env("CONVERGENT_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("CONVERGENT_PROFILE")
        .env_remove("CONVERGENT_DEFAULT_PROFILE")
        .env_remove("CONVERGENT_ENDPOINT")
        .env_remove("CONVERGENT_TOKEN")
        .env_remove("CONVERGENT_OUTPUT")
        .env_remove("CONVERGENT_INSECURE")
        .env_remove("CONVERGENT_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn write_file(dir: &Path, name: &str, body: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(body).unwrap()).unwrap();
    path
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = convergent_cmd(&dir.path().join("config.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    convergent_cmd(&dir.path().join("config.toml"))
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("reconcile")
                .and(predicate::str::contains("resolve"))
                .and(predicate::str::contains("apply"))
                .and(predicate::str::contains("wait")),
        );
}

#[test]
fn test_completions_zsh() {
    let dir = tempfile::tempdir().unwrap();
    convergent_cmd(&dir.path().join("config.toml"))
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_reconcile_keeps_declared_order_and_surfaces_drift() {
    let dir = tempfile::tempdir().unwrap();
    let declared = write_file(
        dir.path(),
        "declared.json",
        &json!([
            { "key": [3132], "attributes": { "nickname": "west" } },
            { "key": [3131], "attributes": { "nickname": "east" } },
            { "key": [3134], "attributes": { "nickname": "gone" } }
        ]),
    );
    let observed = write_file(
        dir.path(),
        "observed.json",
        &json!([
            { "key": [3131], "id": "a", "attributes": { "nickname": "East DC" } },
            { "key": [3133], "id": "c", "attributes": {} },
            { "key": [3132], "id": "b", "attributes": { "nickname": "West DC" } }
        ]),
    );

    convergent_cmd(&dir.path().join("config.toml"))
        .args(["reconcile", "-o", "plain", "--declared"])
        .arg(&declared)
        .arg("--observed")
        .arg(&observed)
        .assert()
        .success()
        .stdout("3132\n3131\n3133\n");
}

#[test]
fn test_resolve_prints_surrogate_id() {
    let dir = tempfile::tempdir().unwrap();
    let observed = write_file(
        dir.path(),
        "observed.json",
        &json!([
            { "key": [7, "STAGING"], "id": "9107" },
            { "key": [7, "PRODUCTION"], "id": "9108" }
        ]),
    );

    convergent_cmd(&dir.path().join("config.toml"))
        .args(["resolve", "--observed"])
        .arg(&observed)
        .args(["7", "PRODUCTION"])
        .assert()
        .success()
        .stdout("9108\n");
}

#[test]
fn test_resolve_missing_key_exits_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let observed = write_file(dir.path(), "observed.json", &json!([]));

    let output = convergent_cmd(&dir.path().join("config.toml"))
        .args(["resolve", "--observed"])
        .arg(&observed)
        .arg("3131")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("not found"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.toml");

    convergent_cmd(&config)
        .args(["config", "init", "--name", "lab", "--url", "https://config.lab.example.com/v1"])
        .assert()
        .success();
    assert!(config.exists());

    convergent_cmd(&config)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"default_profile\": \"lab\"")
                .and(predicate::str::contains("config.lab.example.com")),
        );
}

#[test]
fn test_config_use_unknown_profile_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = convergent_cmd(&dir.path().join("config.toml"))
        .args(["config", "use", "prod"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("Profile 'prod' not found"));
}

#[test]
fn test_apply_without_endpoint_explains_setup() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_file(
        dir.path(),
        "activation.json",
        &json!({ "activation": { "config_id": 1, "version": 2 } }),
    );

    let output = convergent_cmd(&dir.path().join("config.toml"))
        .arg("apply")
        .arg(&doc)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("No service endpoint configured"));
}

#[test]
fn test_apply_rejects_invalid_document() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_file(
        dir.path(),
        "activation.json",
        &json!({ "activation": { "config_id": 1, "version": 0 } }),
    );

    let output = convergent_cmd(&dir.path().join("config.toml"))
        .args(["apply", "--endpoint", "https://config.example.com"])
        .arg(&doc)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("invalid configuration version 0"));
}

// ── Remote commands ─────────────────────────────────────────────────

async fn activation_server(submit_status: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scopes/appsec/1/activations/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/scopes/appsec/1/activations/mutations"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "9107",
            "status": submit_status,
            "message": "Version 2 has validation errors",
            "resourceId": "9107"
        })))
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread")]
async fn test_apply_converges_when_accepted_terminal() {
    let server = activation_server("ACTIVATED").await;
    let dir = tempfile::tempdir().unwrap();
    let doc = write_file(
        dir.path(),
        "activation.json",
        &json!({ "activation": { "config_id": 1, "version": 2 } }),
    );

    convergent_cmd(&dir.path().join("config.toml"))
        .args(["apply", "-o", "plain", "--token", "t0ken", "--endpoint"])
        .arg(server.uri())
        .arg(&doc)
        .assert()
        .success()
        .stdout("9107\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_apply_no_wait_prints_handle() {
    let server = activation_server("PENDING").await;
    let dir = tempfile::tempdir().unwrap();
    let doc = write_file(
        dir.path(),
        "activation.json",
        &json!({ "activation": { "config_id": 1, "version": 2 } }),
    );

    convergent_cmd(&dir.path().join("config.toml"))
        .args(["apply", "--no-wait", "--token", "t0ken", "--endpoint"])
        .arg(server.uri())
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("Accepted: ACTIVATE operation 9107"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_apply_failure_status_exits_rejected() {
    let server = activation_server("FAILED").await;
    let dir = tempfile::tempdir().unwrap();
    let doc = write_file(
        dir.path(),
        "activation.json",
        &json!({ "activation": { "config_id": 1, "version": 2 } }),
    );

    let output = convergent_cmd(&dir.path().join("config.toml"))
        .args(["apply", "--token", "t0ken", "--endpoint"])
        .arg(server.uri())
        .arg(&doc)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("Version 2 has validation errors"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wait_resumes_finished_operation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/p-7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "p-7", "status": "COMPLETE" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    convergent_cmd(&dir.path().join("config.toml"))
        .args([
            "wait",
            "p-7",
            "--kind",
            "update",
            "--vocabulary",
            "propagation",
            "-o",
            "plain",
            "--token",
            "t0ken",
            "--endpoint",
        ])
        .arg(server.uri())
        .assert()
        .success()
        .stdout("COMPLETE\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wait_unknown_operation_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let output = convergent_cmd(&dir.path().join("config.toml"))
        .args(["wait", "missing", "--token", "t0ken", "--endpoint"])
        .arg(server.uri())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}
