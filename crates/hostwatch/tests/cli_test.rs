//! Integration tests for the `hostwatch` CLI binary.
//!
//! Argument parsing, help output and completions run without a registry;
//! host commands run against a wiremock registry.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// The `hostwatch` binary with `HOSTWATCH_*` cleared and the config
/// directory pointed somewhere empty.
fn hostwatch_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("hostwatch");
    cmd.env("HOME", "/tmp/hostwatch-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/hostwatch-cli-test-nonexistent")
        .env_remove("HOSTWATCH_SERVER")
        .env_remove("HOSTWATCH_OUTPUT")
        .env_remove("HOSTWATCH_COLOR")
        .env_remove("HOSTWATCH_TIMEOUT")
        .env_remove("HOSTWATCH_REFRESH_INTERVAL")
        .env_remove("HOSTWATCH_RECONNECT_BASE_MS")
        .env_remove("HOSTWATCH_RECONNECT_MAX_MS")
        .env_remove("HOSTWATCH_INSECURE")
        .env_remove("HOSTWATCH_CA_CERT")
        .env_remove("RUST_LOG");
    cmd
}

/// stdout followed by stderr.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn machine(id: i64, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "hostname": format!("node-{id}"),
        "ip_address": format!("10.0.0.{id}"),
        "mac_address": format!("aa:bb:cc:dd:ee:{id:02x}"),
        "status": status,
        "is_alive": status == "active",
        "response_time": if status == "active" { json!(1.25) } else { json!(null) },
        "last_seen": "2025-01-10T08:00:00"
    })
}

/// Run the binary off the runtime so the mock server keeps serving.
async fn run(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || hostwatch_cmd().args(args).output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = hostwatch_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    hostwatch_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("monitored hosts")
            .and(predicate::str::contains("--ca-cert"))
            .and(predicate::str::contains("hosts"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn test_version_flag() {
    hostwatch_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hostwatch"));
}

#[test]
fn test_hosts_help_lists_subcommands() {
    hostwatch_cmd().args(["hosts", "--help"]).assert().success().stdout(
        predicate::str::contains("list")
            .and(predicate::str::contains("delete"))
            .and(predicate::str::contains("register")),
    );
}

#[test]
fn test_completions_bash() {
    hostwatch_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hostwatch"));
}

#[test]
fn test_invalid_status_value() {
    let output = hostwatch_cmd()
        .args(["hosts", "list", "--status", "sleeping"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("sleeping"));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_missing_server() {
    let output = hostwatch_cmd().args(["hosts", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("No registry server configured"),
        "Expected missing server error:\n{text}"
    );
}

#[test]
fn test_invalid_server_url() {
    let output = hostwatch_cmd()
        .args(["hosts", "list", "--server", "not a url"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("invalid URL"));
}

#[test]
fn test_server_from_env() {
    hostwatch_cmd()
        .env("HOSTWATCH_SERVER", "http://registry.example:8000")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("server = \"http://registry.example:8000\"")
                .and(predicate::str::contains("timeout = 30")),
        );
}

#[test]
fn test_config_show_includes_ca_cert_flag() {
    hostwatch_cmd()
        .args(["config", "show", "--ca-cert", "/etc/hostwatch/ca.pem"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ca_cert = \"/etc/hostwatch/ca.pem\""));
}

#[test]
fn test_delete_requires_confirmation_without_tty() {
    let output = hostwatch_cmd()
        .args(["hosts", "delete", "3", "--server", "http://127.0.0.1:9"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("requires confirmation"));
}

// ── Registry-backed commands ────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hosts_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/machines"))
        .and(query_param("status", "unreachable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "machines": [machine(2, "unreachable")],
            "total": 1,
            "status_filter": "unreachable"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run(vec![
        "hosts".into(),
        "list".into(),
        "--status".into(),
        "unreachable".into(),
        "-o".into(),
        "json".into(),
        "--server".into(),
        server.uri(),
    ])
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let hosts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(hosts[0]["id"], 2);
    assert_eq!(hosts[0]["status"], "unreachable");
    assert_eq!(hosts[0]["alive"], false);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hosts_list_plain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/machines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "machines": [machine(1, "active"), machine(3, "unreachable")],
            "total": 2
        })))
        .mount(&server)
        .await;

    let output = run(vec![
        "hosts".into(),
        "list".into(),
        "-o".into(),
        "plain".into(),
        "--server".into(),
        server.uri(),
    ])
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n3\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hosts_delete_confirmed() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/machines/2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let output = run(vec![
        "hosts".into(),
        "delete".into(),
        "2".into(),
        "-y".into(),
        "--server".into(),
        server.uri(),
    ])
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Host 2 deleted"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hosts_delete_missing() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/machines/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "not found" })))
        .mount(&server)
        .await;

    let output = run(vec![
        "hosts".into(),
        "delete".into(),
        "42".into(),
        "-y".into(),
        "--server".into(),
        server.uri(),
    ])
    .await;

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("Host '42' not found"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hosts_register() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/machines/10.0.0.7"))
        .and(body_json(json!({
            "ip_address": "10.0.0.7",
            "hostname": "node-7",
            "mac_address": "aa:bb:cc:dd:ee:07",
            "metadata": { "rack": "b2" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(machine(7, "active")))
        .expect(1)
        .mount(&server)
        .await;

    let output = run(vec![
        "hosts".into(),
        "register".into(),
        "10.0.0.7".into(),
        "--hostname".into(),
        "node-7".into(),
        "--mac".into(),
        "aa:bb:cc:dd:ee:07".into(),
        "--metadata".into(),
        r#"{"rack": "b2"}"#.into(),
        "-o".into(),
        "plain".into(),
        "--server".into(),
        server.uri(),
    ])
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "7");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_registry_error_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/machines"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "db locked" })))
        .mount(&server)
        .await;

    let output = run(vec![
        "hosts".into(),
        "list".into(),
        "--server".into(),
        server.uri(),
    ])
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("db locked"));
}
