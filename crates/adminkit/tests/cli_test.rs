//! Integration tests for the `adminkit` CLI binary.
//!
//! Argument parsing, help output and completions run without a server;
//! everything else runs against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `adminkit` binary with env isolation.
///
/// Clears all `ADMINKIT_*` variables and points the config file at a path
/// that does not exist, so tests never touch the user's configuration.
fn adminkit_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("adminkit");
    cmd.env("HOME", "/tmp/adminkit-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/adminkit-cli-test-nonexistent")
        .env("ADMINKIT_CONFIG", "/tmp/adminkit-cli-test-nonexistent/config.toml")
        .env("NO_COLOR", "1")
        .env_remove("ADMINKIT_PROFILE")
        .env_remove("ADMINKIT_SERVER")
        .env_remove("ADMINKIT_TOKEN")
        .env_remove("ADMINKIT_OUTPUT")
        .env_remove("ADMINKIT_INSECURE")
        .env_remove("ADMINKIT_TIMEOUT")
        .env_remove("ADMINKIT_DOWNLOAD_DIR")
        .env_remove("RUST_LOG");
    cmd
}

/// `adminkit --server <mock> <args>`, run off the async runtime.
async fn run_against(server: &MockServer, args: &[&str]) -> Output {
    let mut cmd = adminkit_cmd();
    cmd.arg("--server").arg(server.uri()).args(args);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn users_page() -> serde_json::Value {
    json!({
        "code": 200,
        "message": "Success",
        "data": [
            {"id": 1, "name": "Ada", "email": "ada@example.com", "avatar": null},
            {"id": 2, "name": "Linus", "email": "linus@example.com", "avatar": null}
        ]
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = adminkit_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = format!("{}{}", stdout(&output), stderr(&output));
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    adminkit_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("users")
            .and(predicate::str::contains("posts"))
            .and(predicate::str::contains("request")),
    );
}

#[test]
fn test_version_flag() {
    adminkit_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("adminkit"));
}

#[test]
fn test_posts_help_lists_move() {
    adminkit_cmd()
        .args(["posts", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("move").and(predicate::str::contains("list")));
}

#[test]
fn test_completions_bash() {
    adminkit_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_output_format() {
    adminkit_cmd()
        .args(["--output", "xml", "users", "list"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_server_is_a_config_error() {
    adminkit_cmd()
        .args(["users", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No server configured"));
}

// ── Against a server ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_users_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jaq/api/users"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_page()))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["-o", "json", "users", "list"]).await;
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));

    let body: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["data"][1]["name"], json!("Linus"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_posts_list_table_with_sort_and_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jaq/api/posts"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "5"))
        .and(query_param("sorting", "title desc"))
        .and(query_param("authorId", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": 9,
                "title": "Ownership",
                "content": "...",
                "authorId": 1,
                "createdAt": "2024-03-01T09:30:00.000Z"
            }],
            "total": 6
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &[
            "posts", "list", "--page", "2", "--size", "5", "--sort", "title:desc", "--filter",
            "authorId=1",
        ],
    )
    .await;
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("Ownership"), "{text}");
    assert!(text.contains("2024-03-01 09:30"), "{text}");
    assert!(text.contains("Posts: page 2 of 2, 6 total"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_missing_post_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jaq/api/posts/42"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"code": 404, "message": "Post not found"})),
        )
        .mount(&server)
        .await;

    let output = run_against(&server, &["posts", "get", "42"]).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("Post not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_user_posts_form_values() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jaq/api/users"))
        .and(body_json(json!({"name": "Ada", "email": "ada@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {"id": 3, "name": "Ada", "email": "ada@example.com"},
            "message": "User created successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &["users", "create", "name=Ada", "email=ada@example.com"],
    )
    .await;
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert!(stderr(&output).contains("Created successfully"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_without_required_field_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = run_against(&server, &["users", "create", "name=Ada"]).await;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Email is required"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_post_submits_merged_form() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jaq/api/posts/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {"id": 7, "title": "Old", "content": "Body", "authorId": 2}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/jaq/api/posts/7"))
        .and(body_json(json!({"title": "New", "content": "Body", "authorId": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["posts", "update", "7", "title=New"]).await;
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert!(stderr(&output).contains("Updated successfully"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_with_yes_reports_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/jaq/api/users/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "message": "User deleted successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["--yes", "users", "delete", "2"]).await;
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert!(stderr(&output).contains("User deleted successfully"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_move_post_posts_reorder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jaq/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "title": "a"},
                {"id": 2, "title": "b"},
                {"id": 3, "title": "c"}
            ],
            "total": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/jaq/api/posts/sort"))
        .and(body_json(json!({"id": 1, "dir": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["-o", "plain", "posts", "move", "1", "3"]).await;
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "2\n3\n1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_request_fills_params() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/jaq/api/posts/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "message": "gone"})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &["-o", "json-compact", "request", "posts", "item", "-X", "delete", "-P", "id=3"],
    )
    .await;
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    let body: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(body["message"], json!("gone"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_session_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jaq/api/users"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let output = run_against(&server, &["--token", "stale", "users", "list"]).await;
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("Session rejected"), "{err}");
    assert!(err.contains("Authentication failed"), "{err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_hello_uses_profile_token_env() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jaq/hello"))
        .and(header("authorization", "Bearer from-env"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "Hello World!"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "default_profile = \"local\"\n\n[profiles.local]\nserver = \"{}\"\ntoken_env = \"ADMINKIT_TEST_TOKEN\"\n",
            server.uri()
        ),
    )
    .unwrap();

    let mut cmd = adminkit_cmd();
    cmd.env("ADMINKIT_CONFIG", &config)
        .env("ADMINKIT_TEST_TOKEN", "from-env")
        .arg("hello");
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "Hello World!");
}
