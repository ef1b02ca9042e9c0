//! End-to-end tests for the `fintrip` binary
//!
//! Each test gets its own storage directory and a config path that does not
//! exist, so defaults plus flags are all that apply.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fintrip(storage: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fintrip").expect("binary should build");
    cmd.env("NO_COLOR", "1")
        .env_remove("FINTRIP_API_BASE_URL")
        .env_remove("FINTRIP_STORAGE_DIR")
        .env_remove("FINTRIP_PASSWORD")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(storage.path().join("missing.yaml"))
        .arg("--storage-dir")
        .arg(storage.path());
    cmd
}

#[test]
fn test_whoami_without_session() {
    let storage = TempDir::new().unwrap();

    fintrip(&storage)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[test]
fn test_whoami_reads_persisted_session() {
    let storage = TempDir::new().unwrap();
    let user = json!({"fullName": "Alice", "email": "a@b.com"}).to_string();
    let contents = json!({"token": "T1", "user": user}).to_string();
    std::fs::write(storage.path().join("storage.json"), contents).unwrap();

    fintrip(&storage)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice"))
        .stdout(predicate::str::contains("a@b.com"));
}

#[test]
fn test_corrupt_session_is_discarded() {
    let storage = TempDir::new().unwrap();
    let contents = json!({"token": "T1", "user": "{not json"}).to_string();
    std::fs::write(storage.path().join("storage.json"), contents).unwrap();

    fintrip(&storage)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));

    let after = std::fs::read_to_string(storage.path().join("storage.json")).unwrap();
    assert!(!after.contains("T1"));
}

#[test]
fn test_login_rejects_invalid_email_locally() {
    let storage = TempDir::new().unwrap();

    fintrip(&storage)
        .args(["login", "--email", "alice", "--password", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Email address is not valid"));
}

#[test]
fn test_unreachable_backend_reports_generic_message() {
    let storage = TempDir::new().unwrap();

    fintrip(&storage)
        .args(["--api-url", "http://127.0.0.1:9/api"])
        .args(["login", "--email", "a@b.com", "--password", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Could not reach the server. Please try again later.",
        ));
}

#[test]
fn test_invalid_api_url_fails_validation() {
    let storage = TempDir::new().unwrap();

    fintrip(&storage)
        .args(["--api-url", "ftp://example.com", "whoami"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("api.base_url"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_then_whoami_then_logout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "result": {"token": "T1", "user": {"fullName": "A", "email": "a@b.com"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = TempDir::new().unwrap();
    let api_url = server.uri();

    fintrip(&storage)
        .args(["--api-url", api_url.as_str()])
        .args(["login", "--email", "a@b.com"])
        .env("FINTRIP_PASSWORD", "x")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome,"));

    let persisted = std::fs::read_to_string(storage.path().join("storage.json")).unwrap();
    assert!(persisted.contains("\"T1\""));
    assert!(storage.path().join("cookies.json").exists());

    fintrip(&storage)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("A"))
        .stdout(predicate::str::contains("a@b.com"));

    fintrip(&storage)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out."));

    fintrip(&storage)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}
