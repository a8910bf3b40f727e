//! Integration tests for commands that need no external services

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command with a clean environment and a config path that does not exist
fn ragroute_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ragroute").unwrap();
    cmd.env_clear()
        .arg("--config")
        .arg(dir.path().join("missing.yml"));
    cmd
}

#[test]
fn test_collections_lists_all() {
    let dir = TempDir::new().unwrap();
    ragroute_cmd(&dir)
        .arg("collections")
        .assert()
        .success()
        .stdout(predicate::str::contains("products_collection"))
        .stdout(predicate::str::contains("Customer Support & FAQ"))
        .stdout(predicate::str::contains("finance"));
}

#[test]
fn test_collections_json() {
    let dir = TempDir::new().unwrap();
    let output = ragroute_cmd(&dir)
        .args(["--format", "json", "collections"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let keys: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["products", "support", "finance"]);
}

#[test]
fn test_config_masks_secrets() {
    let dir = TempDir::new().unwrap();
    ragroute_cmd(&dir)
        .env("OPENAI_API_KEY", "sk-abcdefghijklmnop")
        .env("RAGROUTE_SQLITE_PATH", dir.path().join("store.sqlite"))
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-a…mnop"))
        .stdout(predicate::str::contains("sk-abcdefghijklmnop").not())
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_config_reports_missing_key() {
    let dir = TempDir::new().unwrap();
    ragroute_cmd(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is invalid"));
}

#[test]
fn test_config_file_values_apply() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yml");
    fs::write(&config_path, "routing:\n  similarity_threshold: 0.7\n").unwrap();

    let output = Command::cargo_bin("ragroute")
        .unwrap()
        .env_clear()
        .arg("--config")
        .arg(&config_path)
        .args(["--format", "json", "config"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let threshold = parsed["config"]["routing"]["similarity_threshold"]
        .as_f64()
        .unwrap();
    assert!((threshold - 0.7).abs() < 1e-6);
    assert_eq!(parsed["valid"], false);
}

#[test]
fn test_ask_without_api_key_fails() {
    let dir = TempDir::new().unwrap();
    ragroute_cmd(&dir)
        .args(["ask", "What", "is", "the", "refund", "policy?"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_ask_with_placeholder_key_fails() {
    let dir = TempDir::new().unwrap();
    ragroute_cmd(&dir)
        .env("OPENAI_API_KEY", "your_openai_api_key_here")
        .env("RAGROUTE_SQLITE_PATH", dir.path().join("store.sqlite"))
        .args(["ask", "hello"])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_ingest_unknown_collection() {
    let dir = TempDir::new().unwrap();
    ragroute_cmd(&dir)
        .args(["ingest", "--collection", "marketing"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Unknown collection"));
}

#[test]
fn test_ingest_rejects_pdf() {
    let dir = TempDir::new().unwrap();
    let pdf = dir.path().join("report.pdf");
    fs::write(&pdf, "%PDF-1.4").unwrap();

    ragroute_cmd(&dir)
        .env("OPENAI_API_KEY", "sk-test-key-123456")
        .env("RAGROUTE_SQLITE_PATH", dir.path().join("store.sqlite"))
        .args(["ingest", "--collection", "finance"])
        .arg(&pdf)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("PDF"));
}

#[test]
fn test_ask_unknown_collection() {
    let dir = TempDir::new().unwrap();
    ragroute_cmd(&dir)
        .args(["ask", "--collection", "marketing", "Who", "are", "our", "customers?"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Unknown collection"));
}

#[test]
fn test_ask_collection_requires_api_key() {
    let dir = TempDir::new().unwrap();
    ragroute_cmd(&dir)
        .env("RAGROUTE_SQLITE_PATH", dir.path().join("store.sqlite"))
        .args(["ask", "--collection", "finance", "Q3", "revenue?"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}
