//! CLI smoke tests for the reviewhub binary
//!
//! These run the real binary against temporary config/home directories and,
//! where a backend is needed, a mock HTTP server.

use std::path::Path;
use std::process::{Command, Stdio};

use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

/// Helper to run the reviewhub binary with given arguments
fn run_reviewhub(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_reviewhub"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute reviewhub")
}

/// Write a config pointing at `base_url` with its home dir inside `dir`.
fn write_config(dir: &Path, base_url: &str) -> String {
    let config_path = dir.join("config.yaml");
    let config = format!(
        r#"
client:
  home_dir: "{}"
  base_url: "{}"
  timeout_sec: 5
  user_id: "smoke-device"

logging:
  default:
    console_level: "off"
    file: "logs/reviewhub.log"
    file_level: debug

modules:
  product_reviews:
    products_page_size: 2
    retry:
      max_attempts: 0
"#,
        dir.join("home").to_string_lossy().replace('\\', "/"),
        base_url
    );
    std::fs::write(&config_path, config).expect("Failed to write config");
    config_path.to_string_lossy().to_string()
}

#[test]
fn test_cli_help_command() {
    let output = run_reviewhub(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    for sub in ["products", "reviews", "wishlist", "notifications", "history", "prefs", "check"] {
        assert!(stdout.contains(sub), "Should contain '{sub}' subcommand");
    }
    assert!(stdout.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_reviewhub(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("reviewhub"), "Should contain binary name");
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_reviewhub(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should report an error: {stderr}");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_reviewhub(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config file not found"),
        "Should mention config file issue: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_reviewhub(&["--config", config_path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("yaml") || stderr.contains("parse") || stderr.contains("config"),
        "Should mention YAML parsing issue: {stderr}"
    );
}

#[test]
fn test_cli_check_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "http://127.0.0.1:9");

    let output = run_reviewhub(&["--config", &config_path, "check"]);

    assert!(
        output.status.success(),
        "Check should pass: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("smoke-device"));
}

#[test]
fn test_cli_print_config_applies_base_url_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "http://127.0.0.1:9");

    let output = run_reviewhub(&[
        "--config",
        &config_path,
        "--base-url",
        "http://override.local:8080",
        "--print-config",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("http://override.local:8080"));
}

#[test]
fn test_cli_history_persists_between_runs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "http://127.0.0.1:9");

    for term in ["headphones", "Keyboard", "HEADPHONES"] {
        let output = run_reviewhub(&["--config", &config_path, "history", "add", term]);
        assert!(output.status.success());
    }

    let output = run_reviewhub(&["--config", &config_path, "history", "list"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["HEADPHONES", "Keyboard"]);
}

#[test]
fn test_cli_prefs_theme_is_saved() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "http://127.0.0.1:9");

    let output = run_reviewhub(&["--config", &config_path, "prefs", "theme", "dark"]);
    assert!(output.status.success());

    let prefs = std::fs::read_to_string(temp_dir.path().join("home/preferences.json"))
        .expect("preferences file should exist");
    assert!(prefs.contains("dark"), "unexpected preferences: {prefs}");
}

#[test]
fn test_cli_products_against_mock_backend() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/products")
            .query_param("page", "0")
            .query_param("size", "2")
            .header("X-User-ID", "smoke-device");
        then.status(200).json_body(json!({
            "content": [
                {"id": 1, "name": "Wireless Headphones", "price": 99.5, "averageRating": 4.5},
                {"id": 2, "name": "Mechanical Keyboard", "price": 120.0}
            ],
            "totalElements": 3,
            "totalPages": 2,
            "number": 0,
            "size": 2,
            "last": false
        }));
    });

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &server.base_url());

    let output = run_reviewhub(&["--config", &config_path, "products"]);

    assert!(
        output.status.success(),
        "products should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    mock.assert();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wireless Headphones"));
    assert!(stdout.contains("Mechanical Keyboard"));
    assert!(stdout.contains("2 of 3 products"));
}

#[test]
fn test_cli_products_lists_every_fetched_page() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET).path("/api/products").query_param("page", "0");
        then.status(200).json_body(json!({
            "content": [
                {"id": 1, "name": "Alpha", "price": 1.0},
                {"id": 2, "name": "Bravo", "price": 2.0}
            ],
            "totalElements": 3,
            "totalPages": 2,
            "number": 0,
            "size": 2,
            "last": false
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/api/products").query_param("page", "1");
        then.status(200).json_body(json!({
            "content": [{"id": 3, "name": "Charlie", "price": 3.0}],
            "totalElements": 3,
            "totalPages": 2,
            "number": 1,
            "size": 2,
            "last": true
        }));
    });

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &server.base_url());

    let output = run_reviewhub(&["--config", &config_path, "products", "--pages", "2"]);

    assert!(
        output.status.success(),
        "products should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    first.assert();
    second.assert();
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["Alpha", "Bravo", "Charlie"] {
        assert!(stdout.contains(name), "missing {name} in: {stdout}");
    }
    assert!(stdout.contains("3 of 3 products (page 2)"), "stdout: {stdout}");
}

#[test]
fn test_cli_backend_not_found_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/products/404");
        then.status(404)
            .json_body(json!({"code": 404, "message": "Product not found with id: 404"}));
    });

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &server.base_url());

    let output = run_reviewhub(&["--config", &config_path, "product", "404"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Product not found with id: 404"), "stderr: {stderr}");
}
