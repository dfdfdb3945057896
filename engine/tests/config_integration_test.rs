//! Integration tests for configuration management
//!
//! These tests load real files from a scratch directory through the public API.

use sdk::EngineError;
use solver_engine::config::Config;
use std::io::Write;

#[test]
fn test_load_full_config_from_path() {
    let toml_content = r#"
[core]
log_level = "debug"

[server]
bind = "0.0.0.0:8000"
max_upload_bytes = 1048576
allowed_extensions = ["csv", ".ZIP"]

[llm]
base_url = "https://proxy.example.com/v1beta/"
model = "gemini-1.5-flash"
api_key_env = "MY_PROXY_TOKEN"
timeout_secs = 30
search_tool = false

[tools]
code_command = "code-insiders"
npx_command = "/usr/local/bin/npx"
prettier_package = "prettier@3.4.2"
command_timeout_secs = 15

[httpbin]
url = "http://localhost:8080/get"
timeout_secs = 3
"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(toml_content.as_bytes()).unwrap();

    let config = Config::load_from_path(file.path()).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.server.bind, "0.0.0.0:8000");
    assert_eq!(config.server.max_upload_bytes, 1_048_576);
    assert_eq!(config.server.allowed_extensions, vec!["csv", "zip"]);
    assert_eq!(config.llm.model, "gemini-1.5-flash");
    assert_eq!(config.llm.api_key_env, "MY_PROXY_TOKEN");
    assert!(!config.llm.search_tool);
    assert_eq!(config.tools.code_command, "code-insiders");
    assert_eq!(config.tools.command_timeout_secs, 15);
    assert_eq!(config.httpbin.url, "http://localhost:8080/get");
    assert_eq!(config.httpbin.timeout_secs, 3);
}

#[test]
fn test_partial_config_fills_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[server]\nbind = \"127.0.0.1:9000\"\n").unwrap();

    let config = Config::load_from_path(file.path()).unwrap();

    assert_eq!(config.server.bind, "127.0.0.1:9000");
    assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
    assert_eq!(
        config.server.allowed_extensions,
        vec!["csv", "xlsx", "xls", "zip", "md"]
    );
    assert_eq!(config.llm.api_key_env, "LLM_API_TOKEN");
    assert_eq!(config.tools.prettier_package, "prettier@3.4.2");
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let result = Config::load_from_path(&dir.path().join("absent.toml"));

    match result {
        Err(EngineError::Config(msg)) => assert!(msg.starts_with("Failed to read config file")),
        other => panic!("Expected config error, got: {:?}", other),
    }
}

#[test]
fn test_malformed_toml_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[server\nbind = ").unwrap();

    let result = Config::load_from_path(file.path());
    match result {
        Err(EngineError::Config(msg)) => assert!(msg.starts_with("Failed to parse config")),
        other => panic!("Expected config error, got: {:?}", other),
    }
}

#[test]
fn test_zero_upload_ceiling_rejected() {
    let result = Config::from_toml_str("[server]\nmax_upload_bytes = 0\n");
    assert!(matches!(result, Err(EngineError::Config(_))));
}

#[test]
fn test_blank_token_variable_rejected() {
    let result = Config::from_toml_str("[llm]\napi_key_env = \"  \"\n");
    assert!(matches!(result, Err(EngineError::Config(_))));
}
