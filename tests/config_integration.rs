use ledger_chat::config::AppConfig;
use serial_test::serial;
use std::env;
use std::io::Write;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("LEDGER_CHAT__SERVER__PORT");
        env::remove_var("LEDGER_CHAT__BACKEND__BASE_URL");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("BACKEND_URL");
        env::remove_var("ESCAPE_MARKUP");
    }
}

fn yaml_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["ledger-chat"]).expect("defaults load");

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.backend.base_url, "http://127.0.0.1:5000");
    assert_eq!(config.backend.chat_path, "/api/chat/accounting");
    assert_eq!(config.backend.schema_path, "/api/accounting/schema");
    assert_eq!(config.backend.timeout_secs, 0);
    assert_eq!(config.widget.initial_mode, "accounting");
    assert!(!config.render.escape_markup);
    assert_eq!(config.bind_address(), "127.0.0.1:3000");
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("LEDGER_CHAT__SERVER__PORT", "9090");
        env::set_var("LEDGER_CHAT__BACKEND__BASE_URL", "http://books.internal:8000");
    }

    let config = AppConfig::load_from_args(["ledger-chat"]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.backend.base_url, "http://books.internal:8000");

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let file = yaml_file(
        r#"
server:
  port: 7070
render:
  escape_markup: true
"#,
    );
    let path = file.path().to_str().expect("utf8 path").to_string();

    let config =
        AppConfig::load_from_args(["ledger-chat", "--config", path.as_str()]).expect("file config");
    assert_eq!(config.server.port, 7070);
    assert!(config.render.escape_markup);
    // Untouched keys keep their defaults.
    assert_eq!(config.backend.chat_path, "/api/chat/accounting");
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["ledger-chat", "--config", "/nonexistent/chat.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cli_flags_beat_environment() {
    clear_env_vars();
    unsafe {
        env::set_var("LEDGER_CHAT__SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args([
        "ledger-chat",
        "--port",
        "4000",
        "--backend-url",
        "http://ledger:9000",
        "--escape-markup",
        "true",
    ])
    .expect("cli config");

    assert_eq!(config.server.port, 4000);
    assert_eq!(config.backend.base_url, "http://ledger:9000");
    assert!(config.render.escape_markup);

    clear_env_vars();
}
