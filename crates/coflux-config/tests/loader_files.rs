use coflux_config::{ConfigError, ConfigLoader, LogFormat};
use std::io::Write;
use tempfile::Builder;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_toml_file() {
    let file = write_temp(
        ".toml",
        r#"
        [client]
        base_url = "http://localhost:9000"
        user_agent = "itest/1"

        [logging]
        format = "pretty"
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.client.base_url.as_deref(), Some("http://localhost:9000"));
    assert_eq!(config.client.user_agent, "itest/1");
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn loads_json_file() {
    let file = write_temp(".json", r#"{"client": {"timeout_ms": 250}}"#);
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.client.timeout_ms, Some(250));
}

#[test]
fn rejects_unknown_extension() {
    let file = write_temp(".yaml", "client: {}");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
}

#[test]
fn rejects_unknown_section() {
    let file = write_temp(".toml", "[server]\nport = 8080\n");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::TomlError(_)));
}

#[test]
fn missing_required_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(
        ConfigLoader::new().with_file(&path),
        Err(ConfigError::FileNotFound { .. })
    ));
    assert!(ConfigLoader::new().with_optional_file(&path).is_ok());
}

#[test]
fn dotenv_file_must_exist_when_named() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::new()
        .with_dotenv_file(dir.path().join(".env"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Dotenv(_)));
}
