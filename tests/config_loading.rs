// tests/config_loading.rs

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use runasd::config::{load_and_validate, load_from_path, Settings};
use runasd::errors::RunAsError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn demo_config_loads_and_validates() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/runasd.toml");

    let (settings, info) = load_and_validate(&path).unwrap();

    assert_eq!(info.name, "myapp");
    assert_eq!(info.display_name, "My App");
    assert_eq!(info.hook_names(), vec!["EmailNotifyHook", "RestartHook"]);
    assert_eq!(settings.value("executable"), "/opt/myapp/bin/myapp");
    assert_eq!(settings.bool_value("killProcessTree").unwrap(), Some(true));
    assert_eq!(settings.parse_value::<u32>("restart/times").unwrap(), Some(3));
    assert_eq!(settings.parse_value::<u16>("email/smtp/port").unwrap(), Some(25));
}

#[test]
fn display_name_defaults_to_name() {
    let file = write_config(
        r#"
name = "worker"
executable = "/usr/bin/worker"
"#,
    );

    let (_settings, info) = load_and_validate(file.path()).unwrap();

    assert_eq!(info.display_name, "worker");
    assert_eq!(info.description, "");
    assert!(info.hook_names().is_empty());
}

#[test]
fn missing_name_returns_config_error() {
    let file = write_config(r#"executable = "/usr/bin/worker""#);

    match load_and_validate(file.path()) {
        Err(RunAsError::ConfigError(msg)) => assert!(msg.contains("name"), "{msg}"),
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn missing_executable_returns_config_error() {
    let file = write_config(r#"name = "worker""#);

    match load_and_validate(file.path()) {
        Err(RunAsError::ConfigError(msg)) => assert!(msg.contains("Executable"), "{msg}"),
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn invalid_kill_process_tree_returns_config_error() {
    let file = write_config(
        r#"
name = "worker"
executable = "/usr/bin/worker"
killProcessTree = "maybe"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(RunAsError::ConfigError(_))
    ));
}

#[test]
fn malformed_toml_returns_toml_error() {
    let file = write_config("name = \"worker\nexecutable = ");

    assert!(matches!(
        load_from_path(file.path()),
        Err(RunAsError::TomlError(_))
    ));
}

#[test]
fn missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        load_from_path(dir.path().join("absent.toml")),
        Err(RunAsError::IoError(_))
    ));
}

#[test]
fn wrong_type_for_service_field_is_rejected() {
    let file = write_config(
        r#"
name = 42
executable = "/usr/bin/worker"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(RunAsError::TomlError(_))
    ));
}

#[test]
fn settings_paths_read_nested_tables() {
    let settings = Settings::from_toml_str(
        r#"
[email.smtp]
host = "smtp.example.com"
port = 587

[email.address]
to = ["a@example.com", "b@example.com"]
"#,
    )
    .unwrap();

    assert_eq!(settings.value("email/smtp/host"), "smtp.example.com");
    assert_eq!(settings.value("email/smtp/port"), "587");
    assert_eq!(settings.value("email/address/to"), "a@example.com");
    assert_eq!(
        settings.values("email/address/to"),
        vec!["a@example.com", "b@example.com"]
    );
    assert_eq!(settings.value("email/smtp/login"), "");
    assert_eq!(settings.value("email/smtp/host/deeper"), "");
    assert!(settings.values("email/nothing").is_empty());
    // A table is not a value.
    assert_eq!(settings.value("email/smtp"), "");
}

#[test]
fn bad_numbers_are_config_errors() {
    let settings = Settings::from_toml_str(
        r#"
[restart]
times = "often"
"#,
    )
    .unwrap();

    assert!(matches!(
        settings.parse_value::<u32>("restart/times"),
        Err(RunAsError::ConfigError(_))
    ));
    assert_eq!(settings.parse_value::<u32>("restart/absent").unwrap(), None);
}
